use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde_json::Value;

use crate::types::{MetricKind, QuotesQuery};
use crate::{Gateway, QuotegateError, Result};

pub(super) async fn health(State(gateway): State<Arc<Gateway>>) -> Result<Json<Value>> {
    Ok(Json(gateway.health().await?))
}

pub(super) async fn quotes(
    State(gateway): State<Arc<Gateway>>,
    query: std::result::Result<Query<QuotesQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) =
        query.map_err(|rejection| QuotegateError::InvalidQuery(rejection.body_text()))?;
    Ok(Json(gateway.quotes(query.n).await?))
}

type MetricFuture = Pin<Box<dyn Future<Output = Result<Json<Value>>> + Send>>;

/// Handler for one fixed metrics resource.
pub(super) fn metric(
    kind: MetricKind,
) -> impl Fn(State<Arc<Gateway>>) -> MetricFuture + Clone + Send + Sync + 'static {
    move |State(gateway): State<Arc<Gateway>>| -> MetricFuture {
        Box::pin(async move { gateway.metric(kind).await.map(Json) })
    }
}
