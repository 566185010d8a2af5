use std::future::Future;
use tracing::debug;

use crate::error::{ErrorKind, SyncResult};
use crate::metrics::prom::PromQueryResponse;
use crate::metrics::queries::MetricQuery;
use crate::sync_error;

/// Runs instant queries against a metrics endpoint.
pub trait MetricsClient: Send + Sync + 'static {
    fn query(
        &self,
        query: &MetricQuery,
    ) -> impl Future<Output = SyncResult<PromQueryResponse>> + Send;
}

/// HTTP [`MetricsClient`] speaking the Prometheus instant-query API.
#[derive(Debug, Clone)]
pub struct PromClient {
    base_url: String,
    client: reqwest::Client,
}

impl PromClient {
    /// Creates a client for the given base URL, e.g.
    /// `http://prometheus.istio-system:9090`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl MetricsClient for PromClient {
    async fn query(&self, query: &MetricQuery) -> SyncResult<PromQueryResponse> {
        let url = format!(
            "{}/api/v1/query",
            self.base_url.trim_end_matches('/')
        );

        debug!(metric = %query.name, expr = %query.expr, "running metrics query");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.expr.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let mut decoded = response.json::<PromQueryResponse>().await?;
        decoded.metric_name = query.name.clone();

        if decoded.status != "success" {
            return Err(sync_error!(
                ErrorKind::SourceQueryFailed,
                "metrics query returned a non-success status",
                format!("metric '{}', status '{}'", query.name, decoded.status)
            ));
        }

        Ok(decoded)
    }
}
