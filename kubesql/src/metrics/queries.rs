use kubesql_config::shared::MetricQueryConfig;

/// A named instant query the poll loop runs each cycle.
///
/// `name` lands in the `metric` column of every row the query produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub name: String,
    pub expr: String,
}

impl MetricQuery {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

impl From<&MetricQueryConfig> for MetricQuery {
    fn from(config: &MetricQueryConfig) -> Self {
        Self::new(config.name.as_str(), config.expr.as_str())
    }
}

/// Builds the cycle's query set from configuration, falling back to the
/// built-in set when none are configured.
pub fn queries_from_config(configs: &[MetricQueryConfig]) -> Vec<MetricQuery> {
    if configs.is_empty() {
        return default_queries();
    }

    configs.iter().map(MetricQuery::from).collect()
}

/// The default query set: service-mesh request metrics over a 5 minute
/// window, one query per metric name.
pub fn default_queries() -> Vec<MetricQuery> {
    vec![
        MetricQuery::new("http_request", "rate(istio_requests_total[5m])"),
        MetricQuery::new(
            "grpc_message_request",
            "rate(istio_request_messages_total[5m])",
        ),
        MetricQuery::new(
            "grpc_message_response",
            "rate(istio_response_messages_total[5m])",
        ),
        MetricQuery::new(
            "duration",
            "increase(istio_request_duration_milliseconds_sum[5m]) / increase(istio_request_duration_milliseconds_count[5m])",
        ),
        MetricQuery::new(
            "duration_50",
            "histogram_quantile(.50, rate(istio_request_duration_milliseconds_bucket[5m]))",
        ),
        MetricQuery::new(
            "duration_95",
            "histogram_quantile(.95, rate(istio_request_duration_milliseconds_bucket[5m]))",
        ),
        MetricQuery::new(
            "duration_99",
            "histogram_quantile(.99, rate(istio_request_duration_milliseconds_bucket[5m]))",
        ),
        MetricQuery::new(
            "request_size",
            "increase(istio_request_bytes_sum[5m]) / increase(istio_request_bytes_count[5m])",
        ),
        MetricQuery::new(
            "request_size_50",
            "histogram_quantile(.50, rate(istio_request_bytes_bucket[5m]))",
        ),
        MetricQuery::new(
            "request_size_95",
            "histogram_quantile(.95, rate(istio_request_bytes_bucket[5m]))",
        ),
        MetricQuery::new(
            "request_size_99",
            "histogram_quantile(.99, rate(istio_request_bytes_bucket[5m]))",
        ),
        MetricQuery::new(
            "response_size",
            "increase(istio_response_bytes_sum[5m]) / increase(istio_response_bytes_count[5m])",
        ),
        MetricQuery::new(
            "response_size_50",
            "histogram_quantile(.50, rate(istio_response_bytes_bucket[5m]))",
        ),
        MetricQuery::new(
            "response_size_95",
            "histogram_quantile(.95, rate(istio_response_bytes_bucket[5m]))",
        ),
        MetricQuery::new(
            "response_size_99",
            "histogram_quantile(.99, rate(istio_response_bytes_bucket[5m]))",
        ),
    ]
}
