use serde::Deserialize;
use tracing::warn;

/// A decoded instant-query response.
///
/// `metric_name` is not part of the wire envelope; the poll loop stamps it
/// with the name of the query that produced the response so the traffic
/// mapper can carry it into the `metric` column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromQueryResponse {
    #[serde(skip)]
    pub metric_name: String,
    pub status: String,
    #[serde(default)]
    pub data: PromQueryData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromQueryData {
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<PromQueryResult>,
}

/// One series of an instant vector: its labels plus a `[timestamp, "value"]`
/// pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromQueryResult {
    #[serde(default)]
    pub metric: PromLabels,
    #[serde(default)]
    pub value: Vec<serde_json::Value>,
}

/// The subset of series labels the traffic table projects.
///
/// Unknown labels are ignored at decode time, absent ones default to empty
/// strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromLabels {
    #[serde(default)]
    pub source_workload: String,
    #[serde(default)]
    pub source_workload_namespace: String,
    #[serde(default)]
    pub destination_workload: String,
    #[serde(default)]
    pub pod: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub destination_service_name: String,
    #[serde(default)]
    pub destination_workload_namespace: String,
    #[serde(default)]
    pub request_protocol: String,
    #[serde(default)]
    pub response_code: String,
    #[serde(default)]
    pub grpc_response_status: String,
}

impl PromQueryResult {
    /// Returns the sample value as a float.
    ///
    /// The wire value is `[timestamp, "<number-as-string>"]`. A missing or
    /// non-numeric value yields NaN with a warning, never an error, so one
    /// malformed series cannot fail a whole refresh cycle.
    pub fn value_as_f64(&self) -> f64 {
        let sample = self.value.get(1);

        let parsed = match sample {
            Some(serde_json::Value::String(s)) => s.parse::<f64>().ok(),
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        };

        parsed.unwrap_or_else(|| {
            warn!(value = ?sample, "non-numeric sample value, substituting NaN");
            f64::NAN
        })
    }
}

impl PromLabels {
    /// Casts the HTTP response code label to an integer.
    ///
    /// An absent label becomes -1, an unparsable one becomes 0 with a
    /// warning.
    pub fn http_status_code(&self) -> i32 {
        cast_status_code(&self.response_code, "response_code")
    }

    /// Casts the gRPC response status label to an integer, with the same
    /// rules as [`http_status_code`](PromLabels::http_status_code).
    pub fn grpc_status_code(&self) -> i32 {
        cast_status_code(&self.grpc_response_status, "grpc_response_status")
    }
}

fn cast_status_code(label: &str, label_name: &'static str) -> i32 {
    if label.is_empty() {
        return -1;
    }

    label.parse::<i32>().unwrap_or_else(|_| {
        warn!(label = label_name, value = label, "unparsable status code label");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_instant_vector_envelope() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {
                        "metric": {
                            "source_workload": "web",
                            "destination_workload": "api",
                            "response_code": "200",
                            "unrelated_label": "ignored"
                        },
                        "value": [1714567890.123, "42.5"]
                    }
                ]
            }
        }"#;

        let response: PromQueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, "success");
        assert_eq!(response.data.result_type, "vector");
        assert_eq!(response.data.result.len(), 1);

        let result = &response.data.result[0];
        assert_eq!(result.metric.source_workload, "web");
        assert_eq!(result.metric.destination_workload, "api");
        assert_eq!(result.metric.grpc_response_status, "");
        assert_eq!(result.value_as_f64(), 42.5);
    }

    #[test]
    fn non_numeric_value_becomes_nan() {
        let result = PromQueryResult {
            value: vec![
                serde_json::json!(1714567890.123),
                serde_json::json!("not-a-number"),
            ],
            ..Default::default()
        };
        assert!(result.value_as_f64().is_nan());

        let empty = PromQueryResult::default();
        assert!(empty.value_as_f64().is_nan());
    }

    #[test]
    fn numeric_json_value_is_accepted() {
        let result = PromQueryResult {
            value: vec![serde_json::json!(1714567890.123), serde_json::json!(7)],
            ..Default::default()
        };
        assert_eq!(result.value_as_f64(), 7.0);
    }

    #[test]
    fn status_code_casts() {
        let mut labels = PromLabels::default();
        assert_eq!(labels.http_status_code(), -1);
        assert_eq!(labels.grpc_status_code(), -1);

        labels.response_code = "503".into();
        assert_eq!(labels.http_status_code(), 503);

        labels.response_code = "5xx".into();
        assert_eq!(labels.http_status_code(), 0);

        labels.grpc_response_status = "14".into();
        assert_eq!(labels.grpc_status_code(), 14);
    }
}
