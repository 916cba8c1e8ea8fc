//! Replay target adapters.
//!
//! `MockTarget` is the default and never leaves the process; `HttpTarget`
//! covers both sandbox and direct endpoints (same wire behavior, different
//! base URL and risk profile).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::domain::{RecordedRequest, TargetKind, Trace};
use crate::ports::{ReplayTarget, TargetError, TargetResponse};

/// Deterministic in-process target, seeded from a recorded trace.
///
/// A replayed request that is byte-for-byte the same call that failed in the
/// trace gets the recorded failure back; anything else (a corrected payload)
/// gets a 200. Same input, same output, no side effects.
pub struct MockTarget {
    recorded: Vec<(RecordedRequest, TargetResponse)>,
}

impl MockTarget {
    pub fn from_trace(trace: &Trace) -> Self {
        let recorded = trace
            .steps
            .iter()
            .filter(|s| s.is_failure())
            .filter_map(|s| {
                s.response.as_ref().map(|r| {
                    (
                        s.request.clone(),
                        TargetResponse {
                            status_code: r.status_code,
                            body: r.body.clone(),
                        },
                    )
                })
            })
            .collect();
        Self { recorded }
    }
}

#[async_trait]
impl ReplayTarget for MockTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::Mock
    }

    async fn send(&self, request: &RecordedRequest) -> Result<TargetResponse, TargetError> {
        for (failed, response) in &self.recorded {
            if failed == request {
                return Ok(response.clone());
            }
        }
        Ok(TargetResponse {
            status_code: 200,
            body: serde_json::json!({"status": "accepted"}),
        })
    }
}

/// HTTP replay against a sandbox or direct endpoint.
pub struct HttpTarget {
    client: Client,
    base_url: String,
    kind: TargetKind,
}

impl HttpTarget {
    /// `kind` must be `Sandbox` or `Direct`; mock replays never go over HTTP.
    pub fn new(base_url: impl Into<String>, kind: TargetKind, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
            kind,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ReplayTarget for HttpTarget {
    fn kind(&self) -> TargetKind {
        self.kind
    }

    async fn send(&self, request: &RecordedRequest) -> Result<TargetResponse, TargetError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TargetError::Unreachable(format!("bad method {:?}: {e}", request.method)))?;
        let url = self.url(&request.path);
        debug!(%url, method = %method, "replaying request");

        let response = self
            .client
            .request(method, &url)
            .json(&request.payload)
            .send()
            .await
            .map_err(|e| TargetError::Unreachable(e.to_string()))?;

        let status_code = response.status().as_u16();
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);

        Ok(TargetResponse { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{SessionId, Step, StepResponse, StepStatus, TraceId};

    fn failing_trace() -> Trace {
        Trace {
            trace_id: TraceId::new("tr_m"),
            session_id: SessionId::new("sess_m"),
            captured_at: Utc::now(),
            steps: vec![Step {
                name: "create_order".to_string(),
                status: StepStatus::Fail,
                request: RecordedRequest {
                    method: "POST".to_string(),
                    path: "/orders".to_string(),
                    payload: serde_json::json!({"items": ["X1"]}),
                },
                response: Some(StepResponse {
                    status_code: 400,
                    body: serde_json::json!({"error": "invalid_item", "code": "X1"}),
                    latency_ms: 80,
                }),
            }],
        }
    }

    #[tokio::test]
    async fn identical_payload_replays_the_recorded_failure() {
        let target = MockTarget::from_trace(&failing_trace());
        let request = failing_trace().steps[0].request.clone();
        let got = target.send(&request).await.unwrap();
        assert_eq!(got.status_code, 400);
        assert_eq!(got.body["code"], "X1");
    }

    #[tokio::test]
    async fn corrected_payload_succeeds() {
        let target = MockTarget::from_trace(&failing_trace());
        let request = RecordedRequest {
            method: "POST".to_string(),
            path: "/orders".to_string(),
            payload: serde_json::json!({"items": ["P12"]}),
        };
        let got = target.send(&request).await.unwrap();
        assert_eq!(got.status_code, 200);
    }

    #[tokio::test]
    async fn mock_is_deterministic() {
        let target = MockTarget::from_trace(&failing_trace());
        let request = failing_trace().steps[0].request.clone();
        let a = target.send(&request).await.unwrap();
        let b = target.send(&request).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn http_target_joins_urls_without_double_slash() {
        let t = HttpTarget::new(
            "http://sandbox.local/",
            TargetKind::Sandbox,
            Duration::from_secs(5),
        );
        assert_eq!(t.url("/orders"), "http://sandbox.local/orders");
        assert_eq!(t.url("orders"), "http://sandbox.local/orders");
    }
}
