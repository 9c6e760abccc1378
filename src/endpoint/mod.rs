//! Request/response collaborator
//!
//! `RequestEndpoint` is the seam the sync layer fetches resources through.
//! `HttpEndpoint` issues `GET {base_url}/{resource}` against the analytics
//! service and unwraps its standard response wrapper.

use crate::arguments::is_debug_endpoint_enabled;
use crate::config::EndpointSettings;
use crate::errors::{SyncError, SyncResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait RequestEndpoint: Send + Sync {
    /// Fetch the current value of `resource`
    async fn fetch(&self, resource: &str) -> SyncResult<Value>;
}

pub struct HttpEndpoint {
    client: Client,
    base_url: String,
}

impl HttpEndpoint {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &EndpointSettings) -> SyncResult<Self> {
        Self::new(
            &settings.base_url,
            Duration::from_secs(settings.request_timeout_secs),
            &settings.user_agent,
        )
    }

    pub fn url_for(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl RequestEndpoint for HttpEndpoint {
    async fn fetch(&self, resource: &str) -> SyncResult<Value> {
        let url = self.url_for(resource);

        if is_debug_endpoint_enabled() {
            logger::debug(LogTag::Endpoint, &format!("GET {}", url));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::request(resource, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

            logger::warning(
                LogTag::Endpoint,
                &format!("GET {} failed with status {}: {}", url, status.as_u16(), message),
            );
            return Err(SyncError::request(resource, Some(status.as_u16()), message));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::request(resource, Some(status.as_u16()), format!("invalid JSON body: {}", e)))?;

        unwrap_response(resource, body)
    }
}

/// Strip the `{success, message, data}` wrapper, if the body uses it
///
/// A wrapper with `success: false` is a request error carrying `message`.
/// Bodies without the wrapper are returned whole.
pub fn unwrap_response(resource: &str, body: Value) -> SyncResult<Value> {
    let is_wrapper = body
        .as_object()
        .map(|obj| obj.get("success").map_or(false, Value::is_boolean) && obj.contains_key("message"))
        .unwrap_or(false);
    if !is_wrapper {
        return Ok(body);
    }

    let Value::Object(mut wrapper) = body else {
        return Err(SyncError::parse("response wrapper is not an object"));
    };

    if wrapper.get("success").and_then(Value::as_bool) == Some(false) {
        let message = wrapper
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request unsuccessful")
            .to_string();
        return Err(SyncError::request(resource, None, message));
    }

    Ok(wrapper.remove("data").unwrap_or(Value::Null))
}

/// Best-effort error text from an error body (`detail` or `message`)
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapper_is_unwrapped() {
        let body = json!({
            "success": true,
            "message": "Insights retrieved",
            "data": {"alerts": 3},
            "timestamp": "2024-03-01T12:00:00"
        });
        assert_eq!(unwrap_response("dashboard/insights", body).unwrap(), json!({"alerts": 3}));
    }

    #[test]
    fn test_wrapper_without_data_is_null() {
        let body = json!({"success": true, "message": "ok"});
        assert_eq!(unwrap_response("x", body).unwrap(), Value::Null);
    }

    #[test]
    fn test_unsuccessful_wrapper_is_request_error() {
        let body = json!({"success": false, "message": "No signals available"});
        assert_eq!(
            unwrap_response("crisis/signals", body),
            Err(SyncError::request("crisis/signals", None, "No signals available"))
        );
    }

    #[test]
    fn test_plain_bodies_pass_through() {
        let list = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(unwrap_response("x", list.clone()).unwrap(), list);

        let object = json!({"total": 2, "data": [{"id": 1}, {"id": 2}]});
        assert_eq!(unwrap_response("x", object.clone()).unwrap(), object);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"detail":"Not Found"}"#), Some("Not Found".to_string()));
        assert_eq!(error_message(r#"{"message":"bad"}"#), Some("bad".to_string()));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_url_joining() {
        let endpoint = HttpEndpoint::new(
            "http://localhost:8000/api/v1/",
            Duration::from_secs(5),
            "dashsync-test",
        )
        .unwrap();
        assert_eq!(
            endpoint.url_for("/dashboard/insights"),
            "http://localhost:8000/api/v1/dashboard/insights"
        );
    }
}
