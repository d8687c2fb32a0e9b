use axum::http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::types::SubscriptionOutcome;
use crate::web::Error;

/// Emits one structured line per request.
pub fn log_request(
    req_id: &str,
    req_method: &Method,
    uri: &Uri,
    status_code: StatusCode,
    web_error: Option<&Error>,
    client_outcome: Option<&SubscriptionOutcome>,
) {
    let web_error_type = web_error.map(|we| match we {
        Error::Newsletter(ne) => format!("{}::{}", we.as_ref(), ne.as_ref()),
    });

    let logline = LogLine {
        timestamp: chrono::Utc::now().to_rfc3339(),
        req_id,
        req_method: req_method.as_str(),
        uri: uri.to_string(),
        status_code: status_code.as_u16(),
        client_outcome: client_outcome.map(|co| co.as_ref()),
        web_error_type,
    };

    debug!("LOGLINE: {}", json!(logline));
}

#[derive(Serialize)]
struct LogLine<'a> {
    timestamp: String,
    req_id: &'a str,

    req_method: &'a str,
    uri: String,
    status_code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    client_outcome: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_error_type: Option<String>,
}
