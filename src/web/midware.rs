use std::sync::Arc;

use axum::{
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use tracing::Span;
use uuid::Uuid;

use crate::web::{log, types::SubscriptionOutcome, Error, REQUEST_ID_HEADER};

/// Turns a `web::Error` stashed in the response extensions into the JSON body the client expects.
/// Errors that are not the client's fault are logged with their full cause chain here,
/// the client only gets a generic message.
///
/// Whatever outcome the request settled on is recorded on the request span.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    headers: HeaderMap,
    resp: Response,
) -> Response {
    let req_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let is_error = web_error.is_some();
    let outcome = web_error
        .map(Error::client_outcome)
        .or_else(|| resp.extensions().get::<SubscriptionOutcome>().cloned());

    if let Some(er) = web_error.filter(|er| er.is_internal()) {
        tracing::error!(req_id = %req_id, "SERVER ERROR: {er:?}");
    }
    if let Some(outcome) = &outcome {
        Span::current().record("outcome", outcome.as_ref());
    }

    log::log_request(
        &req_id,
        &req_method,
        &uri,
        outcome
            .as_ref()
            .map(SubscriptionOutcome::status_code)
            .unwrap_or(resp.status()),
        web_error,
        outcome.as_ref(),
    );

    let Some(outcome) = outcome.filter(|_| is_error) else {
        return resp;
    };

    // The mapped response replaces the original one, so it needs its own copy of the request id.
    let mut mapped = outcome.into_response();
    if let Some(id) = resp.headers().get(REQUEST_ID_HEADER) {
        mapped.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
    }
    mapped
}
