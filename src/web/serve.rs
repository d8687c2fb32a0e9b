use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{field, Span};

use crate::App;

use super::{midware, routes::routes, REQUEST_ID_HEADER};

/// Serves the relay on the listener bound by `App` until the server stops.
pub async fn serve(app: App) -> std::io::Result<()> {
    let App {
        app_state,
        listener,
    } = app;
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(())
                .on_response(log_settled),
        )
        // Runs inside the request span. Responses travel bottom up, so the request id
        // is already on the response when the mapper rebuilds it.
        .layer(middleware::map_response(midware::response_mapper))
        .layer(PropagateRequestIdLayer::new(x_request_id));

    axum::serve(listener, routes(app_state).layer(layers)).await
}

/// `outcome` stays empty until the response mapper knows how a newsletter request ended.
fn request_span(req: &Request<Body>) -> Span {
    let req_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        req_id,
        method = %req.method(),
        path = req.uri().path(),
        outcome = field::Empty,
    )
}

fn log_settled(res: &Response<Body>, latency: Duration, _span: &Span) {
    let status = res.status();

    if status.is_server_error() {
        tracing::error!(%status, ?latency, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%status, ?latency, "request refused");
    } else {
        tracing::info!(%status, ?latency, "request settled");
    }
}
