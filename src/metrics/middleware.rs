use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::IntGauge;

use crate::state::AppState;

/// Holds one slot of `http_requests_in_progress` until dropped, so a
/// cancelled request gives its slot back too.
struct InFlight(IntGauge);

impl InFlight {
    fn enter(gauge: IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Per-route HTTP metrics. Mounted with `route_layer`, so the matched
/// template (`/products/:id`) is known and unmatched paths are not recorded.
pub async fn track_http(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().as_str().to_owned();
    let metrics = state.metrics.clone();

    let in_flight = InFlight::enter(
        metrics
            .http_in_progress
            .with_label_values(&[method.as_str(), endpoint.as_str()]),
    );
    let started = Instant::now();

    let res = next.run(req).await;
    drop(in_flight);

    let code = res.status().as_u16().to_string();
    let labels = [code.as_str(), method.as_str(), endpoint.as_str()];
    metrics.http_requests.with_label_values(&labels).inc();
    metrics
        .http_request_duration
        .with_label_values(&labels)
        .observe(started.elapsed().as_secs_f64());

    res
}
