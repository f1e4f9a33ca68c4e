//! Prometheus metrics for the product service.
//!
//! A single [`Metrics`] value owns its own registry and is shared through
//! the router state; nothing here is a process global. Every primitive is
//! atomic, so handlers update them without extra locking.

pub mod middleware;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use tracing::error;

use crate::{products::repo_types::Product, state::AppState};

/// Values of the `endpoint` label on `products_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    All,
    ById,
    ByIdNotFound,
    Create,
    Update,
    Delete,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::All => "all",
            Endpoint::ById => "byid",
            Endpoint::ByIdNotFound => "byid-notfound",
            Endpoint::Create => "create",
            Endpoint::Update => "update",
            Endpoint::Delete => "delete",
        }
    }
}

pub struct Metrics {
    registry: Registry,
    pub products_created: IntCounter,
    pub product_requests: IntCounterVec,
    pub products_in_stock: IntGauge,
    pub request_duration: Histogram,
    pub http_requests: IntCounterVec,
    pub http_request_duration: HistogramVec,
    pub http_in_progress: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let products_created = IntCounter::new(
            "products_created_total",
            "Total number of products created",
        )?;
        let product_requests = IntCounterVec::new(
            Opts::new("products_requests_total", "Total number of product API requests"),
            &["method", "endpoint"],
        )?;
        let products_in_stock =
            IntGauge::new("products_in_stock", "Current number of products in stock")?;
        let request_duration = Histogram::with_opts(HistogramOpts::new(
            "request_duration_seconds",
            "Duration of HTTP requests",
        ))?;

        let http_requests = IntCounterVec::new(
            Opts::new(
                "http_requests_received_total",
                "Count of HTTP requests that have been completed",
            ),
            &["code", "method", "endpoint"],
        )?;
        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests from start to response",
            ),
            &["code", "method", "endpoint"],
        )?;
        let http_in_progress = IntGaugeVec::new(
            Opts::new(
                "http_requests_in_progress",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(products_created.clone()))?;
        registry.register(Box::new(product_requests.clone()))?;
        registry.register(Box::new(products_in_stock.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(http_in_progress.clone()))?;
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            products_created,
            product_requests,
            products_in_stock,
            request_duration,
            http_requests,
            http_request_duration,
            http_in_progress,
        })
    }

    pub fn count_request(&self, method: &str, endpoint: Endpoint) {
        self.product_requests
            .with_label_values(&[method, endpoint.as_str()])
            .inc();
    }

    #[cfg(test)]
    pub fn requests(&self, method: &str, endpoint: Endpoint) -> u64 {
        self.product_requests
            .with_label_values(&[method, endpoint.as_str()])
            .get()
    }

    /// Overwrites the stock gauge with the total over `products`.
    pub fn set_stock_total(&self, products: &[Product]) {
        let total: i64 = products.iter().map(|p| p.stock).sum();
        self.products_in_stock.set(total);
    }

    /// Text exposition of everything in the registry.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .context("encode metrics")?;
        String::from_utf8(buf).context("metrics are not utf-8")
    }
}

/// GET /metrics
pub async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
