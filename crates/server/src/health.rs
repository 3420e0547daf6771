use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use wrh_quote_core::artifacts::DocumentRenderer;
use wrh_quote_core::cpq::catalog::PricingCatalog;

#[derive(Clone)]
pub struct HealthState {
    catalog: Arc<PricingCatalog>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl HealthState {
    pub fn new(catalog: Arc<PricingCatalog>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub documents: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.catalog);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "wrh-quote-server runtime initialized".to_string(),
        },
        catalog,
        documents: documents_check(state.renderer.as_ref()),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(catalog: &PricingCatalog) -> HealthCheck {
    let services = catalog.services().len();
    if services == 0 {
        return HealthCheck { status: "degraded", detail: "catalog has no services".to_string() };
    }
    HealthCheck { status: "ready", detail: format!("{services} service type(s) priced") }
}

// HTML output is a supported fallback, so it never degrades health.
fn documents_check(renderer: &dyn DocumentRenderer) -> HealthCheck {
    let detail = match renderer.output_format() {
        "pdf" => "documents rendered as PDF",
        _ => "documents rendered as HTML",
    };
    HealthCheck { status: "ready", detail: detail.to_string() }
}
