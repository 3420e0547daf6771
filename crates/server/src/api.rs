//! JSON endpoints a browser front end drives the quote wizard through.
//!
//! Each request carries the full form and builds a fresh wizard over the
//! shared catalog. Nothing is kept between requests. Document rendering may
//! shell out to wkhtmltopdf, so it runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use wrh_quote_core::artifacts::{
    DocumentRenderer, InMemoryFileSink, InMemoryMailComposer, MailDraft,
    QuoteDocumentGenerator, QuoteStamp, StudioProfile,
};
use wrh_quote_core::cpq::catalog::{PricingCatalog, ServiceCatalog};
use wrh_quote_core::cpq::pricing::PricingDetails;
use wrh_quote_core::domain::{FormField, QuoteFormData, ServiceType, WizardStep};
use wrh_quote_core::errors::{ApplicationError, DomainError, InterfaceError};
use wrh_quote_core::flows::{
    DocumentOutcome, Notice, QuoteWizard, SubmitOutcome, WizardTransitionError, WizardView,
};

#[derive(Clone)]
pub struct ApiState {
    catalog: Arc<PricingCatalog>,
    studio: Arc<StudioProfile>,
    generator: Arc<QuoteDocumentGenerator>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl ApiState {
    pub fn new(
        catalog: Arc<PricingCatalog>,
        studio: StudioProfile,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Result<Self, ApplicationError> {
        Ok(Self {
            catalog,
            studio: Arc::new(studio),
            generator: Arc::new(QuoteDocumentGenerator::new()?),
            renderer,
        })
    }
}

/// The form as the client has it, plus the step the client wants to see.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardRequest {
    #[serde(flatten)]
    pub form: QuoteFormData,
    #[serde(default)]
    pub step: Option<WizardStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteResponse {
    pub status: &'static str,
    pub step: WizardStep,
    pub missing_fields: Vec<FormField>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: &'static str,
    pub reference: String,
    pub pricing: PricingDetails,
    pub draft: MailDraft,
    pub mailto: String,
    pub notice: Notice,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), correlation_id: None }
    }
}

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        let status = match value {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: value.user_message().to_string(),
            correlation_id: Some(value.correlation_id().to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/catalog", get(catalog))
        .route("/api/catalog/{service}", get(catalog_service))
        .route("/api/quote/view", post(view))
        .route("/api/quote/submit", post(submit))
        .route("/api/quote/document", post(document))
        .with_state(state)
}

async fn catalog(State(state): State<ApiState>) -> Json<Vec<ServiceCatalog>> {
    Json(state.catalog.services().to_vec())
}

async fn catalog_service(
    Path(service): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<ServiceCatalog>, ApiError> {
    let service_type = service
        .parse::<ServiceType>()
        .map_err(|error| ApiError::new(StatusCode::BAD_REQUEST, error.to_string()))?;
    state.catalog.service(service_type).cloned().map(Json).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, format!("no prices for `{service_type}`"))
    })
}

/// Replays the form, then moves to the requested step if it is unlocked.
async fn view(
    State(state): State<ApiState>,
    Json(request): Json<WizardRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let mut wizard = QuoteWizard::new(&state.catalog);
    // A replay that stops early leaves the wizard on the first incomplete step.
    let _ = wizard.replay(&request.form);

    if let Some(step) = request.step {
        if step != wizard.current_step() {
            wizard.go_to_step(step).map_err(|error| match error {
                WizardTransitionError::StepLocked { .. } => {
                    ApiError::new(StatusCode::CONFLICT, error.to_string())
                }
                other => ApiError::from(interface_error(DomainError::from(other))),
            })?;
        }
    }

    Ok(Json(wizard.view()))
}

async fn submit(
    State(state): State<ApiState>,
    Json(request): Json<WizardRequest>,
) -> Result<Response, ApiError> {
    let mut wizard = QuoteWizard::new(&state.catalog);
    let stamp = QuoteStamp::now(&state.studio.reference_prefix);

    let (pricing, draft, notice) = match submit_form(&mut wizard, &request.form, &state, &stamp)? {
        Ok(submitted) => submitted,
        Err(incomplete) => {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(incomplete)).into_response())
        }
    };

    let response = SubmitResponse {
        status: "submitted",
        reference: stamp.reference,
        mailto: draft.mailto_uri(),
        pricing,
        draft,
        notice,
        message: notice.message(),
    };
    Ok(Json(response).into_response())
}

async fn document(
    State(state): State<ApiState>,
    Json(request): Json<WizardRequest>,
) -> Result<Response, ApiError> {
    tokio::task::spawn_blocking(move || render_document(&state, &request.form))
        .await
        .map_err(|error| {
            ApiError::from(interface_error(ApplicationError::Handoff(format!(
                "document worker stopped: {error}"
            ))))
        })?
}

fn render_document(state: &ApiState, form: &QuoteFormData) -> Result<Response, ApiError> {
    let mut wizard = QuoteWizard::new(&state.catalog);
    let stamp = QuoteStamp::now(&state.studio.reference_prefix);

    if let Err(incomplete) = submit_form(&mut wizard, form, state, &stamp)? {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(incomplete)).into_response());
    }

    let sink = InMemoryFileSink::default();
    let outcome = wizard.download_document(
        &state.studio,
        &stamp,
        &state.generator,
        state.renderer.as_ref(),
        &sink,
    );

    match outcome {
        DocumentOutcome::Saved { filename, content_type, .. } => {
            let bytes = sink.files().into_iter().next().map(|file| file.bytes).unwrap_or_default();
            info!(
                event_name = "server.document.served",
                reference = %stamp.reference,
                filename = %filename,
                size = bytes.len(),
                "quote document served"
            );
            let headers = [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
            ];
            Ok((headers, bytes).into_response())
        }
        DocumentOutcome::NotReady { notice } => {
            Err(ApiError::new(StatusCode::CONFLICT, notice.message()))
        }
        DocumentOutcome::Failed { notice } => Err(ApiError::from(interface_error(
            ApplicationError::Handoff(notice.message().to_string()),
        ))),
    }
}

type Submitted = (PricingDetails, MailDraft, Notice);

/// Walks the wizard to the contact step and submits. The inner `Err` is a
/// normal validation stop; the outer one is an unexpected failure.
fn submit_form(
    wizard: &mut QuoteWizard<'_>,
    form: &QuoteFormData,
    state: &ApiState,
    stamp: &QuoteStamp,
) -> Result<Result<Submitted, IncompleteResponse>, ApiError> {
    match wizard.replay(form) {
        Ok(_) => {}
        Err(WizardTransitionError::MissingRequiredFields { step, missing_fields }) => {
            return Ok(Err(incomplete(step, missing_fields)));
        }
        Err(error) => return Err(interface_error(DomainError::from(error)).into()),
    }

    // The browser opens the mailto link itself, so the draft only needs capturing.
    let composer = InMemoryMailComposer::default();
    match wizard.submit(&state.studio, stamp, &composer) {
        Ok(SubmitOutcome::Submitted { pricing, draft, notice }) => Ok(Ok((pricing, draft, notice))),
        Ok(SubmitOutcome::Incomplete { missing_fields, .. }) => {
            Ok(Err(incomplete(WizardStep::Contact, missing_fields)))
        }
        Err(error) => Err(interface_error(error).into()),
    }
}

fn incomplete(step: WizardStep, missing_fields: Vec<FormField>) -> IncompleteResponse {
    let message = if step == WizardStep::Contact {
        Notice::CompleteRequiredFields.message().to_string()
    } else {
        format!("Please complete the {} step first.", step.label())
    };
    IncompleteResponse { status: "incomplete", step, missing_fields, message }
}

fn interface_error(error: impl Into<ApplicationError>) -> InterfaceError {
    let error = error.into();
    let correlation_id = Uuid::new_v4().to_string();
    warn!(
        event_name = "server.quote.rejected",
        correlation_id = %correlation_id,
        error_class = error.class(),
        error = %error,
        "quote request failed"
    );
    error.into_interface(correlation_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wrh_quote_core::artifacts::{
        DocumentRenderer, HandoffError, HtmlRenderer, RenderedDocument, StudioProfile,
    };
    use wrh_quote_core::cpq::catalog::builtin_catalog;

    use super::{router, ApiState};

    struct BrokenRenderer;

    impl DocumentRenderer for BrokenRenderer {
        fn render(&self, _html: &str) -> Result<RenderedDocument, HandoffError> {
            Err(HandoffError::Render("renderer offline".to_string()))
        }
    }

    fn app_with(renderer: Arc<dyn DocumentRenderer>) -> Router {
        let state =
            ApiState::new(Arc::new(builtin_catalog().clone()), StudioProfile::default(), renderer)
                .expect("template compiles");
        router(state)
    }

    fn app() -> Router {
        app_with(Arc::new(HtmlRenderer))
    }

    fn full_form() -> Value {
        json!({
            "serviceType": "photography",
            "serviceSubtype": "Event Photography",
            "duration": "Half Day (4 hours)",
            "location": "abu-dhabi",
            "venue": "ballroom",
            "style": "cinematic",
            "deliveryTime": "rush",
            "selectedAddons": ["Second Photographer", "Additional Hours"],
            "additionalHoursCount": 2,
            "clientName": "Layla O'Neil",
            "clientEmail": "layla@example.com",
            "clientPhone": "+971 50 123 4567"
        })
    }

    async fn post_json(uri: &str, body: &Value) -> (StatusCode, Vec<u8>, Option<String>) {
        post_json_to(app(), uri, body).await
    }

    async fn post_json_to(
        app: Router,
        uri: &str,
        body: &Value,
    ) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        (status, bytes.to_vec(), disposition)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn catalog_routes_list_services_and_reject_unknown_ids() {
        let (status, body) = get_json("/api/catalog").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(5));

        let (status, body) = get_json("/api/catalog/360tours").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service_type"], "360tours");

        let (status, _) = get_json("/api/catalog/drones").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn view_stops_on_first_incomplete_step() {
        let mut form = full_form();
        form["venue"] = Value::Null;

        let (status, bytes, _) = post_json("/api/quote/view", &form).await;
        let view: Value = serde_json::from_slice(&bytes).expect("json view");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["currentStep"], 2);
        assert_eq!(view["maxAccessibleStep"], 2);
        assert_eq!(view["errorFields"], json!(["venue"]));
        assert_eq!(view["steps"][1]["active"], true);
    }

    #[tokio::test]
    async fn view_jumps_back_to_a_requested_step() {
        let mut form = full_form();
        form["step"] = json!(1);

        let (status, bytes, _) = post_json("/api/quote/view", &form).await;
        let view: Value = serde_json::from_slice(&bytes).expect("json view");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["currentStep"], 1);
        assert_eq!(view["direction"], "backward");
        assert_eq!(view["maxAccessibleStep"], 4);
    }

    #[tokio::test]
    async fn view_refuses_locked_steps() {
        let form = json!({ "serviceType": "videography", "step": 3 });

        let (status, _, _) = post_json("/api/quote/view", &form).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn submit_returns_pricing_and_mailto_link() {
        let (status, bytes, _) = post_json("/api/quote/submit", &full_form()).await;
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "submitted");
        assert_eq!(body["notice"], "mailPrepared");
        assert!(body["reference"].as_str().is_some_and(|r| r.starts_with("WRH-")));
        assert!(body["mailto"].as_str().is_some_and(|m| m.starts_with("mailto:hi@wrh.ae?")));
        assert!(body["draft"]["body"]
            .as_str()
            .is_some_and(|text| text.contains("ESTIMATED TOTAL: AED 3,250 - 6,250")));
    }

    #[tokio::test]
    async fn submit_without_contact_details_is_unprocessable() {
        let mut form = full_form();
        form["clientEmail"] = json!("layla-at-example");

        let (status, bytes, _) = post_json("/api/quote/submit", &form).await;
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "incomplete");
        assert_eq!(body["step"], 4);
        assert_eq!(body["missingFields"], json!(["clientEmail"]));
        assert_eq!(body["message"], "Please fill in all required fields in the final step.");
    }

    #[tokio::test]
    async fn document_downloads_as_attachment() {
        let (status, bytes, disposition) = post_json("/api/quote/document", &full_form()).await;

        assert_eq!(status, StatusCode::OK);
        let disposition = disposition.expect("content disposition header");
        assert!(disposition.starts_with("attachment; filename=\"Quote_WRH-"));
        assert!(disposition.ends_with("_Layla_O_Neil.html\""));
        let html = String::from_utf8(bytes).expect("html body");
        assert!(html.contains("3,250 - 6,250"));
    }

    #[tokio::test]
    async fn document_for_incomplete_form_is_unprocessable() {
        let form = json!({ "serviceType": "photography" });

        let (status, bytes, _) = post_json("/api/quote/document", &form).await;
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["step"], 1);
        assert_eq!(body["missingFields"], json!(["serviceSubtype", "duration"]));
        assert_eq!(body["message"], "Please complete the Service step first.");
    }

    #[tokio::test]
    async fn failed_rendering_is_service_unavailable_with_correlation_id() {
        let app = app_with(Arc::new(BrokenRenderer));

        let (status, bytes, disposition) =
            post_json_to(app, "/api/quote/document", &full_form()).await;
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(disposition.is_none());
        assert_eq!(body["error"], "We could not prepare your quote right now. Please try again.");
        assert!(body["correlationId"].as_str().is_some_and(|id| !id.is_empty()));
    }
}
