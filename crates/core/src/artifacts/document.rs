//! Printable quote document.
//!
//! The HTML comes from an embedded tera template. A [`DocumentRenderer`]
//! then decides the final format: wkhtmltopdf produces a paginated A4 PDF
//! when it is installed, otherwise the HTML itself is the deliverable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::{error, info, warn};

use crate::artifacts::{HandoffError, QuoteSummary};
use crate::cpq::pricing::PricingDetails;
use crate::domain::{format_amount, FormField};

const TEMPLATE_NAME: &str = "quote_document.html";
const DEFAULT_CLIENT_SEGMENT: &str = "Estimate";

pub enum RenderedDocument {
    Pdf(Vec<u8>),
    Html(String),
}

impl RenderedDocument {
    pub fn extension(&self) -> &'static str {
        match self {
            RenderedDocument::Pdf(_) => "pdf",
            RenderedDocument::Html(_) => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RenderedDocument::Pdf(_) => "application/pdf",
            RenderedDocument::Html(_) => "text/html; charset=utf-8",
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RenderedDocument::Pdf(bytes) => bytes,
            RenderedDocument::Html(html) => html.into_bytes(),
        }
    }
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<RenderedDocument, HandoffError>;

    /// Extension of what a successful render normally yields.
    fn output_format(&self) -> &'static str {
        "html"
    }
}

/// Hands the HTML back untouched, for browser printing.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, html: &str) -> Result<RenderedDocument, HandoffError> {
        Ok(RenderedDocument::Html(html.to_string()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct WkhtmltopdfRenderer {
    binary: Option<PathBuf>,
}

impl WkhtmltopdfRenderer {
    /// Looks wkhtmltopdf up on `PATH`.
    pub fn detect() -> Self {
        let binary = which::which("wkhtmltopdf").ok();
        match &binary {
            Some(path) => info!(path = %path.display(), "wkhtmltopdf found"),
            None => warn!("wkhtmltopdf not found in PATH - documents will be rendered as HTML"),
        }
        Self { binary }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self { binary: Some(binary.into()) }
    }

    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn convert(&self, html: &str, binary: &Path) -> Result<Vec<u8>, HandoffError> {
        let temp_dir = std::env::temp_dir();
        let id = uuid::Uuid::new_v4();
        let html_path = temp_dir.join(format!("quote_{id}.html"));
        let pdf_path = temp_dir.join(format!("quote_{id}.pdf"));

        std::fs::write(&html_path, html)
            .map_err(|error| HandoffError::Render(format!("could not stage HTML: {error}")))?;

        let output = Command::new(binary)
            .args(["--page-size", "A4"])
            .args(["--margin-top", "10mm", "--margin-bottom", "10mm"])
            .args(["--margin-left", "10mm", "--margin-right", "10mm"])
            .args(["--encoding", "utf-8", "--quiet"])
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let result = match output {
            Ok(output) if output.status.success() => std::fs::read(&pdf_path)
                .map_err(|error| HandoffError::Render(format!("could not read PDF: {error}"))),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!(stderr = %stderr, "wkhtmltopdf failed");
                Err(HandoffError::Render(stderr.trim().to_string()))
            }
            Err(error) => Err(HandoffError::Render(format!("could not run wkhtmltopdf: {error}"))),
        };

        let _ = std::fs::remove_file(&html_path);
        let _ = std::fs::remove_file(&pdf_path);
        result
    }
}

impl DocumentRenderer for WkhtmltopdfRenderer {
    fn render(&self, html: &str) -> Result<RenderedDocument, HandoffError> {
        let Some(binary) = self.binary.as_deref() else {
            return Ok(RenderedDocument::Html(html.to_string()));
        };
        match self.convert(html, binary) {
            Ok(bytes) => {
                info!(size = bytes.len(), "PDF generated successfully");
                Ok(RenderedDocument::Pdf(bytes))
            }
            Err(error) => {
                warn!(error = %error, "PDF conversion failed, falling back to HTML");
                Ok(RenderedDocument::Html(html.to_string()))
            }
        }
    }

    fn output_format(&self) -> &'static str {
        if self.binary.is_some() {
            "pdf"
        } else {
            "html"
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct DocumentContext<'a> {
    company_name: &'a str,
    contact_email: &'a str,
    currency: &'a str,
    reference: &'a str,
    issued_on: String,
    client: ClientBlock<'a>,
    project: Vec<(&'static str, String)>,
    pricing: &'a PricingDetails,
}

#[derive(Debug, Serialize)]
struct ClientBlock<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    company: Option<&'a str>,
}

#[derive(Clone, Debug)]
pub struct QuoteDocumentGenerator {
    tera: Tera,
}

impl QuoteDocumentGenerator {
    pub fn new() -> Result<Self, HandoffError> {
        let mut tera = Tera::default();
        tera.register_filter("money", money_filter);
        tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../../templates/quote_document.html.tera"),
        )
        .map_err(|error| HandoffError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render_html(&self, summary: &QuoteSummary<'_>) -> Result<String, HandoffError> {
        let form = summary.form;
        let context = DocumentContext {
            company_name: &summary.studio.company_name,
            contact_email: &summary.studio.contact_email,
            currency: &summary.studio.currency,
            reference: &summary.stamp.reference,
            issued_on: summary.stamp.issued_on.format("%B %-d, %Y").to_string(),
            client: ClientBlock {
                name: summary.text_or_placeholder(form.text(FormField::ClientName)),
                email: summary.text_or_placeholder(form.text(FormField::ClientEmail)),
                phone: summary.text_or_placeholder(form.text(FormField::ClientPhone)),
                company: form.text(FormField::Company),
            },
            project: vec![
                ("Service", summary.service_label().to_string()),
                (
                    "Category",
                    summary.text_or_placeholder(form.text(FormField::ServiceSubtype)).to_string(),
                ),
                (
                    "Package",
                    summary.text_or_placeholder(form.text(FormField::Duration)).to_string(),
                ),
                ("Event Date", summary.event_date_label()),
                ("Location", summary.location_label().to_string()),
                ("Venue", summary.venue_label().to_string()),
                ("Style", summary.style_label().to_string()),
                ("Delivery", summary.delivery_label().to_string()),
            ],
            pricing: summary.pricing,
        };
        let context = Context::from_serialize(&context)
            .map_err(|error| HandoffError::Template(error.to_string()))?;
        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| HandoffError::Template(error.to_string()))
    }

    /// Renders the quote and names the file after the format the renderer
    /// actually produced.
    pub fn generate(
        &self,
        summary: &QuoteSummary<'_>,
        renderer: &dyn DocumentRenderer,
    ) -> Result<QuoteDocument, HandoffError> {
        let html = self.render_html(summary)?;
        let rendered = renderer.render(&html)?;
        let filename = document_filename(
            &summary.stamp.reference,
            summary.form.text(FormField::ClientName),
            rendered.extension(),
        );
        Ok(QuoteDocument {
            filename,
            content_type: rendered.content_type(),
            bytes: rendered.into_bytes(),
        })
    }
}

/// `Quote_<reference>_<client>.<ext>` with the client name reduced to
/// ASCII alphanumerics and underscores.
pub fn document_filename(reference: &str, client_name: Option<&str>, extension: &str) -> String {
    let client = client_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            name.chars().map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' }).collect()
        })
        .unwrap_or_else(|| DEFAULT_CLIENT_SEGMENT.to_string());
    format!("Quote_{reference}_{client}.{extension}")
}

/// `amount | money` renders a decimal the way every artifact prints money.
fn money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(raw) => Decimal::from_str(raw)
            .map_err(|error| tera::Error::msg(format!("money filter: `{raw}`: {error}")))?,
        tera::Value::Number(number) => Decimal::from_str(&number.to_string())
            .map_err(|error| tera::Error::msg(format!("money filter: {error}")))?,
        tera::Value::Null => Decimal::ZERO,
        other => {
            return Err(tera::Error::msg(format!("money filter expects a number, got {other}")))
        }
    };
    Ok(tera::Value::String(format_amount(amount)))
}
