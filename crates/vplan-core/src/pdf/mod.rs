//! PDF export: HTML document assembly and the renderer seam.
//!
//! The HTML-to-PDF converter is an external collaborator. The service
//! builds the document here and hands it to a [`PdfRenderer`]; production
//! uses the `wkhtmltopdf` subprocess, tests inject stubs.

pub mod wkhtmltopdf;

pub use wkhtmltopdf::WkhtmltopdfRenderer;

use anyhow::Result;
use async_trait::async_trait;

use vplan_db::models::HolidayPlan;

/// Adapter interface for HTML-to-PDF conversion.
///
/// # Object Safety
///
/// This trait is object-safe so the server can hold the configured
/// renderer as `Arc<dyn PdfRenderer>`.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Human-readable name for this renderer (e.g. "wkhtmltopdf").
    fn name(&self) -> &str;

    /// Convert a complete HTML document into PDF bytes.
    async fn render(&self, html: &str) -> Result<Vec<u8>>;
}

// Compile-time assertion: PdfRenderer must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PdfRenderer) {}
};

/// Date format used in the rendered document.
const PDF_DATE_FORMAT: &str = "%d/%m/%Y";

/// Build the HTML document for one plan.
///
/// Section order and labels are fixed: the title heading, then
/// "Description:", "Date:" (DD/MM/YYYY), "Location:", and an itemized
/// participant list when the plan has any participants.
pub fn render_plan_html(plan: &HolidayPlan) -> String {
    let mut html = String::new();

    html.push_str("<h1>");
    html.push_str(&escape_html(&plan.title));
    html.push_str("</h1>");

    html.push_str("<p><strong>Description:</strong> ");
    html.push_str(&escape_html(plan.description.as_deref().unwrap_or("")));
    html.push_str("</p>");

    html.push_str("<p><strong>Date:</strong> ");
    html.push_str(&plan.date.format(PDF_DATE_FORMAT).to_string());
    html.push_str("</p>");

    html.push_str("<p><strong>Location:</strong> ");
    html.push_str(&escape_html(&plan.location));
    html.push_str("</p>");

    if !plan.participants.0.is_empty() {
        html.push_str("<p><strong>Participants:</strong></p>");
        html.push_str("<ul>");
        for participant in &plan.participants.0 {
            html.push_str("<li>");
            html.push_str(&escape_html(&participant.name));
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }

    html
}

/// Escape interpolated field values so user text cannot break the markup.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
