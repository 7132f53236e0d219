//! Report renderer: the visual HTML document and the plain text fallback.

pub mod escape;
pub mod html;
pub mod text;

pub use escape::escape_html;
pub use html::render_html;
pub use text::{fit_with_link, render_text, DEFAULT_MESSAGE_CAP, TRUNCATION_MARKER};

use crate::normalize::NormalizedReport;

/// Both renderings of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub html: String,
    pub text: String,
}

impl RenderedReport {
    pub fn new(report: &NormalizedReport) -> Self {
        Self {
            html: render_html(report),
            text: render_text(report),
        }
    }
}
