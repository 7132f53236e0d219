//! Distribution fan-out.
//!
//! Publishes the visual document through the optional image service and the
//! raw transcript through the paste chain. Neither path can fail the run:
//! failures are logged and reflected in [`DeliveryArtifacts`].

pub mod image;
pub mod paste;

pub use image::{ImageError, ImageRenderer, DEFAULT_IMAGE_ENDPOINT};
pub use paste::{
    KeyResponseProvider, PasteBody, PasteChain, PasteEndpoints, PasteError, PasteProvider,
    UrlResponseProvider,
};

use crate::render::RenderedReport;

/// What the distribution step produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryArtifacts {
    pub visual_url: Option<String>,
    pub text_report_url: Option<String>,
    /// Set whenever there is no visual URL.
    pub styled_text_fallback: Option<String>,
}

impl DeliveryArtifacts {
    /// Every distribution path failed.
    pub fn is_degraded(&self) -> bool {
        self.visual_url.is_none() && self.text_report_url.is_none()
    }
}

pub struct Distributor {
    image: ImageRenderer,
    paste: PasteChain,
}

impl Distributor {
    pub fn new(image: ImageRenderer, paste: PasteChain) -> Self {
        Self { image, paste }
    }

    /// Run the image path, then the paste chain, and collect whatever
    /// succeeded.
    pub async fn distribute(
        &self,
        rendered: &RenderedReport,
        transcript: &str,
    ) -> DeliveryArtifacts {
        let visual = self.image.render(&rendered.html).await;
        let text_report = self.paste.upload(transcript).await;

        let visual_url = match visual {
            Ok(url) => Some(url),
            Err(ImageError::NotConfigured) => {
                tracing::debug!("Image service not configured, using text report");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Visual report failed, using text report");
                None
            }
        };

        let text_report_url = match text_report {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(error = %e, "Transcript could not be published");
                None
            }
        };

        let styled_text_fallback = visual_url.is_none().then(|| rendered.text.clone());

        DeliveryArtifacts {
            visual_url,
            text_report_url,
            styled_text_fallback,
        }
    }
}
