//! Pipeline orchestrator.
//!
//! Runs one reference through resolve → download → analyze → normalize →
//! render → distribute → deliver. The user sees a single progress message
//! that is edited in place and finally replaced by the report; every
//! terminal error becomes one of the [`FailureKind`] messages while the
//! detail goes to the log.

pub mod stage;

pub use stage::{DeliveryKind, FailureKind, PipelineFailure, PipelineOutcome, Stage};

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::channels::ReportChannel;
use crate::config::{Config, ConfigError};
use crate::distribute::{DeliveryArtifacts, Distributor, ImageRenderer, PasteChain};
use crate::download::{DownloadError, GoogleDriveBackend, OAuthTokenCache, PartialDownloader};
use crate::engine::{AnalysisError, Analyzer, MediaInfoCliFactory};
use crate::normalize::{normalize, NormalizedReport};
use crate::render::{fit_with_link, RenderedReport, DEFAULT_MESSAGE_CAP};
use crate::source::SourceResolver;

/// Appended when neither the image nor the transcript could be published.
pub const DEGRADED_WARNING: &str =
    "⚠️ Report services are unavailable right now, so only this summary could be sent.";

/// Everything one run needs. Shared read-only between runs.
pub struct Pipeline {
    resolver: SourceResolver,
    downloader: PartialDownloader,
    analyzer: Analyzer,
    distributor: Distributor,
    message_cap: usize,
}

impl Pipeline {
    pub fn new(
        resolver: SourceResolver,
        downloader: PartialDownloader,
        analyzer: Analyzer,
        distributor: Distributor,
    ) -> Self {
        Self {
            resolver,
            downloader,
            analyzer,
            distributor,
            message_cap: DEFAULT_MESSAGE_CAP,
        }
    }

    pub fn with_message_cap(mut self, cap: usize) -> Self {
        self.message_cap = cap;
        self
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("mediareport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        let resolver = SourceResolver::new(config.drive.domains.iter().cloned());

        let mut downloader = PartialDownloader::new(client.clone(), config.max_download_bytes);
        match config.drive.credentials() {
            Some((client_id, client_secret, refresh_token)) => {
                let tokens = OAuthTokenCache::new(
                    client.clone(),
                    client_id.to_string(),
                    client_secret.to_string(),
                    refresh_token.to_string(),
                )
                .with_token_url(config.drive.token_url.clone());
                let backend = GoogleDriveBackend::new(client.clone(), Arc::new(tokens))
                    .with_api_base(config.drive.api_base.clone());
                downloader = downloader.with_storage(Arc::new(backend));
            }
            None => tracing::debug!("Drive credentials not configured; drive references will fail"),
        }

        let analyzer = Analyzer::new(
            Arc::new(MediaInfoCliFactory::new(&config.mediainfo.binary)),
            config.engine_chunk_size,
        );

        let image = ImageRenderer::new(
            client.clone(),
            config.image_service.user_id.clone(),
            config.image_service.api_key.clone(),
        )
        .with_endpoint(config.image_service.endpoint.clone());
        let paste = PasteChain::from_endpoints(client, &config.paste);

        Ok(Self::new(resolver, downloader, analyzer, Distributor::new(image, paste))
            .with_message_cap(config.message_length_cap))
    }

    /// Run one reference to completion, reporting through `channel`.
    pub async fn analyze(
        &self,
        raw_reference: &str,
        channel: &dyn ReportChannel,
    ) -> PipelineOutcome {
        let span = tracing::info_span!("pipeline", reference = %raw_reference.trim());
        async {
            let mut run = Run::new(channel);
            let outcome = self.run(raw_reference, &mut run).await;
            match &outcome {
                PipelineOutcome::Delivered { kind, degraded, .. } => {
                    tracing::info!(?kind, degraded, "Pipeline done");
                }
                PipelineOutcome::Failed(failure) => {
                    tracing::info!(stage = %failure.stage, kind = ?failure.kind, "Pipeline failed");
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, raw_reference: &str, run: &mut Run<'_>) -> PipelineOutcome {
        run.enter(Stage::Resolving).await;
        let source = match self.resolver.resolve(raw_reference) {
            Ok(source) => source,
            Err(e) => return run.fail(FailureKind::InvalidReference, e).await,
        };
        tracing::info!(source = %source, kind = source.kind(), "Reference resolved");

        run.enter(Stage::Downloading).await;
        let window = match self.downloader.download(&source).await {
            Ok(window) => window,
            Err(e @ DownloadError::SourceUnavailable(_)) => {
                return run.fail(FailureKind::SourceUnavailable, e).await
            }
            Err(e) => return run.fail(FailureKind::DownloadFailed, e).await,
        };
        let filename = window.filename.clone();

        run.enter(Stage::Analyzing).await;
        let analysis = match self.analyzer.analyze(window).await {
            Ok(output) => output,
            Err(e @ AnalysisError::Busy) => {
                tracing::warn!("Engine instance busy");
                return run.fail(FailureKind::AnalysisFailed, e).await;
            }
            Err(e) => return run.fail(FailureKind::AnalysisFailed, e).await,
        };

        run.enter(Stage::Normalizing).await;
        let report = normalize(&filename, &analysis.tracks);

        run.enter(Stage::Rendering).await;
        let rendered = RenderedReport::new(&report);

        run.enter(Stage::Distributing).await;
        let artifacts = self
            .distributor
            .distribute(&rendered, &analysis.transcript)
            .await;
        if artifacts.is_degraded() {
            tracing::warn!("Every distribution path failed; delivering degraded report");
        }

        run.enter(Stage::Delivering).await;
        match self.deliver(run, &report, &rendered, &artifacts).await {
            Ok(kind) => {
                run.enter(Stage::Done).await;
                let degraded = artifacts.is_degraded();
                PipelineOutcome::Delivered {
                    kind,
                    text_report_url: artifacts.text_report_url,
                    degraded,
                }
            }
            Err(e) => run.fail(FailureKind::DeliveryFailed, e).await,
        }
    }

    /// Replace the progress message with the final artifact: the image when
    /// one was rendered, the text report otherwise.
    async fn deliver(
        &self,
        run: &mut Run<'_>,
        report: &NormalizedReport,
        rendered: &RenderedReport,
        artifacts: &DeliveryArtifacts,
    ) -> Result<DeliveryKind, crate::channels::ChannelError> {
        let link_line = artifacts
            .text_report_url
            .as_ref()
            .map(|url| format!("📄 Full report: {url}"));

        if let Some(visual_url) = &artifacts.visual_url {
            let caption = match &link_line {
                Some(link) => format!("🎬 {}\n{link}", report.filename),
                None => format!("🎬 {}", report.filename),
            };
            match run.channel.send_document(visual_url, &caption).await {
                Ok(_) => {
                    run.remove_progress().await;
                    return Ok(DeliveryKind::Visual);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Sending the rendered image failed, sending text");
                }
            }
        }

        let body = artifacts
            .styled_text_fallback
            .as_deref()
            .unwrap_or(&rendered.text);
        let tail = match link_line {
            Some(link) => Some(link),
            None if artifacts.is_degraded() => Some(DEGRADED_WARNING.to_string()),
            None => None,
        };
        let message = fit_with_link(body, tail.as_deref(), self.message_cap);
        run.replace_progress(&message).await?;
        Ok(DeliveryKind::Text)
    }
}

/// Per-run state: current stage and the progress message id.
struct Run<'a> {
    channel: &'a dyn ReportChannel,
    stage: Stage,
    progress_id: Option<String>,
}

impl<'a> Run<'a> {
    fn new(channel: &'a dyn ReportChannel) -> Self {
        Self {
            channel,
            stage: Stage::Resolving,
            progress_id: None,
        }
    }

    async fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::debug!(stage = %stage, "Entering stage");
        if let Some(text) = stage.progress_text() {
            self.show_progress(text).await;
        }
    }

    /// Best effort: a channel hiccup must not fail the run.
    async fn show_progress(&mut self, text: &str) {
        match &self.progress_id {
            Some(id) => {
                if let Err(e) = self.channel.edit_message(id, text).await {
                    tracing::warn!(
                        channel = self.channel.name(),
                        error = %e,
                        "Progress update failed"
                    );
                }
            }
            None => match self.channel.send_message(text).await {
                Ok(id) => self.progress_id = Some(id),
                Err(e) => {
                    tracing::warn!(
                        channel = self.channel.name(),
                        error = %e,
                        "Progress message failed"
                    );
                }
            },
        }
    }

    /// Put `text` where the progress message is, or send it fresh.
    async fn replace_progress(&mut self, text: &str) -> Result<(), crate::channels::ChannelError> {
        if let Some(id) = &self.progress_id {
            match self.channel.edit_message(id, text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Editing progress message failed, sending new one")
                }
            }
        }
        self.channel.send_message(text).await.map(|_| ())
    }

    async fn remove_progress(&mut self) {
        if let Some(id) = self.progress_id.take() {
            if let Err(e) = self.channel.delete_message(&id).await {
                tracing::debug!(error = %e, "Progress message not removed");
            }
        }
    }

    async fn fail(&mut self, kind: FailureKind, detail: impl Display) -> PipelineOutcome {
        tracing::error!(stage = %self.stage, error = %detail, "Stage failed");
        let failure = PipelineFailure::new(self.stage, kind);
        if let Err(e) = self.replace_progress(&failure.message).await {
            tracing::warn!(error = %e, "Could not tell the user about the failure");
        }
        self.stage = Stage::Failed;
        PipelineOutcome::Failed(failure)
    }
}
