//! Engine driver.
//!
//! [`EngineInstance`] owns one engine and runs the two-pass protocol over a
//! [`ChunkReader`]: a structured pass for the typed tracks, then a reset and
//! a text pass over the identical bytes for the transcript. The engine is
//! closed when the instance is dropped, so every exit path releases it.
//! [`Analyzer`] creates a fresh instance per request and runs it on the
//! blocking pool.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::taxonomy::{parse_tracks, RawTrack};
use super::{EngineError, EngineFactory, MediaEngine, OutputMode};
use crate::download::ByteWindow;

/// Errors that can occur while analyzing a byte window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Another analysis is running on the same engine instance.
    #[error("analysis engine is busy")]
    Busy,

    #[error("analysis engine unavailable: {0}")]
    Unavailable(String),

    #[error("analysis failed: {0}")]
    Failed(String),

    #[error("invalid engine output: {0}")]
    InvalidOutput(String),
}

impl From<EngineError> for AnalysisError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Busy => Self::Busy,
            EngineError::Unavailable(msg) => Self::Unavailable(msg),
            EngineError::Failed(msg) => Self::Failed(msg),
        }
    }
}

/// Typed tracks plus the human-readable transcript of one window.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub tracks: Vec<RawTrack>,
    pub transcript: String,
}

/// Random access to the bytes being analyzed.
pub trait ChunkReader {
    /// Logical size reported to the engine.
    fn size(&self) -> u64;

    /// Up to `len` bytes starting at `offset`; empty past the available data.
    fn read_chunk(&self, offset: u64, len: usize) -> &[u8];
}

impl ChunkReader for ByteWindow {
    fn size(&self) -> u64 {
        self.logical_size
    }

    fn read_chunk(&self, offset: u64, len: usize) -> &[u8] {
        let Ok(start) = usize::try_from(offset) else {
            return &[];
        };
        if start >= self.bytes.len() {
            return &[];
        }
        let end = start.saturating_add(len).min(self.bytes.len());
        &self.bytes[start..end]
    }
}

/// One engine, exclusively owned for the duration of an analysis.
pub struct EngineInstance {
    engine: Mutex<Box<dyn MediaEngine>>,
    chunk_size: usize,
}

impl EngineInstance {
    pub fn new(engine: Box<dyn MediaEngine>, chunk_size: usize) -> Self {
        Self {
            engine: Mutex::new(engine),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Run both passes over `reader`.
    ///
    /// A call made while another is in flight on the same instance returns
    /// [`AnalysisError::Busy`] instead of waiting.
    pub fn analyze(&self, reader: &dyn ChunkReader) -> Result<AnalysisOutput, AnalysisError> {
        let mut engine = self.engine.try_lock().ok_or(AnalysisError::Busy)?;

        let structured = run_pass(&mut **engine, reader, OutputMode::Json, self.chunk_size)?;
        let tracks = parse_tracks(&structured)?;

        engine.reset();
        let transcript = run_pass(&mut **engine, reader, OutputMode::Text, self.chunk_size)?;
        engine.reset();

        Ok(AnalysisOutput { tracks, transcript })
    }
}

impl Drop for EngineInstance {
    fn drop(&mut self) {
        self.engine.get_mut().close();
    }
}

/// Feed one pass, following any seeks the engine asks for.
fn run_pass(
    engine: &mut dyn MediaEngine,
    reader: &dyn ChunkReader,
    mode: OutputMode,
    chunk_size: usize,
) -> Result<String, AnalysisError> {
    engine.set_output(mode);
    engine.open(reader.size())?;

    // Engines may bounce between offsets; bound the total number of feeds.
    let max_feeds = 64 + 4 * (reader.size() / chunk_size as u64 + 1);
    let mut offset = 0u64;
    let mut feeds = 0u64;

    loop {
        let chunk = reader.read_chunk(offset, chunk_size);
        if chunk.is_empty() {
            tracing::debug!(offset, "no more data in window");
            break;
        }

        let status = engine.feed(chunk)?;
        feeds += 1;
        if status.is_finalized() {
            break;
        }
        if feeds >= max_feeds {
            tracing::warn!(feeds, offset, "engine did not settle, finalizing early");
            break;
        }

        match engine.seek_request() {
            Some(target) => {
                tracing::trace!(from = offset, to = target, "engine requested seek");
                engine.seek(target)?;
                offset = target;
            }
            None => offset += chunk.len() as u64,
        }
    }

    engine.finalize()?;
    Ok(engine.inform())
}

/// Creates a fresh engine per request and runs the analysis off the async
/// runtime.
#[derive(Clone)]
pub struct Analyzer {
    factory: Arc<dyn EngineFactory>,
    chunk_size: usize,
}

impl Analyzer {
    pub fn new(factory: Arc<dyn EngineFactory>, chunk_size: usize) -> Self {
        Self {
            factory,
            chunk_size,
        }
    }

    /// Analyze a window. The window and the engine are both released before
    /// this returns, on success or failure.
    pub async fn analyze(&self, window: ByteWindow) -> Result<AnalysisOutput, AnalysisError> {
        let factory = Arc::clone(&self.factory);
        let chunk_size = self.chunk_size;

        tokio::task::spawn_blocking(move || {
            let engine = factory.create().map_err(|e| match e {
                EngineError::Unavailable(msg) | EngineError::Failed(msg) => {
                    AnalysisError::Unavailable(msg)
                }
                EngineError::Busy => AnalysisError::Busy,
            })?;
            let instance = EngineInstance::new(engine, chunk_size);
            instance.analyze(&window)
        })
        .await
        .map_err(|e| AnalysisError::Failed(format!("analysis task panicked: {e}")))?
    }
}
