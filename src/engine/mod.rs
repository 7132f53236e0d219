//! Analysis engine adapter
//!
//! The media-analysis engine is an opaque component that parses container
//! metadata from a byte stream. It is only ever reached through the
//! [`MediaEngine`] trait and driven by [`session`], which feeds it fixed-size
//! chunks, honors the seeks it requests, and runs a second text-mode pass to
//! produce a human-readable transcript.
//!
//! - [`taxonomy`]: typed [`RawTrack`]s from the engine's structured output
//! - [`mediainfo`]: engine backed by the `mediainfo` command-line tool

pub mod mediainfo;
pub mod session;
pub mod taxonomy;

use thiserror::Error;

pub use mediainfo::{MediaInfoCliEngine, MediaInfoCliFactory};
pub use session::{AnalysisError, AnalysisOutput, Analyzer, ChunkReader, EngineInstance};
pub use taxonomy::{parse_tracks, FieldMap, RawTrack, FLOAT_FIELDS, INT_FIELDS};

/// Engine feed chunk size (5 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Errors reported by an engine implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A pass is already open on this instance.
    #[error("engine is busy")]
    Busy,

    /// The engine could not be created.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine failed: {0}")]
    Failed(String),
}

/// Output produced by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Machine-readable JSON (`{"media":{"track":[…]}}`).
    Json,
    /// Human-readable text report.
    Text,
}

/// Status bits returned after each fed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStatus(pub u8);

impl EngineStatus {
    pub const ACCEPTED: Self = Self(0x01);
    /// The engine has everything it needs; stop feeding.
    pub const FINALIZED: Self = Self(0x08);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_finalized(self) -> bool {
        self.contains(Self::FINALIZED)
    }
}

impl std::ops::BitOr for EngineStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Low-level chunk protocol of the analysis engine.
///
/// A pass is `open` → (`feed` → optional `seek_request`/`seek`)* →
/// `finalize` → `inform`. `reset` discards the pass so the same instance can
/// run again; `close` releases the instance for good.
pub trait MediaEngine: Send {
    /// Select the output of the next pass.
    fn set_output(&mut self, mode: OutputMode);

    /// Start a pass over a file of `file_size` bytes.
    ///
    /// Returns [`EngineError::Busy`] if a pass is already open.
    fn open(&mut self, file_size: u64) -> Result<(), EngineError>;

    /// Consume the bytes at the current read position.
    fn feed(&mut self, chunk: &[u8]) -> Result<EngineStatus, EngineError>;

    /// Offset the engine wants to read next, if not the following byte.
    fn seek_request(&mut self) -> Option<u64>;

    /// Move the read position to `offset` ahead of the next `feed`.
    fn seek(&mut self, offset: u64) -> Result<(), EngineError>;

    /// Finish the pass; output is available afterwards.
    fn finalize(&mut self) -> Result<(), EngineError>;

    /// Output of the last finalized pass.
    fn inform(&self) -> String;

    fn reset(&mut self);

    fn close(&mut self);
}

/// Creates fresh engine instances, one per request.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn MediaEngine>, EngineError>;
}
