//! Engine backed by the `mediainfo` command-line tool.
//!
//! Fed chunks are spooled into a temporary file at the current read
//! position; `finalize` runs the tool over the spool. The tool reads the
//! file itself, so this engine never asks for a seek. When only the start
//! of the file was spooled, the structured output's `FileSize` is replaced
//! with the size the engine was opened with.

use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;
use tempfile::NamedTempFile;

use super::{EngineError, EngineFactory, EngineStatus, MediaEngine, OutputMode};

/// Default name of the tool on `PATH`.
pub const DEFAULT_MEDIAINFO_BINARY: &str = "mediainfo";

/// One `mediainfo` run per pass over a spooled copy of the window.
pub struct MediaInfoCliEngine {
    binary: PathBuf,
    mode: OutputMode,
    file_size: u64,
    position: u64,
    /// Furthest byte written to the spool.
    spooled: u64,
    spool: Option<NamedTempFile>,
    output: Option<String>,
}

impl MediaInfoCliEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            mode: OutputMode::Json,
            file_size: 0,
            position: 0,
            spooled: 0,
            spool: None,
            output: None,
        }
    }

    fn spool_mut(&mut self) -> Result<&mut NamedTempFile, EngineError> {
        self.spool
            .as_mut()
            .ok_or_else(|| EngineError::Failed("no pass is open".to_string()))
    }
}

impl MediaEngine for MediaInfoCliEngine {
    fn set_output(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn open(&mut self, file_size: u64) -> Result<(), EngineError> {
        if self.spool.is_some() {
            return Err(EngineError::Busy);
        }
        let spool = tempfile::Builder::new()
            .prefix("mediareport-")
            .tempfile()
            .map_err(|e| EngineError::Failed(format!("failed to create spool file: {e}")))?;
        self.spool = Some(spool);
        self.file_size = file_size;
        self.position = 0;
        self.spooled = 0;
        self.output = None;
        Ok(())
    }

    fn feed(&mut self, chunk: &[u8]) -> Result<EngineStatus, EngineError> {
        let position = self.position;
        let file = self.spool_mut()?.as_file_mut();
        file.seek(SeekFrom::Start(position))
            .and_then(|_| file.write_all(chunk))
            .map_err(|e| EngineError::Failed(format!("failed to spool chunk: {e}")))?;

        self.position += chunk.len() as u64;
        self.spooled = self.spooled.max(self.position);
        let mut status = EngineStatus::ACCEPTED;
        if self.position >= self.file_size {
            status = status | EngineStatus::FINALIZED;
        }
        Ok(status)
    }

    fn seek_request(&mut self) -> Option<u64> {
        None
    }

    fn seek(&mut self, offset: u64) -> Result<(), EngineError> {
        self.position = offset;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        let mode = self.mode;
        let spool = self.spool_mut()?;
        spool
            .as_file_mut()
            .flush()
            .map_err(|e| EngineError::Failed(format!("failed to flush spool: {e}")))?;
        let path = spool.path().to_path_buf();

        let mut command = Command::new(&self.binary);
        if mode == OutputMode::Json {
            command.arg("--Output=JSON");
        }
        let output = command.arg(&path).output().map_err(|e| {
            EngineError::Failed(format!("failed to run {}: {e}", self.binary.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        // The spool path means nothing to a reader of the transcript.
        let mut text = text.replace(&path.display().to_string(), "input");
        if mode == OutputMode::Json && self.spooled < self.file_size {
            text = with_file_size(&text, self.file_size);
        }
        self.output = Some(text);
        Ok(())
    }

    fn inform(&self) -> String {
        self.output.clone().unwrap_or_default()
    }

    fn reset(&mut self) {
        // Dropping the NamedTempFile deletes the spool.
        self.spool = None;
        self.position = 0;
        self.spooled = 0;
        self.file_size = 0;
    }

    fn close(&mut self) {
        self.reset();
        self.output = None;
    }
}

/// Set the General track's `FileSize` to `file_size`. Output without a
/// General track, or that is not JSON, is returned unchanged.
fn with_file_size(output: &str, file_size: u64) -> String {
    let Ok(mut root) = serde_json::from_str::<Value>(output) else {
        return output.to_string();
    };

    let tracks: Vec<&mut Value> = match root.pointer_mut("/media/track") {
        Some(Value::Array(tracks)) => tracks.iter_mut().collect(),
        Some(track) => vec![track],
        None => Vec::new(),
    };
    let general = tracks
        .into_iter()
        .find(|track| track.get("@type").and_then(Value::as_str) == Some("General"))
        .and_then(Value::as_object_mut);
    match general {
        Some(fields) => {
            fields.insert("FileSize".to_string(), Value::String(file_size.to_string()));
        }
        None => return output.to_string(),
    }

    serde_json::to_string(&root).unwrap_or_else(|_| output.to_string())
}

/// Creates [`MediaInfoCliEngine`]s after checking the tool runs.
#[derive(Debug, Clone)]
pub struct MediaInfoCliFactory {
    binary: PathBuf,
}

impl MediaInfoCliFactory {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for MediaInfoCliFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIAINFO_BINARY)
    }
}

impl EngineFactory for MediaInfoCliFactory {
    fn create(&self) -> Result<Box<dyn MediaEngine>, EngineError> {
        let probe = Command::new(&self.binary)
            .arg("--Version")
            .output()
            .map_err(|e| {
                EngineError::Unavailable(format!("cannot run {}: {e}", self.binary.display()))
            })?;
        if !probe.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --Version exited with {}",
                self.binary.display(),
                probe.status
            )));
        }
        Ok(Box::new(MediaInfoCliEngine::new(self.binary.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_factory_missing_binary_is_unavailable() {
        let factory = MediaInfoCliFactory::new("/nonexistent/mediainfo-binary");
        assert!(matches!(
            factory.create().err(),
            Some(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn test_second_open_is_busy() {
        let mut engine = MediaInfoCliEngine::new("mediainfo");
        engine.open(10).unwrap();
        assert_eq!(engine.open(10), Err(EngineError::Busy));
        engine.reset();
        assert!(engine.open(10).is_ok());
    }

    #[test]
    fn test_feed_spools_at_position() {
        let mut engine = MediaInfoCliEngine::new("mediainfo");
        engine.open(8).unwrap();
        assert!(!engine.feed(b"abcd").unwrap().is_finalized());
        engine.seek(2).unwrap();
        engine.feed(b"XY").unwrap();
        engine.seek(4).unwrap();
        assert!(engine.feed(b"efgh").unwrap().is_finalized());

        let mut contents = String::new();
        let mut file = engine.spool.as_ref().unwrap().reopen().unwrap();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "abXYefgh");
    }

    #[test]
    fn test_feed_without_open_fails() {
        let mut engine = MediaInfoCliEngine::new("mediainfo");
        assert!(matches!(engine.feed(b"x"), Err(EngineError::Failed(_))));
    }

    #[test]
    fn test_file_size_replaced_in_general_track() {
        let output = r#"{"media":{"track":[
            {"@type":"General","FileSize":"10485760","Format":"Matroska"},
            {"@type":"Video","StreamSize":"10000"}
        ]}}"#;
        let rewritten: Value =
            serde_json::from_str(&with_file_size(output, 5_368_709_120)).unwrap();
        let tracks = rewritten["media"]["track"].as_array().unwrap();
        assert_eq!(tracks[0]["FileSize"], "5368709120");
        assert_eq!(tracks[0]["Format"], "Matroska");
        assert!(tracks[1].get("FileSize").is_none());
    }

    #[test]
    fn test_file_size_single_track_object() {
        let output = r#"{"media":{"track":{"@type":"General"}}}"#;
        let rewritten: Value = serde_json::from_str(&with_file_size(output, 42)).unwrap();
        assert_eq!(rewritten["media"]["track"]["FileSize"], "42");
    }

    #[test]
    fn test_file_size_leaves_unexpected_output() {
        assert_eq!(with_file_size("not json", 42), "not json");
        let no_general = r#"{"media":{"track":[{"@type":"Audio"}]}}"#;
        assert_eq!(with_file_size(no_general, 42), no_general);
    }

    /// Stand-in for the tool that, like the real one, reports the size of
    /// the file it was given.
    #[cfg(unix)]
    fn fake_mediainfo(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("mediainfo");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             if [ \"$1\" = \"--Version\" ]; then echo 'MediaInfo v0'; exit 0; fi\n\
             if [ \"$1\" = \"--Output=JSON\" ]; then\n\
               size=$(wc -c < \"$2\" | tr -d ' ')\n\
               printf '{\"media\":{\"track\":[{\"@type\":\"General\",\"FileSize\":\"%s\"}]}}' \"$size\"\n\
             else\n\
               echo General\n\
             fi\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_partial_window_reports_logical_size() {
        use crate::download::ByteWindow;
        use crate::engine::Analyzer;
        use crate::normalize::normalize;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let factory = MediaInfoCliFactory::new(fake_mediainfo(dir.path()));
        let analyzer = Analyzer::new(Arc::new(factory), 1024);

        let five_gib = 5 * 1024 * 1024 * 1024;
        let window = ByteWindow::new(vec![0u8; 4096], five_gib, "big.mkv".to_string(), 4096);
        let output = analyzer.analyze(window).await.unwrap();

        let report = normalize("big.mkv", &output.tracks);
        assert_eq!(report.general.size, "5 GiB");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_whole_file_keeps_tool_size() {
        use crate::download::ByteWindow;
        use crate::engine::Analyzer;
        use crate::normalize::normalize;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let factory = MediaInfoCliFactory::new(fake_mediainfo(dir.path()));
        let analyzer = Analyzer::new(Arc::new(factory), 1024);

        let window = ByteWindow::new(vec![0u8; 2048], 2048, "small.mkv".to_string(), 4096);
        let output = analyzer.analyze(window).await.unwrap();

        let report = normalize("small.mkv", &output.tracks);
        assert_eq!(report.general.size, "2 KiB");
    }

    #[test]
    fn test_finalize_with_missing_binary_fails() {
        let mut engine = MediaInfoCliEngine::new("/nonexistent/mediainfo-binary");
        engine.open(1).unwrap();
        engine.feed(b"x").unwrap();
        assert!(matches!(engine.finalize(), Err(EngineError::Failed(_))));
        engine.close();
        assert_eq!(engine.inform(), "");
    }
}
