//! Console Channel
//!
//! Local stand-in for a chat: every update is echoed to stderr as it
//! happens, and [`ConsoleChannel::finish`] writes whatever is left in the
//! "chat" (the final artifact) to stdout.

use super::{ChannelResult, ReportChannel};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Text(String),
    Document { url: String, caption: String },
}

#[derive(Default)]
pub struct ConsoleChannel {
    next_id: AtomicU64,
    messages: Mutex<Vec<(String, Entry)>>,
    quiet: bool,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not echo progress to stderr
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    fn next_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn echo(&self, text: &str) {
        if !self.quiet {
            eprintln!("{text}");
        }
    }

    /// Current contents of the conversation, oldest first.
    pub fn contents(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|(_, entry)| match entry {
                Entry::Text(text) => text.clone(),
                Entry::Document { url, caption } => format!("{url}\n{caption}"),
            })
            .collect()
    }

    /// Write the conversation to `out`.
    pub fn finish(&self, out: &mut impl Write) -> std::io::Result<()> {
        for message in self.contents() {
            writeln!(out, "{message}")?;
        }
        out.flush()
    }
}

#[async_trait]
impl ReportChannel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_message(&self, text: &str) -> ChannelResult<String> {
        let id = self.next_id();
        self.echo(text);
        self.messages
            .lock()
            .push((id.clone(), Entry::Text(text.to_string())));
        Ok(id)
    }

    async fn edit_message(&self, id: &str, text: &str) -> ChannelResult<()> {
        self.echo(text);
        let mut messages = self.messages.lock();
        match messages.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, entry)) => *entry = Entry::Text(text.to_string()),
            None => messages.push((id.to_string(), Entry::Text(text.to_string()))),
        }
        Ok(())
    }

    async fn delete_message(&self, id: &str) -> ChannelResult<()> {
        self.messages.lock().retain(|(existing, _)| existing != id);
        Ok(())
    }

    async fn send_document(&self, url: &str, caption: &str) -> ChannelResult<String> {
        let id = self.next_id();
        self.echo(url);
        self.messages.lock().push((
            id.clone(),
            Entry::Document {
                url: url.to_string(),
                caption: caption.to_string(),
            },
        ));
        Ok(id)
    }
}
