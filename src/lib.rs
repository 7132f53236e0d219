//! mediareport library
//!
//! Turns a cloud-storage reference or a direct link into a technical report
//! of the file's container, video, audio and subtitle tracks. Only a bounded
//! window at the start of the file is downloaded; an analysis engine reads
//! it, the result is normalized and rendered, and the report is published
//! through an image service and a chain of paste hosts before being
//! delivered over a messaging channel.

pub mod channels;
pub mod cli;
pub mod config;
pub mod distribute;
pub mod download;
pub mod engine;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod source;
