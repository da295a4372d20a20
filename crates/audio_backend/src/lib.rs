use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::TrackHandle;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackSource {
    /// The track bundled with the site, addressed by asset path.
    Bundled(String),
    /// A user-supplied upload, held in memory only.
    Upload(TrackHandle),
}

impl TrackSource {
    pub fn describe(&self) -> String {
        match self {
            TrackSource::Bundled(path) => format!("bundled:{path}"),
            TrackSource::Upload(handle) => format!("upload:{}", handle.filename()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkOptions {
    pub looping: bool,
}

#[derive(Debug, Error)]
pub enum AudioBackendError {
    #[error("playback refused by the output environment: {0}")]
    PlaybackBlocked(String),
    #[error("audio source could not be decoded: {0}")]
    Undecodable(String),
    #[error("audio backend unavailable: {0}")]
    Unavailable(String),
}

/// A single playable audio resource.
///
/// `release` stops playback and frees the underlying resource; the sink must
/// not be used afterwards. Acquisition failures must not leave a
/// half-initialized resource behind.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self) -> Result<(), AudioBackendError>;
    async fn pause(&self);
    async fn release(&self);
}

#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn acquire(
        &self,
        source: TrackSource,
        options: SinkOptions,
    ) -> Result<Arc<dyn AudioSink>, AudioBackendError>;
}

/// Placeholder backend for embeddings without audio output wired up.
pub struct MissingAudioBackend;

#[async_trait]
impl AudioBackend for MissingAudioBackend {
    async fn acquire(
        &self,
        source: TrackSource,
        _options: SinkOptions,
    ) -> Result<Arc<dyn AudioSink>, AudioBackendError> {
        Err(AudioBackendError::Unavailable(format!(
            "no audio backend available for {}",
            source.describe()
        )))
    }
}
