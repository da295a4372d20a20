use std::sync::Arc;

use audio_backend::{AudioBackend, AudioSink, SinkOptions, TrackSource};
use shared::domain::AudioMode;
use storage::Preferences;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Whether `configure` should consult the persisted `isPlaying` flag and
/// resume playback on its own. Tours hold playback for the orchestrator to
/// start once the ride begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePolicy {
    Hold,
    RestorePersisted,
}

struct AudioState {
    sink: Option<Arc<dyn AudioSink>>,
    playing: bool,
}

/// Owns at most one playable audio resource at a time and mirrors the
/// playback state into the preference store.
///
/// Playback failures never escape this type: the observable outcome of a
/// refused or undecodable source is `playing == false`, persisted.
pub struct AudioController {
    backend: Arc<dyn AudioBackend>,
    prefs: Preferences,
    default_track_path: String,
    state: Mutex<AudioState>,
}

impl AudioController {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        prefs: Preferences,
        default_track_path: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            prefs,
            default_track_path: default_track_path.into(),
            state: Mutex::new(AudioState {
                sink: None,
                playing: false,
            }),
        })
    }

    /// Swap the owned resource for the given mode. The previous sink is
    /// released before the next one is acquired, so two resources are never
    /// alive at once. An acquisition failure leaves no resource behind and
    /// the music simply stays off.
    pub async fn configure(&self, mode: AudioMode, resume: ResumePolicy) {
        self.release().await;

        let source = match mode {
            AudioMode::None => return,
            AudioMode::Default => TrackSource::Bundled(self.default_track_path.clone()),
            AudioMode::Custom(handle) => TrackSource::Upload(handle),
        };

        let acquired = self
            .backend
            .acquire(source, SinkOptions { looping: true })
            .await;
        let sink = match acquired {
            Ok(sink) => sink,
            Err(err) => {
                warn!(%err, "audio source unavailable; continuing without music");
                self.persist_playing(false).await;
                return;
            }
        };

        self.state.lock().await.sink = Some(sink);

        if resume == ResumePolicy::RestorePersisted {
            match self.prefs.is_playing().await {
                Ok(true) => {
                    self.play().await;
                }
                Ok(false) => {}
                Err(err) => warn!(%err, "failed to read persisted playback state"),
            }
        }
    }

    /// Attempt playback. A refusal by the output environment reverts the
    /// state to paused and persists that fact; it never propagates. Returns
    /// whether audio is playing afterwards.
    pub async fn play(&self) -> bool {
        let sink = self.state.lock().await.sink.clone();
        let Some(sink) = sink else {
            debug!("play requested with no audio resource configured");
            return false;
        };

        match sink.play().await {
            Ok(()) => {
                self.state.lock().await.playing = true;
                self.persist_playing(true).await;
                true
            }
            Err(err) => {
                warn!(%err, "playback refused; leaving music paused");
                self.state.lock().await.playing = false;
                self.persist_playing(false).await;
                false
            }
        }
    }

    pub async fn pause(&self) {
        let sink = self.state.lock().await.sink.clone();
        let Some(sink) = sink else {
            return;
        };

        sink.pause().await;
        self.state.lock().await.playing = false;
        self.persist_playing(false).await;
    }

    /// Flip between playing and paused, persisting the outcome. Returns
    /// whether audio is playing afterwards.
    pub async fn toggle(&self) -> bool {
        let playing = self.state.lock().await.playing;
        if playing {
            self.pause().await;
            false
        } else {
            self.play().await
        }
    }

    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.playing
    }

    pub async fn has_resource(&self) -> bool {
        self.state.lock().await.sink.is_some()
    }

    /// Stop and free the owned resource, if any.
    pub async fn release(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            state.playing = false;
            state.sink.take()
        };
        if let Some(sink) = previous {
            sink.release().await;
        }
    }

    async fn persist_playing(&self, playing: bool) {
        if let Err(err) = self.prefs.set_is_playing(playing).await {
            warn!(%err, "failed to persist playback state");
        }
    }
}

#[cfg(test)]
#[path = "tests/audio_tests.rs"]
mod tests;
