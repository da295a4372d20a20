use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::{AudioMode, MusicModeTag, SectionId, TourPhase};
use storage::Preferences;
use timeline::{total_scroll_distance, SectionRegistry};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

mod audio;
pub mod tween;

pub use crate::audio::{AudioController, ResumePolicy};

use crate::tween::{Easing, Tween};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The scrollable page the tour drives: the browser window in the real
/// embedding, a simulation in the kiosk, a recording double in tests.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    fn viewport_height_px(&self) -> f64;
    async fn current_offset_px(&self) -> f64;
    async fn scroll_to(&self, offset_px: f64);
}

#[derive(Debug, Clone)]
pub enum TourEvent {
    PhaseChanged(TourPhase),
    SectionEntered(SectionId),
    Progress { offset_px: f64, target_px: f64 },
    CompletedNaturally,
    Stopped,
}

/// Timing and pacing knobs. The defaults are the archive page's hand-tuned
/// values; none of them are derived from page content at runtime.
#[derive(Debug, Clone)]
pub struct TourTuning {
    pub scroll_top_duration: Duration,
    pub settle_delay: Duration,
    pub tour_duration: Duration,
    pub slack_viewports: f64,
    pub tick: Duration,
}

impl Default for TourTuning {
    fn default() -> Self {
        Self {
            scroll_top_duration: Duration::from_secs(1),
            settle_delay: Duration::from_secs(3),
            tour_duration: Duration::from_secs(360),
            slack_viewports: timeline::DEFAULT_SLACK_VIEWPORTS,
            tick: Duration::from_millis(50),
        }
    }
}

/// What the persisted flags said at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Fresh,
    Resumed { music: MusicModeTag },
}

struct TourState {
    phase: TourPhase,
    /// Bumped on every start and stop; continuations scheduled under an
    /// older epoch are dropped when they land.
    epoch: u64,
}

struct ActiveTourTask {
    handle: JoinHandle<()>,
}

/// The tour state machine: `Idle -> Starting -> Running -> Idle`, with
/// `stop()` cancelling from any active phase.
///
/// One instance per process. UI bindings observe it through
/// `subscribe_events`; everything else goes through `start`/`stop`.
pub struct TourOrchestrator {
    registry: SectionRegistry,
    surface: Arc<dyn ScrollSurface>,
    audio: Arc<AudioController>,
    prefs: Preferences,
    tuning: TourTuning,
    state: Mutex<TourState>,
    task: Mutex<Option<ActiveTourTask>>,
    events: broadcast::Sender<TourEvent>,
}

impl TourOrchestrator {
    pub fn new(
        registry: SectionRegistry,
        surface: Arc<dyn ScrollSurface>,
        audio: Arc<AudioController>,
        prefs: Preferences,
        tuning: TourTuning,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            registry,
            surface,
            audio,
            prefs,
            tuning,
            state: Mutex::new(TourState {
                phase: TourPhase::Idle,
                epoch: 0,
            }),
            task: Mutex::new(None),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TourEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> TourPhase {
        self.state.lock().await.phase
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn audio(&self) -> &Arc<AudioController> {
        &self.audio
    }

    /// Consult the persisted flags once at startup and resume an
    /// interrupted tour if one was active when the process last stopped.
    ///
    /// An uploaded track does not survive a reload, so a persisted `custom`
    /// selection resumes the scroll without audio.
    pub async fn restore(self: &Arc<Self>) -> Result<RestoreOutcome> {
        if !self.prefs.tour_active().await? {
            return Ok(RestoreOutcome::Fresh);
        }

        let music = self.prefs.music_mode().await?;
        let mode = match music {
            MusicModeTag::None => AudioMode::None,
            MusicModeTag::Default => AudioMode::Default,
            MusicModeTag::Custom => {
                warn!("persisted custom track cannot be restored; resuming tour without audio");
                AudioMode::None
            }
        };

        info!(music = %music, "resuming interrupted tour");
        self.start(mode).await?;
        Ok(RestoreOutcome::Resumed { music })
    }

    /// Begin a tour: persist the selection, hand the mode to the audio
    /// controller, then scroll to the top and ride down the whole archive.
    /// A no-op while a tour is already in flight.
    pub async fn start(self: &Arc<Self>, mode: AudioMode) -> Result<()> {
        let epoch = {
            let mut state = self.state.lock().await;
            if state.phase != TourPhase::Idle {
                debug!(phase = ?state.phase, "tour start ignored; already active");
                return Ok(());
            }
            state.phase = TourPhase::Starting;
            state.epoch += 1;
            state.epoch
        };
        self.notify(TourEvent::PhaseChanged(TourPhase::Starting));

        if let Err(err) = self.persist_selection(&mode).await {
            self.state.lock().await.phase = TourPhase::Idle;
            self.notify(TourEvent::PhaseChanged(TourPhase::Idle));
            return Err(err);
        }

        // The sink must be fully configured before the tour task may play it.
        self.audio.configure(mode, ResumePolicy::Hold).await;

        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            orchestrator.run_tour(epoch).await;
        });

        if let Some(stale) = self.task.lock().await.replace(ActiveTourTask { handle }) {
            stale.handle.abort();
        }

        Ok(())
    }

    /// Cancel whichever tour step is in flight. The scroll position stays
    /// wherever it was and the music keeps its state. A no-op when idle.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.phase == TourPhase::Idle {
                debug!("tour stop ignored; no tour in flight");
                return Ok(());
            }
            state.phase = TourPhase::Stopping;
            state.epoch += 1;
        }
        self.notify(TourEvent::PhaseChanged(TourPhase::Stopping));

        if let Some(active) = self.task.lock().await.take() {
            active.handle.abort();
        }

        self.prefs
            .set_tour_active(false)
            .await
            .context("failed to persist tour deactivation")?;

        self.state.lock().await.phase = TourPhase::Idle;
        self.notify(TourEvent::PhaseChanged(TourPhase::Idle));
        self.notify(TourEvent::Stopped);
        Ok(())
    }

    async fn run_tour(self: Arc<Self>, epoch: u64) {
        let from = self.surface.current_offset_px().await;
        let top = Tween::new(from, 0.0, self.tuning.scroll_top_duration, Easing::QuadInOut);
        self.drive_tween(&top, None).await;

        // Let layout settle at the top before the long ride starts.
        tokio::time::sleep(self.tuning.settle_delay).await;

        if !self.try_enter_running(epoch).await {
            return;
        }

        let viewport = self.surface.viewport_height_px();
        let target =
            match total_scroll_distance(&self.registry, viewport, self.tuning.slack_viewports) {
                Ok(distance) => distance,
                Err(err) => {
                    error!(%err, "cannot size the tour; abandoning it");
                    self.abandon(epoch).await;
                    return;
                }
            };

        self.audio.play().await;

        let ride = Tween::new(0.0, target, self.tuning.tour_duration, Easing::Linear);
        let sections = self.section_starts_px(viewport);
        self.drive_tween(&ride, Some(sections.as_slice())).await;

        self.finish_naturally(epoch).await;
    }

    async fn drive_tween(&self, tween: &Tween, sections: Option<&[(SectionId, f64)]>) {
        let started = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(self.tuning.tick);
        let mut next_section = 0usize;

        loop {
            ticker.tick().await;
            let elapsed = started.elapsed();
            let offset = tween.sample(elapsed);
            self.surface.scroll_to(offset).await;

            if let Some(sections) = sections {
                while next_section < sections.len() && offset >= sections[next_section].1 {
                    self.notify(TourEvent::SectionEntered(sections[next_section].0.clone()));
                    next_section += 1;
                }
            }
            self.notify(TourEvent::Progress {
                offset_px: offset,
                target_px: tween.to(),
            });

            if tween.is_complete(elapsed) {
                break;
            }
        }
    }

    async fn try_enter_running(&self, epoch: u64) -> bool {
        {
            let mut state = self.state.lock().await;
            if state.epoch != epoch || state.phase != TourPhase::Starting {
                debug!("discarding stale tour continuation");
                return false;
            }
            state.phase = TourPhase::Running;
        }
        self.notify(TourEvent::PhaseChanged(TourPhase::Running));
        true
    }

    async fn finish_naturally(&self, epoch: u64) {
        {
            let mut state = self.state.lock().await;
            if state.epoch != epoch || state.phase != TourPhase::Running {
                debug!("discarding stale tour completion");
                return;
            }
            state.phase = TourPhase::Idle;
        }
        self.task.lock().await.take();

        if let Err(err) = self.prefs.set_tour_active(false).await {
            error!(%err, "failed to persist tour completion");
        }

        // The music, if any, keeps playing after the ride ends.
        self.notify(TourEvent::PhaseChanged(TourPhase::Idle));
        self.notify(TourEvent::CompletedNaturally);
    }

    async fn abandon(&self, epoch: u64) {
        {
            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                return;
            }
            state.phase = TourPhase::Idle;
        }
        self.task.lock().await.take();

        if let Err(err) = self.prefs.set_tour_active(false).await {
            error!(%err, "failed to persist tour deactivation");
        }
        self.notify(TourEvent::PhaseChanged(TourPhase::Idle));
        self.notify(TourEvent::Stopped);
    }

    async fn persist_selection(&self, mode: &AudioMode) -> Result<()> {
        self.prefs
            .set_tour_active(true)
            .await
            .context("failed to persist tour activation")?;
        self.prefs
            .set_music_mode(mode.tag())
            .await
            .context("failed to persist music mode")?;
        Ok(())
    }

    fn section_starts_px(&self, viewport_height_px: f64) -> Vec<(SectionId, f64)> {
        self.registry
            .spans_vh()
            .into_iter()
            .map(|span| (span.id, span.start_vh * viewport_height_px / 100.0))
            .collect()
    }

    fn notify(&self, event: TourEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
