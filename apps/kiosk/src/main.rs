use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use audio_backend::{AudioBackend, AudioBackendError, AudioSink, SinkOptions, TrackSource};
use clap::{Parser, ValueEnum};
use shared::domain::{AudioMode, TrackHandle};
use storage::Preferences;
use timeline::SectionRegistry;
use tokio::sync::broadcast;
use tour_core::{
    AudioController, RestoreOutcome, ScrollSurface, TourEvent, TourOrchestrator,
};
use tracing::{debug, info, warn};

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Music selection for a freshly started tour.
    #[arg(long, value_enum, default_value_t = MusicArg::None)]
    music: MusicArg,
    /// Path of an audio file to play when --music=custom.
    #[arg(long)]
    track: Option<std::path::PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    /// Override the tour length, in seconds.
    #[arg(long)]
    duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MusicArg {
    None,
    Default,
    Custom,
}

/// Stand-in for the browser page: a fixed viewport and a scroll offset the
/// tour drives.
struct SimulatedPage {
    viewport_height_px: f64,
    offset_px: Mutex<f64>,
}

impl SimulatedPage {
    fn new(viewport_height_px: f64) -> Arc<Self> {
        Arc::new(Self {
            viewport_height_px,
            offset_px: Mutex::new(0.0),
        })
    }
}

#[async_trait]
impl ScrollSurface for SimulatedPage {
    fn viewport_height_px(&self) -> f64 {
        self.viewport_height_px
    }

    async fn current_offset_px(&self) -> f64 {
        *self.offset_px.lock().expect("offset")
    }

    async fn scroll_to(&self, offset_px: f64) {
        *self.offset_px.lock().expect("offset") = offset_px;
    }
}

/// Audio backend that narrates playback into the log instead of producing
/// sound.
struct HeadlessAudioBackend;

struct HeadlessSink {
    label: String,
}

#[async_trait]
impl AudioSink for HeadlessSink {
    async fn play(&self) -> Result<(), AudioBackendError> {
        info!(track = %self.label, "audio playing");
        Ok(())
    }

    async fn pause(&self) {
        info!(track = %self.label, "audio paused");
    }

    async fn release(&self) {
        info!(track = %self.label, "audio released");
    }
}

#[async_trait]
impl AudioBackend for HeadlessAudioBackend {
    async fn acquire(
        &self,
        source: TrackSource,
        options: SinkOptions,
    ) -> Result<Arc<dyn AudioSink>, AudioBackendError> {
        let label = source.describe();
        info!(track = %label, looping = options.looping, "audio acquired");
        Ok(Arc::new(HeadlessSink { label }))
    }
}

fn selected_mode(args: &Args) -> Result<AudioMode> {
    match args.music {
        MusicArg::None => Ok(AudioMode::None),
        MusicArg::Default => Ok(AudioMode::Default),
        MusicArg::Custom => {
            let path = args
                .track
                .as_ref()
                .context("--music=custom requires --track <path>")?;
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read track '{}'", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-track".to_string());
            Ok(AudioMode::Custom(TrackHandle::new(filename, data)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(database_url) = args.database_url.clone() {
        settings.database_url = database_url;
    }
    if let Some(duration_secs) = args.duration_secs {
        settings.tour_duration_secs = duration_secs;
    }

    let prefs = Preferences::new(&settings.database_url).await?;
    prefs.health_check().await?;

    let audio = AudioController::new(
        Arc::new(HeadlessAudioBackend),
        prefs.clone(),
        settings.default_track_path.clone(),
    );
    let page = SimulatedPage::new(settings.viewport_height_px);
    let orchestrator = TourOrchestrator::new(
        SectionRegistry::bundled(),
        page,
        audio,
        prefs,
        settings.tuning(),
    );

    let mut events = orchestrator.subscribe_events();

    match orchestrator.restore().await? {
        RestoreOutcome::Resumed { music } => {
            info!(%music, "resumed a tour interrupted in a previous run");
        }
        RestoreOutcome::Fresh => {
            let mode = selected_mode(&args)?;
            info!(music = %mode.tag(), "starting tour");
            orchestrator.start(mode).await?;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(TourEvent::SectionEntered(id)) => info!(section = %id, "entered section"),
                Ok(TourEvent::PhaseChanged(phase)) => debug!(?phase, "tour phase changed"),
                Ok(TourEvent::Progress { .. }) => {}
                Ok(TourEvent::CompletedNaturally) => {
                    info!("tour completed");
                    break;
                }
                Ok(TourEvent::Stopped) => {
                    info!("tour stopped");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "tour event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; stopping tour");
                orchestrator.stop().await?;
            }
        }
    }

    Ok(())
}
