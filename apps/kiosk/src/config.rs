use std::{fs, time::Duration};

use serde::Deserialize;
use tour_core::TourTuning;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub viewport_height_px: f64,
    pub scroll_top_duration_ms: u64,
    pub settle_delay_ms: u64,
    pub tour_duration_secs: u64,
    pub slack_viewports: f64,
    pub default_track_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/kiosk.db".into(),
            viewport_height_px: 900.0,
            scroll_top_duration_ms: 1_000,
            settle_delay_ms: 3_000,
            tour_duration_secs: 360,
            slack_viewports: timeline::DEFAULT_SLACK_VIEWPORTS,
            default_track_path: "assets/music/tour_theme.mp3".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    viewport_height_px: Option<f64>,
    scroll_top_duration_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    tour_duration_secs: Option<u64>,
    slack_viewports: Option<f64>,
    default_track_path: Option<String>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("kiosk.toml") {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => tracing::warn!(%err, "ignoring unreadable kiosk.toml"),
        }
    }

    if let Ok(v) = std::env::var("LANE_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env_parse::<f64>("LANE_VIEWPORT_HEIGHT_PX") {
        settings.viewport_height_px = v;
    }
    if let Some(v) = env_parse::<u64>("LANE_SCROLL_TOP_DURATION_MS") {
        settings.scroll_top_duration_ms = v;
    }
    if let Some(v) = env_parse::<u64>("LANE_SETTLE_DELAY_MS") {
        settings.settle_delay_ms = v;
    }
    if let Some(v) = env_parse::<u64>("LANE_TOUR_DURATION_SECS") {
        settings.tour_duration_secs = v;
    }
    if let Some(v) = env_parse::<f64>("LANE_SLACK_VIEWPORTS") {
        settings.slack_viewports = v;
    }
    if let Ok(v) = std::env::var("LANE_DEFAULT_TRACK_PATH") {
        settings.default_track_path = v;
    }

    settings
}

impl Settings {
    pub fn tuning(&self) -> TourTuning {
        TourTuning {
            scroll_top_duration: Duration::from_millis(self.scroll_top_duration_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            tour_duration: Duration::from_secs(self.tour_duration_secs),
            slack_viewports: self.slack_viewports,
            ..TourTuning::default()
        }
    }
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.viewport_height_px {
        settings.viewport_height_px = v;
    }
    if let Some(v) = file_cfg.scroll_top_duration_ms {
        settings.scroll_top_duration_ms = v;
    }
    if let Some(v) = file_cfg.settle_delay_ms {
        settings.settle_delay_ms = v;
    }
    if let Some(v) = file_cfg.tour_duration_secs {
        settings.tour_duration_secs = v;
    }
    if let Some(v) = file_cfg.slack_viewports {
        settings.slack_viewports = v;
    }
    if let Some(v) = file_cfg.default_track_path {
        settings.default_track_path = v;
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_page_tuning() {
        let settings = Settings::default();
        assert_eq!(settings.tour_duration_secs, 360);
        assert_eq!(settings.settle_delay_ms, 3_000);
        assert_eq!(settings.scroll_top_duration_ms, 1_000);
        assert_eq!(settings.slack_viewports, 2.0);
    }

    #[test]
    fn file_settings_overlay_only_what_they_name() {
        let mut settings = Settings::default();
        let file_cfg: FileSettings =
            toml::from_str("tour_duration_secs = 30\nviewport_height_px = 720.0\n")
                .expect("parse");
        apply_file_settings(&mut settings, file_cfg);

        assert_eq!(settings.tour_duration_secs, 30);
        assert_eq!(settings.viewport_height_px, 720.0);
        assert_eq!(settings.settle_delay_ms, 3_000);
    }

    #[test]
    fn tuning_converts_units() {
        let settings = Settings {
            tour_duration_secs: 42,
            ..Settings::default()
        };
        let tuning = settings.tuning();
        assert_eq!(tuning.tour_duration, Duration::from_secs(42));
        assert_eq!(tuning.settle_delay, Duration::from_millis(3_000));
    }
}
