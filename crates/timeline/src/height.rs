use thiserror::Error;

use crate::SectionRegistry;

/// Extra scroll distance, in viewport heights, added on top of the summed
/// section heights. Page headers and inter-section gaps are not modeled
/// per-section; this flat allowance approximates them.
pub const DEFAULT_SLACK_VIEWPORTS: f64 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum HeightError {
    #[error("viewport height must be a positive number of pixels, got {0}")]
    InvalidViewport(f64),
}

/// Total distance the tour scrolls through, in pixels, for the given
/// registry and viewport.
///
/// Declared section heights are trusted as authored; they are not verified
/// against the rendered layout, so drift degrades pacing accuracy but
/// nothing else.
pub fn total_scroll_distance(
    registry: &SectionRegistry,
    viewport_height_px: f64,
    slack_viewports: f64,
) -> Result<f64, HeightError> {
    if !viewport_height_px.is_finite() || viewport_height_px <= 0.0 {
        return Err(HeightError::InvalidViewport(viewport_height_px));
    }

    let sections_px = registry.total_height_vh() * (viewport_height_px / 100.0);
    Ok(sections_px + slack_viewports * viewport_height_px)
}
