use std::{fmt, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One event's display block in the archive. `height_vh` is authored
/// per-section and is what paces the tour; it is not measured from the
/// rendered layout.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSection {
    pub id: SectionId,
    pub title: String,
    /// Used for chronological display ordering only; the tour traverses
    /// sections in authoring order.
    pub occurred_on: NaiveDate,
    pub height_vh: f64,
}

impl EventSection {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        occurred_on: NaiveDate,
        height_vh: f64,
    ) -> Self {
        Self {
            id: SectionId::new(id),
            title: title.into(),
            occurred_on,
            height_vh,
        }
    }
}

/// Payload-free music selection as persisted in the preference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicModeTag {
    None,
    Default,
    Custom,
}

impl MusicModeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            MusicModeTag::None => "none",
            MusicModeTag::Default => "default",
            MusicModeTag::Custom => "custom",
        }
    }

    /// Absent or unrecognized stored values fall back to `None`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "default" => MusicModeTag::Default,
            "custom" => MusicModeTag::Custom,
            _ => MusicModeTag::None,
        }
    }
}

impl fmt::Display for MusicModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory reference to a user-supplied audio blob. The payload lives only
/// for the lifetime of the process and is never persisted.
#[derive(Clone)]
pub struct TrackHandle {
    id: Uuid,
    filename: String,
    data: Arc<[u8]>,
}

impl TrackHandle {
    pub fn new(filename: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }
}

impl fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackHandle")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .finish()
    }
}

impl PartialEq for TrackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackHandle {}

/// Runtime music selection. The custom payload can only exist in `Custom`.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMode {
    None,
    Default,
    Custom(TrackHandle),
}

impl AudioMode {
    pub fn tag(&self) -> MusicModeTag {
        match self {
            AudioMode::None => MusicModeTag::None,
            AudioMode::Default => MusicModeTag::Default,
            AudioMode::Custom(_) => MusicModeTag::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourPhase {
    Idle,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}
