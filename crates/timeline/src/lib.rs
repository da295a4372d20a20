use std::collections::HashSet;

use chrono::NaiveDate;
use shared::domain::{EventSection, SectionId, SortOrder};
use thiserror::Error;

pub mod height;

pub use crate::height::{total_scroll_distance, HeightError, DEFAULT_SLACK_VIEWPORTS};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("section '{id}' declares a non-positive height of {height_vh}vh")]
    NonPositiveHeight { id: SectionId, height_vh: f64 },
    #[error("duplicate section id '{id}'")]
    DuplicateId { id: SectionId },
}

/// Ordered catalog of the event sections making up the archive page.
///
/// The order is the authoring order, which is also the order the tour
/// traverses. Chronological ordering is a separate, display-only concern.
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    sections: Vec<EventSection>,
}

/// Cumulative `[start, end)` offset of one section within the summed
/// timeline, in viewport-height units.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpan {
    pub id: SectionId,
    pub start_vh: f64,
    pub end_vh: f64,
}

impl SectionRegistry {
    pub fn new(sections: Vec<EventSection>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for section in &sections {
            if !(section.height_vh > 0.0) {
                return Err(RegistryError::NonPositiveHeight {
                    id: section.id.clone(),
                    height_vh: section.height_vh,
                });
            }
            if !seen.insert(section.id.clone()) {
                return Err(RegistryError::DuplicateId {
                    id: section.id.clone(),
                });
            }
        }
        Ok(Self { sections })
    }

    /// The catalog shipped with the archive, one entry per event page
    /// section. Heights mirror the authored section layouts.
    pub fn bundled() -> Self {
        let sections = vec![
            bundled_section("compono", "Compono", 2024, 1, 150.0),
            bundled_section("siteaoplus", "Siteaoplus", 2024, 2, 250.0),
            bundled_section("orsem", "Orsem", 2024, 3, 400.0),
            bundled_section("genass", "Genass", 2024, 4, 300.0),
            bundled_section("induction", "Officers", 2024, 5, 300.0),
            bundled_section("lanyard", "Lanyard", 2024, 6, 175.0),
            bundled_section("sweeteao", "Sweeteao", 2024, 7, 200.0),
            bundled_section("ambas", "Ambas", 2024, 8, 250.0),
            bundled_section("donation", "Donation", 2024, 9, 100.0),
            bundled_section("justice", "Justice", 2024, 10, 200.0),
            bundled_section("midterm", "Midterm", 2024, 11, 200.0),
            bundled_section("olympics", "Olympics", 2024, 12, 240.0),
            bundled_section("atfest", "Atfest", 2025, 1, 350.0),
            bundled_section("iggy", "Iggy", 2025, 2, 120.0),
            bundled_section("end", "End", 2025, 3, 120.0),
        ];
        Self { sections }
    }

    pub fn list(&self) -> &[EventSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: &SectionId) -> Option<&EventSection> {
        self.sections.iter().find(|section| &section.id == id)
    }

    pub fn total_height_vh(&self) -> f64 {
        self.sections.iter().map(|section| section.height_vh).sum()
    }

    pub fn spans_vh(&self) -> Vec<SectionSpan> {
        let mut offset = 0.0;
        self.sections
            .iter()
            .map(|section| {
                let start_vh = offset;
                offset += section.height_vh;
                SectionSpan {
                    id: section.id.clone(),
                    start_vh,
                    end_vh: offset,
                }
            })
            .collect()
    }

    /// Display ordering by event date. Does not affect tour traversal.
    pub fn chronological(&self, order: SortOrder) -> Vec<&EventSection> {
        let mut sections: Vec<&EventSection> = self.sections.iter().collect();
        sections.sort_by_key(|section| section.occurred_on);
        if order == SortOrder::Descending {
            sections.reverse();
        }
        sections
    }
}

fn bundled_section(
    id: &str,
    title: &str,
    year: i32,
    month: u32,
    height_vh: f64,
) -> EventSection {
    let occurred_on =
        NaiveDate::from_ymd_opt(year, month, 1).expect("bundled catalog dates are valid");
    EventSection::new(id, title, occurred_on, height_vh)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
