//! Read-only gateways for the legacy and content services.
//!
//! Every read falls back to a bundled dataset when the service fails, so
//! callers always get something to show. Catalog, roster and testimonials
//! accept an empty but successful answer as real data; inventory lookups do
//! not, because a course with a fallback entry is never expected to have
//! zero sessions.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use crate::config::{endpoint, GatewayConfig};
use crate::data::{CourseCatalogItem, CourseInventory, LearnerProfile, Testimonial};
use crate::error::{GatewayError, Result};
use crate::fallback::{Dataset, COURSES, SCHEDULES, STUDENTS, TESTIMONIALS};
use crate::fetch::Fetcher;
use crate::raw_data::RawEnvelope;

const CATALOG_PATH: &[&str] = &["Course", "GetAllPartialValue"];
const ROSTER_PATH: &[&str] = &["Learner", "GetAllPartialValue"];
const SCHEDULES_PATH: &[&str] = &["Class", "Machinist", "Schedules"];
const TESTIMONIALS_PATH: &[&str] = &["Testimonial", "GetAllPartialValue"];

/// Catalog, roster and class inventory.
#[derive(Debug, Clone)]
pub struct LegacyGateway {
    fetcher: Fetcher,
    base: Url,
}

impl LegacyGateway {
    pub fn new(fetcher: Fetcher, config: &GatewayConfig) -> Self {
        Self {
            fetcher,
            base: config.legacy_base.clone(),
        }
    }

    pub async fn get_catalog(&self) -> Result<Vec<CourseCatalogItem>> {
        fetch_or_fallback(&self.fetcher, &self.base, CATALOG_PATH, &COURSES).await
    }

    pub async fn get_roster(&self) -> Result<Vec<LearnerProfile>> {
        fetch_or_fallback(&self.fetcher, &self.base, ROSTER_PATH, &STUDENTS).await
    }

    /// Sessions for one course. Returns `None` only when neither the service
    /// nor the bundled schedules know the course.
    pub async fn get_inventory(&self, course_id: i64) -> Result<Option<CourseInventory>> {
        match fetch_records::<CourseInventory>(&self.fetcher, &self.base, SCHEDULES_PATH).await {
            Ok(live) => {
                let found = live
                    .into_iter()
                    .find(|inventory| inventory.course_id == course_id && inventory.has_sessions());

                if found.is_some() {
                    return Ok(found);
                }

                warn!(
                    course_id,
                    "Real API returned no classes for course {course_id}, using {} fallback",
                    SCHEDULES.name()
                );
            }
            Err(err) => {
                warn!(
                    course_id,
                    error = %err,
                    "Legacy API failed (network error), using {} fallback",
                    SCHEDULES.name()
                );
            }
        }

        Ok(SCHEDULES
            .load()?
            .into_iter()
            .find(|inventory| inventory.course_id == course_id))
    }

    /// Sessions for every known course, merged per course: live entries
    /// with sessions win, courses the service did not mention use the
    /// bundled entry, and courses reported with zero sessions are recorded
    /// as known-empty.
    pub async fn get_all_inventory(&self) -> Result<InventoryMap> {
        let mut inventory = InventoryMap::default();

        match fetch_records::<CourseInventory>(&self.fetcher, &self.base, SCHEDULES_PATH).await {
            Ok(live) => {
                for entry in live {
                    // A duplicate without sessions never hides one with sessions.
                    if entry.has_sessions() || !inventory.contains(entry.course_id) {
                        inventory.insert(entry);
                    }
                }
            }
            Err(err) => warn!(
                error = %err,
                "Legacy API failed (network error), using {} fallback",
                SCHEDULES.name()
            ),
        }

        for entry in SCHEDULES.load()? {
            if !inventory.contains(entry.course_id) {
                inventory.insert(entry);
            }
        }

        Ok(inventory)
    }
}

/// Marketing content.
#[derive(Debug, Clone)]
pub struct ContentGateway {
    fetcher: Fetcher,
    base: Url,
}

impl ContentGateway {
    pub fn new(fetcher: Fetcher, config: &GatewayConfig) -> Self {
        Self {
            fetcher,
            base: config.content_base.clone(),
        }
    }

    pub async fn get_testimonials(&self) -> Result<Vec<Testimonial>> {
        fetch_or_fallback(&self.fetcher, &self.base, TESTIMONIALS_PATH, &TESTIMONIALS).await
    }
}

/// What is known about a course's sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryLookup<'a> {
    /// The course was never fetched.
    NotLoaded,
    /// The course was fetched and has no sessions.
    KnownEmpty,
    Available(&'a CourseInventory),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryMap {
    entries: BTreeMap<i64, Option<CourseInventory>>,
}

impl InventoryMap {
    /// Records `entry`, as known-empty when it has no sessions.
    pub fn insert(&mut self, entry: CourseInventory) {
        let course_id = entry.course_id;
        let value = entry.has_sessions().then_some(entry);

        self.entries.insert(course_id, value);
    }

    pub fn contains(&self, course_id: i64) -> bool {
        self.entries.contains_key(&course_id)
    }

    pub fn lookup(&self, course_id: i64) -> InventoryLookup<'_> {
        match self.entries.get(&course_id) {
            None => InventoryLookup::NotLoaded,
            Some(None) => InventoryLookup::KnownEmpty,
            Some(Some(inventory)) => InventoryLookup::Available(inventory),
        }
    }

    /// Whether a course can be booked. An empty map has not been loaded yet,
    /// so every course is optimistically treated as bookable.
    pub fn has_available_sessions(&self, course_id: i64) -> bool {
        if self.entries.is_empty() {
            return true;
        }

        matches!(self.lookup(course_id), InventoryLookup::Available(_))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, Option<&CourseInventory>)> {
        self.entries
            .iter()
            .map(|(course_id, inventory)| (*course_id, inventory.as_ref()))
    }
}

async fn fetch_records<T: DeserializeOwned>(
    fetcher: &Fetcher,
    base: &Url,
    path: &[&str],
) -> Result<Vec<T>> {
    let envelope: RawEnvelope = fetcher.get_json(&endpoint(base, path)).await?;

    Ok(envelope.decode()?)
}

async fn fetch_or_fallback<T: DeserializeOwned>(
    fetcher: &Fetcher,
    base: &Url,
    path: &[&str],
    dataset: &Dataset<T>,
) -> Result<Vec<T>> {
    match fetch_records(fetcher, base, path).await {
        Ok(records) => Ok(records),
        Err(err @ GatewayError::Fallback { .. }) => Err(err),
        Err(err) => {
            warn!(error = %err, "Remote API failed, using {} fallback", dataset.name());
            dataset.load()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(course_id: i64, sessions: usize) -> CourseInventory {
        let mut entry = SCHEDULES
            .load()
            .unwrap()
            .into_iter()
            .find(|entry| entry.course_id == 11)
            .unwrap();
        entry.course_id = course_id;
        entry.classes.truncate(sessions);
        entry
    }

    #[test]
    fn empty_map_is_optimistic() {
        let map = InventoryMap::default();

        assert_eq!(map.lookup(11), InventoryLookup::NotLoaded);
        assert!(map.has_available_sessions(11));
    }

    #[test]
    fn distinguishes_known_empty_from_not_loaded() {
        let mut map = InventoryMap::default();
        map.insert(inventory(11, 1));
        map.insert(inventory(175, 0));

        assert!(matches!(map.lookup(11), InventoryLookup::Available(_)));
        assert_eq!(map.lookup(175), InventoryLookup::KnownEmpty);
        assert_eq!(map.lookup(999), InventoryLookup::NotLoaded);

        assert!(map.has_available_sessions(11));
        assert!(!map.has_available_sessions(175));
        assert!(!map.has_available_sessions(999));
    }
}
