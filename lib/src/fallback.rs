//! Static datasets bundled with the crate, shaped like the live payloads.

use std::marker::PhantomData;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::data::{CourseCatalogItem, CourseInventory, LearnerProfile, LocalDb, Testimonial};
use crate::error::{GatewayError, Result};

pub static COURSES: Dataset<CourseCatalogItem> =
    Dataset::new("Courses", include_str!("../data/courses.json"));
pub static STUDENTS: Dataset<LearnerProfile> =
    Dataset::new("Students", include_str!("../data/students.json"));
pub static SCHEDULES: Dataset<CourseInventory> =
    Dataset::new("Schedules", include_str!("../data/schedules.json"));
pub static TESTIMONIALS: Dataset<Testimonial> =
    Dataset::new("Testimonials", include_str!("../data/testimonials.json"));

static SEED_DB: Lazy<LocalDb> = Lazy::new(|| {
    serde_json::from_str(include_str!("../data/seed_db.json")).unwrap_or_else(|err| {
        error!(error = %err, "Bundled seed document is malformed, starting empty");
        LocalDb::default()
    })
});

/// Seed document used when nothing has been persisted yet.
pub fn seed_db() -> LocalDb {
    SEED_DB.clone()
}

pub struct Dataset<T> {
    name: &'static str,
    raw: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Dataset<T> {
    const fn new(name: &'static str, raw: &'static str) -> Self {
        Self {
            name,
            raw,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: DeserializeOwned> Dataset<T> {
    pub fn load(&self) -> Result<Vec<T>> {
        serde_json::from_str(self.raw).map_err(|source| GatewayError::Fallback {
            name: self.name,
            source,
        })
    }
}
