use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Basic,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.pad("Basic"),
            Self::Advanced => f.pad("Advanced"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrainingType {
    #[serde(rename = "ILT")]
    Ilt,
    #[serde(rename = "eLearning")]
    ELearning,
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ilt => f.pad("ILT"),
            Self::ELearning => f.pad("eLearning"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub is_free: bool,
    pub price: f64,
    pub currency: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub skill_name: String,
}

/// A course as published by the catalog service.
///
/// `total_days` only carries meaning for ILT courses and `hours` only for
/// eLearning courses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseCatalogItem {
    pub course_id: i64,

    pub course_title: String,
    pub level_name: Level,
    pub training_type_name: TrainingType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_days: u32,
    #[serde(default)]
    pub hours: Option<u32>,
    #[serde(default)]
    pub preview_image_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub prices: Vec<Price>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<Skill>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnerStatus {
    Active,
    Inactive,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEnrollment {
    pub product_name: String,
    pub learner_status_tag: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    #[serde(rename = "learner_Data_Id")]
    pub learner_data_id: i64,
    /// Join key used by assignments and enrollments.
    pub learner_id: String,

    pub learner_name: String,
    pub email_id: String,
    pub location: String,
    pub status: LearnerStatus,
    #[serde(default)]
    pub current_enrollment: Option<CurrentEnrollment>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorProgram {
    pub id: String,

    pub supervisor_id: String,
    pub program_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Order in which a learner takes the courses.
    pub course_sequence: Vec<i64>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl SupervisorProgram {
    /// An unpublished program without an id; the gateway assigns one on create.
    pub fn draft(
        supervisor_id: impl Into<String>,
        program_name: impl Into<String>,
        course_sequence: Vec<i64>,
    ) -> Self {
        Self {
            id: String::new(),
            supervisor_id: supervisor_id.into(),
            program_name: program_name.into(),
            description: String::new(),
            tags: Vec::new(),
            course_sequence,
            published: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_sequence: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl ProgramPatch {
    pub fn publish() -> Self {
        Self {
            published: Some(true),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentStatus {
    Pending,
    Registered,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramAssignment {
    pub id: String,

    pub learner_id: String,
    pub program_id: String,
    pub assigned_date: DateTime<Utc>,
    pub status: AssignmentStatus,
}

impl ProgramAssignment {
    pub fn pending(learner_id: impl Into<String>, program_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            learner_id: learner_id.into(),
            program_id: program_id.into(),
            assigned_date: Utc::now(),
            status: AssignmentStatus::Pending,
        }
    }

    pub fn same_pair(&self, other: &Self) -> bool {
        self.learner_id == other.learner_id && self.program_id == other.program_id
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssignmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollment {
    pub id: String,

    pub learner_id: String,
    pub program_id: String,
    pub course_id: i64,
    /// Scheduled session the learner committed to.
    pub class_id: i64,
    pub enrolled_date: DateTime<Utc>,
}

impl CourseEnrollment {
    pub fn new(
        learner_id: impl Into<String>,
        program_id: impl Into<String>,
        course_id: i64,
        class_id: i64,
    ) -> Self {
        Self {
            id: String::new(),
            learner_id: learner_id.into(),
            program_id: program_id.into(),
            course_id,
            class_id,
            enrolled_date: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSchedule {
    pub class_id: i64,

    pub location: String,
    /// Local wall-clock time; an offset on the wire is dropped.
    #[serde(deserialize_with = "wall_clock")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "wall_clock")]
    pub end_date: NaiveDateTime,
    pub seats: u32,
    #[serde(rename = "type")]
    pub class_type: String,
}

/// Bookable sessions for one course. An empty `classes` list means the
/// course has no sessions, which is not the same as never having fetched it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseInventory {
    pub course_id: i64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub classes: Vec<ClassSchedule>,
}

impl CourseInventory {
    pub fn has_sessions(&self) -> bool {
        !self.classes.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Testimonial(pub serde_json::Value);

/// The whole local working set, persisted as one document.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalDb {
    pub programs: Vec<SupervisorProgram>,
    pub program_registrations: Vec<ProgramAssignment>,
    pub enrollments: Vec<CourseEnrollment>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `2026-03-02T08:00:00` as well as RFC 3339 with an offset.
fn wall_clock<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(date) = DateTime::<FixedOffset>::parse_from_rfc3339(&raw) {
        return Ok(date.naive_local());
    }

    raw.parse::<NaiveDateTime>().map_err(D::Error::custom)
}
