//! Programs, assignments and enrollments.
//!
//! Non-production configurations try the local network service first and
//! return its answer as-is. Everything else, and any failed attempt, is
//! served from the [`LocalStore`] after a short artificial delay.

use std::time::Duration;

use futures::future::join_all;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::{endpoint, GatewayConfig};
use crate::data::{
    AssignmentPatch, CourseEnrollment, EnrollmentPatch, LocalDb, ProgramAssignment, ProgramPatch,
    SupervisorProgram,
};
use crate::error::{FetchError, GatewayError, Result};
use crate::fetch::Fetcher;
use crate::store::LocalStore;

/// A row of one of the three local collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Partial update; every set field overwrites the stored one.
    type Patch: Serialize + Send + Sync;

    /// Collection name, both in the document and on the local service.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn apply(&mut self, patch: &Self::Patch);

    fn rows(db: &LocalDb) -> &Vec<Self>;
    fn rows_mut(db: &mut LocalDb) -> &mut Vec<Self>;
}

impl Record for SupervisorProgram {
    type Patch = ProgramPatch;

    const COLLECTION: &'static str = "programs";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: &ProgramPatch) {
        if let Some(program_name) = &patch.program_name {
            self.program_name = program_name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(course_sequence) = &patch.course_sequence {
            self.course_sequence = course_sequence.clone();
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
    }

    fn rows(db: &LocalDb) -> &Vec<Self> {
        &db.programs
    }

    fn rows_mut(db: &mut LocalDb) -> &mut Vec<Self> {
        &mut db.programs
    }
}

impl Record for ProgramAssignment {
    type Patch = AssignmentPatch;

    const COLLECTION: &'static str = "program_registrations";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: &AssignmentPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assigned_date) = patch.assigned_date {
            self.assigned_date = assigned_date;
        }
    }

    fn rows(db: &LocalDb) -> &Vec<Self> {
        &db.program_registrations
    }

    fn rows_mut(db: &mut LocalDb) -> &mut Vec<Self> {
        &mut db.program_registrations
    }
}

impl Record for CourseEnrollment {
    type Patch = EnrollmentPatch;

    const COLLECTION: &'static str = "enrollments";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: &EnrollmentPatch) {
        if let Some(course_id) = patch.course_id {
            self.course_id = course_id;
        }
        if let Some(class_id) = patch.class_id {
            self.class_id = class_id;
        }
    }

    fn rows(db: &LocalDb) -> &Vec<Self> {
        &db.enrollments
    }

    fn rows_mut(db: &mut LocalDb) -> &mut Vec<Self> {
        &mut db.enrollments
    }
}

/// Outcome of a batch invite. Each learner is assigned independently.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub assigned: Vec<ProgramAssignment>,
    pub failed: Vec<(String, GatewayError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LocalGateway {
    fetcher: Fetcher,
    base: Url,
    use_remote_first: bool,
    latency: Duration,
    store: LocalStore,
}

impl LocalGateway {
    pub fn new(fetcher: Fetcher, config: &GatewayConfig, store: LocalStore) -> Self {
        store.initialize();

        Self {
            fetcher,
            base: config.local_base.clone(),
            use_remote_first: config.use_remote_first,
            latency: config.local_latency,
            store,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>> {
        if self.use_remote_first {
            match self.fetcher.get_json(&self.url::<R>(None)).await {
                Ok(rows) => return Ok(rows),
                Err(err) => self.attempt_failed::<R>("list", &err),
            }
        }

        self.simulate_latency().await;

        Ok(R::rows(&self.store.read()).clone())
    }

    pub async fn get_by_id<R: Record>(&self, id: &str) -> Result<R> {
        if self.use_remote_first {
            match self.fetcher.get_json(&self.url::<R>(Some(id))).await {
                Ok(row) => return Ok(row),
                Err(err) => self.attempt_failed::<R>("get", &err),
            }
        }

        self.simulate_latency().await;

        R::rows(&self.store.read())
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or_else(|| not_found::<R>(id))
    }

    /// Persists `row`, generating an id when the caller left it empty.
    pub async fn create<R: Record>(&self, row: R) -> Result<R> {
        self.insert(row, None).await
    }

    pub async fn update<R: Record>(&self, id: &str, patch: R::Patch) -> Result<R> {
        if self.use_remote_first {
            let url = self.url::<R>(Some(id));
            match self.fetcher.send_json(Method::PATCH, &url, &patch).await {
                Ok(row) => return Ok(row),
                Err(err) => self.attempt_failed::<R>("update", &err),
            }
        }

        self.simulate_latency().await;

        self.store
            .mutate(|db| {
                let row = R::rows_mut(db)
                    .iter_mut()
                    .find(|row| row.id() == id)
                    .ok_or_else(|| not_found::<R>(id))?;
                row.apply(&patch);

                Ok::<_, GatewayError>(row.clone())
            })
            .await
    }

    /// Clears the local document so later reads start from the seed data.
    pub async fn reset(&self) {
        self.simulate_latency().await;
        self.store.clear();
    }

    pub async fn get_all_programs(&self) -> Result<Vec<SupervisorProgram>> {
        self.get_all().await
    }

    pub async fn get_program_by_id(&self, id: &str) -> Result<SupervisorProgram> {
        self.get_by_id(id).await
    }

    pub async fn create_program(&self, program: SupervisorProgram) -> Result<SupervisorProgram> {
        self.create(program).await
    }

    pub async fn update_program(&self, id: &str, patch: ProgramPatch) -> Result<SupervisorProgram> {
        self.update::<SupervisorProgram>(id, patch).await
    }

    pub async fn publish_program(&self, id: &str) -> Result<SupervisorProgram> {
        self.update_program(id, ProgramPatch::publish()).await
    }

    pub async fn get_assignments(&self) -> Result<Vec<ProgramAssignment>> {
        self.get_all().await
    }

    /// Assigns a program to a learner. An existing assignment for the same
    /// learner and program is returned instead of creating a second one.
    pub async fn assign_program(&self, assignment: ProgramAssignment) -> Result<ProgramAssignment> {
        let same_pair: fn(&ProgramAssignment, &ProgramAssignment) -> bool =
            ProgramAssignment::same_pair;

        self.insert(assignment, Some(same_pair)).await
    }

    /// Best-effort batch invite: learners are assigned concurrently and
    /// failures are reported per learner.
    pub async fn assign_program_batch(
        &self,
        learner_ids: &[String],
        program_id: &str,
    ) -> BatchReport {
        let mut unique: Vec<&String> = Vec::with_capacity(learner_ids.len());
        for learner_id in learner_ids {
            if !unique.contains(&learner_id) {
                unique.push(learner_id);
            }
        }

        let results = join_all(unique.iter().map(|learner_id| {
            self.assign_program(ProgramAssignment::pending(learner_id.as_str(), program_id))
        }))
        .await;

        let mut report = BatchReport::default();
        for (learner_id, result) in unique.into_iter().zip(results) {
            match result {
                Ok(assignment) => report.assigned.push(assignment),
                Err(err) => {
                    warn!(%learner_id, program_id, error = %err, "Failed to assign program");
                    report.failed.push((learner_id.clone(), err));
                }
            }
        }

        report
    }

    pub async fn update_assignment(
        &self,
        id: &str,
        patch: AssignmentPatch,
    ) -> Result<ProgramAssignment> {
        self.update::<ProgramAssignment>(id, patch).await
    }

    pub async fn get_enrollments(&self) -> Result<Vec<CourseEnrollment>> {
        self.get_all().await
    }

    pub async fn enroll_student(&self, enrollment: CourseEnrollment) -> Result<CourseEnrollment> {
        self.create(enrollment).await
    }

    pub async fn update_enrollment(
        &self,
        id: &str,
        patch: EnrollmentPatch,
    ) -> Result<CourseEnrollment> {
        self.update::<CourseEnrollment>(id, patch).await
    }

    async fn insert<R: Record>(&self, mut row: R, unique: Option<fn(&R, &R) -> bool>) -> Result<R> {
        if row.id().is_empty() {
            row.set_id(Uuid::new_v4().to_string());
        }

        if self.use_remote_first {
            match self.insert_remote(&row, unique).await {
                Ok(created) => return Ok(created),
                Err(err) => self.attempt_failed::<R>("create", &err),
            }
        }

        self.simulate_latency().await;

        self.store
            .mutate(|db| {
                let rows = R::rows_mut(db);

                if let Some(same) = unique {
                    if let Some(existing) = rows.iter().find(|existing| same(existing, &row)) {
                        debug!(
                            collection = R::COLLECTION,
                            id = existing.id(),
                            "Row already exists"
                        );
                        return Ok(existing.clone());
                    }
                }

                rows.push(row.clone());

                Ok::<_, GatewayError>(row)
            })
            .await
    }

    async fn insert_remote<R: Record>(
        &self,
        row: &R,
        unique: Option<fn(&R, &R) -> bool>,
    ) -> Result<R, FetchError> {
        let url = self.url::<R>(None);

        if let Some(same) = unique {
            let rows: Vec<R> = self.fetcher.get_json(&url).await?;
            if let Some(existing) = rows.into_iter().find(|existing| same(existing, row)) {
                return Ok(existing);
            }
        }

        self.fetcher.send_json(Method::POST, &url, row).await
    }

    fn url<R: Record>(&self, id: Option<&str>) -> Url {
        match id {
            Some(id) => endpoint(&self.base, &[R::COLLECTION, id]),
            None => endpoint(&self.base, &[R::COLLECTION]),
        }
    }

    fn attempt_failed<R: Record>(&self, operation: &str, err: &FetchError) {
        warn!(
            collection = R::COLLECTION,
            operation,
            error = %err,
            "Local API unavailable, using local store"
        );
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn not_found<R: Record>(id: &str) -> GatewayError {
    GatewayError::NotFound {
        collection: R::COLLECTION,
        id: id.to_owned(),
    }
}
