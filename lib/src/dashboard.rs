//! Screen-level loaders that join several gateways.
//!
//! Independent reads are issued concurrently. Remote reads never fail for
//! network reasons, so a joined load only fails on local-gateway errors.

use std::collections::HashSet;

use tracing::warn;

use crate::data::{
    CourseCatalogItem, CourseEnrollment, LearnerProfile, ProgramAssignment, SupervisorProgram,
};
use crate::error::{GatewayError, Result};
use crate::local::LocalGateway;
use crate::remote::{InventoryMap, LegacyGateway};
use crate::resolve::{
    dashboard_metrics, dedupe_assignments, hydrate, progress_metrics, progress_rows,
    student_status, total_duration, CourseDuration, DashboardMetrics, ProgressMetrics, ProgressRow,
    StudentStatus,
};

#[derive(Debug, Clone)]
pub struct Dashboard {
    legacy: LegacyGateway,
    local: LocalGateway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub learner: LearnerProfile,
    pub status: StudentStatus,
}

/// A program with its courses resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramOverview {
    pub program: SupervisorProgram,
    pub courses: Vec<CourseCatalogItem>,
    pub unresolved: Vec<i64>,
    pub duration: CourseDuration,
}

impl ProgramOverview {
    fn new(program: SupervisorProgram, catalog: &[CourseCatalogItem]) -> Self {
        let hydrated = hydrate(&program.course_sequence, catalog);
        let duration = total_duration(&hydrated.courses);

        Self {
            program,
            courses: hydrated.courses,
            unresolved: hydrated.unresolved,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignedProgram {
    pub assignment: ProgramAssignment,
    pub overview: ProgramOverview,
    /// The learner's enrollments in this program.
    pub enrollments: Vec<CourseEnrollment>,
}

impl AssignedProgram {
    pub fn enrollment_for(&self, course_id: i64) -> Option<&CourseEnrollment> {
        self.enrollments
            .iter()
            .find(|enrollment| enrollment.course_id == course_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentPrograms {
    pub programs: Vec<AssignedProgram>,
    /// Empty when inventory could not be loaded.
    pub inventory: InventoryMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentProgress {
    pub learner: LearnerProfile,
    pub rows: Vec<ProgressRow>,
    pub metrics: ProgressMetrics,
}

impl Dashboard {
    pub fn new(legacy: LegacyGateway, local: LocalGateway) -> Self {
        Self { legacy, local }
    }

    pub fn legacy(&self) -> &LegacyGateway {
        &self.legacy
    }

    pub fn local(&self) -> &LocalGateway {
        &self.local
    }

    pub async fn supervisor_metrics(&self) -> Result<DashboardMetrics> {
        let (roster, assignments, enrollments, programs) = tokio::try_join!(
            self.legacy.get_roster(),
            self.local.get_assignments(),
            self.local.get_enrollments(),
            self.local.get_all_programs(),
        )?;

        Ok(dashboard_metrics(&roster, &assignments, &enrollments, &programs))
    }

    /// Every learner on the roster with their status for `program_id`.
    pub async fn roster_status(&self, program_id: &str) -> Result<Vec<RosterEntry>> {
        let (roster, assignments, enrollments) = tokio::try_join!(
            self.legacy.get_roster(),
            self.local.get_assignments(),
            self.local.get_enrollments(),
        )?;

        Ok(roster
            .into_iter()
            .map(|learner| {
                let status =
                    student_status(&learner.learner_id, program_id, &assignments, &enrollments);
                RosterEntry { learner, status }
            })
            .collect())
    }

    pub async fn program_overview(&self, program_id: &str) -> Result<ProgramOverview> {
        let (program, catalog) = tokio::try_join!(
            self.local.get_program_by_id(program_id),
            self.legacy.get_catalog(),
        )?;

        Ok(ProgramOverview::new(program, &catalog))
    }

    /// Programs assigned to a learner, one per program, with the inventory
    /// needed to book their courses. Assignments to programs that no longer
    /// exist are skipped.
    pub async fn student_programs(&self, learner_id: &str) -> Result<StudentPrograms> {
        let (assignments, enrollments, catalog) = tokio::try_join!(
            self.local.get_assignments(),
            self.local.get_enrollments(),
            self.legacy.get_catalog(),
        )?;

        let mut programs = Vec::new();
        for assignment in dedupe_assignments(learner_id, &assignments) {
            let program = match self.local.get_program_by_id(&assignment.program_id).await {
                Ok(program) => program,
                Err(err) if err.is_not_found() => {
                    warn!(
                        program_id = %assignment.program_id,
                        error = %err,
                        "Failed to load program"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            let enrollments = enrollments
                .iter()
                .filter(|enrollment| {
                    enrollment.learner_id == learner_id && enrollment.program_id == program.id
                })
                .cloned()
                .collect();

            programs.push(AssignedProgram {
                assignment: assignment.clone(),
                overview: ProgramOverview::new(program, &catalog),
                enrollments,
            });
        }

        let inventory = self.legacy.get_all_inventory().await.unwrap_or_else(|err| {
            warn!(error = %err, "Failed to pre-fetch inventory");
            InventoryMap::default()
        });

        Ok(StudentPrograms {
            programs,
            inventory,
        })
    }

    /// Course-level progress for one learner, looked up by learner id or
    /// legacy data id. `completed` holds the course ids the learner finished.
    pub async fn student_progress(
        &self,
        learner: &str,
        completed: &HashSet<i64>,
    ) -> Result<StudentProgress> {
        let (roster, assignments, enrollments, programs, catalog) = tokio::try_join!(
            self.legacy.get_roster(),
            self.local.get_assignments(),
            self.local.get_enrollments(),
            self.local.get_all_programs(),
            self.legacy.get_catalog(),
        )?;

        let learner = roster
            .into_iter()
            .find(|profile| {
                profile.learner_id == learner || profile.learner_data_id.to_string() == learner
            })
            .ok_or_else(|| GatewayError::NotFound {
                collection: "learners",
                id: learner.to_owned(),
            })?;

        let rows = progress_rows(
            &learner.learner_id,
            &programs,
            &assignments,
            &enrollments,
            &catalog,
            completed,
        );
        let metrics = progress_metrics(&rows);

        Ok(StudentProgress {
            learner,
            rows,
            metrics,
        })
    }
}
