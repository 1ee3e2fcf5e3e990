//! Pure calculations over already loaded collections.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::warn;

use crate::data::{
    CourseCatalogItem, CourseEnrollment, Level, ProgramAssignment, SupervisorProgram, TrainingType,
};

/// Where a learner stands with respect to one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentStatus {
    Unassigned,
    Pending,
    Registered,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => f.pad("unassigned"),
            Self::Pending => f.pad("pending"),
            Self::Registered => f.pad("registered"),
        }
    }
}

/// Any enrollment wins over any assignment.
pub fn student_status(
    learner_id: &str,
    program_id: &str,
    assignments: &[ProgramAssignment],
    enrollments: &[CourseEnrollment],
) -> StudentStatus {
    let enrolled = enrollments.iter().any(|enrollment| {
        enrollment.learner_id == learner_id && enrollment.program_id == program_id
    });
    if enrolled {
        return StudentStatus::Registered;
    }

    let assigned = assignments.iter().any(|assignment| {
        assignment.learner_id == learner_id && assignment.program_id == program_id
    });
    if assigned {
        return StudentStatus::Pending;
    }

    StudentStatus::Unassigned
}

/// Days of ILT plus hours of eLearning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseDuration {
    pub days: u32,
    pub hours: u32,
}

pub fn total_duration<'a>(
    courses: impl IntoIterator<Item = &'a CourseCatalogItem>,
) -> CourseDuration {
    courses
        .into_iter()
        .fold(CourseDuration::default(), |mut total, course| {
            match course.training_type_name {
                TrainingType::Ilt => total.days += course.total_days,
                TrainingType::ELearning => total.hours += course.hours.unwrap_or(0),
            }
            total
        })
}

impl fmt::Display for CourseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn plural(count: u32) -> &'static str {
            if count == 1 {
                ""
            } else {
                "s"
            }
        }

        match (self.days, self.hours) {
            (0, 0) => f.write_str("0 hours"),
            (days, 0) => write!(f, "{days} day{}", plural(days)),
            (0, hours) => write!(f, "{hours} hour{}", plural(hours)),
            (days, hours) => write!(
                f,
                "{days} day{} + {hours} hour{}",
                plural(days),
                plural(hours)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub total_students: usize,
    pub enrolled_students: usize,
    /// Learners with at least one assignment and no enrollment at all.
    pub pending_invites: usize,
    /// Published programs only.
    pub programs_created: usize,
}

pub fn dashboard_metrics<T>(
    roster: &[T],
    assignments: &[ProgramAssignment],
    enrollments: &[CourseEnrollment],
    programs: &[SupervisorProgram],
) -> DashboardMetrics {
    let assigned: HashSet<&str> = assignments
        .iter()
        .map(|assignment| assignment.learner_id.as_str())
        .collect();
    let enrolled: HashSet<&str> = enrollments
        .iter()
        .map(|enrollment| enrollment.learner_id.as_str())
        .collect();

    DashboardMetrics {
        total_students: roster.len(),
        enrolled_students: enrolled.len(),
        pending_invites: assigned.difference(&enrolled).count(),
        programs_created: programs.iter().filter(|program| program.published).count(),
    }
}

/// Courses resolved from a course sequence, plus the ids the catalog did
/// not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hydrated {
    pub courses: Vec<CourseCatalogItem>,
    pub unresolved: Vec<i64>,
}

pub fn hydrate(course_sequence: &[i64], catalog: &[CourseCatalogItem]) -> Hydrated {
    let index: HashMap<i64, &CourseCatalogItem> = catalog
        .iter()
        .map(|course| (course.course_id, course))
        .collect();

    let mut hydrated = Hydrated::default();
    for course_id in course_sequence {
        match index.get(course_id) {
            Some(course) => hydrated.courses.push((*course).clone()),
            None => {
                warn!(course_id, "Course not found in catalog");
                hydrated.unresolved.push(*course_id);
            }
        }
    }

    hydrated
}

/// A learner's assignments, first one per program.
pub fn dedupe_assignments<'a>(
    learner_id: &str,
    assignments: &'a [ProgramAssignment],
) -> Vec<&'a ProgramAssignment> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for assignment in assignments {
        if assignment.learner_id == learner_id && seen.insert(assignment.program_id.as_str()) {
            unique.push(assignment);
        }
    }

    unique
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStatus {
    Completed,
    Incomplete,
    NotEnrolled,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.pad("Completed"),
            Self::Incomplete => f.pad("Incomplete"),
            Self::NotEnrolled => f.pad("Not Enrolled"),
        }
    }
}

pub fn course_status(
    course_id: i64,
    enrollments: &[&CourseEnrollment],
    completed: &HashSet<i64>,
) -> CourseStatus {
    if completed.contains(&course_id) {
        CourseStatus::Completed
    } else if enrollments.iter().any(|enrollment| enrollment.course_id == course_id) {
        CourseStatus::Incomplete
    } else {
        CourseStatus::NotEnrolled
    }
}

/// One course of one assigned program, as seen by a learner.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub program: SupervisorProgram,
    pub course: CourseCatalogItem,
    pub enrollment: Option<CourseEnrollment>,
    pub status: CourseStatus,
}

/// Flattens a learner's deduplicated assignments into one row per course.
/// Assignments to unknown programs and courses missing from the catalog
/// are skipped.
pub fn progress_rows(
    learner_id: &str,
    programs: &[SupervisorProgram],
    assignments: &[ProgramAssignment],
    enrollments: &[CourseEnrollment],
    catalog: &[CourseCatalogItem],
    completed: &HashSet<i64>,
) -> Vec<ProgressRow> {
    let mut rows = Vec::new();

    for assignment in dedupe_assignments(learner_id, assignments) {
        let Some(program) = programs
            .iter()
            .find(|program| program.id == assignment.program_id)
        else {
            continue;
        };

        let program_enrollments: Vec<&CourseEnrollment> = enrollments
            .iter()
            .filter(|enrollment| {
                enrollment.learner_id == learner_id && enrollment.program_id == program.id
            })
            .collect();

        for course in hydrate(&program.course_sequence, catalog).courses {
            let enrollment = program_enrollments
                .iter()
                .find(|enrollment| enrollment.course_id == course.course_id)
                .map(|enrollment| (*enrollment).clone());
            let status = course_status(course.course_id, &program_enrollments, completed);

            rows.push(ProgressRow {
                program: program.clone(),
                course,
                enrollment,
                status,
            });
        }
    }

    rows
}

/// Row filter; empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFilter {
    pub search: String,
    pub levels: Vec<Level>,
    pub statuses: Vec<CourseStatus>,
}

impl ProgressFilter {
    pub fn matches(&self, row: &ProgressRow) -> bool {
        let matches_level = self.levels.is_empty() || self.levels.contains(&row.course.level_name);
        let matches_status = self.statuses.is_empty() || self.statuses.contains(&row.status);

        matches_level && matches_status && self.matches_search(row)
    }

    pub fn apply<'a>(&self, rows: &'a [ProgressRow]) -> Vec<&'a ProgressRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }

    fn matches_search(&self, row: &ProgressRow) -> bool {
        let search = self.search.trim().to_lowercase();
        if search.is_empty() {
            return true;
        }

        row.course.course_id.to_string().contains(&search)
            || row.course.course_title.to_lowercase().contains(&search)
            || row.program.program_name.to_lowercase().contains(&search)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressMetrics {
    pub completed: usize,
    pub incomplete: usize,
    pub not_enrolled: usize,
    pub total_courses: usize,
    pub completion_percentage: f64,
    pub programs_assigned: usize,
}

pub fn progress_metrics(rows: &[ProgressRow]) -> ProgressMetrics {
    let count = |status: CourseStatus| rows.iter().filter(|row| row.status == status).count();
    let completed = count(CourseStatus::Completed);

    let completion_percentage = if rows.is_empty() {
        0.0
    } else {
        completed as f64 / rows.len() as f64 * 100.0
    };

    ProgressMetrics {
        completed,
        incomplete: count(CourseStatus::Incomplete),
        not_enrolled: count(CourseStatus::NotEnrolled),
        total_courses: rows.len(),
        completion_percentage,
        programs_assigned: rows
            .iter()
            .map(|row| row.program.id.as_str())
            .collect::<HashSet<_>>()
            .len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AssignmentStatus;
    use crate::fallback::COURSES;

    fn assignment(learner_id: &str, program_id: &str) -> ProgramAssignment {
        ProgramAssignment {
            id: format!("{learner_id}-{program_id}"),
            ..ProgramAssignment::pending(learner_id, program_id)
        }
    }

    fn enrollment(learner_id: &str, program_id: &str, course_id: i64) -> CourseEnrollment {
        CourseEnrollment {
            id: format!("{learner_id}-{program_id}-{course_id}"),
            ..CourseEnrollment::new(learner_id, program_id, course_id, 1)
        }
    }

    fn program(id: &str, course_sequence: Vec<i64>, published: bool) -> SupervisorProgram {
        SupervisorProgram {
            id: id.to_owned(),
            published,
            ..SupervisorProgram::draft("pat", id, course_sequence)
        }
    }

    #[test]
    fn status_prefers_enrollment() {
        let assignments = vec![assignment("l1", "p1")];
        let enrollments = vec![enrollment("l1", "p1", 11)];

        assert_eq!(
            student_status("l1", "p1", &assignments, &enrollments),
            StudentStatus::Registered
        );
        assert_eq!(
            student_status("l1", "p1", &assignments, &[]),
            StudentStatus::Pending
        );
        assert_eq!(
            student_status("l1", "p2", &assignments, &enrollments),
            StudentStatus::Unassigned
        );
        assert_eq!(
            student_status("l1", "p1", &[], &enrollments),
            StudentStatus::Registered
        );
    }

    #[test]
    fn duration_is_partitioned_by_type() {
        let catalog = COURSES.load().unwrap();
        let mut courses: Vec<CourseCatalogItem> = catalog
            .into_iter()
            .filter(|course| [11, 9, 131, 90].contains(&course.course_id))
            .collect();

        let forward = total_duration(&courses);
        courses.reverse();
        let backward = total_duration(&courses);

        assert_eq!(forward, CourseDuration { days: 10, hours: 12 });
        assert_eq!(forward, backward);
    }

    #[test]
    fn elearning_without_hours_counts_zero() {
        let mut course = COURSES
            .load()
            .unwrap()
            .into_iter()
            .find(|course| course.course_id == 9)
            .unwrap();
        course.hours = None;
        course.total_days = 4;

        assert_eq!(total_duration([&course]), CourseDuration::default());
    }

    #[test]
    fn status_labels_pad() {
        assert_eq!(format!("[{:<12}]", StudentStatus::Pending), "[pending     ]");
        assert_eq!(format!("[{:>13}]", CourseStatus::NotEnrolled), "[ Not Enrolled]");
    }

    #[test]
    fn duration_labels() {
        assert_eq!(CourseDuration::default().to_string(), "0 hours");
        assert_eq!(CourseDuration { days: 1, hours: 0 }.to_string(), "1 day");
        assert_eq!(CourseDuration { days: 0, hours: 8 }.to_string(), "8 hours");
        assert_eq!(
            CourseDuration { days: 5, hours: 1 }.to_string(),
            "5 days + 1 hour"
        );
    }

    #[test]
    fn metrics_count_learners_not_rows() {
        let roster: Vec<u32> = (0..10).collect();
        let assignments = vec![
            assignment("a", "p1"),
            assignment("a", "p2"),
            assignment("b", "p1"),
            assignment("c", "p1"),
            assignment("d", "p1"),
        ];
        let enrollments = vec![
            enrollment("a", "p1", 11),
            enrollment("a", "p1", 9),
            enrollment("b", "p1", 11),
        ];
        let programs = vec![
            program("p1", vec![11], true),
            program("p2", vec![9], false),
        ];

        let metrics = dashboard_metrics(&roster, &assignments, &enrollments, &programs);

        assert_eq!(
            metrics,
            DashboardMetrics {
                total_students: 10,
                enrolled_students: 2,
                pending_invites: 2,
                programs_created: 1,
            }
        );
    }

    #[test]
    fn hydrate_reports_unknown_courses() {
        let catalog = COURSES.load().unwrap();
        let hydrated = hydrate(&[11, 424242, 9], &catalog);

        let ids: Vec<i64> = hydrated.courses.iter().map(|course| course.course_id).collect();
        assert_eq!(ids, vec![11, 9]);
        assert_eq!(hydrated.unresolved, vec![424242]);
    }

    #[test]
    fn dedupe_keeps_first_per_program() {
        let mut second = assignment("l1", "p1");
        second.id = "later".to_owned();
        second.status = AssignmentStatus::Registered;
        let assignments = vec![
            assignment("l1", "p1"),
            assignment("l2", "p1"),
            second,
            assignment("l1", "p2"),
        ];

        let deduped = dedupe_assignments("l1", &assignments);
        let ids: Vec<&str> = deduped.iter().map(|assignment| assignment.id.as_str()).collect();

        assert_eq!(ids, vec!["l1-p1", "l1-p2"]);
    }

    #[test]
    fn progress_rows_follow_course_sequence() {
        let catalog = COURSES.load().unwrap();
        let programs = vec![program("p1", vec![116, 11, 9], true)];
        let assignments = vec![assignment("l1", "p1"), assignment("l1", "p1")];
        let enrollments = vec![enrollment("l1", "p1", 11), enrollment("l2", "p1", 116)];
        let completed = HashSet::from([9]);

        let rows = progress_rows("l1", &programs, &assignments, &enrollments, &catalog, &completed);
        let statuses: Vec<(i64, CourseStatus)> = rows
            .iter()
            .map(|row| (row.course.course_id, row.status))
            .collect();

        assert_eq!(
            statuses,
            vec![
                (116, CourseStatus::NotEnrolled),
                (11, CourseStatus::Incomplete),
                (9, CourseStatus::Completed),
            ]
        );
        assert!(rows[1].enrollment.is_some());

        let metrics = progress_metrics(&rows);
        assert_eq!(metrics.total_courses, 3);
        assert_eq!(metrics.programs_assigned, 1);
        assert!((metrics.completion_percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn progress_filter_combines_criteria() {
        let catalog = COURSES.load().unwrap();
        let programs = vec![program("Safety Ramp", vec![116, 131], true)];
        let assignments = vec![assignment("l1", "Safety Ramp")];
        let rows = progress_rows("l1", &programs, &assignments, &[], &catalog, &HashSet::new());

        let by_level = ProgressFilter {
            levels: vec![Level::Advanced],
            ..Default::default()
        };
        assert_eq!(by_level.apply(&rows).len(), 1);

        let by_program_name = ProgressFilter {
            search: "  safety ramp ".to_owned(),
            ..Default::default()
        };
        assert_eq!(by_program_name.apply(&rows).len(), 2);

        let by_id = ProgressFilter {
            search: "131".to_owned(),
            statuses: vec![CourseStatus::Completed],
            ..Default::default()
        };
        assert!(by_id.apply(&rows).is_empty());
    }

    #[test]
    fn empty_progress_has_zero_completion() {
        let metrics = progress_metrics(&[]);

        assert_eq!(metrics.total_courses, 0);
        assert_eq!(metrics.completion_percentage, 0.0);
    }
}
