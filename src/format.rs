use training_programs::dashboard::{AssignedProgram, ProgramOverview, RosterEntry};
use training_programs::data::{
    ClassSchedule, CourseCatalogItem, CourseEnrollment, CourseInventory, LearnerProfile,
    ProgramAssignment, SupervisorProgram, TrainingType,
};
use training_programs::resolve::{DashboardMetrics, ProgressMetrics, ProgressRow};
use training_programs::InventoryMap;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn course(course: &CourseCatalogItem) -> String {
    let length = match course.training_type_name {
        TrainingType::Ilt => format!("{} days", course.total_days),
        TrainingType::ELearning => format!("{} hours", course.hours.unwrap_or(0)),
    };

    format!(
        "{:>5}  {:<48} {:<9} {:<9} {}",
        course.course_id, course.course_title, course.level_name, course.training_type_name, length
    )
}

pub fn learner(learner: &LearnerProfile) -> String {
    format!(
        "{:>5}  {}  {:<20} {:<28} {:?}",
        learner.learner_data_id,
        learner.learner_id,
        learner.learner_name,
        learner.email_id,
        learner.status
    )
}

pub fn inventory(course_id: i64, entry: Option<&CourseInventory>) -> String {
    let Some(entry) = entry.filter(|entry| entry.has_sessions()) else {
        return format!("{course_id:>5}  no sessions");
    };

    let classes: Vec<String> = entry.classes.iter().map(class).collect();

    format!("{course_id:>5}\n{}", classes.join("\n"))
}

fn class(class: &ClassSchedule) -> String {
    format!(
        "       {:>5}  {} to {}  {:<20} {} seats",
        class.class_id,
        class.start_date.format(DATE_FORMAT),
        class.end_date.format(DATE_FORMAT),
        class.location,
        class.seats
    )
}

pub fn program(program: &SupervisorProgram) -> String {
    let state = if program.published { "published" } else { "draft" };
    let courses: Vec<String> = program
        .course_sequence
        .iter()
        .map(ToString::to_string)
        .collect();

    format!(
        "{}  {:<36} {:<9} [{}]",
        program.id,
        program.program_name,
        state,
        courses.join(", ")
    )
}

pub fn program_overview(overview: &ProgramOverview) -> String {
    let mut lines = vec![
        program(&overview.program),
        format!("  total: {}", overview.duration),
    ];
    lines.extend(overview.courses.iter().map(|item| format!("  {}", course(item))));
    lines.extend(
        overview
            .unresolved
            .iter()
            .map(|course_id| format!("  {course_id:>5}  (no longer in catalog)")),
    );

    lines.join("\n")
}

pub fn assignment(assignment: &ProgramAssignment) -> String {
    format!(
        "{}  {} -> {}  {:?}",
        assignment.id, assignment.learner_id, assignment.program_id, assignment.status
    )
}

pub fn enrollment(enrollment: &CourseEnrollment) -> String {
    format!(
        "{}  {} in course {} class {} ({})",
        enrollment.id,
        enrollment.learner_id,
        enrollment.course_id,
        enrollment.class_id,
        enrollment.program_id
    )
}

pub fn roster_entry(entry: &RosterEntry) -> String {
    format!(
        "{:<20} {:<12} {}",
        entry.learner.learner_name, entry.status, entry.learner.learner_id
    )
}

pub fn dashboard_metrics(metrics: &DashboardMetrics) -> String {
    format!(
        "students: {}\nenrolled: {}\npending invites: {}\npublished programs: {}",
        metrics.total_students,
        metrics.enrolled_students,
        metrics.pending_invites,
        metrics.programs_created
    )
}

pub fn assigned_program(assigned: &AssignedProgram, inventory: &InventoryMap) -> String {
    let overview = &assigned.overview;
    let mut lines = vec![format!(
        "{}  ({}, {:?})",
        overview.program.program_name, overview.duration, assigned.assignment.status
    )];

    for item in &overview.courses {
        let booking = match assigned.enrollment_for(item.course_id) {
            Some(enrollment) => format!("enrolled in class {}", enrollment.class_id),
            None if inventory.has_available_sessions(item.course_id) => {
                "sessions available".to_owned()
            }
            None => "no sessions".to_owned(),
        };
        lines.push(format!("  {:>5}  {:<48} {}", item.course_id, item.course_title, booking));
    }

    lines.join("\n")
}

pub fn progress_row(row: &ProgressRow) -> String {
    format!(
        "  {:>5}  {:<48} {:<36} {}",
        row.course.course_id, row.course.course_title, row.program.program_name, row.status
    )
}

pub fn progress_metrics(metrics: &ProgressMetrics) -> String {
    format!(
        "completed {} / incomplete {} / not enrolled {} of {} courses in {} programs ({:.0}%)",
        metrics.completed,
        metrics.incomplete,
        metrics.not_enrolled,
        metrics.total_courses,
        metrics.programs_assigned,
        metrics.completion_percentage
    )
}
