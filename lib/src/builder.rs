//! Supervisor-side program drafting.

use crate::data::{CourseCatalogItem, Level, SupervisorProgram, TrainingType};
use crate::resolve::{total_duration, CourseDuration};

const DEFAULT_PROGRAM_NAME: &str = "My Program";

/// A program being assembled from catalog courses. Course order is the
/// order learners take them in.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDraft {
    pub program_name: String,
    pub description: String,
    pub tags: Vec<String>,
    courses: Vec<CourseCatalogItem>,
}

impl Default for ProgramDraft {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM_NAME)
    }
}

impl ProgramDraft {
    pub fn new(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
            description: String::new(),
            tags: Vec::new(),
            courses: Vec::new(),
        }
    }

    pub fn courses(&self) -> &[CourseCatalogItem] {
        &self.courses
    }

    /// Appends `course` unless it is already part of the draft. Returns
    /// whether it was added.
    pub fn add_course(&mut self, course: CourseCatalogItem) -> bool {
        if self.position(course.course_id).is_some() {
            return false;
        }

        self.courses.push(course);
        true
    }

    pub fn remove_course(&mut self, course_id: i64) -> Option<CourseCatalogItem> {
        let index = self.position(course_id)?;

        Some(self.courses.remove(index))
    }

    /// Moves `course_id` to the slot currently held by `over_id`, shifting
    /// the courses in between. Returns `false` if either is missing.
    pub fn move_course(&mut self, course_id: i64, over_id: i64) -> bool {
        let (Some(from), Some(to)) = (self.position(course_id), self.position(over_id)) else {
            return false;
        };

        let course = self.courses.remove(from);
        self.courses.insert(to, course);

        true
    }

    pub fn total_duration(&self) -> CourseDuration {
        total_duration(&self.courses)
    }

    /// An unsaved program ready for `LocalGateway::create_program`.
    pub fn into_program(self, supervisor_id: impl Into<String>) -> SupervisorProgram {
        let course_sequence = self.courses.iter().map(|course| course.course_id).collect();

        SupervisorProgram {
            description: self.description,
            tags: self.tags,
            ..SupervisorProgram::draft(supervisor_id, self.program_name, course_sequence)
        }
    }

    fn position(&self, course_id: i64) -> Option<usize> {
        self.courses
            .iter()
            .position(|course| course.course_id == course_id)
    }
}

/// Catalog browsing filter. Unset criteria match every course; several
/// training types match any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: String,
    pub level: Option<Level>,
    pub training_types: Vec<TrainingType>,
}

impl CatalogFilter {
    pub fn matches(&self, course: &CourseCatalogItem) -> bool {
        let search = self.search.trim().to_lowercase();

        let matches_search =
            search.is_empty() || course.course_title.to_lowercase().contains(&search);
        let matches_level = self.level.map_or(true, |level| course.level_name == level);
        let matches_type = self.training_types.is_empty()
            || self.training_types.contains(&course.training_type_name);

        matches_search && matches_level && matches_type
    }

    pub fn apply<'a>(&self, catalog: &'a [CourseCatalogItem]) -> Vec<&'a CourseCatalogItem> {
        catalog.iter().filter(|course| self.matches(course)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::COURSES;

    fn course(course_id: i64) -> CourseCatalogItem {
        COURSES
            .load()
            .unwrap()
            .into_iter()
            .find(|course| course.course_id == course_id)
            .unwrap()
    }

    fn ids(draft: &ProgramDraft) -> Vec<i64> {
        draft.courses().iter().map(|course| course.course_id).collect()
    }

    #[test]
    fn add_ignores_duplicates() {
        let mut draft = ProgramDraft::default();

        assert!(draft.add_course(course(11)));
        assert!(draft.add_course(course(9)));
        assert!(!draft.add_course(course(11)));

        assert_eq!(ids(&draft), vec![11, 9]);
        assert_eq!(draft.total_duration(), CourseDuration { days: 5, hours: 8 });
    }

    #[test]
    fn move_and_remove() {
        let mut draft = ProgramDraft::new("Ramp-up");
        for course_id in [116, 11, 9, 131] {
            draft.add_course(course(course_id));
        }

        assert!(draft.move_course(131, 11));
        assert_eq!(ids(&draft), vec![116, 131, 11, 9]);

        assert!(draft.move_course(116, 9));
        assert_eq!(ids(&draft), vec![131, 11, 9, 116]);

        assert!(!draft.move_course(116, 424242));
        assert_eq!(draft.remove_course(11).map(|course| course.course_id), Some(11));
        assert!(draft.remove_course(11).is_none());
        assert_eq!(ids(&draft), vec![131, 9, 116]);
    }

    #[test]
    fn into_program_keeps_order() {
        let mut draft = ProgramDraft::new("Lathe Track");
        draft.tags.push("Lathe".to_owned());
        draft.add_course(course(140));
        draft.add_course(course(90));

        let program = draft.into_program("pat_mann_guid");

        assert!(program.id.is_empty());
        assert!(!program.published);
        assert_eq!(program.program_name, "Lathe Track");
        assert_eq!(program.course_sequence, vec![140, 90]);
        assert_eq!(program.tags, vec!["Lathe".to_owned()]);
    }

    #[test]
    fn catalog_filter() {
        let catalog = COURSES.load().unwrap();

        let everything = CatalogFilter::default();
        assert_eq!(everything.apply(&catalog).len(), catalog.len());

        let advanced_elearning = CatalogFilter {
            level: Some(Level::Advanced),
            training_types: vec![TrainingType::ELearning],
            ..Default::default()
        };
        let found: Vec<i64> = advanced_elearning
            .apply(&catalog)
            .into_iter()
            .map(|course| course.course_id)
            .collect();
        assert_eq!(found, vec![152]);

        let nothing = CatalogFilter {
            search: "no such course".to_owned(),
            ..Default::default()
        };
        assert!(nothing.apply(&catalog).is_empty());
    }
}
