use std::collections::HashSet;

use anyhow::{bail, Result};
use training_programs::data::{CourseEnrollment, LearnerStatus, ProgramAssignment};
use training_programs::resolve::ProgressFilter;
use training_programs::{CatalogFilter, ContentGateway, Dashboard, ProgramDraft};

use crate::format;
use crate::{Command, ProgramCommand};

pub async fn run(command: Command, dashboard: &Dashboard, content: &ContentGateway) -> Result<()> {
    let legacy = dashboard.legacy();
    let local = dashboard.local();

    match command {
        Command::Catalog {
            search,
            level,
            training_types,
        } => {
            let filter = CatalogFilter {
                search: search.unwrap_or_default(),
                level: level.map(Into::into),
                training_types: training_types.into_iter().map(Into::into).collect(),
            };
            let catalog = legacy.get_catalog().await?;

            for course in filter.apply(&catalog) {
                println!("{}", format::course(course));
            }
        }

        Command::Roster => {
            for learner in legacy.get_roster().await? {
                println!("{}", format::learner(&learner));
            }
        }

        Command::Inventory { course_id, all } => {
            if all {
                let inventory = legacy.get_all_inventory().await?;
                for (course_id, entry) in inventory.iter() {
                    println!("{}", format::inventory(course_id, entry));
                }
            } else if let Some(course_id) = course_id {
                let entry = legacy.get_inventory(course_id).await?;
                println!("{}", format::inventory(course_id, entry.as_ref()));
            }
        }

        Command::Testimonials => {
            for testimonial in content.get_testimonials().await? {
                println!("{}", serde_json::to_string(&testimonial)?);
            }
        }

        Command::Programs { command } => run_program_command(command, dashboard).await?,

        Command::Assign {
            program_id,
            learner_ids,
        } => {
            let program = local.get_program_by_id(&program_id).await?;
            let roster = legacy.get_roster().await?;

            let inactive: Vec<&str> = roster
                .iter()
                .filter(|learner| learner.status == LearnerStatus::Inactive)
                .filter(|learner| learner_ids.contains(&learner.learner_id))
                .map(|learner| learner.learner_name.as_str())
                .collect();
            if !inactive.is_empty() {
                bail!("cannot assign inactive learners: {}", inactive.join(", "));
            }

            if let [learner_id] = learner_ids.as_slice() {
                let assignment = local
                    .assign_program(ProgramAssignment::pending(learner_id.as_str(), &program.id))
                    .await?;
                println!("{}", format::assignment(&assignment));

                return Ok(());
            }

            let report = local.assign_program_batch(&learner_ids, &program.id).await;
            for assignment in &report.assigned {
                println!("{}", format::assignment(assignment));
            }
            for (learner_id, err) in &report.failed {
                eprintln!("failed to assign {learner_id}: {err}");
            }
            if !report.is_complete() {
                bail!(
                    "{} of {} assignments failed",
                    report.failed.len(),
                    report.failed.len() + report.assigned.len()
                );
            }
        }

        Command::Enroll {
            learner_id,
            program_id,
            course_id,
            class_id,
        } => {
            let enrollment = local
                .enroll_student(CourseEnrollment::new(
                    learner_id, program_id, course_id, class_id,
                ))
                .await?;
            println!("{}", format::enrollment(&enrollment));
        }

        Command::Status { program_id } => {
            for entry in dashboard.roster_status(&program_id).await? {
                println!("{}", format::roster_entry(&entry));
            }
        }

        Command::Metrics => {
            let metrics = dashboard.supervisor_metrics().await?;
            println!("{}", format::dashboard_metrics(&metrics));
        }

        Command::Learner { learner_id } => {
            let loaded = dashboard.student_programs(&learner_id).await?;
            for assigned in &loaded.programs {
                println!("{}", format::assigned_program(assigned, &loaded.inventory));
            }
        }

        Command::Progress {
            learner,
            completed,
            search,
            level,
            status,
        } => {
            let completed: HashSet<i64> = completed.into_iter().collect();
            let progress = dashboard.student_progress(&learner, &completed).await?;
            let filter = ProgressFilter {
                search: search.unwrap_or_default(),
                levels: level.into_iter().map(Into::into).collect(),
                statuses: status.into_iter().map(Into::into).collect(),
            };

            println!("{}", progress.learner.learner_name);
            for row in filter.apply(&progress.rows) {
                println!("{}", format::progress_row(row));
            }
            println!("{}", format::progress_metrics(&progress.metrics));
        }

        Command::Reset => {
            local.reset().await;
            println!("local store reset to seed data");
        }
    }

    Ok(())
}

async fn run_program_command(command: ProgramCommand, dashboard: &Dashboard) -> Result<()> {
    let local = dashboard.local();

    match command {
        ProgramCommand::List => {
            for program in local.get_all_programs().await? {
                println!("{}", format::program(&program));
            }
        }

        ProgramCommand::Show { id } => {
            let overview = dashboard.program_overview(&id).await?;
            println!("{}", format::program_overview(&overview));
        }

        ProgramCommand::Create {
            name,
            description,
            tags,
            courses,
            supervisor,
        } => {
            let catalog = dashboard.legacy().get_catalog().await?;

            let mut draft = ProgramDraft::new(name);
            draft.description = description;
            draft.tags = tags;
            for course_id in courses {
                let Some(course) = catalog.iter().find(|course| course.course_id == course_id)
                else {
                    bail!("course {course_id} is not in the catalog");
                };
                draft.add_course(course.clone());
            }

            println!("total duration: {}", draft.total_duration());
            let program = local.create_program(draft.into_program(supervisor)).await?;
            println!("{}", format::program(&program));
        }

        ProgramCommand::Publish { id } => {
            let program = local.publish_program(&id).await?;
            println!("{}", format::program(&program));
        }
    }

    Ok(())
}
