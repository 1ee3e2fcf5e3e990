use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use training_programs::config::{
    DEFAULT_CONTENT_API_BASE, DEFAULT_LEGACY_API_BASE, DEFAULT_LOCAL_API_BASE,
};
use training_programs::data::{Level, TrainingType};
use training_programs::resolve::CourseStatus;
use training_programs::{
    ContentGateway, Dashboard, Environment, Fetcher, FileStorage, GatewayConfig, LegacyGateway,
    LocalGateway, LocalStore,
};
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod format;

/// Training program data tool
#[derive(Parser)]
#[clap(name = "programs", version)]
struct Programs {
    #[clap(
        long,
        env = "PROGRAMS_LEGACY_API_BASE",
        value_parser,
        default_value = DEFAULT_LEGACY_API_BASE
    )]
    legacy_api_base: Url,

    #[clap(
        long,
        env = "PROGRAMS_CONTENT_API_BASE",
        value_parser,
        default_value = DEFAULT_CONTENT_API_BASE
    )]
    content_api_base: Url,

    #[clap(
        long,
        env = "PROGRAMS_LOCAL_API_BASE",
        value_parser,
        default_value = DEFAULT_LOCAL_API_BASE
    )]
    local_api_base: Url,

    /// `production` never calls the local API
    #[clap(long = "env", env = "PROGRAMS_ENV", value_parser, default_value = "production")]
    environment: Environment,

    /// Directory holding the local store document
    #[clap(
        long,
        env = "PROGRAMS_DATA_DIR",
        value_parser,
        value_name = "PATH",
        default_value = ".programs"
    )]
    data_dir: PathBuf,

    /// Artificial delay for local store operations
    #[clap(long, env = "PROGRAMS_LATENCY_MS", value_parser)]
    latency_ms: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

impl Programs {
    fn config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(
            self.legacy_api_base.clone(),
            self.content_api_base.clone(),
            self.local_api_base.clone(),
        )
        .with_environment(self.environment);

        match self.latency_ms {
            Some(latency_ms) => config.with_local_latency(Duration::from_millis(latency_ms)),
            None => config,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List catalog courses
    Catalog {
        #[clap(short, long, value_parser)]
        search: Option<String>,

        #[clap(short, long, value_enum)]
        level: Option<LevelArg>,

        #[clap(short = 't', long = "type", value_enum)]
        training_types: Vec<TrainingTypeArg>,
    },

    /// List learners
    Roster,

    /// Show bookable sessions for one course or for every course
    Inventory {
        #[clap(value_parser, required_unless_present = "all")]
        course_id: Option<i64>,

        /// Every course, merged with the bundled schedules
        #[clap(long)]
        all: bool,
    },

    Testimonials,

    Programs {
        #[clap(subcommand)]
        command: ProgramCommand,
    },

    /// Assign a program to one or more learners
    Assign {
        #[clap(value_parser)]
        program_id: String,

        #[clap(value_parser, required = true)]
        learner_ids: Vec<String>,
    },

    /// Enroll a learner in a class session
    Enroll {
        #[clap(value_parser)]
        learner_id: String,
        #[clap(value_parser)]
        program_id: String,
        #[clap(value_parser)]
        course_id: i64,
        #[clap(value_parser)]
        class_id: i64,
    },

    /// Roster with each learner's status for a program
    Status {
        #[clap(value_parser)]
        program_id: String,
    },

    /// Supervisor dashboard metrics
    Metrics,

    /// Programs assigned to a learner
    Learner {
        #[clap(value_parser)]
        learner_id: String,
    },

    /// Course-level progress for a learner id or legacy data id
    Progress {
        #[clap(value_parser)]
        learner: String,

        /// Course ids the learner has finished
        #[clap(long, value_parser, value_delimiter = ',')]
        completed: Vec<i64>,

        #[clap(short, long, value_parser)]
        search: Option<String>,

        #[clap(short, long, value_enum)]
        level: Vec<LevelArg>,

        #[clap(long, value_enum)]
        status: Vec<StatusArg>,
    },

    /// Drop local changes and start over from the seed data
    Reset,
}

#[derive(Subcommand)]
pub enum ProgramCommand {
    List,

    Show {
        #[clap(value_parser)]
        id: String,
    },

    Create {
        #[clap(long, value_parser)]
        name: String,

        #[clap(long, value_parser, default_value = "")]
        description: String,

        #[clap(long = "tag", value_parser)]
        tags: Vec<String>,

        /// Course ids in the order learners take them
        #[clap(long, value_parser, value_delimiter = ',')]
        courses: Vec<i64>,

        #[clap(long, value_parser, default_value = "supervisor")]
        supervisor: String,
    },

    Publish {
        #[clap(value_parser)]
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy)]
pub enum LevelArg {
    Basic,
    Advanced,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Basic => Level::Basic,
            LevelArg::Advanced => Level::Advanced,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
pub enum TrainingTypeArg {
    Ilt,
    Elearning,
}

impl From<TrainingTypeArg> for TrainingType {
    fn from(training_type: TrainingTypeArg) -> Self {
        match training_type {
            TrainingTypeArg::Ilt => TrainingType::Ilt,
            TrainingTypeArg::Elearning => TrainingType::ELearning,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
pub enum StatusArg {
    Completed,
    Incomplete,
    NotEnrolled,
}

impl From<StatusArg> for CourseStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Completed => CourseStatus::Completed,
            StatusArg::Incomplete => CourseStatus::Incomplete,
            StatusArg::NotEnrolled => CourseStatus::NotEnrolled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("training_programs=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let programs = Programs::parse();
    let config = programs.config();

    let fetcher = Fetcher::new();
    let store = LocalStore::new(FileStorage::new(&programs.data_dir));
    let dashboard = Dashboard::new(
        LegacyGateway::new(fetcher.clone(), &config),
        LocalGateway::new(fetcher.clone(), &config, store),
    );
    let content = ContentGateway::new(fetcher, &config);

    commands::run(programs.command, &dashboard, &content).await
}
