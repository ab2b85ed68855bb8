mod config;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use prostart_api::conversations::{
    append_message, find_or_create_direct_conversation, open_conversation,
};
use prostart_api::handoff::{self, Intent};
use prostart_api::middleware::require_identity;
use prostart_api::{ApiError, ApiResult, auth, mentors, messenger, profile, tasks};
use prostart_db::Database;
use prostart_types::api::{
    Identity, LoginRequest, NewTaskRequest, ProfilePatch, RegisterRequest, TaskFilter,
};
use prostart_types::models::{ConversationId, DirectKind, Role, TaskId, UserId};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "prostart", version, about = "Student, mentor and company marketplace on a local store")]
struct Cli {
    /// Store file; overrides PROSTART_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// student, mentor or company
        #[arg(long)]
        role: Role,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    /// Show the logged-in account
    Whoami,
    #[command(subcommand)]
    Tasks(TaskCommand),
    #[command(subcommand)]
    Mentors(MentorCommand),
    #[command(subcommand)]
    Students(StudentCommand),
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Messenger(MessengerCommand),
    /// Print every raw entry of the store
    Dump,
}

#[derive(Subcommand)]
enum TaskCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        level: Option<String>,
    },
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        direction: String,
        #[arg(long)]
        level: String,
    },
    Apply {
        task_id: TaskId,
    },
    Assign {
        task_id: TaskId,
        student_id: UserId,
    },
    Applicants {
        task_id: TaskId,
    },
    /// Open the conversation with the task's company
    Chat {
        task_id: TaskId,
    },
}

#[derive(Subcommand)]
enum MentorCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        expertise: Option<String>,
    },
    /// Write to a mentor (students)
    Chat {
        mentor_id: UserId,
    },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// Write to a student (mentors)
    Chat {
        student_id: UserId,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        expertise: Option<String>,
    },
}

#[derive(Subcommand)]
enum MessengerCommand {
    /// List dialogs, applying any pending chat request
    Open,
    Show {
        conversation_id: ConversationId,
    },
    Send {
        conversation_id: ConversationId,
        text: String,
    },
    /// Start or reopen a direct conversation with any user
    Direct {
        user_id: UserId,
    },
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prostart=info,prostart_api=warn,prostart_db=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.db);
    let db = Database::open(&config.db_path, config.seed)?;

    match run(&db, cli.command) {
        Ok(()) => Ok(()),
        Err(ApiError::Storage(e)) => Err(e),
        Err(e) => {
            debug!(error = ?e, "command failed");
            eprintln!("{}", render::notice(&e));
            std::process::exit(1);
        }
    }
}

fn run(db: &Database, command: Command) -> ApiResult<()> {
    match command {
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            let identity = auth::register(
                db,
                RegisterRequest {
                    name,
                    email,
                    password,
                    role,
                },
            )?;
            println!("Registration successful! Welcome, {}.", identity.name);
        }
        Command::Login { email, password } => {
            let identity = auth::login(db, LoginRequest { email, password })?;
            println!("Welcome, {}.", identity.name);
        }
        Command::Logout => {
            auth::logout(db)?;
            println!("You have logged out.");
        }
        Command::Whoami => match auth::current_user(db)? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not logged in."),
        },
        Command::Tasks(cmd) => run_tasks(db, cmd)?,
        Command::Mentors(MentorCommand::List { search, expertise }) => {
            let found = mentors::filter_mentors(db, search.as_deref(), expertise.as_deref())?;
            print!("{}", render::users(&found, "No mentors match these criteria."));
        }
        Command::Mentors(MentorCommand::Chat { mentor_id }) => {
            let identity = require_identity(db)?;
            handoff::stash(db, Intent::MentorChat(mentor_id))?;
            open_messenger(db, &identity)?;
        }
        Command::Students(StudentCommand::Chat { student_id }) => {
            let identity = require_identity(db)?;
            handoff::stash(db, Intent::StudentChat(student_id))?;
            open_messenger(db, &identity)?;
        }
        Command::Profile(ProfileCommand::Show) => {
            let identity = require_identity(db)?;
            let user = profile::load_profile(db, &identity)?;
            let own_tasks = match user.role {
                Role::Company => tasks::tasks_for_company(db, user.id)?,
                _ => vec![],
            };
            print!("{}", render::profile(&user, &own_tasks));
        }
        Command::Profile(ProfileCommand::Edit {
            name,
            email,
            expertise,
        }) => {
            let identity = require_identity(db)?;
            let user = profile::update_profile(
                db,
                &identity,
                ProfilePatch {
                    name,
                    email,
                    expertise,
                },
            )?;
            println!("Profile saved.");
            print!("{}", render::profile(&user, &[]));
        }
        Command::Messenger(cmd) => {
            let identity = require_identity(db)?;
            match cmd {
                MessengerCommand::Open => open_messenger(db, &identity)?,
                MessengerCommand::Show { conversation_id } => {
                    show_conversation(db, &identity, conversation_id)?
                }
                MessengerCommand::Send {
                    conversation_id,
                    text,
                } => {
                    append_message(db, &identity, conversation_id, &text)?;
                    show_conversation(db, &identity, conversation_id)?;
                }
                MessengerCommand::Direct { user_id } => {
                    let conversation =
                        find_or_create_direct_conversation(db, &identity, user_id, DirectKind::Direct)?;
                    show_conversation(db, &identity, conversation.id)?;
                }
            }
        }
        Command::Dump => print!("{}", render::entries(&db.entries()?)),
    }
    Ok(())
}

fn run_tasks(db: &Database, cmd: TaskCommand) -> ApiResult<()> {
    match cmd {
        TaskCommand::List {
            search,
            direction,
            level,
        } => {
            let found = tasks::filter_tasks(
                db,
                &TaskFilter {
                    search,
                    direction,
                    level,
                },
            )?;
            let viewer = auth::current_user(db)?.map(|u| u.id);
            print!("{}", render::tasks(&found, viewer));
        }
        TaskCommand::Publish {
            title,
            description,
            direction,
            level,
        } => {
            let identity = require_identity(db)?;
            let task = tasks::publish_task(
                db,
                &identity,
                NewTaskRequest {
                    title,
                    description,
                    direction,
                    level,
                },
            )?;
            println!("Task \"{}\" published (id {}).", task.title, task.id);
        }
        TaskCommand::Apply { task_id } => {
            let identity = require_identity(db)?;
            let task = tasks::apply_to_task(db, &identity, task_id)?;
            println!("You applied to task \"{}\".", task.title);
        }
        TaskCommand::Assign {
            task_id,
            student_id,
        } => {
            let identity = require_identity(db)?;
            let task = tasks::assign_task(db, &identity, task_id, student_id)?;
            println!("Task \"{}\" is now {}.", task.title, task.status);
        }
        TaskCommand::Applicants { task_id } => {
            let found = tasks::applicants(db, task_id)?;
            print!("{}", render::users(&found, "No applications for this task yet."));
        }
        TaskCommand::Chat { task_id } => {
            let identity = require_identity(db)?;
            let task = db.task_by_id(task_id)?.ok_or(ApiError::TaskNotFound(task_id))?;
            if !task.can_chat(identity.user_id) {
                return Err(ApiError::Forbidden("apply to the task before opening its chat"));
            }
            handoff::stash(db, Intent::TaskChat(task_id))?;
            open_messenger(db, &identity)?;
        }
    }
    Ok(())
}

fn open_messenger(db: &Database, identity: &Identity) -> ApiResult<()> {
    let intents = handoff::take_pending(db)?;
    let state = messenger::initialize(db, identity, &intents)?;
    print!("{}", render::messenger(&state));

    if let Some(active) = state.active {
        println!();
        show_conversation(db, identity, active)?;
    }
    Ok(())
}

fn show_conversation(db: &Database, identity: &Identity, conversation_id: ConversationId) -> ApiResult<()> {
    let view = open_conversation(db, identity, conversation_id)?;
    print!("{}", render::conversation(&view, identity.user_id));
    Ok(())
}
