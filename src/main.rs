use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todo_cli::commands::*;
use todo_cli::error::{exit_codes, Result};
use todo_cli::filter::ListOptions;
use todo_cli::lifecycle::Clock;
use todo_cli::prompt::Console;
use todo_cli::storage::{db_path, Store};

#[derive(Parser)]
#[command(name = "todo", version)]
#[command(about = "GTD-style task manager for the terminal", long_about = None)]
struct Cli {
    /// Path to the SQLite database (defaults to $TODO_DB or ~/.todo/database.sqlite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new task
    #[command(name = "task:add", visible_alias = "add")]
    Add {
        /// Task name
        #[arg(long)]
        name: Option<String>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Priority name
        #[arg(long)]
        priority: Option<String>,
        /// Deadline in YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
        /// Expected date in YYYY-MM-DD
        #[arg(long)]
        expected_date: Option<String>,
    },
    /// Edit an existing task
    #[command(name = "task:edit", visible_alias = "edit")]
    Edit {
        /// The task ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description ('clear' removes it)
        #[arg(long)]
        description: Option<String>,
        /// New category name
        #[arg(long)]
        category: Option<String>,
        /// New priority name
        #[arg(long)]
        priority: Option<String>,
        /// New deadline in YYYY-MM-DD, or 'clear'
        #[arg(long)]
        deadline: Option<String>,
        /// New expected date in YYYY-MM-DD, or 'clear'
        #[arg(long)]
        expected_date: Option<String>,
    },
    /// List and filter tasks
    #[command(name = "task:list", visible_alias = "list")]
    List {
        /// Filter by status name
        #[arg(long)]
        status: Option<String>,
        /// Filter by category name
        #[arg(long)]
        category: Option<String>,
        /// Filter by priority name
        #[arg(long)]
        priority: Option<String>,
        /// Show only overdue tasks
        #[arg(long)]
        overdue: bool,
        /// Include done and cancelled tasks
        #[arg(long)]
        all: bool,
        /// Search in name and description
        #[arg(long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show all unprocessed tasks in your inbox
    #[command(name = "task:inbox", visible_alias = "inbox")]
    Inbox {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show detailed information about a task
    #[command(name = "task:show", visible_alias = "show")]
    Show {
        /// The task ID
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Change a task's status
    #[command(name = "task:status", visible_alias = "status")]
    Status {
        /// The task ID
        id: i64,
        /// The new status name
        status: Option<String>,
    },
    /// Weekly review: process inbox, review active tasks, handle overdue items
    #[command(name = "task:review", visible_alias = "review")]
    Review,
    /// Set up statuses, priorities, and categories
    #[command(name = "task:install", visible_alias = "install")]
    Install {
        /// Use the default statuses, priorities and categories without asking
        #[arg(long)]
        defaults: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

fn init_tracing() {
    // Opt-in via RUST_LOG; stderr keeps logs out of table output.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Opens the database and runs the installation check.
fn open_store(path: &std::path::Path) -> Result<Store> {
    let store = Store::open(path)?;
    store.ensure_installed()?;
    Ok(store)
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.db.unwrap_or_else(db_path);
    let mut console = Console::stdio();
    let clock = Clock::system();

    match cli.command {
        Commands::Install { defaults } => {
            cmd_install(&path, &mut console, defaults)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "todo", &mut io::stdout());
        }
        Commands::Add {
            name,
            description,
            category,
            priority,
            deadline,
            expected_date,
        } => {
            let store = open_store(&path)?;
            let args = AddArgs {
                name,
                description,
                category,
                priority,
                deadline,
                expected_date,
            };
            cmd_add(&store, &mut console, args)?;
        }
        Commands::Edit {
            id,
            name,
            description,
            category,
            priority,
            deadline,
            expected_date,
        } => {
            let store = open_store(&path)?;
            let args = EditArgs {
                name,
                description,
                category,
                priority,
                deadline,
                expected_date,
            };
            cmd_edit(&store, &mut console, id, args)?;
        }
        Commands::List {
            status,
            category,
            priority,
            overdue,
            all,
            search,
            json,
        } => {
            let store = open_store(&path)?;
            let options = ListOptions {
                status,
                category,
                priority,
                overdue,
                all,
                search,
            };
            cmd_list(&store, &mut console, &options, json, clock)?;
        }
        Commands::Inbox { json } => {
            let store = open_store(&path)?;
            cmd_inbox(&store, &mut console, json, clock)?;
        }
        Commands::Show { id, json } => {
            let store = open_store(&path)?;
            cmd_show(&store, &mut console, id, json, clock)?;
        }
        Commands::Status { id, status } => {
            let store = open_store(&path)?;
            cmd_status(&store, &mut console, id, status, clock)?;
        }
        Commands::Review => {
            let store = open_store(&path)?;
            cmd_review(&store, &mut console, clock)?;
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("  {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
