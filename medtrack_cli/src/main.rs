use clap::{Parser, Subcommand};
use medtrack_core::service;
use medtrack_core::*;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Recurring medication schedule tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add medicines to a user's schedule from JSON (file or stdin)
    Add {
        #[arg(long)]
        user: String,

        /// JSON file holding one medicine object or an array of them
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show the medicines due on a date, grouped by time slot
    View {
        #[arg(long)]
        user: String,

        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Mark a dose as taken (or not taken)
    Mark {
        #[arg(long)]
        user: String,

        #[arg(long)]
        medicine: String,

        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// morning, afternoon or dinner
        #[arg(long)]
        slot: String,

        /// Record the dose as not taken
        #[arg(long)]
        untaken: bool,
    },

    /// Print the full schedule document
    Show {
        #[arg(long)]
        user: String,
    },

    /// Summarize taken vs. due doses
    Adherence {
        #[arg(long)]
        user: String,

        /// Count doses up to this date (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Export the taken ledger as CSV
    Export {
        #[arg(long)]
        user: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e.kind();
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("error[{}]: {}", kind.as_str(), e);
            if kind.is_input_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    medtrack_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonScheduleStore::in_data_dir(&data_dir);

    match cli.command {
        Commands::Add { user, file } => cmd_add(
            &store,
            &user,
            file.as_deref(),
            config.schedule.entry_limits(),
        ),
        Commands::View { user, date } => {
            let view = service::daily_view(&store, &user, &date)?;
            print_json(&view)
        }
        Commands::Mark {
            user,
            medicine,
            date,
            slot,
            untaken,
        } => {
            let mut sink = JsonlStatusSink::new(data_dir.join("status.log"));
            let request = StatusRequest::new(medicine, &date, &slot, !untaken);
            let update = service::update_status(
                &store,
                &mut sink,
                &user,
                &request,
                config.schedule.update_options(),
            )?;
            print_json(&update)
        }
        Commands::Show { user } => {
            let schedule = service::load_schedule(&store, &user)?;
            print_json(&schedule)
        }
        Commands::Adherence { user, as_of } => {
            let as_of = match as_of {
                Some(d) => dates::parse_date(&d)?,
                None => chrono::Utc::now().date_naive(),
            };
            let schedule = service::load_schedule(&store, &user)?;
            print_json(&adherence::report(&schedule, as_of))
        }
        Commands::Export { user, output } => {
            let schedule = service::load_schedule(&store, &user)?;
            match output {
                Some(path) => {
                    let rows = export::export_to_path(&schedule, &path)?;
                    eprintln!("✓ Exported {} rows to {}", rows, path.display());
                    Ok(())
                }
                None => {
                    export::write_ledger_csv(&schedule, io::stdout().lock())?;
                    Ok(())
                }
            }
        }
    }
}

fn cmd_add(
    store: &JsonScheduleStore,
    user: &str,
    file: Option<&Path>,
    limits: EntryLimits,
) -> Result<()> {
    let contents = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let raw: Value = serde_json::from_str(&contents)?;
    let raw_entries = match raw {
        Value::Array(items) => items,
        single => vec![single],
    };

    let created = service::create_entries(store, user, &raw_entries, limits)?;
    print_json(&created)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
