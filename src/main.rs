// Rust Schedule
// Command line entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

/// Schedules with solar and lunar recurrence, stored in SQLite
#[derive(Parser, Debug)]
#[command(name = "rust-schedule")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configured one
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and the local account
    Init,
    /// List the schedule types of the local account
    Types,
    /// Add a user schedule type
    AddType {
        name: String,
        /// Hex color such as #FF8800
        #[arg(default_value = "#6B7280")]
        color: String,
    },
    /// Add a schedule
    Add(cli::AddArgs),
    /// Delete a schedule, or one occurrence of a recurring schedule
    Delete {
        id: i64,
        /// Start of the single occurrence to remove
        #[arg(long)]
        occurrence: Option<String>,
    },
    /// Show occurrences between two dates, grouped by day
    Range {
        /// First day (YYYY-MM-DD)
        from: String,
        /// Day after the last one shown (YYYY-MM-DD)
        to: String,
        #[arg(short, long)]
        keyword: Option<String>,
        /// Keep only the first N occurrences
        #[arg(short, long)]
        top: Option<usize>,
        /// Keep only one recurrence kind (daily, weekly, lunar-yearly, ...)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Show one day
    Day {
        /// YYYY-MM-DD, today when omitted
        date: Option<String>,
    },
    /// Search titles, descriptions and locations around today
    Search {
        keyword: String,
        /// Months either side of today (defaults to the configured window)
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// List the next occurrences from now
    Upcoming {
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// List alarms firing in the next N hours
    Reminders {
        #[arg(long, default_value = "24")]
        hours: i64,
    },
    /// Export every schedule of the local account to an .ics file
    Export { output: PathBuf },
    /// Import an .ics file into a schedule type
    Import {
        input: PathBuf,
        /// Target type name or id
        #[arg(short = 't', long = "type", default_value = "Other")]
        type_ref: String,
    },
    /// Show lunar calendar details for a date
    Lunar {
        /// YYYY-MM-DD, today when omitted
        date: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = cli::load_settings(args.config.as_deref())?;
    let ctx = cli::Context::open(settings, args.database, args.json)?;

    match args.command {
        Command::Init => ctx.init(),
        Command::Types => ctx.types(),
        Command::AddType { name, color } => ctx.add_type(&name, &color),
        Command::Add(add) => ctx.add(add),
        Command::Delete { id, occurrence } => ctx.delete(id, occurrence.as_deref()),
        Command::Range {
            from,
            to,
            keyword,
            top,
            kind,
        } => ctx.range(&from, &to, keyword, top, kind.as_deref()),
        Command::Day { date } => ctx.day(date.as_deref()),
        Command::Search { keyword, months } => ctx.search(&keyword, months),
        Command::Upcoming { count } => ctx.upcoming(count),
        Command::Reminders { hours } => ctx.reminders(hours),
        Command::Export { output } => ctx.export(&output),
        Command::Import { input, type_ref } => ctx.import(&input, &type_ref),
        Command::Lunar { date } => ctx.lunar(date.as_deref()),
    }
}
