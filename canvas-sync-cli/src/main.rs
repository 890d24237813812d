mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use canvas_sync_core::config::{Overrides, Settings};
use clap::{ArgAction, Parser};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "canvas-sync")]
#[command(about = "Sync upcoming Canvas assignments into a CalDAV task list")]
struct Cli {
    /// Config file of `key = value` lines, keys named like the long flags
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The Canvas url to connect to
    #[arg(long)]
    canvas_url: Option<String>,

    /// The Canvas user to read courses and assignments for
    #[arg(long)]
    canvas_user_id: Option<String>,

    /// The Canvas API key to use
    #[arg(long)]
    canvas_api_key: Option<String>,

    /// The CalDAV server url
    #[arg(long)]
    caldav_url: Option<String>,

    #[arg(long)]
    caldav_user: Option<String>,

    #[arg(long)]
    caldav_password: Option<String>,

    /// Url of the calendar holding the todos
    #[arg(long)]
    caldav_calendar_url: Option<String>,

    /// Description prefix that marks the assignment id of a todo
    #[arg(long)]
    description_id_prefix: Option<String>,

    /// Category used to mark todos created from Canvas assignments
    #[arg(long)]
    category: Option<String>,

    /// Create todos for assignments due within this many days
    #[arg(long, allow_negative_numbers = true)]
    look_ahead: Option<i64>,

    /// Also create todos for assignments without a due date
    #[arg(long)]
    no_due: bool,

    /// IANA time zone for due dates, e.g. "America/Chicago"
    #[arg(long, conflicts_with = "timezone_offset")]
    timezone: Option<String>,

    /// Fixed hour offset from UTC for due dates (prefer --timezone)
    #[arg(long, allow_negative_numbers = true)]
    timezone_offset: Option<i64>,

    /// Due times at or before this local hour count as 23:59 of the previous day
    #[arg(long, allow_negative_numbers = true)]
    fallback_hour: Option<i64>,

    /// Leave todos of courses that are no longer active alone instead of failing
    #[arg(long)]
    skip_inactive_courses: bool,

    /// Show what would change without writing to the calendar
    #[arg(long)]
    dry_run: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            canvas_url: self.canvas_url.clone(),
            canvas_user_id: self.canvas_user_id.clone(),
            canvas_api_key: self.canvas_api_key.clone(),
            caldav_url: self.caldav_url.clone(),
            caldav_user: self.caldav_user.clone(),
            caldav_password: self.caldav_password.clone(),
            caldav_calendar_url: self.caldav_calendar_url.clone(),
            description_id_prefix: self.description_id_prefix.clone(),
            category: self.category.clone(),
            look_ahead: self.look_ahead,
            // Flags can only switch these on, the config file may too
            no_due: self.no_due.then_some(true),
            timezone: self.timezone.clone(),
            timezone_offset: self.timezone_offset,
            fallback_hour: self.fallback_hour,
            skip_inactive_courses: self.skip_inactive_courses.then_some(true),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "canvas_sync=info",
        1 => "canvas_sync=debug",
        _ => "canvas_sync=trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref(), &cli.overrides())?;
    settings.sync.dry_run = cli.dry_run;

    commands::sync::run(&settings).await
}
