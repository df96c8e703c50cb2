//! tally - client for the tallyd earnings service
//!
//! Talks to a running tallyd over its Unix socket, or works offline
//! from a JSON backup file (`--backup`), which is how the old report
//! scripts were run against exported data.

mod report;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tally_api::{Command, ResponsePayload, ResponseResult, SessionFilter, SessionRecord};
use tally_ipc::IpcClient;
use tally_util::{default_socket_path, format_date, week_of};
use tracing_subscriber::EnvFilter;

/// tally - earnings reports and session queries for the practice
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Earnings reports and session queries for the practice", long_about = None)]
struct Cli {
    /// Socket path of a running tallyd
    #[arg(short, long, env = "TALLY_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    /// Read sessions from a JSON backup file instead of tallyd
    #[arg(short, long)]
    backup: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List sessions with per-session totals
    Sessions {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Totals and per-location / per-day figures
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// The full analysis summary
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Daily, weekly, or monthly earnings report
    Report {
        #[command(subcommand)]
        shape: ReportShape,
    },

    /// Highest-earning days
    BestDays {
        #[command(flatten)]
        filter: FilterArgs,

        /// How many days to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Sync bookkeeping of the running service
    SyncStatus,

    /// Check that the service is up
    Ping,
}

#[derive(Subcommand, Debug)]
enum ReportShape {
    /// One day in detail
    Daily {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,

        /// Restrict to one location
        #[arg(long)]
        location: Option<String>,
    },

    /// Monday-to-Sunday week
    Weekly {
        /// Any date in the week (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Restrict to one location
        #[arg(long)]
        location: Option<String>,
    },

    /// Calendar month
    Monthly {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Restrict to one location
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Location id (e.g. "soul-bridge", "halo")
    #[arg(long)]
    location: Option<String>,
}

impl FilterArgs {
    fn to_session_filter(&self) -> SessionFilter {
        SessionFilter {
            start_date: self.from,
            end_date: self.to,
            location: self.location.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        CliCommand::Sessions { ref filter } => {
            let sessions = fetch_sessions(&cli, &filter.to_session_filter()).await?;
            print_sessions(&sessions);
        }

        CliCommand::Stats { ref filter } => {
            let sessions = fetch_sessions(&cli, &filter.to_session_filter()).await?;
            print_stats(&sessions);
        }

        CliCommand::Summary { ref filter } => {
            let sessions = fetch_sessions(&cli, &filter.to_session_filter()).await?;
            let summary = tally_core::summarize(&sessions);
            print!("{}", report::summary_report(&summary));
        }

        CliCommand::Report { ref shape } => {
            run_report(&cli, shape).await?;
        }

        CliCommand::BestDays { ref filter, limit } => {
            let sessions = fetch_sessions(&cli, &filter.to_session_filter()).await?;
            for (i, day) in tally_core::best_days(&sessions, limit).iter().enumerate() {
                println!("{}. {}: {}", i + 1, format_date(day.date), day.total);
            }
        }

        CliCommand::SyncStatus => {
            let payload = send_command(&cli, Command::GetSyncStatus).await?;
            let ResponsePayload::SyncStatus(status) = payload else {
                bail!("unexpected response to sync-status");
            };
            println!("Total sessions: {}", status.total_sessions);
            match status.last_sync {
                Some(sync) => println!(
                    "Last sync: {} sessions from {} at {}",
                    sync.session_count,
                    sync.device_id,
                    sync.timestamp.format("%Y-%m-%d %H:%M:%S")
                ),
                None => println!("Last sync: never"),
            }
            for (date, count) in &status.sessions_by_date {
                println!("  {}: {}", format_date(*date), count);
            }
        }

        CliCommand::Ping => {
            let payload = send_command(&cli, Command::Ping).await?;
            match payload {
                ResponsePayload::Pong => println!("tallyd is up"),
                _ => bail!("unexpected response to ping"),
            }
        }
    }

    Ok(())
}

async fn run_report(cli: &Cli, shape: &ReportShape) -> Result<()> {
    match shape {
        ReportShape::Daily { date, location } => {
            let filter = SessionFilter {
                start_date: Some(*date),
                end_date: Some(*date),
                location: location.clone(),
            };
            let sessions = fetch_sessions(cli, &filter).await?;
            print!("{}", report::daily_report(*date, &sessions));
        }

        ReportShape::Weekly { start, location } => {
            let (start, end) = week_of(start.unwrap_or_else(tally_util::today));
            let filter = SessionFilter {
                start_date: Some(start),
                end_date: Some(end),
                location: location.clone(),
            };
            let sessions = fetch_sessions(cli, &filter).await?;
            print!("{}", report::weekly_report(start, end, &sessions));
        }

        ReportShape::Monthly { month, location } => {
            let month = month
                .clone()
                .unwrap_or_else(|| tally_util::today().format("%Y-%m").to_string());
            let (start, end) = tally_util::parse_month(&month)?;
            let filter = SessionFilter {
                start_date: Some(start),
                end_date: Some(end),
                location: location.clone(),
            };
            let sessions = fetch_sessions(cli, &filter).await?;
            print!("{}", report::monthly_report(&month, &sessions));
        }
    }
    Ok(())
}

/// Fetch sessions from the backup file if one was given, otherwise from
/// the running service.
async fn fetch_sessions(cli: &Cli, filter: &SessionFilter) -> Result<Vec<SessionRecord>> {
    if let Some(path) = &cli.backup {
        let sessions = load_backup(path)?;
        return Ok(sessions
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect());
    }

    let payload = send_command(cli, Command::ListSessions {
        filter: filter.clone(),
    })
    .await?;
    match payload {
        ResponsePayload::Sessions(sessions) => Ok(sessions),
        _ => bail!("unexpected response to session listing"),
    }
}

/// Load a JSON backup: an array of wire-shaped session records.
fn load_backup(path: &PathBuf) -> Result<Vec<SessionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup file {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in backup file {:?}", path))
}

async fn send_command(cli: &Cli, command: Command) -> Result<ResponsePayload> {
    if cli.backup.is_some() {
        bail!("this command needs a running tallyd (remove --backup)");
    }

    let mut client = IpcClient::connect(&cli.socket)
        .await
        .with_context(|| format!("Failed to connect to tallyd at {:?}", cli.socket))?;

    let response = client.send(command).await?;
    match response.result {
        ResponseResult::Ok(payload) => Ok(payload),
        ResponseResult::Err(e) => bail!("tallyd error: {} ({:?})", e.message, e.code),
    }
}

fn print_sessions(sessions: &[SessionRecord]) {
    if sessions.is_empty() {
        println!("No sessions.");
        return;
    }

    println!(
        "{:<12} {:<20} {:<14} {:>9} {:>6} {:>10}",
        "DATE", "ID", "LOCATION", "SERVICES", "TIPS", "TOTAL"
    );
    for session in sessions {
        println!(
            "{:<12} {:<20} {:<14} {:>9} {:>6} {:>10}",
            format_date(session.date),
            session.id.to_string(),
            session.location,
            session.services.len(),
            session.tips.to_string(),
            tally_core::session_total(session).to_string(),
        );
    }
    println!();
    println!(
        "{} sessions, gross total {}",
        sessions.len(),
        tally_core::total(sessions)
    );
}

fn print_stats(sessions: &[SessionRecord]) {
    let summary = tally_core::summarize(sessions);

    println!("Total sessions: {}", summary.total_sessions);
    println!("Total earnings: {}", summary.total_earnings);

    if !summary.earnings_by_location.is_empty() {
        println!();
        println!("By location:");
        for (location, earnings) in &summary.earnings_by_location {
            let count = summary
                .sessions_by_location
                .get(location)
                .copied()
                .unwrap_or(0);
            println!("  {}: {} ({} sessions)", location, earnings, count);
        }
    }

    if !summary.daily.is_empty() {
        println!();
        println!("By date:");
        for (date, metrics) in &summary.daily {
            println!(
                "  {}: {} ({} sessions, tips {})",
                format_date(*date),
                metrics.total(),
                metrics.sessions,
                metrics.tips
            );
        }
    }
}
