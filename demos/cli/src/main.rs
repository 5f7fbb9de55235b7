use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use schedule_api::envelope::decode_collection;
use schedule_api::{ApiConfig, CalendarSession, Dispatcher, HttpClient};
use schedule_core::{
    format_appointments, layout_week, AppState, Appointment, CalendarConfig, ScreenStatus,
    WeekLayout,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "schedule-cli", about = "Inspect clinic appointments as a week calendar.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print formatted appointments as JSON.
    Format {
        /// JSON file holding an array or an `{ "appointments": [...] }` envelope.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Render the week of a local file as text.
    Week {
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Fetch a week from the API configured in the environment.
    Fetch {
        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Any date of the week to show (YYYY-MM-DD). Defaults to today.
    #[arg(short, long)]
    anchor: Option<NaiveDate>,
    #[arg(long, default_value_t = 9)]
    start_hour: u32,
    #[arg(long, default_value_t = 18)]
    end_hour: u32,
}

impl GridArgs {
    fn anchor(&self) -> NaiveDate {
        self.anchor.unwrap_or_else(|| Local::now().date_naive())
    }

    fn config(&self) -> anyhow::Result<CalendarConfig> {
        let config = CalendarConfig {
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            ..CalendarConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Format { input } => {
            let appointments = read_appointments(&input)?;
            let formatted = format_appointments(&appointments);
            println!("{}", serde_json::to_string_pretty(&formatted)?);
        }
        Command::Week { input, grid } => {
            let appointments = read_appointments(&input)?;
            let layout = layout_week(&format_appointments(&appointments), grid.anchor(), &grid.config()?)?;
            print_week(&layout);
        }
        Command::Fetch { grid } => fetch(grid).await?,
    }

    Ok(())
}

async fn fetch(grid: GridArgs) -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    let client = HttpClient::new(&config)?;
    let session = CalendarSession::new(
        Dispatcher::new(client, AppState::default()),
        grid.anchor(),
        grid.config()?,
    )?;

    session.load().await;
    let screen = session.screen().await?;
    match screen.status {
        ScreenStatus::Failed => {
            let message = screen.banner.unwrap_or_default();
            anyhow::bail!("could not load {} .. {}: {message}", screen.range.start, screen.range.end);
        }
        _ => print_week(&screen.layout),
    }
    Ok(())
}

fn read_appointments(path: &Path) -> anyhow::Result<Vec<Appointment>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let json: Value =
        serde_json::from_str(&data).with_context(|| format!("{} is not JSON", path.display()))?;

    let appointments = if json.is_array() {
        serde_json::from_value(json)?
    } else {
        decode_collection::<Appointment>(json)?
    };
    Ok(appointments)
}

fn print_week(layout: &WeekLayout) {
    println!("Week {} .. {}", layout.range.start, layout.range.end);
    for row in &layout.rows {
        let entries: Vec<String> = row
            .cells
            .iter()
            .flat_map(|cell| cell.entries.iter())
            .map(|placed| {
                let appointment = &placed.appointment;
                format!(
                    "{} {} [{}] {}",
                    appointment.date.format("%a"),
                    appointment.time_display,
                    appointment.status,
                    appointment.title
                )
            })
            .collect();
        if entries.is_empty() {
            println!("{}  -", row.label);
        } else {
            println!("{}  {}", row.label, entries.join(" | "));
        }
    }
    if layout.hidden > 0 {
        println!("({} outside working hours)", layout.hidden);
    }
}
