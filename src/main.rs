use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hpi_explorer::config::AppConfig;
use hpi_explorer::presenter::{ConsolePresenter, JsonPresenter};
use hpi_explorer::utils::Timer;
use hpi_explorer::{Dashboard, DateRangeSelection, Selection};

#[derive(Parser)]
#[command(name = "hpi-explorer", about = "UK House Price Index explorer", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// HPI CSV file (overrides config)
    #[arg(short, long, global = true, env = "HPI_FILE")]
    data: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Metrics and time series for one region (default)
    Show {
        /// Parent region group (e.g. "Greater London", "All Data")
        #[arg(short, long)]
        parent: Option<String>,

        /// Region to analyse
        #[arg(short, long)]
        region: Option<String>,

        /// Start of the period, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End of the period, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Emit one JSON document instead of text
        #[arg(long)]
        json: bool,
    },

    /// List selectable regions under a parent group
    Regions {
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// List parent region groups
    Parents,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "hpi_explorer=info,warn",
        1 => "hpi_explorer=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;
    if let Some(path) = cli.data {
        config.data.path = path;
    }
    let mut dashboard = Dashboard::new(config);

    let command = cli.command.unwrap_or(Command::Show {
        parent: None,
        region: None,
        from: None,
        to: None,
        json: false,
    });

    match command {
        Command::Show { parent, region, from, to, json } => {
            let _t = Timer::start("Dashboard refresh");
            let selection = Selection {
                parent,
                region,
                range: DateRangeSelection { start: from, end: to },
            };

            let outcome = if json {
                let mut presenter = JsonPresenter::new();
                let outcome = dashboard.run(&selection, &mut presenter);
                println!("{}", serde_json::to_string_pretty(&presenter.into_value())?);
                outcome
            } else {
                let stdout = std::io::stdout();
                let mut presenter = ConsolePresenter::new(stdout.lock());
                dashboard.run(&selection, &mut presenter)
            };

            match outcome {
                Ok(summary) => info!("Done: {} rows for {}", summary.rows, summary.criteria.region_name),
                Err(e) if e.is_recoverable() => info!("{}", e),
                Err(e) => return Err(e).context("Dashboard halted"),
            }
        }

        Command::Regions { parent } => {
            let regions = dashboard
                .region_options(parent.as_deref())
                .context("Could not load region list")?;
            if regions.is_empty() {
                println!("No regions under that parent.");
            } else {
                println!("{} regions:", regions.len());
                for r in &regions {
                    println!("  {}", r);
                }
            }
        }

        Command::Parents => {
            for p in dashboard.parent_options() {
                println!("  {}", p);
            }
        }
    }

    Ok(())
}
