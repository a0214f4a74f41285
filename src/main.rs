use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use tradedash::dashboard::{ChartSection, ConfigView, Dashboard};
use tradedash::logging::{info, obj, v_str, Domain};
use tradedash::render;
use tradedash::settings::{clamp_days, Settings};
use tradedash::{server, source};

#[derive(Parser)]
#[command(name = "tradedash")]
#[command(about = "Status dashboard for the trading bot's config and logs", long_about = None)]
struct Cli {
    /// Directory holding config/ and logs/
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Read files over HTTP below this URL instead of from disk
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full dashboard
    Show {
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Parsed settings blocks
    Config {
        #[arg(long)]
        json: bool,
    },
    /// Per-day signal counts and confidence
    Chart {
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Today's trades, or the tail of trade.log
    History,
    /// Serve the JSON endpoints
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("encoding output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(root) = cli.root {
        settings.root = root;
    }
    if let Some(base_url) = cli.base_url {
        settings.base_url = Some(base_url);
    }

    let source = source::from_settings(&settings)?;
    info(Domain::System, "startup", obj(&[("source", v_str(&source.describe()))]));
    let mut dashboard = Dashboard::new(source, &settings);

    match cli.command {
        Commands::Show { days, json } => {
            let days = clamp_days(days.unwrap_or(settings.days));
            let snapshot = dashboard.refresh_now(days).await;
            if json {
                print_json(snapshot)?;
            } else {
                print!("{}", render::render_text(snapshot));
            }
        }
        Commands::Config { json } => {
            let view = dashboard.load_config().await?.map(ConfigView::from_parsed);
            if json {
                print_json(&view)?;
            } else {
                let mut out = String::new();
                render::render_config(&mut out, view.as_ref());
                print!("{}", out);
            }
        }
        Commands::Chart { days, json } => {
            let days = clamp_days(days.unwrap_or(settings.days));
            let today = chrono::Local::now().date_naive();
            let chart = ChartSection::from_points(dashboard.load_chart(days, today).await);
            if json {
                print_json(&chart)?;
            } else {
                let mut out = String::new();
                render::render_chart(&mut out, &chart.points);
                print!("{}", out);
            }
        }
        Commands::History => {
            let today = chrono::Local::now().date_naive();
            let history = dashboard.load_trade_history(today).await?;
            let mut out = String::new();
            render::render_history(&mut out, &history);
            print!("{}", out);
        }
        Commands::Serve { port } => {
            let addr = format!("{}:{}", settings.bind, port.unwrap_or(settings.port));
            eprintln!("tradedash serving at http://{}", addr);
            eprintln!("  GET /api/snapshot?days=N");
            eprintln!("  GET /api/chart?days=N");
            eprintln!("  GET /api/config");
            eprintln!("  GET /api/health");
            info(Domain::System, "serve", obj(&[("addr", v_str(&addr)), ("days", json!(settings.days))]));
            server::serve(dashboard, &addr).await?;
        }
    }
    Ok(())
}
