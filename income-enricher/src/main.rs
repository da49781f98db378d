use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use income_classifier::{catalog, classify_raw_income};
use income_core::RawIncome;
use income_registry::HttpIncomeRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, BufWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod enricher;
mod error;
mod packet;
mod runner;

use enricher::Enricher;

const DEFAULT_LOG_FILTER: &str = "income_enricher=info,income_registry=info";

#[derive(Parser, Debug)]
#[command(name = "income-enricher", version, about = "Answers income behov packets with classified monthly income")]
struct Cli {
    /// Config file (default: ./income-enricher.toml)
    #[arg(long, global = true, env = "INCOME_ENRICHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read behov packets as JSON lines and write answered packets back
    Run {
        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Classify a registry payload offline and print the result
    Classify {
        #[arg(long)]
        file: PathBuf,
    },

    /// Print every known posting type with its income class
    Catalog,

    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { input, output } => {
            run(cli.config.as_deref(), input, output).await?;
        }

        Command::Classify { file } => {
            let s = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let raw: RawIncome =
                serde_json::from_str(&s).with_context(|| format!("parse {}", file.display()))?;
            let income = classify_raw_income(&raw)?;
            println!("{}", serde_json::to_string_pretty(&income)?);
        }

        Command::Catalog => {
            let mut rows: Vec<_> = catalog().collect();
            rows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
            for (code, class) in rows {
                println!("{}\t{}", class.wire_name(), code);
            }
        }

        Command::InitConfig => {
            config::init_config(cli.config.as_deref())?;
        }
    }

    Ok(())
}

async fn run(config_file: Option<&Path>, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let cfg = config::load_config(config_file)?;
    let Some(token) = cfg.registry.token.clone() else {
        bail!("no registry token configured (set INCOME_API_TOKEN or registry.token)");
    };

    let registry = HttpIncomeRegistry::new(
        cfg.registry.base_url.clone(),
        token,
        Duration::from_secs(cfg.registry.timeout_secs),
    )
    .context("build registry client")?;

    let enricher = Enricher::new(registry)
        .with_strategy(cfg.enricher.context_strategy)
        .with_stale_after(Duration::from_secs(cfg.enricher.stale_after_secs));

    tracing::info!(
        registry = %cfg.registry.base_url,
        strategy = ?cfg.enricher.context_strategy,
        max_in_flight = cfg.enricher.max_in_flight,
        "starting"
    );

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &input {
        Some(p) => {
            let f = tokio::fs::File::open(p)
                .await
                .with_context(|| format!("open {}", p.display()))?;
            Box::new(BufReader::new(f))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let writer: Box<dyn AsyncWrite + Unpin + Send> = match &output {
        Some(p) => {
            let f = tokio::fs::File::create(p)
                .await
                .with_context(|| format!("create {}", p.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => Box::new(tokio::io::stdout()),
    };

    tokio::select! {
        res = runner::run(Arc::new(enricher), reader, writer, cfg.enricher.max_in_flight) => {
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, dropping in-flight packets");
        }
    }
    Ok(())
}
