//! surveytab - ANES Survey Cross-Tabulation & Chart Generator
//!
//! Loads the raw cumulative-file export, recodes the analysis variables,
//! caches the recoded table, and renders the chart catalog.

mod analysis;
mod charts;
mod data;
mod tabulate;

use anyhow::{Context, Result};
use clap::Parser;
use data::{codebook, DataLoader, RecodeMap, Recoder};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "surveytab", about = "Cross-tabulates ANES survey data into charts")]
struct Args {
    /// Raw cumulative-file CSV export
    #[arg(long, default_value = "data/anes_cumulative.csv")]
    data: PathBuf,

    /// Recoded-table snapshot, reused on later runs
    #[arg(long, default_value = "data/recoded.feather")]
    cache: PathBuf,

    /// Directory the chart images are written to
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,

    /// JSON codebook replacing the built-in variable map
    #[arg(long)]
    codebook: Option<PathBuf>,

    /// Recode from the raw export even if a snapshot exists
    #[arg(long)]
    refresh: bool,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    let map = match &args.codebook {
        Some(path) => RecodeMap::from_json_file(path)
            .with_context(|| format!("loading codebook {}", path.display()))?,
        None => codebook::anes_cumulative(),
    };

    let recoded = if args.cache.exists() && !args.refresh {
        info!("reusing recoded snapshot {}", args.cache.display());
        DataLoader::read_cache(&args.cache)
            .with_context(|| format!("reading snapshot {}", args.cache.display()))?
    } else {
        info!("loading raw export {}", args.data.display());
        let raw = DataLoader::load_csv(&args.data)
            .with_context(|| format!("loading export {}", args.data.display()))?;
        let recoded = Recoder::apply(&raw, &map).context("recoding survey variables")?;

        if let Some(parent) = args.cache.parent() {
            fs::create_dir_all(parent)?;
        }
        DataLoader::write_cache(&recoded, &args.cache)
            .with_context(|| format!("writing snapshot {}", args.cache.display()))?;
        recoded
    };
    info!("{} respondent-year rows ready for analysis", recoded.height());

    analysis::run(&recoded, &analysis::default_catalog(), &args.out_dir)
}
