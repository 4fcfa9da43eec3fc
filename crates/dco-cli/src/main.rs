use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dco_runner::{Config, Scanner, DEFAULT_CONFIG_FILE};

/// Audit a GitHub organization for commits without a DCO sign-off.
#[derive(Parser)]
#[command(name = "dco-org-check", version)]
struct Cli {
    /// name of YAML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let started = Instant::now();

    let cfg = Config::load_from(&cli.config)?;
    let csvfile = cfg.csvfile.clone();
    let summary = Scanner::open(cfg)?.run()?;

    println!(
        "{} commits without a DCO sign-off across {} repositories written to {}",
        summary.non_compliant,
        summary.repos_scanned,
        csvfile.display()
    );
    if summary.repos_failed > 0 {
        println!("{} repositories could not be scanned; see warnings above", summary.repos_failed);
    }
    println!("This took {:.1?}", started.elapsed());
    Ok(())
}
