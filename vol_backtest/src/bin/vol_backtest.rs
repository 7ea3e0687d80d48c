use anyhow::{bail, Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;
use vol_backtest::backtest::Backtest;
use vol_backtest::config::RunConfig;

fn usage() -> &'static str {
    "usage: vol_backtest <config.toml> [--json]"
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let config_path = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => path,
        None => bail!("{}", usage()),
    };

    let config = RunConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let data = config
        .data
        .load_data()
        .with_context(|| format!("failed to prepare {}", config.data.path.display()))?;
    let mut model = config.model_spec().build()?;
    let backtest = Backtest::new(config.backtest.clone())?;

    let report = backtest
        .run(model.as_mut(), &data)
        .with_context(|| format!("{} backtest failed", config.model.kind))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} | {} window | horizon {}",
            report.model, report.window_mode, report.horizon
        );
        print!("{}", report.metrics);
    }

    Ok(())
}
