//! Walk-forward comparison of HAR and ESN forecasts on a synthetic
//! log-volatility series.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use volatility_eval_workspace::backtest::models::{EchoStateNetwork, EsnConfig, HarModel};
use volatility_eval_workspace::backtest::{
    Backtest, BacktestConfig, Data, ForecastingModel, Metric, WindowMode,
};

// Persistent log-volatility process with seeded Gaussian shocks
fn synthetic_log_volatility(n: usize) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let shocks = Normal::new(0.0, 0.12)?;
    let mut series = Vec::with_capacity(n);
    let mut level = -4.5;

    for _ in 0..n {
        level = -4.5 + 0.85 * (level + 4.5) + shocks.sample(&mut rng);
        series.push(level);
    }

    Ok(series)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let series = synthetic_log_volatility(1500)?;
    let data = Data::from_log_series(&series, 0.8, true)?;
    println!(
        "Train: {} observations, test: {} observations",
        data.x_train().len(),
        data.test_len()
    );

    let configs = [
        BacktestConfig::new(10, WindowMode::Fixed).with_parallel(true),
        BacktestConfig::new(10, WindowMode::Rolling).with_window_size(500),
        BacktestConfig::new(10, WindowMode::Expanding),
    ];

    for config in configs {
        let backtest = Backtest::new(config)?;
        let mut models: Vec<Box<dyn ForecastingModel>> = vec![
            Box::new(HarModel::new()),
            Box::new(EchoStateNetwork::new(EsnConfig::default())?),
        ];

        for model in models.iter_mut() {
            let report = backtest.run(model.as_mut(), &data)?;
            let rmse = report.metrics.vector(Metric::Rmse);
            let qlik = report.metrics.vector(Metric::Qlik);
            println!(
                "{:>4} {:>9}: RMSE h1 {:.6} h10 {:.6} | QLIK h1 {:.4} h10 {:.4}",
                report.model,
                report.window_mode,
                rmse[0],
                rmse[rmse.len() - 1],
                qlik[0],
                qlik[qlik.len() - 1]
            );
        }
    }

    Ok(())
}
