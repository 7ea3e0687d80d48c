use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;
use vol_backtest::data::{interpolate_gaps, Data, DataLoader, MinMaxScaler, Scaler, ValueDomain};
use vol_backtest::ForecastError;

fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "exported realized volatility").unwrap();
    writeln!(file, "\"Dates\",\"DJI_rv\",\"FTSE_rv\"").unwrap();
    writeln!(file, "20000103,0.0001,0.0002").unwrap();
    writeln!(file, "20000104,,0.0003").unwrap();
    writeln!(file, "20000105,0.0003,").unwrap();
    writeln!(file, "20000106,0.0004,0.0005").unwrap();
    writeln!(file, "20000107,0.0005,0.0006").unwrap();
    file
}

#[test]
fn test_split_shifts_targets_by_one() {
    let series: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let data = Data::from_log_series(&series, 0.8, false).unwrap();

    assert_eq!(data.x_train().len(), 79);
    assert_eq!(data.y_train()[0], 1.0);
    assert_eq!(data.x_test()[0], 80.0);
    assert_eq!(data.y_test()[0], 81.0);
    assert_eq!(data.test_len(), 19);
    assert_eq!(data.y_test().last(), Some(&99.0));
    assert!(data.scaler().is_none());
    assert_eq!(data.domain(), ValueDomain::Log);
}

#[test]
fn test_scaler_fitted_on_training_inputs_only() {
    let series: Vec<f64> = (0..100).map(|i| -3.0 + 0.01 * i as f64).collect();
    let data = Data::from_log_series(&series, 0.8, true).unwrap();

    let train_min = data.x_train().iter().copied().fold(f64::INFINITY, f64::min);
    let train_max = data.x_train().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_relative_eq!(train_min, 0.0);
    assert_relative_eq!(train_max, 1.0);
    // test values lie above the training range
    assert!(data.x_test().iter().all(|&v| v > 1.0));

    let restored = data.to_natural_scale(data.x_test()).unwrap();
    for (a, b) in restored.iter().zip(&series[80..99]) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_invalid_split() {
    assert!(matches!(
        Data::from_log_series(&[1.0, 2.0, 3.0], 0.8, false),
        Err(ForecastError::DataError(_))
    ));
    assert!(matches!(
        Data::from_log_series(&[1.0; 100], 1.0, false),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        Data::new(vec![1.0], vec![], vec![], vec![]),
        Err(ForecastError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_custom_range_scaler() {
    let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
    let scaled = scaler.fit_transform(&[2.0, 4.0, 6.0]).unwrap();
    assert_eq!(scaled, vec![-1.0, 0.0, 1.0]);
    assert_eq!(scaler.data_range(), Some((2.0, 6.0)));
}

#[test]
fn test_interpolate_gaps() {
    let filled = interpolate_gaps(&[Some(1.0), None, None, Some(4.0)], 3);
    assert_eq!(filled, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
}

#[test]
fn test_load_from_csv() {
    let file = create_test_csv();
    let rv = DataLoader::from_csv(file.path(), &["DJI", "FTSE"], 1).unwrap();

    // both gaps are single interior points and get interpolated
    assert_eq!(rv.len(), 5);
    assert_eq!(rv.assets().collect::<Vec<_>>(), vec!["DJI", "FTSE"]);
    assert_eq!(
        rv.dates()[0],
        chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap()
    );

    let dji = rv.levels("DJI").unwrap();
    assert_relative_eq!(dji[1], 0.0002, epsilon = 1e-12);

    let log = rv.log_series("FTSE").unwrap();
    assert_relative_eq!(log[0], 0.0002f64.ln(), epsilon = 1e-12);
}

#[test]
fn test_missing_asset_column() {
    let file = create_test_csv();
    let result = DataLoader::from_csv(file.path(), &["SPX"], 1);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_sequence_windows_from_training_split() {
    let series: Vec<f64> = (0..200).map(|i| (i as f64 * 0.1).sin() - 2.0).collect();
    let data = Data::from_log_series(&series, 0.8, true).unwrap();
    let dataset = vol_backtest::features::sequence_dataset(data.x_train(), 22, 5).unwrap();

    // rows for i in [22, len - 1 - 5)
    assert_eq!(dataset.inputs.len(), data.x_train().len() - 28);
    assert_eq!(dataset.inputs.len(), dataset.targets.len());
    for (i, (input, target)) in dataset.inputs.iter().zip(&dataset.targets).enumerate() {
        assert_eq!(input.as_slice(), &data.x_train()[i..i + 22]);
        assert_eq!(target.as_slice(), &data.x_train()[i + 22..i + 27]);
    }
}
