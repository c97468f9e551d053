//! CLI integration tests.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, build_strategy, risk/optimizer/rebalance builders)
//! - Argument parsing for weights and targets
//! - The backtest pipeline with MockDataPort
//! - Whole commands run against INI and CSV files on disk

mod common;

use clap::Parser;
use common::*;
use quantdesk::adapters::csv_report_adapter::{EQUITY_FILE, TRADES_FILE};
use quantdesk::adapters::file_config_adapter::FileConfigAdapter;
use quantdesk::cli::{self, BacktestRequest, Cli};
use quantdesk::domain::error::QuantError;
use quantdesk::domain::indicator::IndicatorType;
use quantdesk::domain::risk::var::HorizonScaling;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn exit_code_eq(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn run_args(args: &[&str]) -> ExitCode {
    cli::run(Cli::parse_from(std::iter::once("quantdesk").chain(args.iter().copied())))
}

const VALID_INI: &str = r#"
[backtest]
ticker = acme
initial_capital = 50000.0
commission = 0.002
start_date = 2024-01-01
end_date = 2024-06-30

[strategy]
kind = momentum
position_size = 0.2
rsi_period = 10
fast_ma = 5
slow_ma = 20

[risk]
confidence = 0.99
simulations = 500
seed = 7
horizon_days = 10
horizon_scaling = linear

[optimizer]
max_iterations = 200
tolerance = 1e-8

[rebalance]
min_trade_value = 50
threshold = 2.5
commission = 1.0

[logging]
level = debug
format = compact
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_reads_values() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert!((config.initial_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((config.commission_rate - 0.002).abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert!((config.initial_capital - 100_000.0).abs() < f64::EPSILON);
        assert!((config.commission_rate - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_rejects_negative_capital() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ninitial_capital = -5\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn backtest_request_reads_ticker_and_dates() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::build_backtest_request(&adapter, None).unwrap();
        assert_eq!(request.ticker, "ACME");
        assert_eq!(request.start_date, Some(date(2024, 1, 1)));
        assert_eq!(request.end_date, Some(date(2024, 6, 30)));
    }

    #[test]
    fn backtest_request_override_wins() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::build_backtest_request(&adapter, Some("msft")).unwrap();
        assert_eq!(request.ticker, "MSFT");
    }

    #[test]
    fn backtest_request_missing_ticker() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let err = cli::build_backtest_request(&adapter, None).unwrap_err();
        assert!(matches!(err, QuantError::ConfigMissing { key, .. } if key == "ticker"));
    }

    #[test]
    fn build_var_config_reads_risk_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_var_config(&adapter).unwrap();
        assert!((config.confidence - 0.99).abs() < f64::EPSILON);
        assert_eq!(config.simulations, 500);
        assert_eq!(config.seed, 7);
        assert_eq!(config.horizon_days, 10);
        assert_eq!(config.horizon_scaling, HorizonScaling::Linear);
    }

    #[test]
    fn build_solver_and_rebalance_configs() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let solver = cli::build_solver_config(&adapter).unwrap();
        assert_eq!(solver.max_iterations, 200);
        assert!((solver.tolerance - 1e-8).abs() < f64::EPSILON);

        let rebalance = cli::build_rebalance_config(&adapter).unwrap();
        assert!((rebalance.min_trade_value - 50.0).abs() < f64::EPSILON);
        assert!((rebalance.threshold_pct - 2.5).abs() < f64::EPSILON);
        assert!((rebalance.commission - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn log_settings_prefer_flags_over_file() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();

        let from_file = Cli::parse_from(["quantdesk", "validate", "--config", path]);
        assert_eq!(
            cli::log_settings(&from_file),
            ("debug".to_string(), "compact".to_string())
        );

        let flagged = Cli::parse_from(["quantdesk", "--log-level", "warn", "validate", "--config", path]);
        assert_eq!(cli::log_settings(&flagged).0, "warn");

        let bare = Cli::parse_from(["quantdesk", "list-tickers", "--data-dir", "."]);
        assert_eq!(cli::log_settings(&bare), ("info".to_string(), "text".to_string()));
    }
}

mod strategy_building {
    use super::*;

    #[test]
    fn momentum_uses_configured_periods() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let strategy = cli::build_strategy(&adapter).unwrap();
        assert_eq!(strategy.name(), "Momentum Strategy");
        assert_eq!(
            strategy.required_indicators(),
            vec![IndicatorType::Rsi(10), IndicatorType::Sma(5), IndicatorType::Sma(20)]
        );
    }

    #[test]
    fn mean_reversion_kind() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nkind = mean_reversion\nbb_period = 10\nbb_std = 1.5\n")
                .unwrap();
        let strategy = cli::build_strategy(&adapter).unwrap();
        assert_eq!(strategy.name(), "Mean Reversion Strategy");
        assert_eq!(
            strategy.required_indicators(),
            vec![IndicatorType::Bollinger {
                period: 10,
                stddev_mult_x100: 150
            }]
        );
    }

    #[test]
    fn breakout_kind_needs_no_indicators() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nkind = breakout\n").unwrap();
        let strategy = cli::build_strategy(&adapter).unwrap();
        assert_eq!(strategy.name(), "Breakout Strategy");
        assert!(strategy.required_indicators().is_empty());
    }

    #[test]
    fn unknown_kind_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nkind = arbitrage\n").unwrap();
        let err = cli::build_strategy(&adapter).err().unwrap();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "kind"));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn parse_allocation_reads_pairs() {
        let map = cli::parse_allocation("targets", "aapl=60, MSFT = 40").unwrap();
        assert_eq!(map.len(), 2);
        assert!((map["AAPL"] - 60.0).abs() < f64::EPSILON);
        assert!((map["MSFT"] - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_allocation_rejects_garbage() {
        assert!(cli::parse_allocation("targets", "AAPL").is_err());
        assert!(cli::parse_allocation("targets", "AAPL=abc").is_err());
        assert!(cli::parse_allocation("targets", "AAPL=-1").is_err());
        assert!(cli::parse_allocation("targets", "").is_err());
    }

    #[test]
    fn portfolio_weights_normalize_and_fill_missing() {
        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let requested = cli::parse_allocation("weights", "AAA=3,CCC=1").unwrap();
        let w = cli::portfolio_weights(&tickers, Some(&requested)).unwrap();
        assert!((w[0] - 0.75).abs() < 1e-12);
        assert!(w[1].abs() < f64::EPSILON);
        assert!((w[2] - 0.25).abs() < 1e-12);

        let equal = cli::portfolio_weights(&tickers, None).unwrap();
        assert!(equal.iter().all(|x| (x - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn portfolio_weights_reject_unknown_ticker() {
        let tickers = vec!["AAA".to_string()];
        let requested = cli::parse_allocation("weights", "ZZZ=1").unwrap();
        assert!(cli::portfolio_weights(&tickers, Some(&requested)).is_err());
    }
}

mod pipeline_mock {
    use super::*;

    fn request(ticker: &str) -> BacktestRequest {
        BacktestRequest {
            ticker: ticker.to_string(),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn pipeline_runs_and_writes_report() {
        let closes = [100.0, 110.0, 120.0, 115.0, 125.0];
        let mock = MockDataPort::new().with_bars("ACME", bars_from_closes("ACME", "2024-01-01", &closes));
        let strategy = FixedSignalStrategy::new(
            vec![Signal::Buy, Signal::Hold, Signal::Sell, Signal::Hold, Signal::Hold],
            10.0,
        );
        let dir = tempfile::TempDir::new().unwrap();

        let result = cli::run_backtest_pipeline(
            &mock,
            Box::new(strategy),
            sample_config(),
            &request("ACME"),
            None,
            Some(dir.path()),
        )
        .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert!((result.trades[0].pnl - 197.8).abs() < 1e-9);
        assert!(dir.path().join(TRADES_FILE).exists());
        assert!(dir.path().join(EQUITY_FILE).exists());
    }

    #[test]
    fn pipeline_respects_date_window() {
        let mock = MockDataPort::new().with_bars("ACME", generate_bars("ACME", "2024-01-01", 10, 100.0));
        let strategy = FixedSignalStrategy::new(vec![Signal::Hold; 3], 1.0);
        let window = BacktestRequest {
            ticker: "ACME".into(),
            start_date: Some(date(2024, 1, 4)),
            end_date: Some(date(2024, 1, 6)),
        };

        let result =
            cli::run_backtest_pipeline(&mock, Box::new(strategy), sample_config(), &window, None, None)
                .unwrap();
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(result.start_date, date(2024, 1, 4));
    }

    #[test]
    fn pipeline_without_bars_is_no_data() {
        let mock = MockDataPort::new();
        let strategy = FixedSignalStrategy::new(Vec::new(), 1.0);
        let err = cli::run_backtest_pipeline(
            &mock,
            Box::new(strategy),
            sample_config(),
            &request("NONE"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuantError::NoData { ticker } if ticker == "NONE"));
    }

    #[test]
    fn pipeline_propagates_data_port_errors() {
        let mock = MockDataPort::new().with_error("ACME", "connection refused");
        let strategy = FixedSignalStrategy::new(Vec::new(), 1.0);
        let err = cli::run_backtest_pipeline(
            &mock,
            Box::new(strategy),
            sample_config(),
            &request("ACME"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuantError::Database { .. }));
    }
}

mod commands {
    use super::*;

    fn write_ohlcv(dir: &Path, ticker: &str, bars: &[OhlcvBar]) {
        let mut body = String::from("date,open,high,low,close,volume\n");
        for b in bars {
            body.push_str(&format!(
                "{},{},{},{},{},{}\n",
                b.timestamp, b.open, b.high, b.low, b.close, b.volume
            ));
        }
        std::fs::write(dir.join(format!("{ticker}.csv")), body).unwrap();
    }

    #[test]
    fn validate_accepts_valid_config() {
        let file = write_temp_ini(VALID_INI);
        let code = run_args(&["validate", "--config", file.path().to_str().unwrap()]);
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_value_with_config_exit_code() {
        let file = write_temp_ini("[risk]\nconfidence = 1.5\n");
        let code = run_args(&["validate", "--config", file.path().to_str().unwrap()]);
        assert!(exit_code_eq(code, ExitCode::from(2)));
    }

    #[test]
    fn validate_missing_file_fails() {
        let code = run_args(&["validate", "--config", "/nonexistent/quantdesk.ini"]);
        assert!(exit_code_eq(code, ExitCode::from(2)));
    }

    #[test]
    fn backtest_command_reads_csv_and_writes_report() {
        let data = tempfile::TempDir::new().unwrap();
        write_ohlcv(data.path(), "WAVE", &generate_wave_bars("WAVE", "2023-01-01", 80));
        let config = write_temp_ini(&format!(
            "[backtest]\nticker = WAVE\ndata_dir = {}\n\n[strategy]\nkind = breakout\nlookback = 10\nvolume_multiplier = 1.0\n",
            data.path().display()
        ));
        let out = tempfile::TempDir::new().unwrap();

        let code = run_args(&[
            "backtest",
            "--config",
            config.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert!(exit_code_eq(code, ExitCode::SUCCESS));

        let equity = std::fs::read_to_string(out.path().join(EQUITY_FILE)).unwrap();
        assert_eq!(equity.lines().count(), 81);
    }

    #[test]
    fn backtest_unknown_ticker_exits_with_data_code() {
        let data = tempfile::TempDir::new().unwrap();
        let config = write_temp_ini("[strategy]\nkind = breakout\n");
        let code = run_args(&[
            "backtest",
            "--config",
            config.path().to_str().unwrap(),
            "--ticker",
            "NOPE",
            "--data-dir",
            data.path().to_str().unwrap(),
        ]);
        assert!(exit_code_eq(code, ExitCode::from(5)));
    }

    #[test]
    fn list_tickers_succeeds() {
        let data = tempfile::TempDir::new().unwrap();
        write_ohlcv(data.path(), "ACME", &generate_bars("ACME", "2024-01-01", 3, 10.0));
        let code = run_args(&["list-tickers", "--data-dir", data.path().to_str().unwrap()]);
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn analytics_commands_run_on_closes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let prices = dir.path().join("closes.csv");
        std::fs::write(&prices, two_asset_closes_csv(60)).unwrap();
        let prices = prices.to_str().unwrap();

        let risk = run_args(&["risk", "--prices", prices, "--weights", "AAA=0.6,BBB=0.4"]);
        assert!(exit_code_eq(risk, ExitCode::SUCCESS));

        for method in ["min-volatility", "max-sharpe", "risk-parity", "equal-weight"] {
            let code = run_args(&["optimize", "--prices", prices, "--method", method]);
            assert!(exit_code_eq(code, ExitCode::SUCCESS), "method {method}");
        }

        let rebalance = run_args(&[
            "rebalance",
            "--prices",
            prices,
            "--targets",
            "AAA=50,BBB=50",
            "--holdings",
            "AAA=100",
        ]);
        assert!(exit_code_eq(rebalance, ExitCode::SUCCESS));
    }

    #[test]
    fn rebalance_with_unknown_holding_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let prices = dir.path().join("closes.csv");
        std::fs::write(&prices, two_asset_closes_csv(10)).unwrap();

        let code = run_args(&[
            "rebalance",
            "--prices",
            prices.to_str().unwrap(),
            "--targets",
            "AAA=100",
            "--holdings",
            "ZZZ=5",
            "--dry-run",
        ]);
        assert!(exit_code_eq(code, ExitCode::from(5)));
    }
}
