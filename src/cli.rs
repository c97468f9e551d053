//! CLI definition and dispatch.
//!
//! Human-readable progress and summaries go to stderr; tables meant for other
//! tools (weights, orders, tickers) go to stdout.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, read_price_matrix};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::config_validation::{
    optional_date, strategy_kind, validate_all, validate_backtest_config,
    validate_optimizer_config, validate_rebalance_config, validate_risk_config,
    validate_strategy_config,
};
use crate::domain::error::QuantError;
use crate::domain::indicator::apply_indicators;
use crate::domain::optimizer::solver::SolverConfig;
use crate::domain::optimizer::{Allocation, OptimizationOutcome, PortfolioOptimizer};
use crate::domain::portfolio::Portfolio;
use crate::domain::price_table::PriceTable;
use crate::domain::rebalancer::{RebalanceConfig, Rebalancer};
use crate::domain::returns::{PriceMatrix, ReturnsMatrix};
use crate::domain::risk::metrics::comprehensive_report;
use crate::domain::risk::var::{VarConfig, calculate_all_var, marginal_var};
use crate::domain::strategy::{
    BreakoutConfig, BreakoutStrategy, DEFAULT_POSITION_SIZE_PCT, MeanReversionConfig,
    MeanReversionStrategy, MomentumConfig, MomentumStrategy, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::result_store::ResultStore;

/// Default annual risk-free rate for Sharpe and Sortino in risk reports.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_FRONTIER_POINTS: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "quantdesk", about = "Backtesting, risk and portfolio analytics")]
pub struct Cli {
    /// Log filter, e.g. `debug` or `quantdesk=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Log format: text or compact
    #[arg(long, global = true)]
    pub log_format: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-ticker backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides `[backtest] ticker`
        #[arg(long)]
        ticker: Option<String>,
        /// Overrides `[backtest] data_dir`
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for trades.csv and equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Risk report and VaR for a weighted portfolio of a closes file
    Risk {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Weights as `AAPL=0.6,MSFT=0.4`; equal weight when omitted
        #[arg(long)]
        weights: Option<String>,
    },
    /// Mean-variance optimization over a closes file
    Optimize {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OptimizeMethod::MaxSharpe)]
        method: OptimizeMethod,
        /// Annualized return target for min-volatility
        #[arg(long)]
        target_return: Option<f64>,
    },
    /// Rebalance a portfolio to percent targets at the latest closes
    Rebalance {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Targets in percent, e.g. `AAPL=60,MSFT=40`
        #[arg(long)]
        targets: String,
        /// Current holdings in shares, e.g. `AAPL=100`
        #[arg(long)]
        holdings: Option<String>,
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,
        /// Only trade when drift exceeds `[rebalance] threshold`; also
        /// enabled by `[rebalance] use_threshold`
        #[arg(long)]
        threshold: bool,
        /// Print orders without executing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate every config section
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in a CSV data directory
    ListTickers {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OptimizeMethod {
    MinVolatility,
    MaxSharpe,
    RiskParity,
    EqualWeight,
    Frontier,
}

impl Command {
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Backtest { config, .. } | Command::Validate { config } => Some(config.as_path()),
            Command::Risk { config, .. }
            | Command::Optimize { config, .. }
            | Command::Rebalance { config, .. } => config.as_deref(),
            Command::ListTickers { .. } => None,
        }
    }
}

/// Log level and format: CLI flags, then `[logging]` in the command's config,
/// then `info` / `text`.
pub fn log_settings(cli: &Cli) -> (String, String) {
    let file = cli
        .command
        .config_path()
        .and_then(|p| FileConfigAdapter::from_file(p).ok());
    let from_file = |key: &str| file.as_ref().and_then(|c| c.get_string("logging", key));

    let level = cli
        .log_level
        .clone()
        .or_else(|| from_file("level"))
        .unwrap_or_else(|| "info".to_string());
    let format = cli
        .log_format
        .clone()
        .or_else(|| from_file("format"))
        .unwrap_or_else(|| "text".to_string());
    (level, format)
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            ticker,
            data_dir,
            output,
        } => run_backtest(&config, ticker.as_deref(), data_dir.as_deref(), output.as_deref()),
        Command::Risk {
            prices,
            config,
            weights,
        } => run_risk(&prices, config.as_deref(), weights.as_deref()),
        Command::Optimize {
            prices,
            config,
            method,
            target_return,
        } => run_optimize(&prices, config.as_deref(), method, target_return),
        Command::Rebalance {
            prices,
            config,
            targets,
            holdings,
            capital,
            threshold,
            dry_run,
        } => run_rebalance(
            &prices,
            config.as_deref(),
            &targets,
            holdings.as_deref(),
            capital,
            threshold,
            dry_run,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data_dir } => run_list_tickers(&data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load a config file, or an empty config when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, QuantError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, QuantError> {
    validate_backtest_config(config)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", defaults.initial_capital),
        commission_rate: config.get_double("backtest", "commission", defaults.commission_rate),
    })
}

/// Ticker and optional date window of a backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub ticker: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn build_backtest_request(
    config: &dyn ConfigPort,
    ticker_override: Option<&str>,
) -> Result<BacktestRequest, QuantError> {
    let ticker = ticker_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "ticker"))
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| QuantError::ConfigMissing {
            section: "backtest".into(),
            key: "ticker".into(),
        })?;

    Ok(BacktestRequest {
        ticker,
        start_date: optional_date(config, "start_date")?,
        end_date: optional_date(config, "end_date")?,
    })
}

fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    config.get_int(section, key, default as i64).max(0) as usize
}

/// Strategy selected by `[strategy] kind`, parameterized from the same section.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, QuantError> {
    validate_strategy_config(config)?;
    let position_size_pct =
        config.get_double("strategy", "position_size", DEFAULT_POSITION_SIZE_PCT);

    let strategy: Box<dyn Strategy> = match strategy_kind(config)? {
        StrategyKind::Momentum => {
            let d = MomentumConfig::default();
            Box::new(MomentumStrategy::new(MomentumConfig {
                rsi_period: get_usize(config, "strategy", "rsi_period", d.rsi_period),
                rsi_oversold: config.get_double("strategy", "rsi_oversold", d.rsi_oversold),
                rsi_overbought: config.get_double("strategy", "rsi_overbought", d.rsi_overbought),
                fast_ma: get_usize(config, "strategy", "fast_ma", d.fast_ma),
                slow_ma: get_usize(config, "strategy", "slow_ma", d.slow_ma),
                position_size_pct,
            }))
        }
        StrategyKind::MeanReversion => {
            let d = MeanReversionConfig::default();
            Box::new(MeanReversionStrategy::new(MeanReversionConfig {
                bb_period: get_usize(config, "strategy", "bb_period", d.bb_period),
                bb_std: config.get_double("strategy", "bb_std", d.bb_std),
                position_size_pct,
            }))
        }
        StrategyKind::Breakout => {
            let d = BreakoutConfig::default();
            Box::new(BreakoutStrategy::new(BreakoutConfig {
                lookback: get_usize(config, "strategy", "lookback", d.lookback),
                volume_multiplier: config.get_double(
                    "strategy",
                    "volume_multiplier",
                    d.volume_multiplier,
                ),
                position_size_pct,
            }))
        }
    };
    Ok(strategy)
}

pub fn build_var_config(config: &dyn ConfigPort) -> Result<VarConfig, QuantError> {
    validate_risk_config(config)?;
    let d = VarConfig::default();
    let horizon_scaling = match config.get_string("risk", "horizon_scaling") {
        Some(s) => s
            .parse()
            .map_err(|reason: String| QuantError::config_invalid("risk", "horizon_scaling", reason))?,
        None => d.horizon_scaling,
    };
    Ok(VarConfig {
        confidence: config.get_double("risk", "confidence", d.confidence),
        portfolio_value: config.get_double("risk", "portfolio_value", d.portfolio_value),
        simulations: get_usize(config, "risk", "simulations", d.simulations),
        seed: config.get_int("risk", "seed", d.seed as i64).max(0) as u64,
        horizon_days: config.get_int("risk", "horizon_days", i64::from(d.horizon_days)).max(1) as u32,
        horizon_scaling,
    })
}

pub fn build_solver_config(config: &dyn ConfigPort) -> Result<SolverConfig, QuantError> {
    validate_optimizer_config(config)?;
    let d = SolverConfig::default();
    Ok(SolverConfig {
        max_iterations: get_usize(config, "optimizer", "max_iterations", d.max_iterations),
        tolerance: config.get_double("optimizer", "tolerance", d.tolerance),
    })
}

pub fn build_rebalance_config(config: &dyn ConfigPort) -> Result<RebalanceConfig, QuantError> {
    validate_rebalance_config(config)?;
    let d = RebalanceConfig::default();
    Ok(RebalanceConfig {
        min_trade_value: config.get_double("rebalance", "min_trade_value", d.min_trade_value),
        threshold_pct: config.get_double("rebalance", "threshold", d.threshold_pct),
        commission: config.get_double("rebalance", "commission", d.commission),
    })
}

/// Parse `TICKER=value` pairs separated by commas. Tickers are upper-cased.
pub fn parse_allocation(arg: &str, spec: &str) -> Result<BTreeMap<String, f64>, QuantError> {
    let invalid = |reason: String| QuantError::config_invalid("args", arg, reason);
    let mut map = BTreeMap::new();
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (ticker, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("expected TICKER=value, got '{pair}'")))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid number in '{pair}'")))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("value in '{pair}' must be non-negative")));
        }
        map.insert(ticker.trim().to_uppercase(), value);
    }
    if map.is_empty() {
        return Err(invalid("no TICKER=value pairs given".into()));
    }
    Ok(map)
}

/// Weights in `tickers` order, normalized to sum to 1. Tickers absent from
/// `weights` get 0; `None` means equal weight.
pub fn portfolio_weights(
    tickers: &[String],
    weights: Option<&BTreeMap<String, f64>>,
) -> Result<Vec<f64>, QuantError> {
    let Some(weights) = weights else {
        return Ok(vec![1.0 / tickers.len() as f64; tickers.len()]);
    };
    if let Some(unknown) = weights.keys().find(|t| !tickers.contains(t)) {
        return Err(QuantError::config_invalid(
            "args",
            "weights",
            format!("{unknown} is not a column of the prices file"),
        ));
    }
    let raw: Vec<f64> = tickers
        .iter()
        .map(|t| weights.get(t).copied().unwrap_or(0.0))
        .collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(QuantError::config_invalid(
            "args",
            "weights",
            "weights must not all be zero",
        ));
    }
    Ok(raw.into_iter().map(|w| w / total).collect())
}

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(Some(config_path))?;
    validate_all(&config)?;
    eprintln!("Config validated successfully");
    Ok(())
}

fn run_list_tickers(data_dir: &Path) -> Result<(), QuantError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    for ticker in adapter.list_tickers()? {
        println!("{ticker}");
    }
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    ticker_override: Option<&str>,
    data_dir_override: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<(), QuantError> {
    let config = load_config(Some(config_path))?;
    let bt_config = build_backtest_config(&config)?;
    let strategy = build_strategy(&config)?;
    let request = build_backtest_request(&config, ticker_override)?;
    eprintln!("Loading strategy: {}", strategy.name());

    let data_dir = data_dir_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("backtest", "data_dir").map(PathBuf::from));
    let store = open_result_store(&config);

    let result = match data_dir {
        Some(dir) => {
            let data_port = CsvAdapter::new(dir);
            run_backtest_pipeline(&data_port, strategy, bt_config, &request, store, output_dir)?
        }
        None => {
            let data_port = sqlite_data_port(&config)?;
            run_backtest_pipeline(
                data_port.as_ref(),
                strategy,
                bt_config,
                &request,
                store,
                output_dir,
            )?
        }
    };
    print_backtest_summary(&result);
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_result_store(config: &dyn ConfigPort) -> Option<Box<dyn ResultStore + Send>> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    config.get_string("sqlite", "path")?;
    let opened = SqliteAdapter::from_config(config).and_then(|adapter| {
        adapter.initialize_schema()?;
        Ok(adapter)
    });
    match opened {
        Ok(adapter) => Some(Box::new(adapter) as Box<dyn ResultStore + Send>),
        Err(e) => {
            warn!(error = %e, "result store unavailable, results will not be persisted");
            None
        }
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_result_store(_config: &dyn ConfigPort) -> Option<Box<dyn ResultStore + Send>> {
    None
}

#[cfg(feature = "sqlite")]
fn sqlite_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, QuantError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    if config.get_string("sqlite", "path").is_none() {
        return Err(QuantError::ConfigMissing {
            section: "backtest".into(),
            key: "data_dir".into(),
        });
    }
    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter) as Box<dyn DataPort>)
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_data_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, QuantError> {
    Err(QuantError::ConfigMissing {
        section: "backtest".into(),
        key: "data_dir".into(),
    })
}

/// Fetch bars, attach the strategy's indicators, run the engine and
/// optionally export the ledger and equity curve.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: Box<dyn Strategy>,
    bt_config: BacktestConfig,
    request: &BacktestRequest,
    store: Option<Box<dyn ResultStore + Send>>,
    output_dir: Option<&Path>,
) -> Result<BacktestResult, QuantError> {
    let bars = data_port.fetch_ohlcv(&request.ticker, request.start_date, request.end_date)?;
    if bars.is_empty() {
        return Err(QuantError::NoData {
            ticker: request.ticker.clone(),
        });
    }
    eprintln!("Running backtest: {} ({} bars)", request.ticker, bars.len());

    let table = apply_indicators(PriceTable::new(bars)?, &strategy.required_indicators())?;

    let mut engine = BacktestEngine::new(strategy, bt_config);
    if let Some(store) = store {
        engine = engine.with_store(store);
    }
    let result = engine.run(&table, &request.ticker)?;

    if let Some(dir) = output_dir {
        CsvReportAdapter::new().write(&result, dir)?;
        eprintln!("Report written to: {}", dir.display());
    }
    Ok(result)
}

pub fn print_backtest_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} on {} ===", result.strategy_name, result.ticker);
    eprintln!("Run:              {}", result.run_id.short());
    eprintln!("Period:           {} to {}", result.start_date, result.end_date);
    eprintln!("Final Value:      {:.2}", result.final_value);
    eprintln!("Total Return:     {:.2}%", result.total_return_pct);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     {:.2}%", m.max_drawdown_pct);
    eprintln!("Total Trades:     {}", m.num_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate);
}

fn load_returns(prices_path: &Path) -> Result<(PriceMatrix, ReturnsMatrix), QuantError> {
    eprintln!("Loading prices from {}", prices_path.display());
    let prices = read_price_matrix(prices_path)?;
    let returns = prices.returns()?;
    if returns.n_rows() == 0 {
        return Err(QuantError::InvalidReturns {
            reason: "need at least two price rows".into(),
        });
    }
    Ok((prices, returns))
}

fn run_risk(
    prices_path: &Path,
    config_path: Option<&Path>,
    weights: Option<&str>,
) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let var_config = build_var_config(&config)?;
    let risk_free = config.get_double("risk", "risk_free_rate", DEFAULT_RISK_FREE_RATE);

    let (_, returns) = load_returns(prices_path)?;
    let requested = weights.map(|w| parse_allocation("weights", w)).transpose()?;
    let w = portfolio_weights(returns.tickers(), requested.as_ref())?;

    let series = returns.portfolio_returns(&w);
    let values: Vec<f64> = std::iter::once(1.0)
        .chain(series.iter().scan(1.0, |value, r| {
            *value *= 1.0 + r;
            Some(*value)
        }))
        .collect();

    let report = comprehensive_report(&series, &values, risk_free);
    let var = calculate_all_var(&series, &var_config)
        .scaled(var_config.horizon_days, var_config.horizon_scaling);
    let marginal = marginal_var(&returns, &w, var_config.confidence);
    info!(assets = returns.n_assets(), observations = series.len(), "risk report computed");

    println!("metric,value");
    println!("annual_return,{:.6}", report.mean_return);
    println!("median_return,{:.6}", report.median_return);
    println!("volatility,{:.6}", report.volatility);
    println!("downside_deviation,{:.6}", report.downside_deviation);
    println!("sharpe_ratio,{:.6}", report.sharpe_ratio);
    println!("sortino_ratio,{:.6}", report.sortino_ratio);
    println!("calmar_ratio,{:.6}", report.calmar_ratio);
    println!("max_drawdown_pct,{:.6}", report.drawdown.max_drawdown_pct);
    println!("skewness,{:.6}", report.skewness);
    println!("kurtosis,{:.6}", report.kurtosis);
    println!("tail_ratio,{:.6}", report.tail_ratio);
    println!("historical_var,{:.2}", var.historical_var);
    println!("parametric_var,{:.2}", var.parametric_var);
    println!("monte_carlo_var,{:.2}", var.monte_carlo_var);
    println!("historical_cvar,{:.2}", var.historical_cvar);
    println!("parametric_cvar,{:.2}", var.parametric_cvar);
    for (ticker, m) in returns.tickers().iter().zip(&marginal) {
        println!("marginal_var_{ticker},{m:.6}");
    }

    eprintln!(
        "VaR at {:.0}% over {} day(s) on {:.0}",
        var.confidence_level * 100.0,
        var_config.horizon_days,
        var.portfolio_value
    );
    Ok(())
}

fn print_allocation(allocation: &Allocation) {
    println!("ticker,weight");
    for (ticker, weight) in &allocation.weights {
        println!("{ticker},{weight:.6}");
    }
    eprintln!("Expected Return:  {:.2}%", allocation.expected_return * 100.0);
    eprintln!("Volatility:       {:.2}%", allocation.volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", allocation.sharpe_ratio);
}

fn run_optimize(
    prices_path: &Path,
    config_path: Option<&Path>,
    method: OptimizeMethod,
    target_return: Option<f64>,
) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let solver = build_solver_config(&config)?;
    let (_, returns) = load_returns(prices_path)?;
    let optimizer = PortfolioOptimizer::new(&returns, solver)?;

    let outcome = match method {
        OptimizeMethod::MinVolatility => optimizer.minimize_volatility(target_return),
        OptimizeMethod::MaxSharpe => optimizer.maximize_sharpe(),
        OptimizeMethod::RiskParity => optimizer.risk_parity(),
        OptimizeMethod::EqualWeight => OptimizationOutcome::Solved(optimizer.equal_weight()),
        OptimizeMethod::Frontier => {
            let n = get_usize(&config, "optimizer", "frontier_points", DEFAULT_FRONTIER_POINTS);
            println!("expected_return,volatility,sharpe_ratio");
            for p in optimizer.efficient_frontier(n) {
                println!("{:.6},{:.6},{:.6}", p.expected_return, p.volatility, p.sharpe_ratio);
            }
            return Ok(());
        }
    };

    match outcome {
        OptimizationOutcome::Solved(allocation) => print_allocation(&allocation),
        OptimizationOutcome::Failed { message } => {
            // non-convergence is reported, not an error
            eprintln!("Optimization did not converge: {message}");
        }
    }
    Ok(())
}

fn run_rebalance(
    prices_path: &Path,
    config_path: Option<&Path>,
    targets: &str,
    holdings: Option<&str>,
    capital: f64,
    threshold: bool,
    dry_run: bool,
) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let rebalancer = Rebalancer::new(build_rebalance_config(&config)?);
    let prices = read_price_matrix(prices_path)?;
    let latest: HashMap<String, f64> = prices.latest_prices().into_iter().collect();
    let targets = parse_allocation("targets", targets)?;

    let mut portfolio = Portfolio::new("cli", capital);
    if let Some(spec) = holdings {
        for (ticker, quantity) in parse_allocation("holdings", spec)? {
            let price = latest.get(&ticker).copied().ok_or_else(|| QuantError::NoData {
                ticker: ticker.clone(),
            })?;
            portfolio.buy(&ticker, quantity, price, 0.0)?;
        }
    }

    if dry_run {
        let orders = rebalancer.calculate_trades(&mut portfolio, &targets, &latest);
        println!("ticker,action,quantity");
        for o in &orders {
            println!("{},{},{:.6}", o.ticker, o.action, o.quantity);
        }
        eprintln!("{} order(s), not executed", orders.len());
        return Ok(());
    }

    let executed = if threshold || config.get_bool("rebalance", "use_threshold", false) {
        rebalancer.threshold_rebalance(&mut portfolio, &targets, &latest)
    } else {
        rebalancer.execute_rebalance(&mut portfolio, &targets, &latest)
    };

    println!("ticker,action,quantity,price,value");
    for o in &executed {
        println!(
            "{},{},{:.6},{:.4},{:.2}",
            o.ticker, o.action, o.quantity, o.price, o.value
        );
    }
    let summary = portfolio.summary();
    eprintln!("Total Value:      {:.2}", summary.total_value);
    eprintln!("Cash:             {:.2} ({:.2}%)", summary.cash, summary.cash_weight);
    for (ticker, weight) in portfolio.allocation() {
        eprintln!("  {ticker}: {weight:.2}%");
    }
    Ok(())
}
