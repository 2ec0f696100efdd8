//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, rank_by_total_return};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, InstrumentRun};
use crate::domain::config_validation::{load_backtest_config, load_strategy_kind};
use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_REPORT_DIR: &str = "results";

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Vectorized strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy over one or more instruments
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [strategy] kind
        #[arg(short, long)]
        strategy: Option<String>,
        /// Run a single instrument instead of [data] instruments
        #[arg(short, long)]
        instrument: Option<String>,
        /// Overrides [report] directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in a data directory
    ListInstruments {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            instrument,
            output,
        } => run_backtest(
            &config,
            strategy.as_deref(),
            instrument.as_deref(),
            output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListInstruments { data } => run_list_instruments(&data),
    }
}

fn fail(e: &BacktestError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    load_backtest_config(adapter)
}

/// `--strategy` wins over `[strategy] kind`.
pub fn resolve_strategy_kind(
    strategy_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<StrategyKind, BacktestError> {
    match strategy_override {
        Some(s) => s
            .parse::<StrategyKind>()
            .map_err(|reason| BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: "kind".into(),
                reason,
            }),
        None => load_strategy_kind(config),
    }
}

/// `--instrument`, then `[data] instruments`, then everything the data port lists.
pub fn resolve_instruments(
    instrument_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, BacktestError> {
    if let Some(instrument) = instrument_override {
        return Ok(vec![instrument.trim().to_string()]);
    }
    let configured = config.get_list("data", "instruments");
    if !configured.is_empty() {
        return Ok(dedup_instruments(&configured));
    }
    data_port.list_instruments()
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    instrument_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let kind = match resolve_strategy_kind(strategy_override, &adapter) {
        Ok(k) => k,
        Err(e) => return fail(&e),
    };

    let data_dir = adapter
        .get_string("data", "directory")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    let data_port = CsvAdapter::new(PathBuf::from(&data_dir));

    let instruments = match resolve_instruments(instrument_override, &adapter, &data_port) {
        Ok(list) => list,
        Err(e) => return fail(&e),
    };
    if instruments.is_empty() {
        eprintln!("error: no instruments found in {}", data_dir);
        return ExitCode::from(1);
    }

    let output_dir = output_override.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("report", "directory")
                .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string()),
        )
    });

    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        kind,
        &bt_config,
        &instruments,
        &output_dir,
    )
}

/// First occurrence wins; later repeats are dropped.
fn dedup_instruments(instruments: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    instruments
        .iter()
        .filter(|instrument| seen.insert(instrument.as_str()))
        .cloned()
        .collect()
}

/// Load every instrument, run the batch, print a summary and write reports.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    kind: StrategyKind,
    bt_config: &BacktestConfig,
    instruments: &[String],
    output_dir: &Path,
) -> ExitCode {
    let instruments = dedup_instruments(instruments);
    let mut loaded: Vec<PriceSeries> = Vec::with_capacity(instruments.len());
    let mut outcomes: HashMap<String, InstrumentRun> = HashMap::new();

    for instrument in &instruments {
        match data_port.fetch_series(instrument) {
            Ok(series) => loaded.push(series),
            Err(e) => {
                eprintln!("warning: skipping {} ({})", instrument, e);
                outcomes.insert(
                    instrument.clone(),
                    InstrumentRun {
                        instrument: instrument.clone(),
                        outcome: Err(e),
                    },
                );
            }
        }
    }

    let strategy = kind.build(bt_config);
    eprintln!(
        "Running {}: {} instruments, delay {} bar(s), {} periods/year",
        kind,
        loaded.len(),
        bt_config.execution_delay_bars,
        bt_config.periods_per_year
    );

    for run in backtest_engine::run_batch(strategy.as_ref(), &loaded, bt_config) {
        outcomes.insert(run.instrument.clone(), run);
    }
    let runs: Vec<InstrumentRun> = instruments
        .iter()
        .filter_map(|instrument| outcomes.remove(instrument))
        .collect();

    print_summary(&kind.to_string(), &runs);

    if let Err(e) = report_port.write_batch(&kind.to_string(), &runs, output_dir) {
        return fail(&e);
    }
    eprintln!("\nReports written to: {}", output_dir.display());

    if runs.iter().any(|run| run.outcome.is_ok()) {
        ExitCode::SUCCESS
    } else {
        eprintln!("error: no instrument could be backtested");
        runs.iter()
            .find_map(|run| run.outcome.as_ref().err())
            .map(ExitCode::from)
            .unwrap_or_else(|| ExitCode::from(5))
    }
}

fn print_summary(strategy: &str, runs: &[InstrumentRun]) {
    eprintln!("\n=== {} ===", strategy);
    for run in runs {
        match &run.outcome {
            Ok(result) => {
                let m = &result.metrics;
                eprintln!(
                    "  {}:  return {:.2}%, sharpe {:.2}, max dd {:.1}%, win {:.1}%, exposure {:.1}%",
                    run.instrument,
                    m.total_return * 100.0,
                    m.sharpe_ratio,
                    m.max_drawdown * 100.0,
                    m.win_rate * 100.0,
                    m.exposure_time,
                );
                let undefined = m.undefined_metrics();
                if !undefined.is_empty() {
                    eprintln!("    undefined: {}", undefined.join(", "));
                }
            }
            Err(e) => eprintln!("  {}:  excluded ({})", run.instrument, e),
        }
    }

    let ranked = rank_by_total_return(runs);
    if !ranked.is_empty() {
        eprintln!("\n=== Ranked by total return ===");
        for (i, (instrument, total_return)) in ranked.iter().enumerate() {
            eprintln!("  {:>3}. {:<12} {:>8.2}%", i + 1, instrument, total_return * 100.0);
        }
    }
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let kind = match load_strategy_kind(&adapter) {
        Ok(k) => k,
        Err(e) => return fail(&e),
    };

    let strategy = kind.build(&bt_config);
    eprintln!("\nStrategy: {}", strategy.name());
    eprintln!("  minimum bars: {}", strategy.required_bars());
    eprintln!("  allow shorting: {}", bt_config.allow_shorting);
    eprintln!("\nExecution:");
    eprintln!("  initial capital: {}", bt_config.initial_capital);
    eprintln!("  commission rate: {}", bt_config.commission_rate);
    eprintln!("  slippage rate: {}", bt_config.slippage_rate);
    eprintln!("  execution delay: {} bar(s)", bt_config.execution_delay_bars);
    eprintln!("  periods per year: {}", bt_config.periods_per_year);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn run_list_instruments(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    match adapter.list_instruments() {
        Ok(instruments) if instruments.is_empty() => {
            eprintln!("No instruments found in {}", data_dir.display());
            ExitCode::SUCCESS
        }
        Ok(instruments) => {
            for instrument in &instruments {
                println!("{}", instrument);
            }
            eprintln!("{} instruments found", instruments.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
