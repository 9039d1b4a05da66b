//! fx-exposure-engine CLI
//!
//! Evaluate letter-of-credit currency exposure from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Mark a contract against a quote table
//! fx-exposure-engine analyze --contract lc.json --quotes usdinr.json --as-of 2025-05-20
//!
//! # Forward basis, JSON output
//! fx-exposure-engine analyze --contract lc.json --quotes usdinr.json --basis forward --rate 6.5 --format json
//!
//! # Forward rates for the standard tenors
//! fx-exposure-engine forward --spot 83.25 --rate 6.5
//!
//! # Deterministic synthetic quote table
//! fx-exposure-engine generate --pair USD/INR --start 2025-01-01 --end 2025-03-31
//! ```

use chrono::{NaiveDate, Utc};
use fx_exposure_engine::config::EngineConfig;
use fx_exposure_engine::core::contract::Contract;
use fx_exposure_engine::core::currency::CurrencyPair;
use fx_exposure_engine::core::error::parse_date;
use fx_exposure_engine::core::quote::RawQuote;
use fx_exposure_engine::engine::{ExposureEngine, ExposureReport, ExposureRequest, RateBasis};
use fx_exposure_engine::market::repository::RateSeriesRepository;
use fx_exposure_engine::market::source::{QuoteFile, QuoteSource, StaticQuoteSource};
use fx_exposure_engine::market::synthetic::generate_synthetic_series;
use fx_exposure_engine::pricing::forward::{ForwardRateEngine, STANDARD_TENORS};
use fx_exposure_engine::risk::portfolio::PortfolioSummary;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::process;
use std::sync::Arc;

fn print_usage() {
    eprintln!(
        r#"fx-exposure-engine: forward-rate exposure and risk for letters of credit

USAGE:
    fx-exposure-engine <COMMAND> [OPTIONS]

COMMANDS:
    analyze     Build a P&L trajectory and risk report for a contract
    forward     Compute forward rates from a spot rate
    generate    Generate a deterministic synthetic quote table
    help        Show this message

OPTIONS (analyze):
    --contract <FILE>   Path to JSON contract file (required; repeat for a portfolio)
    --quotes <FILE>     Path to JSON quote table (omit to use the synthetic series)
    --as-of <DATE>      Valuation date, YYYY-MM-DD (default: today)
    --basis <BASIS>     spot (default), forward, or table
    --rate <PCT>        Annual interest rate in percent for the forward basis (default: 6.5)
    --table <FILE>      JSON object of date -> rate for the table basis
    --exit <DATES>      Comma-separated candidate exit dates
    --shifts <PCTS>     Comma-separated scenario shifts in percent
    --config <FILE>     Engine configuration JSON
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (forward):
    --spot <RATE>       Spot rate (required)
    --rate <PCT>        Annual interest rate in percent (required)
    --days <N>          Days to maturity (default: standard tenor table)

OPTIONS (generate):
    --pair <PAIR>       Currency pair, e.g. USD/INR (default: USD/INR)
    --start <DATE>      First day (required)
    --end <DATE>        Last day (required)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    fx-exposure-engine analyze --contract lc.json --quotes usdinr.json --exit 2025-05-15,2025-05-20
    fx-exposure-engine analyze --contract lc.json --basis forward --rate 7 --format json
    fx-exposure-engine analyze --contract lc1.json --contract lc2.json --quotes usdinr.json
    fx-exposure-engine forward --spot 83.25 --rate 6.5 --days 90
    fx-exposure-engine generate --pair EUR/INR --start 2025-01-01 --end 2025-06-30 --output eurinr.json"#
    );
}

fn exit_with(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Value following an option flag.
fn option_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, what);
        process::exit(1);
    })
}

fn parse_decimal(value: &str, flag: &str) -> Decimal {
    value.trim().parse().unwrap_or_else(|e| {
        eprintln!("Invalid {} '{}': {}", flag, value, e);
        process::exit(1);
    })
}

fn parse_date_or_exit(value: &str) -> NaiveDate {
    parse_date(value).unwrap_or_else(|e| exit_with(e))
}

fn load_contract(path: &str) -> Contract {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing contract: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "id": "LC-2025-001",
  "notional": "500000",
  "direction": "import",
  "signing_date": "2025-05-03",
  "maturity_date": "2025-06-02",
  "contracted_rate": "82.50",
  "pair": {{ "base": "USD", "quote": "INR" }}
}}"#
        );
        process::exit(1);
    })
}

fn load_rate_table(path: &str) -> BTreeMap<NaiveDate, Decimal> {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing rate table: {}", e);
        eprintln!(r#"Expected format: {{ "2025-05-03": "82.10", "2025-05-04": "82.15" }}"#);
        process::exit(1);
    })
}

#[derive(Serialize)]
struct PortfolioOutput<'a> {
    reports: &'a [ExposureReport],
    portfolio: &'a PortfolioSummary,
}

fn cmd_analyze(args: &[String]) {
    let mut contract_paths: Vec<String> = Vec::new();
    let mut quotes_path: Option<String> = None;
    let mut as_of = Utc::now().date_naive();
    let mut basis = "spot".to_string();
    let mut rate = Decimal::new(65, 1);
    let mut table_path: Option<String> = None;
    let mut exits: Vec<NaiveDate> = Vec::new();
    let mut shifts: Option<Vec<Decimal>> = None;
    let mut config_path: Option<String> = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--contract" => contract_paths.push(option_value(args, i, flag, "a file path")),
            "--quotes" => quotes_path = Some(option_value(args, i, flag, "a file path")),
            "--as-of" => as_of = parse_date_or_exit(&option_value(args, i, flag, "a date")),
            "--basis" => basis = option_value(args, i, flag, "'spot', 'forward' or 'table'"),
            "--rate" => rate = parse_decimal(&option_value(args, i, flag, "a percentage"), flag),
            "--table" => table_path = Some(option_value(args, i, flag, "a file path")),
            "--exit" => {
                exits = option_value(args, i, flag, "a comma-separated list of dates")
                    .split(',')
                    .map(parse_date_or_exit)
                    .collect();
            }
            "--shifts" => {
                shifts = Some(
                    option_value(args, i, flag, "a comma-separated list of percentages")
                        .split(',')
                        .map(|s| parse_decimal(s, flag))
                        .collect(),
                );
            }
            "--config" => config_path = Some(option_value(args, i, flag, "a file path")),
            "--format" => format = option_value(args, i, flag, "'text' or 'json'"),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    if contract_paths.is_empty() {
        exit_with("--contract <FILE> is required");
    }
    let contracts: Vec<Contract> = contract_paths.iter().map(|p| load_contract(p)).collect();

    let config = match config_path {
        Some(path) => EngineConfig::from_json_file(&path).unwrap_or_else(|e| exit_with(e)),
        None => EngineConfig::default(),
    };

    let mut sources: Vec<Arc<dyn QuoteSource>> = Vec::new();
    if let Some(path) = quotes_path {
        let source = StaticQuoteSource::from_json_file("quote-file", &path).unwrap_or_else(|e| exit_with(e));
        sources.push(Arc::new(source));
    }
    let repository = RateSeriesRepository::new(sources, &config.repository);

    let rate_basis = match basis.as_str() {
        "spot" => RateBasis::Spot,
        "forward" => RateBasis::Forward {
            annual_rate_percent: rate,
        },
        "table" => {
            let path = table_path.unwrap_or_else(|| exit_with("--basis table requires --table <FILE>"));
            RateBasis::Table {
                rates: load_rate_table(&path),
            }
        }
        other => exit_with(format!("unknown basis '{}'", other)),
    };

    let engine = ExposureEngine::new(repository, config);
    let reports: Vec<ExposureReport> = contracts
        .into_iter()
        .map(|contract| {
            let mut request = ExposureRequest::new(contract, as_of)
                .with_basis(rate_basis.clone())
                .with_exit_candidates(exits.clone());
            if let Some(shifts) = &shifts {
                request = request.with_scenario_shifts(shifts.clone());
            }
            engine.evaluate(&request).unwrap_or_else(|e| exit_with(e))
        })
        .collect();
    let portfolio = (reports.len() > 1).then(|| PortfolioSummary::from_reports(&reports));

    if format == "json" {
        let json = match &portfolio {
            Some(portfolio) => serde_json::to_string_pretty(&PortfolioOutput {
                reports: &reports,
                portfolio,
            }),
            None => serde_json::to_string_pretty(&reports[0]),
        }
        .unwrap_or_else(|e| exit_with(e));
        println!("{}", json);
    } else {
        for report in &reports {
            println!("{}", report);
            println!("Daily trajectory (* = not observed):");
            for point in &report.trajectory {
                println!("  {}", point);
            }
            println!();
        }
        if let Some(portfolio) = portfolio {
            println!("{}", portfolio);
        }
    }
}

fn cmd_forward(args: &[String]) {
    let mut spot = None;
    let mut rate = None;
    let mut days: Option<u32> = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--spot" => spot = Some(parse_decimal(&option_value(args, i, flag, "a rate"), flag)),
            "--rate" => rate = Some(parse_decimal(&option_value(args, i, flag, "a percentage"), flag)),
            "--days" => {
                days = Some(
                    option_value(args, i, flag, "a number")
                        .parse()
                        .unwrap_or_else(|_| exit_with("--days requires a non-negative number")),
                );
            }
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let spot = spot.unwrap_or_else(|| exit_with("--spot <RATE> is required"));
    let rate = rate.unwrap_or_else(|| exit_with("--rate <PCT> is required"));

    match days {
        Some(days) => {
            let forward = ForwardRateEngine::forward_rate(spot, rate, days).unwrap_or_else(|e| exit_with(e));
            println!("Spot:      {}", spot);
            println!("Rate:      {}% p.a.", rate);
            println!("Days:      {}", days);
            println!("Forward:   {}", forward.round_dp(4));
            println!("Premium:   {}", (forward - spot).round_dp(4));
        }
        None => {
            let points = ForwardRateEngine::tenor_curve(spot, rate, &STANDARD_TENORS)
                .unwrap_or_else(|e| exit_with(e));
            println!("Spot {} @ {}% p.a.", spot, rate);
            println!("Tenor         Forward     Premium  Premium%");
            for point in points {
                println!("{}", point);
            }
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut pair = CurrencyPair::default();
    let mut start = None;
    let mut end = None;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--pair" => {
                pair = option_value(args, i, flag, "a pair such as USD/INR")
                    .parse()
                    .unwrap_or_else(|e| exit_with(e));
            }
            "--start" => start = Some(parse_date_or_exit(&option_value(args, i, flag, "a date"))),
            "--end" => end = Some(parse_date_or_exit(&option_value(args, i, flag, "a date"))),
            "--output" => output_path = Some(option_value(args, i, flag, "a file path")),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let start = start.unwrap_or_else(|| exit_with("--start <DATE> is required"));
    let end = end.unwrap_or_else(|| exit_with("--end <DATE> is required"));

    let series = generate_synthetic_series(&pair, start, end, &EngineConfig::default().synthetic)
        .unwrap_or_else(|e| exit_with(e));

    let output = QuoteFile {
        pair: pair.to_string(),
        quotes: series.iter().map(RawQuote::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| exit_with(e));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!("Generated {} synthetic {} quotes → {}", series.len(), pair, path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "analyze" => cmd_analyze(rest),
        "forward" => cmd_forward(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
