//! Gold Grid Calculator
//!
//! Computes worst-case loss, risk against balance, margin requirements and
//! simulated P&L for layered (scale-in) gold trading plans.

mod api;
mod engine;
mod error;
mod models;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::RatesClient;
use crate::engine::{Engine, EvaluationRequest, RiskPolicy};
use crate::models::{
    AccountContext, Currency, FixedConfigEntry, LayerOutcomes, Leverage, RateSnapshot,
    StrategyPlan, TradeDistribution,
};

/// Default trades per layer when none are given (effective distribution).
const DEFAULT_TRADES: [u32; 8] = [4, 4, 4, 4, 4, 8, 8, 8];

/// Risk and margin calculator for layered gold trading plans.
#[derive(Parser)]
#[command(name = "goldgrid")]
#[command(about = "Risk and margin calculator for layered gold trading plans", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON file overriding risk policy constants
    #[arg(long, env = "GOLDGRID_POLICY")]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct PlanArgs {
    /// Number of entry layers
    #[arg(long, env = "GOLDGRID_LAYERS", default_value = "8")]
    layers: usize,

    /// Lot size per trade
    #[arg(long, env = "GOLDGRID_LOT_SIZE", default_value = "0.02")]
    lot_size: Decimal,

    /// Pip value in USD per 0.01 lot
    #[arg(long, env = "GOLDGRID_PIP_VALUE", default_value = "0.1")]
    pip_value: Decimal,

    /// Stop-loss distance from the first layer (pips)
    #[arg(long, env = "GOLDGRID_SL_PIPS", default_value = "80")]
    sl_pips: Decimal,

    /// Distance between the first and last layer (pips)
    #[arg(long, env = "GOLDGRID_LAYER_SPREAD_PIPS", default_value = "40")]
    layer_spread_pips: Decimal,

    /// Trades per layer, comma separated (defaults to 4,4,4,4,4,8,8,8 truncated)
    #[arg(long, value_delimiter = ',')]
    trades: Option<Vec<u32>>,
}

#[derive(Args, Debug, Clone)]
struct AccountArgs {
    /// Account balance in account currency
    #[arg(long, env = "GOLDGRID_BALANCE", default_value = "4500")]
    balance: Decimal,

    /// Account currency (USD, EUR, GBP, CHF, AUD, CAD, JPY)
    #[arg(long, env = "GOLDGRID_CURRENCY", default_value = "EUR")]
    currency: Currency,

    /// Account leverage, e.g. 1:500
    #[arg(long, env = "GOLDGRID_LEVERAGE", default_value = "1:500")]
    leverage: Leverage,

    /// Override the XAUUSD price
    #[arg(long)]
    gold_price: Option<Decimal>,

    /// Override the USD rate of the account currency (market quoting, e.g. EURUSD)
    #[arg(long)]
    fx_rate: Option<Decimal>,

    /// Fetch live rates instead of using defaults
    #[arg(long)]
    live: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a custom layered plan
    Evaluate {
        #[command(flatten)]
        plan: PlanArgs,

        #[command(flatten)]
        account: AccountArgs,

        /// Read the whole request (plan, account, rates) from a JSON file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Take-profit distance (pips) for outcome simulation
        #[arg(long)]
        tp_pips: Option<Decimal>,

        /// Opened trades per layer, comma separated (enables simulation)
        #[arg(long, value_delimiter = ',', requires = "tp_hits")]
        opened: Option<Vec<u32>>,

        /// Take-profit hits per layer, comma separated
        #[arg(long, value_delimiter = ',', requires = "opened")]
        tp_hits: Option<Vec<u32>>,

        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Compare the preset 6/7/8-layer distributions
    Compare {
        #[command(flatten)]
        plan: PlanArgs,

        #[command(flatten)]
        account: AccountArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show current market rates
    Rates {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the active risk policy
    Policy,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let policy = match &cli.policy {
        Some(path) => RiskPolicy::from_file(path)?,
        None => RiskPolicy::default(),
    };
    let engine = Engine::new(policy);

    match cli.command {
        Commands::Evaluate {
            plan,
            account,
            input,
            tp_pips,
            opened,
            tp_hits,
            json,
        } => {
            let request = match input {
                Some(path) => {
                    info!(path = %path.display(), "Loading evaluation request");
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    serde_json::from_str::<EvaluationRequest>(&raw)
                        .with_context(|| format!("Failed to parse {}", path.display()))?
                }
                None => {
                    let mut strategy = build_plan(&plan);
                    strategy.tp_distance_pips = tp_pips;
                    if let (Some(opened_trades), Some(tp_hits)) = (opened, tp_hits) {
                        strategy.simulation = Some(LayerOutcomes {
                            opened_trades,
                            tp_hits,
                        });
                    }
                    EvaluationRequest {
                        plan: strategy,
                        account: build_account(&account),
                        rates: Some(load_rates(account.live).await?),
                    }
                }
            };

            info!(
                layers = request.plan.num_layers,
                currency = %request.account.currency,
                "Evaluating plan"
            );

            let evaluation = engine.evaluate_request(&request).inspect_err(|e| {
                warn!(field = e.field(), error = %e, "Evaluation rejected");
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                if request.rates.as_ref().map_or(true, |r| r.is_fallback) {
                    println!("Note: using default market data, live prices unavailable.");
                }
                println!("{}", evaluation);
            }
        }

        Commands::Compare {
            plan,
            account,
            json,
        } => {
            let strategy = build_plan(&plan);
            let acc = build_account(&account);
            let rates = load_rates(account.live).await?;

            info!(currency = %acc.currency, balance = %acc.balance, "Comparing presets");

            let entries = engine.compare_presets(&strategy, &acc, &rates).inspect_err(|e| {
                warn!(field = e.field(), error = %e, "Comparison rejected");
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                if rates.is_fallback {
                    println!("Note: using default market data, live prices unavailable.");
                }
                print_comparison(&entries, acc.currency);
            }
        }

        Commands::Rates { json } => {
            let rates = load_rates(true).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rates)?);
            } else {
                println!("\n=== Market Prices ===");
                println!("XAUUSD (Gold):  ${:.2}", rates.gold_price_usd);
                println!("EURUSD:         {:.4}", rates.eur_usd);
                println!("GBPUSD:         {:.4}", rates.gbp_usd);
                println!("AUDUSD:         {:.4}", rates.aud_usd);
                println!("USDCAD:         {:.4}", rates.usd_cad);
                println!("USDCHF:         {:.4}", rates.usd_chf);
                println!("USDJPY:         {:.2}", rates.usd_jpy);
                println!("Last Update:    {}", rates.captured_at.format("%Y-%m-%d %H:%M:%S"));
                if rates.is_fallback {
                    println!("\nUsing default data: live prices unavailable.");
                }
            }
        }

        Commands::Policy => {
            let p = engine.policy();

            println!("\n=== Risk Policy ===\n");
            println!("Allowed Risk:");
            println!("  {} balance and below:  {}%", p.start_balance, p.max_risk_fraction * Decimal::from(100));
            println!("  {} balance and above:  {}%", p.end_balance, p.min_risk_fraction * Decimal::from(100));
            println!("  Warning at:            {}% of allowed", p.risk_warning_fraction * Decimal::from(100));

            println!("\nMargin Thresholds:");
            println!("  Too High:              >{}%", p.margin_too_high_pct);
            println!("  High:                  >{}%", p.margin_high_pct);
            println!("  Moderate:              >{}%", p.margin_moderate_pct);

            println!("\nContract:");
            println!("  Contract Size:         {} oz/lot", p.contract_size_oz);
            println!("  Pip Value Basis:       {} lot", p.baseline_lot);
            println!("  Max Layers:            {}", p.max_layers);
            println!(
                "  Common Leverage:       {}",
                Leverage::COMMON.map(|r| format!("1:{}", r)).join(", ")
            );

            println!("\nPreset Catalogue:");
            for t in p.catalogue() {
                println!("  {} layers {:<10} {:?}", t.layers, t.distribution.label(), t.trades_distribution);
            }

            println!("\nProfit Heuristic:");
            println!("  Base Profit:           €{}", p.profit.base_profit_eur);
            println!("  Baseline Trades:       {}", p.profit.baseline_trades);
            println!("  Reference Layers:      {}", p.profit.reference_layers);
        }
    }

    Ok(())
}

fn build_plan(args: &PlanArgs) -> StrategyPlan {
    let trades_per_layer = args.trades.clone().unwrap_or_else(|| {
        (0..args.layers)
            .map(|i| DEFAULT_TRADES.get(i).copied().unwrap_or(4))
            .collect()
    });

    StrategyPlan {
        num_layers: args.layers,
        lot_size_per_trade: args.lot_size,
        pip_value: args.pip_value,
        sl_distance_pips: args.sl_pips,
        first_to_last_layer_distance_pips: args.layer_spread_pips,
        trades_per_layer,
        tp_distance_pips: None,
        simulation: None,
    }
}

fn build_account(args: &AccountArgs) -> AccountContext {
    let mut account = AccountContext::new(args.balance, args.currency, args.leverage);
    account.gold_price_override = args.gold_price;
    account.fx_override = args.fx_rate;
    account
}

async fn load_rates(live: bool) -> Result<RateSnapshot> {
    if !live {
        return Ok(RateSnapshot::fallback());
    }
    let client = RatesClient::new()?;
    Ok(client.snapshot().await)
}

fn print_comparison(entries: &[FixedConfigEntry], currency: Currency) {
    let sym = currency.symbol();

    for distribution in [TradeDistribution::Normal, TradeDistribution::Effective] {
        println!("\n=== {} Distribution ===", distribution);
        println!(
            "{:<7} {:<28} {:>7} {:>14} {:>8} {:>9} {:>8}  {}",
            "LAYERS", "TRADES", "TOTAL", "MAX LOSS", "RISK%", "ALLOWED%", "MARGIN%", "STATUS"
        );
        println!("{}", "-".repeat(110));

        for e in entries.iter().filter(|e| e.distribution == distribution) {
            println!(
                "{:<7} {:<28} {:>7} {:>14} {:>7.2}% {:>8.2}% {:>7.2}%  {}",
                e.layers,
                format!("{:?}", e.trades_distribution),
                e.exposure.total_trades,
                format!("{}{:.2}", sym, e.risk.total_loss_account_ccy),
                e.risk.actual_risk_pct,
                e.risk.allowed_risk_pct,
                e.risk.margin_usage_pct,
                e.risk.risk_status.message()
            );
        }
    }
}
