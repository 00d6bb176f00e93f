use analytics::BacktestSummary;
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{init_tracing, load_config, Config, StrategyConfig};
use core_types::{BotSettings, TradingBot};
use engine::{
    CycleOutcome, CyclePorts, InMemoryBotRepository, InMemoryDecisionLog, InMemoryMarketData,
    RecordingOrderGateway, TradingCycle,
};
use executor::{InMemoryExchangeInfo, OrderValidator, SymbolFilter};
use std::path::PathBuf;
use std::sync::Arc;
use strategies::{create_strategy, default_config_for, Strategy, StrategyId};

/// The main entry point for the Crypgo decision and simulation engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // CRYPGO__* overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    // Keep the guard alive so the file writer flushes on exit.
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Validate(args) => handle_validate(args),
        Commands::Paper(args) => handle_paper(args, &config).await,
        Commands::Strategies => handle_strategies(),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Strategy decisions, backtests and order pre-flight checks for crypto spot markets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay historical candles through a strategy and report the results.
    Backtest(BacktestArgs),
    /// Check an order quantity and price against a symbol's exchange rules.
    Validate(ValidateArgs),
    /// Run the live engine against historical candles with a paper order gateway.
    Paper(PaperArgs),
    /// List the available strategies with their default parameters.
    Strategies,
}

#[derive(Parser)]
struct BacktestArgs {
    /// JSON file with an array of candles (open, close, high, low, volume, closeTime).
    #[arg(long)]
    candles: PathBuf,

    /// Use this strategy with default parameters instead of the configured one.
    #[arg(long)]
    strategy: Option<String>,

    /// Show a progress bar while simulating.
    #[arg(long)]
    progress: bool,

    /// Print the summary as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ValidateArgs {
    #[arg(long)]
    symbol: String,

    #[arg(long)]
    quantity: f64,

    #[arg(long)]
    price: f64,

    /// JSON file with exchange metadata; overrides the individual filter flags.
    #[arg(long)]
    filters: Option<PathBuf>,

    #[arg(long, default_value_t = 0.0)]
    min_qty: f64,

    #[arg(long, default_value_t = 999_999_999.0)]
    max_qty: f64,

    #[arg(long, default_value_t = 1.0)]
    step_size: f64,

    #[arg(long, default_value_t = 0.0)]
    min_price: f64,

    #[arg(long, default_value_t = 999_999_999.0)]
    max_price: f64,

    #[arg(long, default_value_t = 0.01)]
    tick_size: f64,

    #[arg(long, default_value_t = 0.0)]
    min_notional: f64,
}

#[derive(Parser)]
struct PaperArgs {
    /// JSON file with an array of candles, replayed one per cycle.
    #[arg(long)]
    candles: PathBuf,

    /// JSON file with exchange metadata for the configured symbol.
    #[arg(long)]
    filters: PathBuf,

    /// Use this strategy with default parameters instead of the configured one.
    #[arg(long)]
    strategy: Option<String>,

    /// Fixed order quantity; only used when `live.use_fixed_quantity` is set.
    #[arg(long, default_value_t = 0.0)]
    quantity: f64,
}

fn strategy_config(config: &Config, name: Option<&str>) -> anyhow::Result<StrategyConfig> {
    match name {
        Some(name) => Ok(default_config_for(name)?),
        None => Ok(config.strategy.clone()),
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let strategy = create_strategy(&strategy_config(config, args.strategy.as_deref())?)?;
    let candles = backtester::load_candles(&args.candles)?;
    tracing::info!(
        strategy = strategy.name(),
        symbol = %config.backtest.symbol,
        candles = candles.len(),
        "Starting backtest"
    );

    let result = backtester::run_backtest(strategy, candles, &config.backtest, args.progress)?;
    let summary = result.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary_table(&summary, &config.backtest.currency));
    }
    Ok(())
}

fn summary_table(summary: &BacktestSummary, currency: &str) -> Table {
    let profit_factor = summary
        .profit_factor
        .map_or_else(|| "n/a".to_string(), |pf| format!("{pf:.2}"));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);
    let rows = [
        ("Strategy", summary.strategy_name.clone()),
        ("Symbol", summary.symbol.clone()),
        ("Period", format!("{} -> {}", summary.start, summary.end)),
        ("Initial capital", format!("{:.2} {currency}", summary.initial_capital)),
        ("Final capital", format!("{:.2} {currency}", summary.final_capital)),
        ("Total P&L", format!("{:.2} {currency}", summary.total_profit_loss)),
        ("ROI", format!("{:.2}%", summary.roi_pct)),
        ("Trades", summary.total_trades.to_string()),
        ("Win rate", format!("{:.2}%", summary.win_rate_pct)),
        ("Winning / losing", format!("{} / {}", summary.winning_trades, summary.losing_trades)),
        ("Average win", format!("{:.2}", summary.average_win)),
        ("Average loss", format!("{:.2}", summary.average_loss)),
        ("Profit factor", profit_factor),
        ("Max drawdown", format!("{:.2}%", summary.max_drawdown_pct)),
        ("Avg holding", format!("{}s", summary.average_holding_secs)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    table
}

fn handle_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let validator = OrderValidator::new();
    let result = match &args.filters {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read exchange metadata from {}", path.display()))?;
            let exchange = InMemoryExchangeInfo::from_json(&json)?;
            validator.validate_symbol(&exchange, &args.symbol, args.quantity, args.price)
        }
        None => {
            let filter = SymbolFilter::new(
                args.symbol.as_str(),
                args.min_qty,
                args.max_qty,
                args.step_size,
                args.min_price,
                args.max_price,
                args.tick_size,
                args.min_notional,
            )?;
            validator.validate(&filter, args.quantity, args.price)
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.is_valid {
        anyhow::bail!("order for {} is invalid: {}", args.symbol, result.errors.join("; "));
    }
    Ok(())
}

async fn handle_paper(args: PaperArgs, config: &Config) -> anyhow::Result<()> {
    let strategy = create_strategy(&strategy_config(config, args.strategy.as_deref())?)?;
    let candles = backtester::load_candles(&args.candles)?;
    let json = std::fs::read_to_string(&args.filters)
        .with_context(|| format!("Failed to read exchange metadata from {}", args.filters.display()))?;
    let exchange = InMemoryExchangeInfo::from_json(&json)?;

    let market = &config.backtest;
    let trade_amount = if market.trade_amount > 0.0 {
        market.trade_amount
    } else {
        market.initial_capital
    };
    let mut bot = TradingBot::new(BotSettings {
        symbol: market.symbol.clone(),
        strategy_id: strategy.id(),
        quantity: args.quantity,
        interval_seconds: config.live.poll_interval_seconds,
        initial_capital: market.initial_capital,
        trade_amount,
        currency: market.currency.clone(),
        trading_fees: market.trading_fees,
        minimum_profit_threshold: market.minimum_profit_threshold,
        use_fixed_quantity: config.live.use_fixed_quantity,
    })?;
    bot.start()?;

    let warm_up = strategy.min_candles().max(1);
    let cycles = candles.len().saturating_sub(warm_up) + 1;
    let orders = Arc::new(RecordingOrderGateway::new());
    let bots = Arc::new(InMemoryBotRepository::new());
    bots.insert(bot.clone()).await;
    let ports = CyclePorts {
        market_data: Arc::new(InMemoryMarketData::replaying(&market.symbol, candles, warm_up)),
        orders: orders.clone(),
        exchange: Arc::new(exchange),
        bots,
        decisions: Arc::new(InMemoryDecisionLog::new()),
    };
    let cycle = TradingCycle::from_settings(strategy, ports, market, &config.live);

    let mut rejected = 0usize;
    let mut realized_pct = Vec::new();
    for _ in 0..cycles {
        match cycle.execute(&mut bot).await {
            Ok(CycleOutcome::Rejected { .. }) => rejected += 1,
            Ok(CycleOutcome::Sold { profit_pct, .. }) => realized_pct.push(profit_pct),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Paper cycle failed"),
        }
    }

    let placed = orders.placed().await;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Cycles", "Orders", "Rejected", "Closed trades", "Avg return", "Still positioned"]);
    let average = if realized_pct.is_empty() {
        0.0
    } else {
        realized_pct.iter().sum::<f64>() / realized_pct.len() as f64
    };
    table.add_row(vec![
        cycles.to_string(),
        placed.len().to_string(),
        rejected.to_string(),
        realized_pct.len().to_string(),
        format!("{average:.2}%"),
        bot.is_positioned().to_string(),
    ]);
    println!("{table}");
    Ok(())
}

fn handle_strategies() -> anyhow::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Strategy", "Warm-up candles", "Default parameters"]);
    for id in [StrategyId::MovingAverage, StrategyId::Rsi, StrategyId::Breakout] {
        let strategy = create_strategy(&StrategyConfig::default_for(id))?;
        table.add_row(vec![
            id.as_str().to_string(),
            strategy.min_candles().to_string(),
            serde_json::to_string(&strategy.params())?,
        ]);
    }
    println!("{table}");
    Ok(())
}
