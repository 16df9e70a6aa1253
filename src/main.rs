use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tradeledger::matcher::match_trades;
use tradeledger::metrics::PerformanceSnapshot;
use tradeledger::models::{MatchedPair, Trade};
use tradeledger::query::{DetailLevel, QueryEngine, QueryParams, QueryResponse, ResponseStatus};
use tradeledger::store::OrderLog;
use tradeledger::LedgerError;

#[derive(Parser)]
#[command(name = "tradeledger")]
#[command(about = "Reconciles an order event log into trade performance reports")]
#[command(version)]
struct Cli {
    /// Path to the order log (defaults to ORDER_LOG_FILE, then order_status_log.txt)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Only include trades whose symbol contains this text
    #[arg(short, long)]
    symbol: Option<String>,

    /// Earliest trade date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    start_date: Option<String>,

    /// Latest trade date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    end_date: Option<String>,

    /// Report detail: standard, extended or full
    #[arg(short, long, default_value = "standard")]
    detail: DetailLevel,

    /// Attach pipeline counters to the output
    #[arg(long)]
    debug: bool,

    /// Print the response as pretty JSON instead of the console report
    #[arg(long)]
    json: bool,

    /// Write <PREFIX>_trades.csv, _pairs.csv, _daily.csv and _symbols.csv
    #[arg(long, value_name = "PREFIX")]
    export: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging();

    let log_path = resolve_log_path(cli.file);
    let engine = QueryEngine::new(OrderLog::new(&log_path));

    let params = QueryParams {
        symbol: cli.symbol,
        start_date: cli.start_date,
        end_date: cli.end_date,
        detail_level: cli.detail,
        debug: cli.debug,
    };

    let response = engine.query(&params).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_report(&log_path, &response);
    }

    if response.status == ResponseStatus::NoFile {
        return Ok(());
    }

    if let Some(prefix) = cli.export.as_deref() {
        export_results(&engine, &params, prefix).await?;
    }

    Ok(())
}

fn setup_logging() {
    // Keep the report readable; raise via RUST_LOG-style filter if needed
    tracing_subscriber::fmt()
        .with_env_filter("tradeledger=warn")
        .init();
}

fn resolve_log_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        std::env::var("ORDER_LOG_FILE")
            .unwrap_or_else(|_| "order_status_log.txt".to_string())
            .into()
    })
}

// ============================================================================
// Console Report
// ============================================================================

fn print_report(log_path: &Path, response: &QueryResponse) {
    if response.status == ResponseStatus::NoFile {
        println!("\nNo order log found at {}", log_path.display());
        println!("Point --file (or ORDER_LOG_FILE) at a log, or write one with the genlog tool.");
        return;
    }

    let perf = &response.performance;

    println!("\n═══════════════════════════════════════════════════════");
    println!("            TRADE LEDGER PERFORMANCE REPORT");
    println!("═══════════════════════════════════════════════════════\n");
    println!("Log File:            {}", log_path.display());
    println!("Total Trades:        {}", perf.total_trades);
    println!("Buys / Sells:        {} / {}", perf.buys, perf.sells);
    println!("Executed:            {}", perf.executed);
    println!("Cancelled:           {}", perf.cancelled);
    println!("Executed Volume:     ${:.2}", perf.total_volume);

    println!("\n═══════════════════════════════════════════════════════");
    println!("                    REALIZED P&L");
    println!("═══════════════════════════════════════════════════════\n");
    println!("Matched Pairs:       {}", perf.matched_pairs);
    println!("Profit/Loss:         ${:+.2}", perf.profit_loss);
    println!(
        "Winning Pairs:       {} ({:.1}%)",
        perf.win_trades,
        perf.win_rate * 100.0
    );
    println!("Losing Pairs:        {}", perf.loss_trades);
    println!("Break-even Pairs:    {}", perf.break_even_trades);
    println!("Avg P&L per Pair:    ${:+.2}", perf.avg_profit_per_trade);
    println!("Average Win:         ${:.2}", perf.avg_win);
    println!("Average Loss:        ${:.2}", perf.avg_loss);
    println!("Largest Win:         ${:.2}", perf.largest_win);
    println!("Largest Loss:        ${:.2}", perf.largest_loss);
    println!("Profit Factor:       {:.2}", perf.profit_factor);
    println!("Expectancy:          ${:.2}", perf.expectancy);
    println!("Risk/Reward:         {:.2}", perf.risk_reward_ratio);
    println!("Longest Win Streak:  {}", perf.longest_win_streak);
    println!("Longest Loss Streak: {}", perf.longest_loss_streak);
    println!("Avg Hold Time:       {:.1}h", perf.avg_trade_duration_hours);
    println!("Trades per Day:      {:.1}", perf.trade_frequency);

    if let Some(trade) = &perf.highest_profit_trade {
        println!(
            "\nLargest Sell:        {} {} {:.4} @ ${:.2} (${:.2})",
            trade.date, trade.symbol, trade.amount, trade.price, trade.value
        );
    }
    if let Some(trade) = &perf.highest_loss_trade {
        println!(
            "Largest Buy:         {} {} {:.4} @ ${:.2} (${:.2})",
            trade.date, trade.symbol, trade.amount, trade.price, trade.value
        );
    }

    if !perf.daily_performance.is_empty() {
        println!("\n═══════════════════════════════════════════════════════");
        println!("                   DAILY BREAKDOWN");
        println!("═══════════════════════════════════════════════════════\n");
        println!(
            "{:<12} {:>7} {:>6} {:>6} {:>9} {:>10} {:>12}",
            "Date", "Trades", "Buys", "Sells", "Executed", "Cancelled", "P&L"
        );
        println!("{}", "─".repeat(68));
        for day in &perf.daily_performance {
            println!(
                "{:<12} {:>7} {:>6} {:>6} {:>9} {:>10} {:>+12.2}",
                day.date, day.trades, day.buys, day.sells, day.executed, day.cancelled,
                day.profit_loss
            );
        }
    }

    if !perf.symbols.is_empty() {
        println!("\n═══════════════════════════════════════════════════════");
        println!("                  SYMBOL BREAKDOWN");
        println!("═══════════════════════════════════════════════════════\n");
        println!(
            "{:<12} {:>7} {:>6} {:>6} {:>12} {:>12}",
            "Symbol", "Trades", "Buys", "Sells", "Volume", "P&L"
        );
        println!("{}", "─".repeat(60));
        for (symbol, stats) in &perf.symbols {
            println!(
                "{:<12} {:>7} {:>6} {:>6} {:>12.2} {:>+12.2}",
                symbol, stats.trades, stats.buys, stats.sells, stats.volume, stats.profit_loss
            );
        }
    }

    if let Some(hourly) = &response.hourly_stats {
        println!("\n─────────────────────────────────────────────────────────");
        println!("Activity by Hour:\n");
        println!(
            "{:<6} {:>7} {:>9} {:>10} {:>6} {:>6} {:>9}",
            "Hour", "Total", "Executed", "Cancelled", "Buys", "Sells", "Success"
        );
        for (hour, activity) in hourly {
            println!(
                "{:<6} {:>7} {:>9} {:>10} {:>6} {:>6} {:>8.1}%",
                hour,
                activity.total,
                activity.executed,
                activity.cancelled,
                activity.buys,
                activity.sells,
                activity.success_rate * 100.0
            );
        }
    }

    if !response.trades.is_empty() {
        let start = response.trades.len().saturating_sub(10);
        println!("\n─────────────────────────────────────────────────────────");
        println!(
            "Recent Trades (last {} of {}):\n",
            response.trades.len() - start,
            perf.total_trades
        );
        println!(
            "{:<26} {:<10} {:<5} {:>10} {:>12} {:>12}",
            "Time", "Symbol", "Side", "Amount", "Price", "Value"
        );
        for trade in &response.trades[start..] {
            println!(
                "{:<26} {:<10} {:<5} {:>10.4} {:>12.2} {:>12.2}",
                trade.time,
                trade.symbol,
                trade.side.to_string(),
                trade.amount,
                trade.price,
                trade.value
            );
        }
    }

    if let Some(errors) = &response.parse_errors {
        println!("\n─────────────────────────────────────────────────────────");
        println!("Parse Errors:        {}", errors.len());
        for err in errors.iter().take(5) {
            let clipped: String = err.line.chars().take(60).collect();
            println!("  [{}] {}", err.error, clipped);
        }
        if errors.len() > 5 {
            println!("  ... and {} more", errors.len() - 5);
        }
    }

    if let Some(debug) = &response.debug_info {
        println!("\n─────────────────────────────────────────────────────────");
        println!("Pipeline Counters:\n");
        println!("Log Lines:           {}", debug.total_lines);
        println!("Order Lines:         {}", debug.order_lines);
        println!("Accepted Trades:     {}", debug.accepted_trades);
        println!("Filtered Out:        {}", debug.filtered_out);
        println!("Matched Pairs:       {}", debug.matched_pairs);
        println!("Open Lots:           {}", debug.open_lots);
        println!("Parse Errors:        {}", debug.parse_errors);
    }

    println!();
}

// ============================================================================
// CSV Export
// ============================================================================

/// Re-runs the query at full detail so the export covers the whole batch,
/// not the clipped recent-trades window.
async fn export_results(engine: &QueryEngine, params: &QueryParams, prefix: &str) -> Result<()> {
    let full_params = QueryParams {
        detail_level: DetailLevel::Full,
        ..params.clone()
    };
    let response = engine.query(&full_params).await?;
    let trades = response.all_trades.unwrap_or_default();
    let outcome = match_trades(&trades);

    export_results_to_csv(prefix, &trades, &outcome.pairs, &response.performance)?;
    println!(
        "Exported {} trades and {} pairs to {}_*.csv",
        trades.len(),
        outcome.pairs.len(),
        prefix
    );
    Ok(())
}

fn export_results_to_csv(
    prefix: &str,
    trades: &[Trade],
    pairs: &[MatchedPair],
    performance: &PerformanceSnapshot,
) -> tradeledger::Result<()> {
    write_exports(prefix, trades, pairs, performance).map_err(|source| LedgerError::Export {
        path: format!("{}_*.csv", prefix),
        source,
    })
}

fn write_exports(
    prefix: &str,
    trades: &[Trade],
    pairs: &[MatchedPair],
    performance: &PerformanceSnapshot,
) -> std::io::Result<()> {
    use std::fs::File;
    use std::io::Write;

    let path = format!("{}_trades.csv", prefix);
    let mut file = File::create(&path)?;
    writeln!(
        file,
        "date,time,order_id,symbol,side,type,price,amount,value,status"
    )?;
    for trade in trades {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{}",
            trade.date,
            trade.time,
            trade.order_id,
            trade.symbol,
            trade.side,
            trade.order_kind,
            trade.price,
            trade.amount,
            trade.value,
            trade.status
        )?;
    }
    tracing::info!("Exported {} trades to {}", trades.len(), path);

    let path = format!("{}_pairs.csv", prefix);
    let mut file = File::create(&path)?;
    writeln!(
        file,
        "buy_order,sell_order,symbol,buy_time,sell_time,buy_price,sell_price,amount,profit_loss,profit_loss_percent,duration_hours"
    )?;
    for pair in pairs {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{}",
            pair.buy_order,
            pair.sell_order,
            pair.symbol,
            pair.buy_time,
            pair.sell_time,
            pair.buy_price,
            pair.sell_price,
            pair.matched_amount,
            pair.profit_loss,
            pair.profit_loss_percent,
            pair.duration_hours
        )?;
    }
    tracing::info!("Exported {} pairs to {}", pairs.len(), path);

    let path = format!("{}_daily.csv", prefix);
    let mut file = File::create(&path)?;
    writeln!(
        file,
        "date,trades,buys,sells,volume,executed,cancelled,profit_loss"
    )?;
    for day in &performance.daily_performance {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            day.date,
            day.trades,
            day.buys,
            day.sells,
            day.volume,
            day.executed,
            day.cancelled,
            day.profit_loss
        )?;
    }

    let path = format!("{}_symbols.csv", prefix);
    let mut file = File::create(&path)?;
    writeln!(
        file,
        "symbol,trades,buys,sells,volume,executed,cancelled,avg_buy_price,avg_sell_price,total_buy_value,total_sell_value,profit_loss"
    )?;
    for (symbol, stats) in &performance.symbols {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            symbol,
            stats.trades,
            stats.buys,
            stats.sells,
            stats.volume,
            stats.executed,
            stats.cancelled,
            stats.avg_buy_price,
            stats.avg_sell_price,
            stats.total_buy_value,
            stats.total_sell_value,
            stats.profit_loss
        )?;
    }

    Ok(())
}
