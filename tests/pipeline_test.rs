use std::collections::HashMap;
use std::path::PathBuf;

use tradeledger::matcher::match_trades;
use tradeledger::models::TradeSide;
use tradeledger::parser::is_executed;
use tradeledger::query::{run_query, DetailLevel, QueryEngine, QueryParams, ResponseStatus};
use tradeledger::store::{LogSnapshot, OrderLog};
use tradeledger::synthetic::{encode_order_line, LogScenario, SyntheticLogGenerator};

fn temp_log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tradeledger_{}_{}.log", name, std::process::id()))
}

fn buy_line(timestamp: &str, id: u64, symbol: &str, amount: f64, price: f64) -> String {
    encode_order_line(
        timestamp,
        id,
        &format!("EXECUTED @ {}({})", price, amount),
        symbol,
        amount,
        "EXCHANGE LIMIT",
        price,
    )
}

fn sell_line(timestamp: &str, id: u64, symbol: &str, amount: f64, price: f64) -> String {
    encode_order_line(
        timestamp,
        id,
        &format!("EXECUTED @ {}(-{})", price, amount),
        symbol,
        -amount,
        "EXCHANGE LIMIT",
        price,
    )
}

#[tokio::test]
async fn test_end_to_end_over_generated_log_file() {
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Ledger Pipeline E2E ===\n");

    // 1. Generate a clean profitable day and write it to a real file
    println!("1. Generating synthetic log...");
    let mut generator = SyntheticLogGenerator::new(42);
    let lines = generator.generate(LogScenario::ProfitableDay, 50);
    assert_eq!(lines.len(), 50);

    let path = temp_log_path("e2e");
    std::fs::write(&path, lines.join("\n") + "\n").expect("write temp log");
    println!("   ✓ Wrote {} lines to {}", lines.len(), path.display());

    // 2. Query it at full detail with pipeline counters
    println!("\n2. Running full query...");
    let engine = QueryEngine::new(OrderLog::new(&path));
    let params = QueryParams {
        detail_level: DetailLevel::Full,
        debug: true,
        ..Default::default()
    };
    let response = engine.query(&params).await.expect("query should succeed");

    assert_eq!(response.status, ResponseStatus::Ok);
    let perf = &response.performance;
    println!(
        "   ✓ {} trades, {} pairs, P&L ${:.2}",
        perf.total_trades, perf.matched_pairs, perf.profit_loss
    );

    // Alternating buy/sell on one symbol pairs everything off
    assert_eq!(perf.total_trades, 50);
    assert_eq!(perf.buys, 25);
    assert_eq!(perf.sells, 25);
    assert_eq!(perf.executed, 50);
    assert_eq!(perf.cancelled, 0);
    assert_eq!(perf.matched_pairs, 25);
    assert_eq!(perf.win_trades, 25);
    assert_eq!(perf.loss_trades, 0);
    assert!((perf.win_rate - 1.0).abs() < 1e-9);
    assert!(perf.profit_loss > 0.0);

    let debug = response.debug_info.as_ref().expect("debug counters");
    assert_eq!(debug.total_lines, 50);
    assert_eq!(debug.order_lines, 50);
    assert_eq!(debug.accepted_trades, 50);
    assert_eq!(debug.filtered_out, 0);
    assert_eq!(debug.matched_pairs, 25);
    assert_eq!(debug.open_lots, 0);
    assert_eq!(debug.parse_errors, 0);

    assert_eq!(response.all_trades.as_ref().map(Vec::len), Some(50));
    assert_eq!(response.parse_errors.as_ref().map(Vec::len), Some(0));
    assert!(response.hourly_stats.is_some());

    assert_eq!(perf.daily_performance.len(), 1);
    assert_eq!(perf.daily_performance[0].date, "2024-03-01");
    assert_eq!(perf.daily_performance[0].trades, 50);

    // 3. The same query over the same file gives the same answer
    println!("\n3. Checking idempotence...");
    let second = engine.query(&params).await.expect("second query");
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    println!("   ✓ Responses identical");

    let _ = std::fs::remove_file(&path);
    println!("\n=== E2E Complete ✅ ===");
}

#[test]
fn test_round_trip_buy_sell_pair() {
    let lines = vec![
        buy_line("2024-03-01 09:00:00.000000", 1, "tBTCUSDT", 1.0, 100.0),
        sell_line("2024-03-01 11:00:00.000000", 2, "tBTCUSDT", 1.0, 110.0),
    ];
    let snapshot = LogSnapshot::from_text(&lines.join("\n"));

    let response = run_query(&snapshot, &QueryParams::default());
    let perf = &response.performance;

    assert_eq!(perf.total_trades, 2);
    assert_eq!(perf.matched_pairs, 1);
    assert!((perf.profit_loss - 10.0).abs() < 1e-9);
    assert_eq!(perf.win_trades, 1);
    assert!((perf.win_rate - 1.0).abs() < 1e-9);
    assert!((perf.avg_profit_per_trade - 10.0).abs() < 1e-9);
    assert!((perf.avg_trade_duration_hours - 2.0).abs() < 1e-9);

    assert_eq!(response.trades[0].order_id, "1");
    assert_eq!(response.trades[1].order_id, "2");
}

#[test]
fn test_oversell_matches_only_covered_amount() {
    let lines = vec![
        buy_line("2024-03-01 09:00:00.000000", 1, "tBTCUSDT", 1.0, 100.0),
        sell_line("2024-03-01 10:00:00.000000", 2, "tBTCUSDT", 2.0, 110.0),
    ];
    let snapshot = LogSnapshot::from_text(&lines.join("\n"));

    let params = QueryParams {
        debug: true,
        ..Default::default()
    };
    let response = run_query(&snapshot, &params);

    // The uncovered half of the sell is dropped, not shorted
    assert_eq!(response.performance.matched_pairs, 1);
    assert!((response.performance.profit_loss - 10.0).abs() < 1e-9);
    assert_eq!(response.debug_info.unwrap().open_lots, 0);
}

#[tokio::test]
async fn test_malformed_lines_surface_as_diagnostics() {
    let mut generator = SyntheticLogGenerator::new(42);
    let lines = generator.generate(LogScenario::Malformed, 50);

    let path = temp_log_path("malformed");
    std::fs::write(&path, lines.join("\n") + "\n").expect("write temp log");

    let engine = QueryEngine::new(OrderLog::new(&path));
    let params = QueryParams {
        detail_level: DetailLevel::Full,
        debug: true,
        ..Default::default()
    };
    let response = engine.query(&params).await.expect("query should succeed");

    // Every seventh line is corrupt; the rest still goes through
    assert_eq!(response.status, ResponseStatus::Ok);
    let errors = response.parse_errors.as_ref().expect("full detail");
    assert_eq!(errors.len(), 7);
    assert!(errors.iter().all(|e| !e.line.is_empty() && !e.error.is_empty()));

    let debug = response.debug_info.as_ref().expect("debug counters");
    assert_eq!(debug.order_lines, 50);
    assert_eq!(debug.accepted_trades, 43);
    assert_eq!(debug.accepted_trades + debug.parse_errors, debug.order_lines);

    assert_eq!(response.performance.total_trades, 43);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_filters_restrict_the_batch() {
    let mut generator = SyntheticLogGenerator::new(42);
    let lines = generator.generate(LogScenario::MixedWeek, 70);
    let snapshot = LogSnapshot::from_text(&lines.join("\n"));

    // Symbols rotate; every third order is tETHUSDT
    let by_symbol = run_query(
        &snapshot,
        &QueryParams {
            symbol: Some("eth".to_string()),
            debug: true,
            ..Default::default()
        },
    );
    assert_eq!(by_symbol.performance.total_trades, 23);
    assert!(by_symbol
        .trades
        .iter()
        .all(|trade| trade.symbol.contains("ETH")));
    assert_eq!(by_symbol.debug_info.unwrap().filtered_out, 47);

    // Ten orders per day; three days of the week stay inside the window
    let by_date = run_query(
        &snapshot,
        &QueryParams {
            start_date: Some("2024-03-03".to_string()),
            end_date: Some("2024-03-05".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(by_date.performance.total_trades, 30);
    assert!(by_date
        .trades
        .iter()
        .all(|trade| trade.date.as_str() >= "2024-03-03" && trade.date.as_str() <= "2024-03-05"));
}

#[test]
fn test_volume_is_conserved_per_symbol() {
    let mut generator = SyntheticLogGenerator::new(7);
    let lines = generator.generate(LogScenario::MixedWeek, 70);
    let snapshot = LogSnapshot::from_text(&lines.join("\n"));

    let response = run_query(
        &snapshot,
        &QueryParams {
            detail_level: DetailLevel::Full,
            ..Default::default()
        },
    );
    let trades = response.all_trades.expect("full detail");
    let outcome = match_trades(&trades);

    let mut bought: HashMap<String, f64> = HashMap::new();
    for trade in trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy && is_executed(&t.status))
    {
        *bought.entry(trade.symbol.clone()).or_default() += trade.amount;
    }

    let mut matched: HashMap<String, f64> = HashMap::new();
    for pair in &outcome.pairs {
        *matched.entry(pair.symbol.clone()).or_default() += pair.matched_amount;
    }

    for (symbol, amount) in &matched {
        let available = bought.get(symbol).copied().unwrap_or(0.0);
        assert!(
            *amount <= available + 1e-9,
            "{}: matched {} exceeds bought {}",
            symbol,
            amount,
            available
        );
    }
    for queue in outcome.open_lots.values() {
        for lot in queue {
            assert!(lot.remaining_amount > 0.0);
        }
    }

    // Daily buckets come out date-ascending
    let dates: Vec<&str> = response
        .performance
        .daily_performance
        .iter()
        .map(|d| d.date.as_str())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn test_missing_log_file_reports_no_file() {
    let engine = QueryEngine::new(OrderLog::new(temp_log_path("does_not_exist")));

    let response = engine
        .query(&QueryParams::default())
        .await
        .expect("missing file is not an error");

    assert_eq!(response.status, ResponseStatus::NoFile);
    assert_eq!(response.performance.total_trades, 0);
    assert!(response.trades.is_empty());
    assert!(response.all_trades.is_none());
}
