use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matcher::{match_trades, MatchOutcome};
use crate::metrics::{HourlyActivity, PerformanceSnapshot};
use crate::models::{ParseError, Trade, TradeSide};
use crate::parser;
use crate::store::{LogSnapshot, OrderLog};

/// Response verbosity policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Snapshot plus the most recent 100 trades
    #[default]
    Standard,
    /// Standard plus hourly stats and a per-symbol side summary
    Extended,
    /// Extended plus parse diagnostics and the unclipped trade list
    Full,
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            "full" => Ok(Self::Full),
            other => Err(format!(
                "unknown detail level '{}', expected standard, extended or full",
                other
            )),
        }
    }
}

/// Filters and options for one query pass
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub symbol: Option<String>,       // case-insensitive substring match
    pub start_date: Option<String>,   // YYYY-MM-DD, inclusive
    pub end_date: Option<String>,     // YYYY-MM-DD, inclusive
    pub detail_level: DetailLevel,
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    NoFile,
}

/// Per-symbol executed buy/sell counts for the extended summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideCounts {
    pub buys: usize,
    pub sells: usize,
}

/// Pipeline counters attached when the caller asks for debug output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugInfo {
    pub total_lines: usize,
    pub order_lines: usize,
    pub accepted_trades: usize,
    pub filtered_out: usize,
    pub matched_pairs: usize,
    pub open_lots: usize,
    pub parse_errors: usize,
}

/// One query's result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub performance: PerformanceSnapshot,
    pub trades: Vec<Trade>,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_stats: Option<BTreeMap<String, HourlyActivity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_trades_summary: Option<BTreeMap<String, SideCounts>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_errors: Option<Vec<ParseError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_trades: Option<Vec<Trade>>,
}

impl QueryResponse {
    fn no_file() -> Self {
        Self {
            performance: PerformanceSnapshot::default(),
            trades: Vec::new(),
            status: ResponseStatus::NoFile,
            debug_info: None,
            hourly_stats: None,
            paired_trades_summary: None,
            parse_errors: None,
            all_trades: None,
        }
    }
}

/// Read side of the ledger: turns the order log into performance reports
///
/// Holds nothing but the log handle. All matching state is scoped to a
/// single call, so concurrent queries never observe each other.
pub struct QueryEngine {
    log: OrderLog,
}

impl QueryEngine {
    pub fn new(log: OrderLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &OrderLog {
        &self.log
    }

    /// Runs one full read-parse-match-aggregate pass.
    ///
    /// A missing log file is an empty response with `no_file` status, not an
    /// error; an unreadable file is an error.
    pub async fn query(&self, params: &QueryParams) -> Result<QueryResponse> {
        let Some(snapshot) = self.log.snapshot().await? else {
            return Ok(QueryResponse::no_file());
        };
        Ok(run_query(&snapshot, params))
    }
}

/// Executes the pipeline over one closed batch of lines.
///
/// Pure and synchronous; callers that already hold the log text can use this
/// directly via [`LogSnapshot::from_text`].
pub fn run_query(snapshot: &LogSnapshot, params: &QueryParams) -> QueryResponse {
    let mut parse_errors: Vec<ParseError> = Vec::new();
    let mut trades: Vec<Trade> = Vec::new();
    let mut order_lines = 0usize;

    for line in snapshot.lines() {
        if !parser::is_order_event(line) {
            continue;
        }
        order_lines += 1;

        let event = match parser::parse_line(line) {
            Ok(event) => event,
            Err(err) => {
                parse_errors.push(err);
                continue;
            }
        };
        match parser::normalize(&event) {
            Ok(trade) => trades.push(trade),
            Err(err) => parse_errors.push(err),
        }
    }

    let accepted = trades.len();

    // One stable chronological sort for the whole batch; matching and
    // aggregation both rely on it. Ties keep input order.
    trades.sort_by(|a, b| a.time.cmp(&b.time));

    let symbol_needle = params.symbol.as_ref().map(|s| s.to_uppercase());
    let filtered: Vec<Trade> = trades
        .into_iter()
        .filter(|trade| {
            if let Some(needle) = &symbol_needle {
                if !trade.symbol.contains(needle.as_str()) {
                    return false;
                }
            }
            if let Some(start) = &params.start_date {
                if trade.date.as_str() < start.as_str() {
                    return false;
                }
            }
            if let Some(end) = &params.end_date {
                if trade.date.as_str() > end.as_str() {
                    return false;
                }
            }
            true
        })
        .collect();
    let filtered_out = accepted - filtered.len();

    let outcome = match_trades(&filtered);
    let performance = PerformanceSnapshot::aggregate(&filtered, &outcome.pairs);

    tracing::info!(
        "Processed {} lines: {} trades accepted, {} matched pairs, {} parse errors",
        snapshot.len(),
        filtered.len(),
        outcome.pairs.len(),
        parse_errors.len()
    );

    let debug_info = params.debug.then(|| DebugInfo {
        total_lines: snapshot.len(),
        order_lines,
        accepted_trades: accepted,
        filtered_out,
        matched_pairs: outcome.pairs.len(),
        open_lots: open_lot_count(&outcome),
        parse_errors: parse_errors.len(),
    });

    let extended = matches!(params.detail_level, DetailLevel::Extended | DetailLevel::Full);
    let full = params.detail_level == DetailLevel::Full;

    let recent = filtered[filtered.len().saturating_sub(100)..].to_vec();

    QueryResponse {
        hourly_stats: extended.then(|| performance.trade_success_by_hour.clone()),
        paired_trades_summary: extended.then(|| side_summary(&filtered)),
        all_trades: full.then(|| filtered.clone()),
        parse_errors: full.then_some(parse_errors),
        performance,
        trades: recent,
        status: ResponseStatus::Ok,
        debug_info,
    }
}

fn open_lot_count(outcome: &MatchOutcome) -> usize {
    outcome.open_lots.values().map(|queue| queue.len()).sum()
}

/// Executed buy/sell counts per symbol over the filtered batch.
fn side_summary(trades: &[Trade]) -> BTreeMap<String, SideCounts> {
    let mut summary: BTreeMap<String, SideCounts> = BTreeMap::new();
    for trade in trades.iter().filter(|t| parser::is_executed(&t.status)) {
        let counts = summary.entry(trade.symbol.clone()).or_default();
        match trade.side {
            TradeSide::Buy => counts.buys += 1,
            TradeSide::Sell => counts.sells += 1,
        }
    }
    summary
}
