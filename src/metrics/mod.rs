use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{MatchedPair, Trade, TradeSide};
use crate::parser::{is_cancelled, is_executed};

/// Per-day activity bucket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyPerformance {
    pub date: String,
    pub trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub volume: f64,
    pub executed: usize,
    pub cancelled: usize,
    pub profit_loss: f64,  // realized P&L of pairs whose sell closed on this date
}

/// Per-symbol rollup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolStats {
    pub trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub volume: f64,
    pub executed: usize,
    pub cancelled: usize,
    pub avg_buy_price: f64,
    pub avg_sell_price: f64,
    pub total_buy_value: f64,
    pub total_sell_value: f64,
    pub profit_loss: f64,
}

/// Executed-trade count for one hour of the day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyCount {
    pub hour: String,  // zero-padded "00".."23"
    pub count: usize,
}

/// Full activity bucket for one hour of the day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyActivity {
    pub total: usize,
    pub executed: usize,
    pub cancelled: usize,
    pub buys: usize,
    pub sells: usize,
    pub success_rate: f64,  // executed / total
}

/// Complete performance snapshot for one reconciliation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    // Activity
    pub total_trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub executed: usize,
    pub cancelled: usize,
    pub total_volume: f64,  // executed value only

    // Realized P&L over matched pairs
    pub matched_pairs: usize,
    pub profit_loss: f64,
    pub win_trades: usize,
    pub loss_trades: usize,
    pub break_even_trades: usize,
    pub win_rate: f64,  // wins / (wins + losses), 0..=1
    pub avg_profit_per_trade: f64,

    // P&L distribution
    pub avg_win: f64,
    pub avg_loss: f64,  // mean of losing pairs, negative when losses exist
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub risk_reward_ratio: f64,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,

    // Timing
    pub avg_trade_duration_hours: f64,
    pub trade_frequency: f64,  // trades per distinct active day

    // Notable single trades
    pub highest_profit_trade: Option<Trade>,
    pub highest_loss_trade: Option<Trade>,

    // Breakdowns
    pub daily_performance: Vec<DailyPerformance>,
    pub symbols: BTreeMap<String, SymbolStats>,
    pub hourly_distribution: Vec<HourlyCount>,
    pub trade_success_by_hour: BTreeMap<String, HourlyActivity>,
}

/// Hour-of-day from a log timestamp, "00" when the clock part is missing.
fn hour_of(time: &str) -> String {
    time.split(' ')
        .nth(1)
        .filter(|clock| clock.contains(':'))
        .and_then(|clock| clock.split(':').next())
        .map(str::to_string)
        .unwrap_or_else(|| "00".to_string())
}

impl PerformanceSnapshot {
    /// Folds an accepted trade batch and its matched pairs into a snapshot.
    ///
    /// Pure over its inputs. Trades are the validated batch in chronological
    /// order; pairs are in sell-completion order as emitted by the matcher.
    pub fn aggregate(trades: &[Trade], pairs: &[MatchedPair]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        // Activity counts
        let total_trades = trades.len();
        let buys = trades.iter().filter(|t| t.side == TradeSide::Buy).count();
        let sells = total_trades - buys;
        let executed = trades.iter().filter(|t| is_executed(&t.status)).count();
        let cancelled = trades.iter().filter(|t| is_cancelled(&t.status)).count();
        let total_volume: f64 = trades
            .iter()
            .filter(|t| is_executed(&t.status))
            .map(|t| t.value)
            .sum();

        // Win/loss partition
        let wins: Vec<f64> = pairs
            .iter()
            .map(|p| p.profit_loss)
            .filter(|pl| *pl > 0.0)
            .collect();
        let losses: Vec<f64> = pairs
            .iter()
            .map(|p| p.profit_loss)
            .filter(|pl| *pl < 0.0)
            .collect();

        let win_trades = wins.len();
        let loss_trades = losses.len();
        let break_even_trades = pairs.len() - win_trades - loss_trades;

        let profit_loss: f64 = pairs.iter().map(|p| p.profit_loss).sum();
        let closed = win_trades + loss_trades;
        let win_rate = if closed > 0 {
            win_trades as f64 / closed as f64
        } else {
            0.0
        };
        let avg_profit_per_trade = if pairs.is_empty() {
            0.0
        } else {
            profit_loss / pairs.len() as f64
        };

        let total_wins: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().map(|pl| pl.abs()).sum();
        let avg_win = if win_trades > 0 {
            total_wins / win_trades as f64
        } else {
            0.0
        };
        let avg_loss = if loss_trades > 0 {
            losses.iter().sum::<f64>() / loss_trades as f64
        } else {
            0.0
        };
        let largest_win = wins.iter().copied().fold(0.0, f64::max);
        let largest_loss = losses.iter().copied().fold(0.0, f64::min);

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else {
            0.0
        };
        let risk_reward_ratio = if avg_loss.abs() > 0.0 {
            avg_win / avg_loss.abs()
        } else {
            0.0
        };
        let expectancy = if win_trades > 0 && loss_trades > 0 {
            win_rate * avg_win - (1.0 - win_rate) * avg_loss.abs()
        } else {
            0.0
        };

        // Streaks over pairs in completion order. A break-even pair ends the
        // current run without starting one of its own.
        let mut longest_win_streak = 0u32;
        let mut longest_loss_streak = 0u32;
        let mut win_run = 0u32;
        let mut loss_run = 0u32;
        for pair in pairs {
            if pair.profit_loss > 0.0 {
                win_run += 1;
                loss_run = 0;
                longest_win_streak = longest_win_streak.max(win_run);
            } else if pair.profit_loss < 0.0 {
                loss_run += 1;
                win_run = 0;
                longest_loss_streak = longest_loss_streak.max(loss_run);
            } else {
                win_run = 0;
                loss_run = 0;
            }
        }

        let avg_trade_duration_hours = if pairs.is_empty() {
            0.0
        } else {
            pairs.iter().map(|p| p.duration_hours).sum::<f64>() / pairs.len() as f64
        };

        // Daily buckets over the whole accepted batch, with realized P&L
        // attributed to the sell side's date.
        let mut daily: BTreeMap<String, DailyPerformance> = BTreeMap::new();
        for trade in trades {
            let bucket = daily.entry(trade.date.clone()).or_insert_with(|| DailyPerformance {
                date: trade.date.clone(),
                ..Default::default()
            });
            bucket.trades += 1;
            bucket.volume += trade.value;
            match trade.side {
                TradeSide::Buy => bucket.buys += 1,
                TradeSide::Sell => bucket.sells += 1,
            }
            if is_executed(&trade.status) {
                bucket.executed += 1;
            } else if is_cancelled(&trade.status) {
                bucket.cancelled += 1;
            }
        }
        for pair in pairs {
            let sell_date = pair.sell_time.split(' ').next().unwrap_or_default();
            if let Some(bucket) = daily.get_mut(sell_date) {
                bucket.profit_loss += pair.profit_loss;
            }
        }
        let trade_frequency = if daily.is_empty() {
            0.0
        } else {
            total_trades as f64 / daily.len() as f64
        };

        // Per-symbol rollup. Average prices divide executed value by all
        // orders seen on that side so far, cancelled ones included.
        let mut symbols: BTreeMap<String, SymbolStats> = BTreeMap::new();
        for trade in trades {
            let stats = symbols.entry(trade.symbol.clone()).or_default();
            stats.trades += 1;
            stats.volume += trade.value;
            let executed_trade = is_executed(&trade.status);
            match trade.side {
                TradeSide::Buy => {
                    stats.buys += 1;
                    if executed_trade {
                        stats.total_buy_value += trade.value;
                        stats.avg_buy_price = stats.total_buy_value / stats.buys as f64;
                    }
                }
                TradeSide::Sell => {
                    stats.sells += 1;
                    if executed_trade {
                        stats.total_sell_value += trade.value;
                        stats.avg_sell_price = stats.total_sell_value / stats.sells as f64;
                    }
                }
            }
            if executed_trade {
                stats.executed += 1;
            } else if is_cancelled(&trade.status) {
                stats.cancelled += 1;
            }
        }
        for stats in symbols.values_mut() {
            if stats.buys > 0 && stats.sells > 0 {
                stats.profit_loss = stats.total_sell_value - stats.total_buy_value;
            }
        }

        // Hour-of-day buckets
        let mut hourly: BTreeMap<String, HourlyActivity> = BTreeMap::new();
        let mut executed_by_hour: BTreeMap<String, usize> = BTreeMap::new();
        for trade in trades {
            let hour = hour_of(&trade.time);
            let bucket = hourly.entry(hour.clone()).or_default();
            bucket.total += 1;
            match trade.side {
                TradeSide::Buy => bucket.buys += 1,
                TradeSide::Sell => bucket.sells += 1,
            }
            if is_executed(&trade.status) {
                bucket.executed += 1;
                *executed_by_hour.entry(hour).or_default() += 1;
            } else if is_cancelled(&trade.status) {
                bucket.cancelled += 1;
            }
        }
        for bucket in hourly.values_mut() {
            if bucket.total > 0 {
                bucket.success_rate = bucket.executed as f64 / bucket.total as f64;
            }
        }
        let hourly_distribution: Vec<HourlyCount> = executed_by_hour
            .into_iter()
            .map(|(hour, count)| HourlyCount { hour, count })
            .collect();

        // Largest executed tickets by value; strict comparison keeps the
        // first seen on ties.
        let mut highest_profit_trade: Option<Trade> = None;
        let mut highest_loss_trade: Option<Trade> = None;
        for trade in trades.iter().filter(|t| is_executed(&t.status)) {
            match trade.side {
                TradeSide::Sell => {
                    let beats = highest_profit_trade
                        .as_ref()
                        .map_or(true, |best| trade.value > best.value);
                    if beats {
                        highest_profit_trade = Some(trade.clone());
                    }
                }
                TradeSide::Buy => {
                    let beats = highest_loss_trade
                        .as_ref()
                        .map_or(true, |best| trade.value > best.value);
                    if beats {
                        highest_loss_trade = Some(trade.clone());
                    }
                }
            }
        }

        Self {
            total_trades,
            buys,
            sells,
            executed,
            cancelled,
            total_volume,
            matched_pairs: pairs.len(),
            profit_loss,
            win_trades,
            loss_trades,
            break_even_trades,
            win_rate,
            avg_profit_per_trade,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            profit_factor,
            expectancy,
            risk_reward_ratio,
            longest_win_streak,
            longest_loss_streak,
            avg_trade_duration_hours,
            trade_frequency,
            highest_profit_trade,
            highest_loss_trade,
            daily_performance: daily.into_values().collect(),
            symbols,
            hourly_distribution,
            trade_success_by_hour: hourly,
        }
    }
}
