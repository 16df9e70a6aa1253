use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;

use crate::models::{MatchedPair, Trade, TradeSide};
use crate::parser::is_executed;

/// A buy execution with inventory not yet consumed by later sells
#[derive(Debug, Clone)]
pub struct OpenLot {
    pub trade: Trade,
    pub remaining_amount: f64,
}

/// Result of one matching pass over a chronological trade batch
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    pub open_lots: HashMap<String, VecDeque<OpenLot>>,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Hours between two log timestamps, 0.0 when either side fails to parse.
fn duration_hours(buy_time: &str, sell_time: &str) -> f64 {
    let parse = |t: &str| NaiveDateTime::parse_from_str(t.trim(), TIMESTAMP_FORMAT);
    match (parse(buy_time), parse(sell_time)) {
        (Ok(bought), Ok(sold)) => (sold - bought).num_milliseconds() as f64 / 3_600_000.0,
        _ => 0.0,
    }
}

fn build_pair(buy: &Trade, sell: &Trade, matched_amount: f64) -> MatchedPair {
    let profit_loss = (sell.price - buy.price) * matched_amount;
    let buy_cost = buy.price * matched_amount;
    let profit_loss_percent = if buy_cost > 0.0 {
        profit_loss / buy_cost * 100.0
    } else {
        0.0
    };

    MatchedPair {
        buy_order: buy.order_id.clone(),
        sell_order: sell.order_id.clone(),
        symbol: sell.symbol.clone(),
        buy_time: buy.time.clone(),
        sell_time: sell.time.clone(),
        buy_price: buy.price,
        sell_price: sell.price,
        matched_amount,
        profit_loss,
        profit_loss_percent,
        duration_hours: duration_hours(&buy.time, &sell.time),
    }
}

/// Reconciles executed trades into realized buy/sell pairs, FIFO per symbol.
///
/// Trades must already be in ascending time order. Buys stack up as open
/// lots; each sell consumes the oldest inventory first, emitting one pair per
/// consumed chunk, so a sell spanning several lots yields several pairs. A
/// sell that outruns the available inventory keeps whatever pairs it produced
/// and the remainder is dropped; short positions are not modeled. Queues
/// live only for the duration of the call.
pub fn match_trades(trades: &[Trade]) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    for trade in trades {
        if !is_executed(&trade.status) {
            continue;
        }

        let queue = outcome.open_lots.entry(trade.symbol.clone()).or_default();
        match trade.side {
            TradeSide::Buy => {
                queue.push_back(OpenLot {
                    trade: trade.clone(),
                    remaining_amount: trade.amount,
                });
            }
            TradeSide::Sell => {
                let mut sell_remaining = trade.amount;
                while sell_remaining > 0.0 {
                    let Some(lot) = queue.front_mut() else { break };
                    let matched = lot.remaining_amount.min(sell_remaining);

                    outcome.pairs.push(build_pair(&lot.trade, trade, matched));

                    lot.remaining_amount -= matched;
                    sell_remaining -= matched;
                    if lot.remaining_amount <= 0.0 {
                        queue.pop_front();
                    }
                }

                if sell_remaining > 0.0 {
                    tracing::debug!(
                        symbol = %trade.symbol,
                        order_id = %trade.order_id,
                        unmatched = sell_remaining,
                        "Sell exceeds open inventory, remainder dropped"
                    );
                }
            }
        }
    }

    outcome.open_lots.retain(|_, queue| !queue.is_empty());
    outcome
}
