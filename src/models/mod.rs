use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw order event split out of a log line
///
/// Field extraction has not happened yet: `info` is the decoded array exactly
/// as the order writer logged it. Dropped once normalized into a [`Trade`].
#[derive(Debug, Clone)]
pub struct OrderEvent {
    pub raw_line: String,  // kept verbatim for diagnostics
    pub timestamp_text: String,
    pub order_id: String,
    pub status_text: String,
    pub info: Vec<Value>,
}

/// Direction of a trade, recovered from the sign of the raw amount field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A normalized, validated order record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub date: String,  // YYYY-MM-DD prefix of the timestamp
    pub time: String,  // full timestamp text as logged
    pub order_id: String,
    pub symbol: String,
    pub side: TradeSide,
    #[serde(rename = "type")]
    pub order_kind: String,
    pub price: f64,
    pub amount: f64,
    pub value: f64,
    pub status: String,
}

/// A buy chunk consumed by a later sell of the same symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    pub buy_order: String,
    pub sell_order: String,
    pub symbol: String,
    pub buy_time: String,
    pub sell_time: String,
    pub buy_price: f64,
    pub sell_price: f64,
    #[serde(rename = "amount")]
    pub matched_amount: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    pub duration_hours: f64,
}

/// Diagnostic record for a line that failed parsing or validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    pub line: String,
    pub error: String,
}

impl ParseError {
    pub fn new(line: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_creation() {
        let trade = Trade {
            date: "2024-03-01".to_string(),
            time: "2024-03-01 09:30:15.123456".to_string(),
            order_id: "12345".to_string(),
            symbol: "BTCUSDT".to_string(),
            side: TradeSide::Buy,
            order_kind: "limit".to_string(),
            price: 42000.0,
            amount: 0.5,
            value: 21000.0,
            status: "EXECUTED".to_string(),
        };

        assert_eq!(trade.date, "2024-03-01");
        assert_eq!(trade.value, trade.price * trade.amount);
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(TradeSide::Buy).unwrap(),
            serde_json::json!("buy")
        );
        assert_eq!(TradeSide::Sell.to_string(), "sell");
    }

    #[test]
    fn test_matched_amount_wire_name() {
        let pair = MatchedPair {
            buy_order: "1".to_string(),
            sell_order: "2".to_string(),
            symbol: "ETHUSDT".to_string(),
            buy_time: "2024-03-01 09:00:00.000000".to_string(),
            sell_time: "2024-03-01 11:00:00.000000".to_string(),
            buy_price: 2500.0,
            sell_price: 2600.0,
            matched_amount: 1.5,
            profit_loss: 150.0,
            profit_loss_percent: 4.0,
            duration_hours: 2.0,
        };

        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["amount"], serde_json::json!(1.5));
    }
}
