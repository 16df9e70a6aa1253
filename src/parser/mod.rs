pub mod info;
pub mod normalize;

pub use normalize::normalize;

use crate::models::{OrderEvent, ParseError};

/// Literal status tokens the order writer puts on every order line
const ORDER_TOKENS: [&str; 3] = ["EXECUTED", "CANCELED", "CANCELLED"];

/// Returns true when a raw log line is an order event candidate.
///
/// Matches the writer's literal tokens anywhere in the line. Startup banners,
/// heartbeats and other log noise fail this check and are skipped without a
/// diagnostic.
pub fn is_order_event(line: &str) -> bool {
    ORDER_TOKENS.iter().any(|token| line.contains(token))
}

/// Returns true when a status text marks an executed order.
///
/// Substring match: the writer decorates statuses, e.g.
/// `EXECUTED @ 42000.0(0.5)`. Tighten the rule here, not at call sites.
pub fn is_executed(status: &str) -> bool {
    status.to_uppercase().contains("EXECUTED")
}

/// Returns true when a status text marks a cancelled order, either spelling.
pub fn is_cancelled(status: &str) -> bool {
    let upper = status.to_uppercase();
    upper.contains("CANCELED") || upper.contains("CANCELLED")
}

/// Splits one raw log line into an [`OrderEvent`].
///
/// Expected shape: `<timestamp>: Order-ID: <id>, Status: <status>, Info: [...]`.
/// The timestamp prefix must be at least `YYYY-MM-DD` long and the three
/// markers must appear in order; otherwise the line is reported as a
/// [`ParseError`] naming the first marker that failed.
pub fn parse_line(line: &str) -> Result<OrderEvent, ParseError> {
    let (timestamp, rest) = line
        .split_once(": Order-ID:")
        .ok_or_else(|| ParseError::new(line, "Could not split on 'Order-ID:'"))?;

    if timestamp.len() < 10 {
        return Err(ParseError::new(line, "Invalid date format"));
    }

    let (order_id, rest) = rest
        .split_once(", Status:")
        .ok_or_else(|| ParseError::new(line, "Could not split on 'Status:'"))?;

    let (status, info_text) = rest
        .split_once(", Info:")
        .ok_or_else(|| ParseError::new(line, "Could not split on 'Info:'"))?;

    let info = info::decode_info_array(info_text).map_err(|reason| ParseError::new(line, reason))?;

    Ok(OrderEvent {
        raw_line: line.to_string(),
        timestamp_text: timestamp.to_string(),
        order_id: order_id.trim().to_string(),
        status_text: status.trim().to_string(),
        info,
    })
}
