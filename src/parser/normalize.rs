use serde_json::Value;

use crate::models::{OrderEvent, ParseError, Trade, TradeSide};

// Positions of the meaningful cells in the exchange info array. Everything
// else in the array is ignored.
const IDX_SYMBOL: usize = 3;
const IDX_SIGNED_AMOUNT: usize = 6;
const IDX_ORDER_KIND: usize = 8;
const IDX_PRICE: usize = 16;

fn text_at(info: &[Value], idx: usize) -> Option<String> {
    match info.get(idx)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number_at(info: &[Value], idx: usize) -> Option<f64> {
    match info.get(idx)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turns a raw [`OrderEvent`] into a validated [`Trade`].
///
/// Cells that are out of range, null or empty fall back to field defaults
/// rather than failing the line; validation afterwards rejects records whose
/// defaults would poison downstream arithmetic (unknown symbol, non-positive
/// price or amount). The sign of the raw amount picks the side, its
/// magnitude becomes the trade amount.
pub fn normalize(event: &OrderEvent) -> Result<Trade, ParseError> {
    let symbol = text_at(&event.info, IDX_SYMBOL)
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let signed_amount = number_at(&event.info, IDX_SIGNED_AMOUNT).unwrap_or(0.0);
    let order_kind =
        text_at(&event.info, IDX_ORDER_KIND).unwrap_or_else(|| "unknown".to_string());
    let price = number_at(&event.info, IDX_PRICE).unwrap_or(0.0);

    let side = if signed_amount > 0.0 {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    };
    let amount = signed_amount.abs();
    let date = event
        .timestamp_text
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();

    let trade = Trade {
        date,
        time: event.timestamp_text.clone(),
        order_id: event.order_id.clone(),
        symbol,
        side,
        order_kind,
        price,
        amount,
        value: price * amount,
        status: event.status_text.clone(),
    };

    if trade.symbol.is_empty()
        || trade.symbol == "UNKNOWN"
        || trade.price <= 0.0
        || trade.amount <= 0.0
    {
        tracing::warn!(
            symbol = %trade.symbol,
            price = trade.price,
            amount = trade.amount,
            "Rejected trade with invalid data"
        );
        return Err(ParseError::new(&event.raw_line, "Invalid trade data"));
    }

    Ok(trade)
}
