use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Order log scenario types for synthetic data generation
#[derive(Debug, Clone, Copy)]
pub enum LogScenario {
    /// Buys followed by higher sells, one symbol
    ProfitableDay,
    /// Buys followed by lower sells, one symbol
    LosingDay,
    /// Several symbols over a week, wins, losses and cancellations mixed
    MixedWeek,
    /// Most orders cancelled, little execution
    HeavyCancellations,
    /// Valid orders interleaved with unrelated log noise
    WithNoise,
    /// Valid orders with corrupt lines sprinkled in
    Malformed,
}

impl FromStr for LogScenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "profitable-day" => Ok(Self::ProfitableDay),
            "losing-day" => Ok(Self::LosingDay),
            "mixed-week" => Ok(Self::MixedWeek),
            "heavy-cancellations" => Ok(Self::HeavyCancellations),
            "with-noise" => Ok(Self::WithNoise),
            "malformed" => Ok(Self::Malformed),
            other => Err(format!(
                "unknown scenario '{}', expected profitable-day, losing-day, mixed-week, heavy-cancellations, with-noise or malformed",
                other
            )),
        }
    }
}

const SYMBOLS: [&str; 3] = ["tBTCUSDT", "tETHUSDT", "tSOLUSD"];

/// Generates synthetic order log lines in the writer's wire format
pub struct SyntheticLogGenerator {
    rng: StdRng,
    base_price: f64,
    next_id: u64,
}

/// Encodes one order line exactly the way the order writer does.
///
/// The info array uses the writer's repr dialect: single-quoted strings and
/// a bare `None` in every unused cell. Cells 0, 3, 6, 8 and 16 carry the
/// order id, symbol, signed amount, order kind and price.
pub fn encode_order_line(
    timestamp: &str,
    order_id: u64,
    status: &str,
    symbol: &str,
    signed_amount: f64,
    order_kind: &str,
    price: f64,
) -> String {
    let mut cells = vec!["None".to_string(); 17];
    cells[0] = order_id.to_string();
    cells[3] = format!("'{}'", symbol);
    cells[6] = signed_amount.to_string();
    cells[8] = format!("'{}'", order_kind);
    cells[16] = price.to_string();

    format!(
        "{}: Order-ID: {}, Status: {}, Info: [{}]",
        timestamp,
        order_id,
        status,
        cells.join(", ")
    )
}

fn executed_status(price: f64, signed_amount: f64) -> String {
    format!("EXECUTED @ {:.1}({})", price, signed_amount)
}

fn format_timestamp(ndt: NaiveDateTime) -> String {
    ndt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn base_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

impl SyntheticLogGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 42_000.0,
            next_id: 10_000,
        }
    }

    /// Generate log lines for a specific scenario
    ///
    /// # Arguments
    /// * `scenario` - The log shape to simulate
    /// * `num_orders` - Number of order events to emit (noise lines come on top)
    ///
    /// # Returns
    /// Lines in chronological order, ready to be written to a log file
    pub fn generate(&mut self, scenario: LogScenario, num_orders: usize) -> Vec<String> {
        match scenario {
            LogScenario::ProfitableDay => self.generate_trend_day(num_orders, 1.01..1.05),
            LogScenario::LosingDay => self.generate_trend_day(num_orders, 0.95..0.99),
            LogScenario::MixedWeek => self.generate_mixed_week(num_orders),
            LogScenario::HeavyCancellations => self.generate_heavy_cancellations(num_orders),
            LogScenario::WithNoise => self.generate_with_noise(num_orders),
            LogScenario::Malformed => self.generate_malformed(num_orders),
        }
    }

    fn next_order_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Alternating buy/sell on one symbol; sells priced inside `sell_factor`
    /// relative to their buy.
    fn generate_trend_day(
        &mut self,
        num_orders: usize,
        sell_factor: std::ops::Range<f64>,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(num_orders);
        let start = base_start();
        let mut pending_buy: Option<(f64, f64)> = None;

        for i in 0..num_orders {
            let timestamp = format_timestamp(start + Duration::minutes(3 * i as i64));
            let order_id = self.next_order_id();

            let line = match pending_buy.take() {
                None => {
                    let price = self.base_price * self.rng.gen_range(0.98..1.02);
                    let amount = self.rng.gen_range(0.05..0.5);
                    pending_buy = Some((price, amount));
                    encode_order_line(
                        &timestamp,
                        order_id,
                        &executed_status(price, amount),
                        "tBTCUSDT",
                        amount,
                        "EXCHANGE LIMIT",
                        price,
                    )
                }
                Some((buy_price, amount)) => {
                    let price = buy_price * self.rng.gen_range(sell_factor.clone());
                    encode_order_line(
                        &timestamp,
                        order_id,
                        &executed_status(price, -amount),
                        "tBTCUSDT",
                        -amount,
                        "EXCHANGE LIMIT",
                        price,
                    )
                }
            };
            lines.push(line);
        }

        lines
    }

    fn generate_mixed_week(&mut self, num_orders: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(num_orders);
        let start = base_start();
        let per_day = (num_orders / 7).max(1);
        let mut pending: HashMap<&str, (f64, f64)> = HashMap::new();

        for i in 0..num_orders {
            let day = (i / per_day) as i64;
            let slot = (i % per_day) as i64;
            let timestamp = format_timestamp(start + Duration::days(day) + Duration::minutes(5 * slot));
            let order_id = self.next_order_id();
            let symbol = SYMBOLS[i % SYMBOLS.len()];
            let scale = 1.0 / (1.0 + i as f64 % 3.0);  // spread symbols across price bands
            let reference = self.base_price * scale;

            if self.rng.gen_bool(0.1) {
                let amount = self.rng.gen_range(0.05..0.5);
                let signed = if self.rng.gen_bool(0.5) { amount } else { -amount };
                lines.push(encode_order_line(
                    &timestamp,
                    order_id,
                    "CANCELED was: PARTIALLY FILLED",
                    symbol,
                    signed,
                    "EXCHANGE LIMIT",
                    reference,
                ));
                continue;
            }

            let line = match pending.remove(symbol) {
                None => {
                    let price = reference * self.rng.gen_range(0.98..1.02);
                    let amount = self.rng.gen_range(0.05..0.5);
                    pending.insert(symbol, (price, amount));
                    encode_order_line(
                        &timestamp,
                        order_id,
                        &executed_status(price, amount),
                        symbol,
                        amount,
                        "EXCHANGE LIMIT",
                        price,
                    )
                }
                Some((buy_price, amount)) => {
                    let factor = if self.rng.gen_bool(0.6) {
                        self.rng.gen_range(1.005..1.04)
                    } else {
                        self.rng.gen_range(0.96..0.995)
                    };
                    let price = buy_price * factor;
                    encode_order_line(
                        &timestamp,
                        order_id,
                        &executed_status(price, -amount),
                        symbol,
                        -amount,
                        "EXCHANGE MARKET",
                        price,
                    )
                }
            };
            lines.push(line);
        }

        lines
    }

    fn generate_heavy_cancellations(&mut self, num_orders: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(num_orders);
        let start = base_start();

        for i in 0..num_orders {
            let timestamp = format_timestamp(start + Duration::minutes(2 * i as i64));
            let order_id = self.next_order_id();
            let price = self.base_price * self.rng.gen_range(0.99..1.01);
            let amount = self.rng.gen_range(0.05..0.5);

            let line = if self.rng.gen_bool(0.6) {
                encode_order_line(
                    &timestamp,
                    order_id,
                    "CANCELED",
                    "tBTCUSDT",
                    amount,
                    "EXCHANGE LIMIT",
                    price,
                )
            } else {
                encode_order_line(
                    &timestamp,
                    order_id,
                    &executed_status(price, amount),
                    "tBTCUSDT",
                    amount,
                    "EXCHANGE LIMIT",
                    price,
                )
            };
            lines.push(line);
        }

        lines
    }

    fn generate_with_noise(&mut self, num_orders: usize) -> Vec<String> {
        let orders = self.generate_trend_day(num_orders, 1.01..1.05);
        let mut lines = Vec::with_capacity(orders.len() * 2);

        for (i, order) in orders.into_iter().enumerate() {
            if i % 3 == 0 {
                let timestamp = order.split(": Order-ID:").next().unwrap_or("").to_string();
                lines.push(format!("{}: INFO checking account balance", timestamp));
            }
            lines.push(order);
        }
        lines.push("heartbeat ok".to_string());

        lines
    }

    fn generate_malformed(&mut self, num_orders: usize) -> Vec<String> {
        let mut lines = self.generate_trend_day(num_orders, 1.01..1.05);

        // Corrupt every seventh line, rotating through the failure modes the
        // parser reports: missing marker, missing info, bad payload, bad date.
        for (i, line) in lines.iter_mut().enumerate() {
            if i % 7 != 6 {
                continue;
            }
            let timestamp = line.split(": Order-ID:").next().unwrap_or("").to_string();
            *line = match (i / 7) % 4 {
                0 => format!("{}: OrderID oops, Status: EXECUTED", timestamp),
                1 => format!("{}: Order-ID: 1, Status: EXECUTED", timestamp),
                2 => format!(
                    "{}: Order-ID: 2, Status: EXECUTED, Info: [0.5, 'tBTCUSDT'",
                    timestamp
                ),
                _ => "BAD: Order-ID: 3, Status: EXECUTED, Info: [1]".to_string(),
            };
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn test_encoded_line_round_trips_through_parser() {
        let line = encode_order_line(
            "2024-03-01 09:30:15.123456",
            98765,
            "EXECUTED @ 42000.0(0.5)",
            "tBTCUSDT",
            0.5,
            "EXCHANGE LIMIT",
            42000.0,
        );

        let event = parser::parse_line(&line).unwrap();
        let trade = parser::normalize(&event).unwrap();

        assert_eq!(trade.order_id, "98765");
        assert_eq!(trade.symbol, "TBTCUSDT");
        assert_eq!(trade.price, 42000.0);
        assert_eq!(trade.amount, 0.5);
        assert_eq!(trade.order_kind, "EXCHANGE LIMIT");
    }

    #[test]
    fn test_negative_amount_encodes_sell() {
        let line = encode_order_line(
            "2024-03-01 10:00:00.000000",
            1,
            "EXECUTED @ 100.0(-0.5)",
            "tETHUSDT",
            -0.5,
            "EXCHANGE MARKET",
            100.0,
        );

        let event = parser::parse_line(&line).unwrap();
        let trade = parser::normalize(&event).unwrap();

        assert_eq!(trade.side, crate::models::TradeSide::Sell);
        assert_eq!(trade.amount, 0.5);
    }

    #[test]
    fn test_profitable_day_is_fully_parseable() {
        let mut gen = SyntheticLogGenerator::new(42);
        let lines = gen.generate(LogScenario::ProfitableDay, 50);

        assert_eq!(lines.len(), 50);
        for line in &lines {
            assert!(parser::is_order_event(line));
            let event = parser::parse_line(line).unwrap();
            parser::normalize(&event).unwrap();
        }
    }

    #[test]
    fn test_generation_is_deterministic_by_seed() {
        let mut a = SyntheticLogGenerator::new(7);
        let mut b = SyntheticLogGenerator::new(7);

        assert_eq!(
            a.generate(LogScenario::MixedWeek, 70),
            b.generate(LogScenario::MixedWeek, 70)
        );
    }

    #[test]
    fn test_noise_lines_are_not_order_events() {
        let mut gen = SyntheticLogGenerator::new(42);
        let lines = gen.generate(LogScenario::WithNoise, 30);

        let noise = lines.iter().filter(|l| !parser::is_order_event(l)).count();
        let orders = lines.iter().filter(|l| parser::is_order_event(l)).count();

        assert_eq!(orders, 30);
        assert!(noise > 0);
    }

    #[test]
    fn test_malformed_scenario_produces_parse_failures() {
        let mut gen = SyntheticLogGenerator::new(42);
        let lines = gen.generate(LogScenario::Malformed, 50);

        let failures = lines
            .iter()
            .filter(|l| parser::is_order_event(l) && parser::parse_line(l).is_err())
            .count();

        assert!(failures > 0);
        assert!(failures < lines.len() / 2);
    }

    #[test]
    fn test_heavy_cancellations_lean_cancelled() {
        let mut gen = SyntheticLogGenerator::new(42);
        let lines = gen.generate(LogScenario::HeavyCancellations, 100);

        let cancelled = lines.iter().filter(|l| l.contains("CANCELED")).count();
        assert!(cancelled > 40, "expected a cancel-heavy log, got {}", cancelled);
    }

    #[test]
    fn test_mixed_week_covers_multiple_dates_and_symbols() {
        let mut gen = SyntheticLogGenerator::new(42);
        let lines = gen.generate(LogScenario::MixedWeek, 70);

        let distinct_dates: std::collections::HashSet<&str> =
            lines.iter().filter_map(|l| l.get(0..10)).collect();
        assert!(distinct_dates.len() >= 6);

        for symbol in SYMBOLS {
            assert!(lines.iter().any(|l| l.contains(symbol)));
        }
    }
}
