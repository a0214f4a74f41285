//! Records produced by the trading bot: daily JSON logs, trade history and
//! the plain-text `TIMESTAMP - SOURCE - LEVEL - MESSAGE` log lines.
//!
//! Everything is read defensively: missing fields fall back to defaults and
//! entries that cannot be read at all are skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::logging::{obj, v_str, warn, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "buy",
            Decision::Sell => "sell",
            Decision::Hold => "hold",
        }
    }

    /// Anything that is not buy or sell reads as hold.
    pub fn from_label(label: &str) -> Self {
        match label {
            "buy" => Decision::Buy,
            "sell" => Decision::Sell,
            _ => Decision::Hold,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalCounts {
    #[serde(deserialize_with = "null_as_default")]
    pub buy: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub sell: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub hold: u32,
}

/// One indicator's opinion inside a daily record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSignal {
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub signal: String,
    #[serde(deserialize_with = "null_as_default")]
    pub strength: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub weight: Option<f64>,
}

impl IndicatorSignal {
    pub fn decision(&self) -> Decision {
        Decision::from_label(&self.signal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPrice {
    #[serde(deserialize_with = "null_as_default")]
    pub market: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trade_price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub signed_change_rate: f64,
}

/// One snapshot of the bot's analysis. A day's log holds several.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "lenient_decision")]
    pub decision: Option<Decision>,
    pub decision_kr: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f64,
    pub avg_signal_strength: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub signals: Vec<IndicatorSignal>,
    #[serde(deserialize_with = "null_as_default")]
    pub signal_counts: SignalCounts,
    #[serde(deserialize_with = "null_as_default")]
    pub current_price: Vec<MarketPrice>,
    pub price_change_24h: Option<String>,
}

impl DailyRecord {
    pub fn trade_price(&self) -> Option<f64> {
        self.current_price
            .first()
            .map(|p| p.trade_price)
            .filter(|p| *p != 0.0)
    }

    pub fn signal_from(&self, source: &str) -> Option<&IndicatorSignal> {
        self.signals.iter().find(|s| s.source == source)
    }
}

/// The bot writes `null` where a value could not be fetched; read it like a
/// missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_decision<'de, D>(deserializer: D) -> Result<Option<Decision>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| match s {
        "buy" => Some(Decision::Buy),
        "sell" => Some(Decision::Sell),
        "hold" => Some(Decision::Hold),
        _ => None,
    }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    #[default]
    Sell,
}

/// An executed order from `trade_history_YYYYMMDD.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRecord {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub side: TradeSide,
    #[serde(deserialize_with = "null_as_default")]
    pub ticker: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
}

/// A line of the bot's plain-text logs (`trade.log`, `app.log`, `error.log`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub timestamp: String,
    pub source: String,
    pub level: String,
    pub message: String,
}

static RE_LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) - (\w+) - (\w+) - (.+)")
        .expect("log line pattern")
});

impl LogLine {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = RE_LOG_LINE.captures(line)?;
        Some(Self {
            timestamp: caps[1].to_string(),
            source: caps[2].to_string(),
            level: caps[3].to_string(),
            message: caps[4].trim_end().to_string(),
        })
    }
}

/// Read a JSON list, skipping elements that do not deserialize as `T`.
///
/// A body that is not a JSON list at all is an error.
pub fn parse_json_list<T>(body: &str, what: &str) -> serde_json::Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let items: Vec<Value> = serde_json::from_str(body)?;
    let domain = if what.starts_with("trade") {
        Domain::History
    } else {
        Domain::Logs
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(v) => out.push(v),
            Err(err) => warn(
                domain,
                "record_skipped",
                obj(&[
                    ("kind", v_str(what)),
                    ("index", serde_json::json!(idx)),
                    ("msg", v_str(&err.to_string())),
                ]),
            ),
        }
    }
    Ok(out)
}

pub fn parse_daily_records(body: &str) -> serde_json::Result<Vec<DailyRecord>> {
    parse_json_list(body, "daily_record")
}

pub fn parse_trade_records(body: &str) -> serde_json::Result<Vec<TradeRecord>> {
    parse_json_list(body, "trade_record")
}

/// The last `limit` well-formed lines of a plain-text log, newest first.
pub fn recent_log_lines(text: &str, limit: usize) -> Vec<LogLine> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    lines[start..]
        .iter()
        .rev()
        .filter_map(|l| LogLine::parse(l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: &str = r#"[
        {
            "timestamp": "2026-10-16 00:00:00",
            "decision": "hold",
            "decision_kr": "홀드",
            "confidence": 0.45,
            "signals": [
                {"source": "MACD", "signal": "buy", "strength": 0.6, "description": "golden cross", "weight": 1.2}
            ],
            "signal_counts": {"buy": 2, "sell": 1, "hold": 5},
            "current_price": [{"market": "KRW-BTC", "trade_price": 50123000.0, "signed_change_rate": 0.01}],
            "price_change_24h": "1.00%"
        },
        {"timestamp": "2026-10-16 04:00:00", "decision": "panic", "signal_counts": {"buy": 3}},
        "not a record"
    ]"#;

    #[test]
    fn test_daily_records_are_read_defensively() {
        let records = parse_daily_records(DAY).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.decision, Some(Decision::Hold));
        assert_eq!(first.trade_price(), Some(50123000.0));
        assert_eq!(first.signal_from("MACD").unwrap().decision(), Decision::Buy);

        let second = &records[1];
        assert_eq!(second.decision, None);
        assert_eq!(second.confidence, 0.0);
        assert_eq!(second.signal_counts, SignalCounts { buy: 3, sell: 0, hold: 0 });
        assert!(second.trade_price().is_none());
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        // Shapes the bot writes when the price fetch fails.
        let body = r#"[
            {"timestamp": "2026-10-16 00:00:00", "confidence": 0.4, "signal_counts": {"buy": 1}},
            {
                "timestamp": "2026-10-16 04:00:00",
                "decision": "sell",
                "confidence": 0.7,
                "signals": [{"source": "MACD", "signal": "sell", "strength": null, "description": null}],
                "signal_counts": {"buy": 0, "sell": 7, "hold": null},
                "current_price": [{"market": "KRW-BTC", "trade_price": null, "error": "timeout"}],
                "price_change_24h": null
            },
            {"timestamp": null, "confidence": null, "signals": null, "current_price": null}
        ]"#;
        let records = parse_daily_records(body).unwrap();
        assert_eq!(records.len(), 3);

        let failed = &records[1];
        assert_eq!(failed.decision, Some(Decision::Sell));
        assert_eq!(failed.signal_counts, SignalCounts { buy: 0, sell: 7, hold: 0 });
        assert_eq!(failed.signals[0].strength, 0.0);
        assert!(failed.trade_price().is_none());

        let bare = &records[2];
        assert_eq!(bare.timestamp, "");
        assert_eq!(bare.confidence, 0.0);
        assert!(bare.signals.is_empty());
        assert!(bare.current_price.is_empty());

        let trades = parse_trade_records(r#"[{"type": null, "price": null, "total": 5000}]"#).unwrap();
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].price, 0.0);
    }

    #[test]
    fn test_non_list_body_is_an_error() {
        assert!(parse_daily_records("{\"oops\": 1}").is_err());
        assert!(parse_daily_records("").is_err());
    }

    #[test]
    fn test_trade_record_side() {
        let trades = parse_trade_records(
            r#"[{"type": "buy", "ticker": "KRW-BTC", "price": 50000000, "amount": 0.002, "total": 100000}]"#,
        )
        .unwrap();
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].total, 100000.0);
    }

    #[test]
    fn test_log_line_pattern() {
        let line = "2026-10-16 09:12:44,123 - trade - INFO - order placed: KRW-BTC - 0.001 BTC";
        let parsed = LogLine::parse(line).unwrap();
        assert_eq!(parsed.source, "trade");
        assert_eq!(parsed.level, "INFO");
        assert_eq!(parsed.message, "order placed: KRW-BTC - 0.001 BTC");

        assert!(LogLine::parse("2026-10-16 trade INFO missing separators").is_none());
    }

    #[test]
    fn test_recent_log_lines_newest_first() {
        let mut text = String::new();
        for i in 0..15 {
            text.push_str(&format!("2026-10-16 {:02}:00:00,000 - trade - INFO - line {}\n", i, i));
        }
        text.push('\n');
        let lines = recent_log_lines(&text, 10);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0].message, "line 14");
        assert_eq!(lines[9].message, "line 5");
    }
}
