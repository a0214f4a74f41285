//! Presentation rules shared by the text renderer and the JSON endpoints.
//!
//! Nothing here carries algorithmic weight; it decides how values look:
//! percentages, severity bands, key formatting and the row models of each
//! dashboard table.

use serde::Serialize;

use crate::config_text::{BlockName, ConfigBlock, ConfigValue};
use crate::records::{DailyRecord, Decision, TradeRecord, TradeSide};

/// Indicators shown in the summary table, by the source names the bot emits.
pub const KEY_INDICATORS: [&str; 6] = [
    "RSI(상대강도지수)",
    "이동평균선(MA)",
    "MACD",
    "볼린저밴드(BB)",
    "김프(한국 프리미엄)",
    "시장심리(공포&탐욕지수)",
];

pub const TOP_STRENGTHS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Danger,
    Warning,
    Info,
    Success,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 0.3 {
            ConfidenceBand::Danger
        } else if confidence < 0.5 {
            ConfidenceBand::Warning
        } else if confidence < 0.7 {
            ConfidenceBand::Info
        } else {
            ConfidenceBand::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Danger => "danger",
            ConfidenceBand::Warning => "warning",
            ConfidenceBand::Info => "info",
            ConfidenceBand::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    Unknown,
}

impl PriceDirection {
    pub fn from_change(change: Option<&str>) -> Self {
        match change.map(str::trim) {
            None | Some("") | Some("N/A") => PriceDirection::Unknown,
            Some(c) if c.starts_with('-') => PriceDirection::Down,
            Some(_) => PriceDirection::Up,
        }
    }
}

/// Confidence in [0,1] as `72.4%`.
pub fn percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// A ratio such as 0.2 as `20%`; up to six decimals, trailing zeros dropped.
pub fn ratio_percent(ratio: f64) -> String {
    let scaled = (ratio * 100.0 * 1e6).round() / 1e6;
    format!("{}%", scaled)
}

/// `min_order_amount` -> `Min Order Amount`
pub fn format_config_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c == ' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole won with thousands separators: `₩50,123,000`.
pub fn format_krw(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}₩{}", sign, grouped)
}

pub fn signal_marker(decision: Decision) -> &'static str {
    match decision {
        Decision::Buy => "🔼",
        Decision::Sell => "🔽",
        Decision::Hold => "➖",
    }
}

pub fn signal_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Buy => "Buy",
        Decision::Sell => "Sell",
        Decision::Hold => "Hold",
    }
}

fn truthy(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Bool(b) => *b,
        ConfigValue::Number(n) => *n != 0.0,
        ConfigValue::Text(s) => !s.is_empty(),
    }
}

/// Signal strengths, strongest first. Non-numeric values sort last; ties
/// keep source order.
pub fn top_strengths(block: &ConfigBlock, limit: usize) -> Vec<(&str, &ConfigValue)> {
    let mut entries: Vec<(&str, &ConfigValue)> = block.iter().collect();
    entries.sort_by(|a, b| {
        let a = a.1.as_f64().unwrap_or(f64::NEG_INFINITY);
        let b = b.1.as_f64().unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    entries.truncate(limit);
    entries
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigRow {
    pub label: String,
    pub value: String,
}

/// Display rows of one settings block.
pub fn config_rows(name: BlockName, block: &ConfigBlock) -> Vec<ConfigRow> {
    let row = |label: String, value: String| ConfigRow { label, value };
    match name {
        BlockName::DecisionThresholds => block
            .iter()
            .map(|(k, v)| row(format_config_key(k), v.to_string()))
            .collect(),
        BlockName::InvestmentRatios => block
            .iter()
            .map(|(k, v)| {
                let value = v.as_f64().map(ratio_percent).unwrap_or_else(|| v.to_string());
                row(format_config_key(k), value)
            })
            .collect(),
        BlockName::IndicatorUsage => block
            .iter()
            .map(|(k, v)| {
                let value = if truthy(v) { "on" } else { "off" };
                row(k.to_string(), value.to_string())
            })
            .collect(),
        BlockName::TradingSettings => block
            .iter()
            .filter(|(_, v)| !v.is_nested())
            .map(|(k, v)| row(format_config_key(k), v.to_string()))
            .collect(),
        BlockName::IndicatorWeights => block
            .iter()
            .map(|(k, v)| row(k.to_string(), v.to_string()))
            .collect(),
        BlockName::SignalStrengths => top_strengths(block, TOP_STRENGTHS)
            .into_iter()
            .map(|(k, v)| row(format_config_key(k), v.to_string()))
            .collect(),
    }
}

/// Headline widgets from the most recent record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub price: Option<String>,
    pub price_change: Option<String>,
    pub price_direction: PriceDirection,
    pub decision: Option<Decision>,
    pub decision_label: Option<String>,
    pub confidence: Option<f64>,
    pub confidence_pct: Option<String>,
    pub confidence_band: Option<ConfidenceBand>,
    /// `buy/sell/hold`
    pub signal_ratio: String,
}

impl StatusView {
    pub fn from_record(record: &DailyRecord) -> Self {
        let price_direction = PriceDirection::from_change(record.price_change_24h.as_deref());
        let price_change = match price_direction {
            PriceDirection::Unknown => None,
            _ => record.price_change_24h.clone(),
        };
        let confidence = Some(record.confidence).filter(|c| *c > 0.0);
        let counts = record.signal_counts;

        Self {
            price: record.trade_price().map(format_krw),
            price_change,
            price_direction,
            decision: record.decision,
            decision_label: record.decision.map(|d| {
                record
                    .decision_kr
                    .clone()
                    .unwrap_or_else(|| signal_label(d).to_string())
            }),
            confidence,
            confidence_pct: confidence.map(percent),
            confidence_band: confidence.map(ConfidenceBand::from_confidence),
            signal_ratio: format!("{}/{}/{}", counts.buy, counts.sell, counts.hold),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub indicator: String,
    pub decision: Decision,
    pub signal: String,
    pub description: String,
}

/// The key indicators, in display order, that appear in `record`.
pub fn indicator_summary(record: &DailyRecord) -> Vec<IndicatorRow> {
    KEY_INDICATORS
        .iter()
        .filter_map(|name| record.signal_from(name))
        .map(|s| {
            let decision = s.decision();
            IndicatorRow {
                indicator: s.source.clone(),
                decision,
                signal: format!("{} {}", signal_marker(decision), signal_label(decision)),
                description: s.description.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    pub source: String,
    pub decision: Decision,
    pub signal: String,
    pub strength: f64,
    pub strength_text: String,
    pub description: String,
}

pub fn signal_rows(record: &DailyRecord) -> Vec<SignalRow> {
    record
        .signals
        .iter()
        .map(|s| {
            let decision = s.decision();
            SignalRow {
                source: s.source.clone(),
                decision,
                signal: format!("{} {}", signal_marker(decision), signal_label(decision)),
                strength: s.strength,
                strength_text: format!("{:.1}", s.strength),
                description: s.description.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub timestamp: String,
    pub decision: Decision,
    pub summary: String,
}

/// The last `limit` records, newest first.
pub fn log_rows(records: &[DailyRecord], limit: usize) -> Vec<LogRow> {
    let start = records.len().saturating_sub(limit);
    records[start..]
        .iter()
        .rev()
        .map(|r| {
            let decision = r.decision.unwrap_or(Decision::Hold);
            let label = r
                .decision_kr
                .clone()
                .unwrap_or_else(|| signal_label(decision).to_string());
            LogRow {
                timestamp: r.timestamp.clone(),
                decision,
                summary: format!("{} {} ({})", signal_marker(decision), label, percent(r.confidence)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub side: TradeSide,
    pub side_label: String,
    pub detail: String,
}

/// The last `limit` trades, newest first.
pub fn trade_rows(trades: &[TradeRecord], limit: usize) -> Vec<TradeRow> {
    let start = trades.len().saturating_sub(limit);
    trades[start..]
        .iter()
        .rev()
        .map(|t| {
            let asset = t.ticker.rsplit('-').next().filter(|a| !a.is_empty()).unwrap_or("BTC");
            let detail = match t.side {
                TradeSide::Buy => format!("{} x {}", format_krw(t.price), format_krw(t.total)),
                TradeSide::Sell => format!("{} x {:.8} {}", format_krw(t.price), t.amount, asset),
            };
            TradeRow {
                timestamp: t.timestamp.clone(),
                side: t.side,
                side_label: match t.side {
                    TradeSide::Buy => "Buy".to_string(),
                    TradeSide::Sell => "Sell".to_string(),
                },
                detail,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_text::parse_block_body;
    use crate::records::{IndicatorSignal, MarketPrice};

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.0), ConfidenceBand::Danger);
        assert_eq!(ConfidenceBand::from_confidence(0.29), ConfidenceBand::Danger);
        assert_eq!(ConfidenceBand::from_confidence(0.3), ConfidenceBand::Warning);
        assert_eq!(ConfidenceBand::from_confidence(0.5), ConfidenceBand::Info);
        assert_eq!(ConfidenceBand::from_confidence(0.69), ConfidenceBand::Info);
        assert_eq!(ConfidenceBand::from_confidence(0.7), ConfidenceBand::Success);
    }

    #[test]
    fn test_price_direction() {
        assert_eq!(PriceDirection::from_change(Some("-1.25%")), PriceDirection::Down);
        assert_eq!(PriceDirection::from_change(Some("0.40%")), PriceDirection::Up);
        assert_eq!(PriceDirection::from_change(Some("N/A")), PriceDirection::Unknown);
        assert_eq!(PriceDirection::from_change(None), PriceDirection::Unknown);
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(percent(0.724), "72.4%");
        assert_eq!(ratio_percent(0.2), "20%");
        assert_eq!(ratio_percent(0.005), "0.5%");
        assert_eq!(format_krw(50123000.4), "₩50,123,000");
        assert_eq!(format_krw(999.0), "₩999");
        assert_eq!(format_krw(-1500.0), "-₩1,500");
        assert_eq!(format_config_key("min_order_amount"), "Min Order Amount");
        assert_eq!(format_config_key("RSI"), "RSI");
    }

    #[test]
    fn test_top_strengths_sorted_and_capped() {
        let mut body = String::new();
        for i in 0..12 {
            body.push_str(&format!("\"s{}\": 0.{},", i, i % 10));
        }
        body.push_str("\"label\": \"x\", \"s_top\": 0.95");
        let block = parse_block_body(&body);

        let top = top_strengths(&block, TOP_STRENGTHS);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].0, "s_top");
        assert_eq!(top[1].0, "s9");
        assert!(top.iter().all(|(k, _)| *k != "label"));
        // s0 and s10 are both 0.0; neither makes the cut ahead of 0.1+
        assert!(top.iter().all(|(k, _)| *k != "s0"));
    }

    #[test]
    fn test_config_rows_per_block() {
        let ratios = parse_block_body("\"min_ratio\": 0.2, \"max_ratio\": 0.7");
        let rows = config_rows(BlockName::InvestmentRatios, &ratios);
        assert_eq!(rows[0], ConfigRow { label: "Min Ratio".into(), value: "20%".into() });

        let usage = parse_block_body("\"MA\": True, \"SOPR\": False");
        let rows = config_rows(BlockName::IndicatorUsage, &usage);
        assert_eq!(rows[0].label, "MA");
        assert_eq!(rows[0].value, "on");
        assert_eq!(rows[1].value, "off");

        let trading = parse_block_body("\"min_order_amount\": 5000, \"trading_hours\": {\n\"enabled\": False");
        let rows = config_rows(BlockName::TradingSettings, &trading);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "5000");
    }

    fn sample_record() -> DailyRecord {
        DailyRecord {
            timestamp: "2026-10-16 20:00:00".into(),
            decision: Some(Decision::Sell),
            decision_kr: None,
            confidence: 0.72,
            signals: vec![
                IndicatorSignal {
                    source: "MACD".into(),
                    signal: "sell".into(),
                    strength: 0.64,
                    description: "dead cross".into(),
                    weight: None,
                },
                IndicatorSignal {
                    source: "RSI(상대강도지수)".into(),
                    signal: "hold".into(),
                    strength: 0.1,
                    description: "neutral".into(),
                    weight: None,
                },
            ],
            current_price: vec![MarketPrice {
                market: "KRW-BTC".into(),
                trade_price: 50123000.0,
                signed_change_rate: -0.01,
            }],
            price_change_24h: Some("-1.00%".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_view() {
        let status = StatusView::from_record(&sample_record());
        assert_eq!(status.price.as_deref(), Some("₩50,123,000"));
        assert_eq!(status.price_direction, PriceDirection::Down);
        assert_eq!(status.decision_label.as_deref(), Some("Sell"));
        assert_eq!(status.confidence_pct.as_deref(), Some("72.0%"));
        assert_eq!(status.confidence_band, Some(ConfidenceBand::Success));
        assert_eq!(status.signal_ratio, "0/0/0");

        let blank = StatusView::from_record(&DailyRecord::default());
        assert!(blank.price.is_none());
        assert!(blank.confidence.is_none());
        assert_eq!(blank.price_direction, PriceDirection::Unknown);
    }

    #[test]
    fn test_indicator_summary_uses_key_order() {
        let rows = indicator_summary(&sample_record());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].indicator, "RSI(상대강도지수)");
        assert_eq!(rows[1].indicator, "MACD");
        assert_eq!(rows[1].signal, "🔽 Sell");

        let signals = signal_rows(&sample_record());
        assert_eq!(signals[0].strength_text, "0.6");
    }

    #[test]
    fn test_log_and_trade_rows_newest_first() {
        let records: Vec<DailyRecord> = (0..12)
            .map(|i| DailyRecord {
                timestamp: format!("t{}", i),
                confidence: 0.5,
                ..Default::default()
            })
            .collect();
        let rows = log_rows(&records, 10);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].timestamp, "t11");
        assert_eq!(rows[0].summary, "➖ Hold (50.0%)");

        let trades = vec![
            TradeRecord {
                side: TradeSide::Buy,
                price: 50_000_000.0,
                total: 100_000.0,
                timestamp: "a".into(),
                ..Default::default()
            },
            TradeRecord {
                side: TradeSide::Sell,
                ticker: "KRW-ETH".into(),
                price: 3_000_000.0,
                amount: 0.002,
                timestamp: "b".into(),
                ..Default::default()
            },
        ];
        let rows = trade_rows(&trades, 10);
        assert_eq!(rows[0].detail, "₩3,000,000 x 0.00200000 ETH");
        assert_eq!(rows[1].detail, "₩50,000,000 x ₩100,000");
    }
}
