use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tradedash::config_text::{BlockName, ConfigValue};
use tradedash::dashboard::{Dashboard, HistorySection, TradingSection};
use tradedash::render::render_text;
use tradedash::settings::Settings;
use tradedash::source::FsSource;

const CONFIG: &str = r#"
# trading bot settings
DECISION_THRESHOLDS = {
    "buy_threshold": 0.05,   # weighted score above this buys
    "sell_threshold": -0.05,
    "confidence_min": 0.6
}

INVESTMENT_RATIOS = {
    "min_ratio": 0.1,
    "max_ratio": 0.5
}

INDICATOR_USAGE = {
    "RSI": True,
    "MACD": false,
}

TRADING_SETTINGS = {
    "market": "KRW-BTC",
    "min_order_amount": 5000,
    "trading_interval": 60,
}
"#;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn record(ts: &str, decision: &str, confidence: f64, buy: u32) -> String {
    format!(
        r#"{{
            "timestamp": "{ts}",
            "decision": "{decision}",
            "confidence": {confidence},
            "signals": [
                {{"source": "MACD", "signal": "buy", "strength": 0.7, "description": "golden cross"}},
                {{"source": "RSI(상대강도지수)", "signal": "hold", "strength": 0.1, "description": "neutral"}}
            ],
            "signal_counts": {{"buy": {buy}, "sell": 1, "hold": 3}},
            "current_price": [{{"market": "KRW-BTC", "trade_price": 50123000.0}}],
            "price_change_24h": "1.25%"
        }}"#
    )
}

fn dashboard(dir: &TempDir) -> Dashboard {
    Dashboard::new(Box::new(FsSource::new(dir.path())), &Settings::default())
}

#[tokio::test]
async fn full_refresh_from_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config/trading_config.py", CONFIG);
    write(
        dir.path(),
        "logs/trading_log_20261016.json",
        &format!(
            "[{}, {}]",
            record("2026-10-16 00:00:00", "hold", 0.45, 2),
            record("2026-10-16 04:00:00", "buy", 0.82, 6)
        ),
    );
    write(
        dir.path(),
        "logs/trading_log_20261014.json",
        &format!("[{}]", record("2026-10-14 08:00:00", "sell", 0.3, 1)),
    );
    write(
        dir.path(),
        "logs/trade_history_20261016.json",
        r#"[{"type": "buy", "price": 50000000, "amount": 0.002, "total": 100000, "timestamp": "2026-10-16 09:12:00"}]"#,
    );

    let mut dash = dashboard(&dir);
    let snap = dash.refresh(5, today()).await.clone();

    let config = dash.config().unwrap();
    let thresholds = config.get(BlockName::DecisionThresholds).unwrap();
    assert_eq!(thresholds.get("buy_threshold"), Some(&ConfigValue::Number(0.05)));
    assert_eq!(thresholds.get("sell_threshold"), Some(&ConfigValue::Number(-0.05)));
    assert_eq!(thresholds.get("confidence_min"), Some(&ConfigValue::Number(0.6)));
    let usage = config.get(BlockName::IndicatorUsage).unwrap();
    assert_eq!(usage.get("RSI"), Some(&ConfigValue::Bool(true)));
    assert_eq!(usage.get("MACD"), Some(&ConfigValue::Bool(false)));
    assert!(!config.contains(BlockName::SignalStrengths));

    match &snap.trading {
        TradingSection::Records { status, logs, .. } => {
            assert_eq!(status.confidence, Some(0.82));
            assert_eq!(logs.len(), 2);
            assert_eq!(logs[0].timestamp, "2026-10-16 04:00:00");
        }
        other => panic!("expected records, got {:?}", other),
    }
    assert!(matches!(&snap.history, HistorySection::Trades { rows } if rows.len() == 1));

    let points = &snap.chart.points;
    assert_eq!(points.len(), 5);
    assert_eq!(points[0].label, "10/12");
    assert_eq!(points[4].label, "10/16");
    assert_eq!((points[2].buy, points[2].sell, points[2].hold), (1, 1, 3));
    assert_eq!(points[3].buy, 0);
    assert_eq!(points[4].buy, 6);
    assert_eq!(points[4].confidence, 0.82);
    assert_eq!(snap.chart.columns.len(), 5);
    assert!(snap.notice.is_none());

    let text = render_text(&snap);
    assert!(text.contains("Buy Threshold"));
    assert!(text.contains("golden cross"));
}

#[tokio::test]
async fn empty_directory_renders_placeholders() {
    let dir = TempDir::new().unwrap();
    let mut dash = dashboard(&dir);
    let snap = dash.refresh(7, today()).await;

    assert!(snap.config.is_none());
    assert_eq!(snap.trading, TradingSection::Missing);
    assert_eq!(snap.history, HistorySection::Empty);
    assert_eq!(snap.chart.points.len(), 7);
    assert!(render_text(snap).contains("no trading log data for today"));
}

#[tokio::test]
async fn config_survives_deletion_between_refreshes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config/trading_config.py", CONFIG);
    let mut dash = dashboard(&dir);
    dash.refresh(1, today()).await;
    let before = dash.config().unwrap().fingerprint().to_string();

    fs::remove_file(dir.path().join("config/trading_config.py")).unwrap();
    let snap = dash.refresh(1, today()).await;
    assert_eq!(snap.config.as_ref().unwrap().fingerprint, before);
}

#[tokio::test]
async fn trade_log_tail_when_no_history_file() {
    let dir = TempDir::new().unwrap();
    let lines: String = (0..15)
        .map(|i| format!("2026-10-16 {:02}:30:00,123 - trade - INFO - step {}\n", i, i))
        .collect();
    write(dir.path(), "logs/trade.log", &format!("not a log line\n{}", lines));

    let dash = dashboard(&dir);
    match dash.load_trade_history(today()).await.unwrap() {
        HistorySection::LogLines { lines } => {
            assert_eq!(lines.len(), 10);
            assert_eq!(lines[0].message, "step 14");
            assert_eq!(lines[9].message, "step 5");
        }
        other => panic!("expected log lines, got {:?}", other),
    }
}

#[tokio::test]
async fn snapshot_without_price_still_shows() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "logs/trading_log_20261016.json",
        r#"[{"timestamp": "2026-10-16 08:00:00", "decision": "sell", "confidence": 0.66,
             "signal_counts": {"sell": 4}, "current_price": null}]"#,
    );
    let mut dash = dashboard(&dir);
    let snap = dash.refresh(1, today()).await;

    match &snap.trading {
        TradingSection::Records { status, .. } => {
            assert!(status.price.is_none());
            assert_eq!(status.confidence, Some(0.66));
        }
        other => panic!("expected records, got {:?}", other),
    }
    assert_eq!(snap.chart.points[0].sell, 4);
}
