//! Writes plausible bot output for trying the dashboard without a live bot.
//!
//! Usage:
//!   gen_sample_data [--days N] [--dir DIR]
//!
//! Files that already exist are left alone.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use tradedash::source::file_stamp;

const INDICATORS: [&str; 10] = [
    "이동평균선(MA)",
    "장기추세(MA60)",
    "볼린저밴드(BB)",
    "RSI(상대강도지수)",
    "MACD",
    "스토캐스틱",
    "호가창(매수/매도비율)",
    "체결데이터",
    "김프(한국 프리미엄)",
    "시장심리(공포&탐욕지수)",
];

const ERROR_MESSAGES: [&str; 5] = [
    "트레이딩 작업 오류: 'NoneType' object is not subscriptable",
    "API 호출 오류: Timeout waiting for response",
    "데이터 처리 오류: Invalid JSON response",
    "거래소 연결 오류: Connection refused",
    "인증 오류: Invalid API credentials",
];

const TRADE_MESSAGES: [&str; 6] = [
    "거래 실행: KRW-BTC 100000원 매수 시도",
    "거래 성공: KRW-BTC 0.002 BTC 매수 완료",
    "거래 실행: KRW-BTC 0.001 BTC 매도 시도",
    "거래 성공: KRW-BTC 0.001 BTC 매도 완료",
    "거래 결과: {'status': 'success', 'action': 'buy', 'amount': 100000, 'price': 50000000}",
    "거래 결과: {'status': 'error', 'message': '거래 실행 오류: 최소 주문 금액 미달'}",
];

const APP_MESSAGES: [&str; 7] = [
    "비트코인 자동매매 프로그램 시작",
    "시장 데이터 업데이트: KRW-BTC",
    "분석 결과: buy (신뢰도: 0.72)",
    "분석 결과: sell (신뢰도: 0.68)",
    "분석 결과: hold (신뢰도: 0.44)",
    "현재가: 50,123,000원",
    "트레이딩 스케줄러 시작 (간격: 60분)",
];

#[derive(Parser)]
#[command(name = "gen_sample_data")]
#[command(about = "Generate sample trading logs for the dashboard", long_about = None)]
struct Args {
    /// Number of days to generate, ending today
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Log directory to write into
    #[arg(long, default_value = "logs")]
    dir: PathBuf,
}

fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
    date.and_hms_opt(h, m, s).unwrap_or_default()
}

fn stamp(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Write `body` unless `path` exists. Returns whether it wrote.
fn write_new(path: &Path, body: &str) -> Result<bool> {
    if path.exists() {
        println!("{} exists, skipping", path.display());
        return Ok(false);
    }
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(true)
}

fn indicator_signal<R: Rng>(rng: &mut R, source: &str) -> Value {
    let (signal, strength, description) = if rng.gen_bool(0.33) {
        let d = match source {
            "RSI(상대강도지수)" => format!("과매도 상태 (RSI: {:.1} < 30)", rng.gen_range(10.0..30.0)),
            "MACD" => "MACD 골든크로스 발생".to_string(),
            _ => "매수 신호".to_string(),
        };
        ("buy", rng.gen_range(0.3..0.8), d)
    } else if rng.gen_bool(0.5) {
        let d = match source {
            "RSI(상대강도지수)" => format!("과매수 상태 (RSI: {:.1} > 70)", rng.gen_range(70.0..90.0)),
            "MACD" => "MACD 데드크로스 발생".to_string(),
            _ => "매도 신호".to_string(),
        };
        ("sell", rng.gen_range(0.3..0.8), d)
    } else {
        let d = match source {
            "RSI(상대강도지수)" => format!("중립적 (RSI: {:.1})", rng.gen_range(40.0..60.0)),
            "MACD" => "MACD 중립적 상태".to_string(),
            _ => "중립 신호".to_string(),
        };
        ("hold", rng.gen_range(0.0..0.3), d)
    };

    let weight = match source {
        "RSI(상대강도지수)" | "MACD" => 1.2,
        "호가창(매수/매도비율)" | "체결데이터" | "김프(한국 프리미엄)" => 0.8,
        _ => 1.0,
    };

    json!({
        "source": source,
        "signal": signal,
        "strength": strength,
        "description": description,
        "weight": weight,
    })
}

/// Six snapshots, four hours apart, with a drifting price.
fn trading_day<R: Rng>(rng: &mut R, date: NaiveDate) -> Vec<Value> {
    let mut price = rng.gen_range(48_000_000..=52_000_000) as f64;
    (0..6)
        .map(|j| {
            let change = rng.gen_range(-0.02..0.02);
            price *= 1.0 + change;

            let buy: u32 = rng.gen_range(1..=5);
            let sell: u32 = rng.gen_range(1..=5);
            let hold: u32 = rng.gen_range(3..=8);
            let (decision, decision_kr, confidence) = if buy > sell && buy > hold {
                ("buy", "매수", rng.gen_range(0.6..0.9))
            } else if sell > buy && sell > hold {
                ("sell", "매도", rng.gen_range(0.6..0.9))
            } else {
                ("hold", "홀드", rng.gen_range(0.4..0.6))
            };

            let signals: Vec<Value> = INDICATORS.iter().map(|s| indicator_signal(rng, s)).collect();
            json!({
                "timestamp": stamp(at(date, j * 4, 0, 0)),
                "decision": decision,
                "decision_kr": decision_kr,
                "confidence": confidence,
                "avg_signal_strength": rng.gen_range(0.0..0.3),
                "signals": signals,
                "signal_counts": {"buy": buy, "sell": sell, "hold": hold},
                "current_price": [{
                    "market": "KRW-BTC",
                    "trade_price": price,
                    "signed_change_rate": change,
                }],
                "price_change_24h": format!("{:.2}%", change * 100.0),
            })
        })
        .collect()
}

/// Zero to three executed trades.
fn trades<R: Rng>(rng: &mut R, date: NaiveDate) -> Vec<Value> {
    let count = rng.gen_range(0..=3);
    (0..count)
        .map(|_| {
            let time = at(date, rng.gen_range(9..=21), rng.gen_range(0..60), rng.gen_range(0..60));
            let price = rng.gen_range(48_000_000..=52_000_000) as f64;
            let side = if rng.gen_bool(0.5) { "buy" } else { "sell" };
            let (amount, total) = if side == "buy" {
                let amount = rng.gen_range(0.001..0.01);
                (amount, price * amount)
            } else {
                let total = rng.gen_range(100_000.0..1_000_000.0);
                (total / price, total)
            };
            json!({
                "type": side,
                "ticker": "KRW-BTC",
                "price": price,
                "amount": amount,
                "total": total,
                "timestamp": stamp(time),
                "confidence": rng.gen_range(0.5..0.9),
                "order_id": format!("uuid-{}", rng.gen_range(100_000..1_000_000)),
            })
        })
        .collect()
}

/// `count` plain-text log lines stepping back `step_hours` from `now`.
#[allow(clippy::too_many_arguments)]
fn text_log<R: Rng>(
    rng: &mut R,
    now: NaiveDateTime,
    name: &str,
    level: &str,
    count: usize,
    step_hours: i64,
    messages: &[&str],
    in_order: bool,
) -> String {
    (0..count)
        .map(|i| {
            let t = now - Duration::hours(i as i64 * step_hours);
            let msg = if in_order && i < messages.len() {
                messages[i]
            } else {
                messages.choose(rng).copied().unwrap_or_default()
            };
            format!("{},123 - {} - {} - {}\n", stamp(t), name, level, msg)
        })
        .collect()
}

fn pretty(value: &[Value]) -> Result<String> {
    serde_json::to_string_pretty(value).context("encoding sample data")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dir = &args.dir;
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    println!("generating {} days of sample data in {}", args.days, dir.display());

    let mut rng = rand::thread_rng();
    let now = Local::now().naive_local();
    let today = now.date();

    for i in 0..args.days {
        let date = today - Duration::days(i as i64);
        let log_path = dir.join(format!("trading_log_{}.json", file_stamp(date)));
        if !write_new(&log_path, &pretty(&trading_day(&mut rng, date))?)? {
            continue;
        }

        if i == 0 || rng.gen_bool(0.3) {
            let day_trades = trades(&mut rng, date);
            if !day_trades.is_empty() {
                let path = dir.join(format!("trade_history_{}.json", file_stamp(date)));
                write_new(&path, &pretty(&day_trades)?)?;
            }
        }
    }

    let error_log = text_log(&mut rng, now, "error", "ERROR", 3, 8, &ERROR_MESSAGES, false);
    write_new(&dir.join("error.log"), &error_log)?;
    let trade_log = text_log(&mut rng, now, "trade", "INFO", 5, 6, &TRADE_MESSAGES, false);
    write_new(&dir.join("trade.log"), &trade_log)?;
    let app_log = text_log(&mut rng, now, "app", "INFO", 7, 4, &APP_MESSAGES, true);
    write_new(&dir.join("app.log"), &app_log)?;

    println!("done");
    Ok(())
}
