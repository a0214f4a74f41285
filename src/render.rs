//! Plain-text rendering of a snapshot for the terminal.

use std::fmt::Write;

use crate::dashboard::{ConfigView, HistorySection, Snapshot, TradingSection};
use crate::series::SeriesPoint;

const NO_DATA: &str = "(no data)";

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n== {} ==", title);
}

/// Left-aligned columns sized to their widest cell.
fn table(out: &mut String, header: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{}{}", c, " ".repeat(w.saturating_sub(c.chars().count()))))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(out, "  {}", line(header.to_vec()));
    for row in rows {
        let _ = writeln!(out, "  {}", line(row.iter().map(String::as_str).collect()));
    }
}

pub fn render_config(out: &mut String, config: Option<&ConfigView>) {
    let Some(config) = config else {
        heading(out, "Settings");
        let _ = writeln!(out, "  {}", NO_DATA);
        return;
    };
    for section in &config.sections {
        heading(out, &section.title);
        if section.rows.is_empty() {
            let _ = writeln!(out, "  {}", NO_DATA);
            continue;
        }
        for row in &section.rows {
            let _ = writeln!(out, "  {:<28} {}", row.label, row.value);
        }
    }
}

fn render_trading(out: &mut String, trading: &TradingSection) {
    let (status, indicators, signals, logs) = match trading {
        TradingSection::Records {
            status,
            indicators,
            signals,
            logs,
        } => (status, indicators, signals, logs),
        TradingSection::Empty | TradingSection::Missing => {
            heading(out, "Status");
            let _ = writeln!(out, "  no trading log data for today");
            return;
        }
        TradingSection::Unavailable { reason } => {
            heading(out, "Status");
            let _ = writeln!(out, "  trading log could not be loaded: {}", reason);
            return;
        }
    };

    heading(out, "Status");
    let dash = || "-".to_string();
    let _ = writeln!(out, "  price        {}", status.price.clone().unwrap_or_else(|| NO_DATA.to_string()));
    let _ = writeln!(
        out,
        "  24h change   {} ({:?})",
        status.price_change.clone().unwrap_or_else(|| "N/A".to_string()),
        status.price_direction
    );
    let _ = writeln!(out, "  decision     {}", status.decision_label.clone().unwrap_or_else(|| NO_DATA.to_string()));
    let _ = writeln!(
        out,
        "  confidence   {} {}",
        status.confidence_pct.clone().unwrap_or_else(dash),
        status
            .confidence_band
            .map(|b| format!("[{}]", b.as_str()))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "  signals b/s/h {}", status.signal_ratio);

    heading(out, "Key indicators");
    if indicators.is_empty() {
        let _ = writeln!(out, "  {}", NO_DATA);
    } else {
        let rows: Vec<Vec<String>> = indicators
            .iter()
            .map(|r| vec![r.indicator.clone(), r.signal.clone(), r.description.clone()])
            .collect();
        table(out, &["indicator", "signal", "description"], &rows);
    }

    heading(out, "Signals");
    if signals.is_empty() {
        let _ = writeln!(out, "  {}", NO_DATA);
    } else {
        let rows: Vec<Vec<String>> = signals
            .iter()
            .map(|r| {
                vec![
                    r.source.clone(),
                    r.signal.clone(),
                    r.strength_text.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        table(out, &["source", "signal", "strength", "description"], &rows);
    }

    heading(out, "Recent decisions");
    let rows: Vec<Vec<String>> = logs
        .iter()
        .map(|r| vec![r.timestamp.clone(), r.summary.clone()])
        .collect();
    table(out, &["time", "decision"], &rows);
}

pub fn render_history(out: &mut String, history: &HistorySection) {
    heading(out, "Trade history");
    match history {
        HistorySection::Trades { rows } => {
            let rows: Vec<Vec<String>> = rows
                .iter()
                .map(|r| vec![r.timestamp.clone(), r.side_label.clone(), r.detail.clone()])
                .collect();
            table(out, &["time", "side", "detail"], &rows);
        }
        HistorySection::LogLines { lines } => {
            let rows: Vec<Vec<String>> = lines
                .iter()
                .map(|l| vec![l.timestamp.clone(), l.level.clone(), l.message.clone()])
                .collect();
            table(out, &["time", "level", "message"], &rows);
        }
        HistorySection::Empty => {
            let _ = writeln!(out, "  no trade history");
        }
        HistorySection::Unavailable { reason } => {
            let _ = writeln!(out, "  trade history could not be loaded: {}", reason);
        }
    }
}

pub fn render_chart(out: &mut String, points: &[SeriesPoint]) {
    heading(out, &format!("Signals over {} days", points.len()));
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| {
            vec![
                p.label.clone(),
                p.buy.to_string(),
                p.sell.to_string(),
                p.hold.to_string(),
                format!("{:.1}", p.confidence * 100.0),
                "#".repeat((p.confidence * 20.0).round().clamp(0.0, 20.0) as usize),
            ]
        })
        .collect();
    table(out, &["date", "buy", "sell", "hold", "conf%", ""], &rows);
}

/// The whole dashboard.
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "updated {} ({})", snapshot.updated_at, snapshot.source);
    if let Some(notice) = &snapshot.notice {
        let _ = writeln!(out, "!! {}", notice);
    }
    render_trading(&mut out, &snapshot.trading);
    render_history(&mut out, &snapshot.history);
    render_chart(&mut out, &snapshot.chart.points);
    render_config(&mut out, snapshot.config.as_ref());
    out
}
