//! The dashboard load flow.
//!
//! A refresh runs its stages strictly in order (settings, today's trading
//! log, trade history, chart) so a half-loaded dashboard never mixes data
//! from different passes. Each stage degrades to a placeholder on its own;
//! an unexpected failure keeps the previously loaded section and raises a
//! single notice on the snapshot.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::config_text::{self, BlockName, ParsedConfig};
use crate::display::{
    config_rows, indicator_summary, log_rows, signal_rows, trade_rows, ConfigRow, IndicatorRow,
    LogRow, SignalRow, StatusView, TradeRow,
};
use crate::logging::{
    error, info, log_refresh_summary, log_section_fallback, obj, v_str, Domain, ProfileScope,
};
use crate::records::{parse_daily_records, parse_trade_records, recent_log_lines, DailyRecord, LogLine};
use crate::series::{aggregate, ChartColumns, DayReducer, LastSnapshot, SeriesPoint};
use crate::settings::Settings;
use crate::source::{DataSource, ResourcePaths};

pub const LOAD_FAILED_NOTICE: &str = "Some dashboard data could not be loaded; showing the last good values.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSection {
    pub name: BlockName,
    pub title: String,
    pub rows: Vec<ConfigRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigView {
    pub fingerprint: String,
    pub sections: Vec<ConfigSection>,
}

impl ConfigView {
    /// All six blocks in display order; absent blocks have no rows.
    pub fn from_parsed(config: &ParsedConfig) -> Self {
        let sections = BlockName::ALL
            .iter()
            .map(|name| ConfigSection {
                name: *name,
                title: name.title().to_string(),
                rows: config.get(*name).map(|b| config_rows(*name, b)).unwrap_or_default(),
            })
            .collect();
        Self {
            fingerprint: config.fingerprint().to_string(),
            sections,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TradingSection {
    Records {
        status: StatusView,
        indicators: Vec<IndicatorRow>,
        signals: Vec<SignalRow>,
        logs: Vec<LogRow>,
    },
    /// The day's file exists but holds no entries.
    Empty,
    /// No file for today.
    Missing,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HistorySection {
    Trades { rows: Vec<TradeRow> },
    LogLines { lines: Vec<LogLine> },
    Empty,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSection {
    pub points: Vec<SeriesPoint>,
    pub columns: ChartColumns,
}

impl ChartSection {
    pub fn from_points(points: Vec<SeriesPoint>) -> Self {
        let columns = ChartColumns::from_points(&points);
        Self { points, columns }
    }
}

/// Everything one refresh produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub updated_at: String,
    pub today: NaiveDate,
    pub days: usize,
    pub source: String,
    pub config: Option<ConfigView>,
    pub trading: TradingSection,
    pub history: HistorySection,
    pub chart: ChartSection,
    pub notice: Option<String>,
}

pub struct Dashboard {
    source: Box<dyn DataSource>,
    paths: ResourcePaths,
    reducer: Box<dyn DayReducer + Send + Sync>,
    logs_limit: usize,
    history_limit: usize,
    config: Option<ParsedConfig>,
    last: Option<Snapshot>,
}

impl Dashboard {
    pub fn new(source: Box<dyn DataSource>, settings: &Settings) -> Self {
        Self {
            source,
            paths: ResourcePaths::from_settings(settings),
            reducer: Box::new(LastSnapshot),
            logs_limit: settings.logs_limit,
            history_limit: settings.history_limit,
            config: None,
            last: None,
        }
    }

    /// Replace the policy that picks a day's representative record.
    pub fn with_reducer(mut self, reducer: impl DayReducer + Send + Sync + 'static) -> Self {
        self.reducer = Box::new(reducer);
        self
    }

    /// The last successfully parsed settings.
    pub fn config(&self) -> Option<&ParsedConfig> {
        self.config.as_ref()
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last.as_ref()
    }

    /// Fetch and parse the settings text. A successful parse replaces the
    /// retained config wholesale; a miss leaves it untouched.
    pub async fn load_config(&mut self) -> Result<Option<&ParsedConfig>> {
        let _scope = ProfileScope::new("load_config");
        let text = self
            .source
            .fetch_text(&self.paths.config)
            .await
            .context("fetching settings")?;

        let Some(text) = text else {
            log_section_fallback(Domain::Config, "config", "settings file not found");
            return Ok(self.config.as_ref());
        };

        let parsed = config_text::parse(&text);
        let changed = self
            .config
            .as_ref()
            .map(|old| old.fingerprint() != parsed.fingerprint())
            .unwrap_or(true);
        let found: Vec<serde_json::Value> = parsed.blocks().map(|(n, _)| v_str(n.as_str())).collect();
        info(
            Domain::Config,
            "config_loaded",
            obj(&[
                ("path", v_str(&self.paths.config)),
                ("fingerprint", v_str(parsed.fingerprint())),
                ("changed", json!(changed)),
                ("blocks", json!(found)),
            ]),
        );
        self.config = Some(parsed);
        Ok(self.config.as_ref())
    }

    /// Today's trading log: status widgets and the signal/log tables.
    pub async fn load_trading_logs(&self, today: NaiveDate) -> Result<TradingSection> {
        let _scope = ProfileScope::new("load_trading_logs");
        let path = self.paths.trading_log(today);
        let Some(body) = self.source.fetch_text(&path).await.context("fetching trading log")? else {
            log_section_fallback(Domain::Logs, "trading", "no trading log for today");
            return Ok(TradingSection::Missing);
        };

        let records = parse_daily_records(&body).with_context(|| format!("parsing {}", path))?;
        let Some(latest) = records.last() else {
            return Ok(TradingSection::Empty);
        };

        Ok(TradingSection::Records {
            status: StatusView::from_record(latest),
            indicators: indicator_summary(latest),
            signals: signal_rows(latest),
            logs: log_rows(&records, self.logs_limit),
        })
    }

    /// Today's executed trades, falling back to the plain-text trade log.
    pub async fn load_trade_history(&self, today: NaiveDate) -> Result<HistorySection> {
        let _scope = ProfileScope::new("load_trade_history");
        let path = self.paths.trade_history(today);
        if let Some(body) = self.source.fetch_text(&path).await.context("fetching trade history")? {
            let trades = parse_trade_records(&body).with_context(|| format!("parsing {}", path))?;
            if trades.is_empty() {
                return Ok(HistorySection::Empty);
            }
            return Ok(HistorySection::Trades {
                rows: trade_rows(&trades, self.history_limit),
            });
        }

        let log_path = self.paths.trade_log();
        let Some(text) = self.source.fetch_text(&log_path).await.context("fetching trade log")? else {
            return Ok(HistorySection::Empty);
        };
        let lines = recent_log_lines(&text, self.history_limit);
        if lines.is_empty() {
            Ok(HistorySection::Empty)
        } else {
            Ok(HistorySection::LogLines { lines })
        }
    }

    /// Records of one day; any failure reads as a day without data.
    async fn fetch_day(&self, date: NaiveDate) -> (NaiveDate, Option<Vec<DailyRecord>>) {
        let path = self.paths.trading_log(date);
        let records = match self.source.fetch_text(&path).await {
            Ok(Some(body)) => match parse_daily_records(&body) {
                Ok(records) => Some(records),
                Err(err) => {
                    log_section_fallback(Domain::Chart, "chart_day", &format!("{}: {}", path, err));
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                log_section_fallback(Domain::Chart, "chart_day", &format!("{:#}", err));
                None
            }
        };
        (date, records)
    }

    /// Exactly `days` points ending at `today`. Day fetches run concurrently,
    /// each filling its own slot.
    pub async fn load_chart(&self, days: usize, today: NaiveDate) -> Vec<SeriesPoint> {
        let _scope = ProfileScope::with_context("load_chart", &[("days", json!(days))]);
        let dates = crate::series::date_window(today, days);
        let fetched = join_all(dates.iter().map(|d| self.fetch_day(*d))).await;

        let lookup: HashMap<NaiveDate, Vec<DailyRecord>> = fetched
            .into_iter()
            .filter_map(|(date, records)| records.map(|r| (date, r)))
            .collect();
        info(
            Domain::Chart,
            "chart_loaded",
            obj(&[("days", json!(days)), ("days_with_data", json!(lookup.len()))]),
        );
        aggregate(days, today, &lookup, self.reducer.as_ref())
    }

    /// Run the full load sequence and retain the resulting snapshot.
    pub async fn refresh(&mut self, days: usize, today: NaiveDate) -> &Snapshot {
        let scope = ProfileScope::with_context("refresh", &[("days", json!(days))]);
        let mut failed = false;

        if let Err(err) = self.load_config().await {
            error(Domain::Config, "load_failed", obj(&[("msg", v_str(&format!("{:#}", err)))]));
            failed = true;
        }

        let trading = match self.load_trading_logs(today).await {
            Ok(section) => section,
            Err(err) => {
                error(Domain::Logs, "load_failed", obj(&[("msg", v_str(&format!("{:#}", err)))]));
                failed = true;
                self.previous(|s| s.trading.clone()).unwrap_or(TradingSection::Unavailable {
                    reason: format!("{:#}", err),
                })
            }
        };

        let history = match self.load_trade_history(today).await {
            Ok(section) => section,
            Err(err) => {
                error(Domain::History, "load_failed", obj(&[("msg", v_str(&format!("{:#}", err)))]));
                failed = true;
                self.previous(|s| s.history.clone()).unwrap_or(HistorySection::Unavailable {
                    reason: format!("{:#}", err),
                })
            }
        };

        let chart = ChartSection::from_points(self.load_chart(days, today).await);

        let notice = failed.then(|| LOAD_FAILED_NOTICE.to_string());
        log_refresh_summary(days, scope.elapsed_ms(), notice.as_deref());

        let snapshot = Snapshot {
            updated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            today,
            days,
            source: self.source.describe(),
            config: self.config.as_ref().map(ConfigView::from_parsed),
            trading,
            history,
            chart,
            notice,
        };
        self.last.insert(snapshot)
    }

    /// Refresh for the local calendar day.
    pub async fn refresh_now(&mut self, days: usize) -> &Snapshot {
        let today = Local::now().date_naive();
        self.refresh(days, today).await
    }

    fn previous<T>(&self, pick: impl FnOnce(&Snapshot) -> T) -> Option<T> {
        self.last.as_ref().map(pick)
    }
}
