//! Per-day chart series.
//!
//! A window of calendar days ending today is mapped onto one point per day.
//! Days without data are zero-filled, never skipped, so every series has
//! exactly as many points as requested.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::records::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub label: String,
    pub buy: u32,
    pub sell: u32,
    pub hold: u32,
    pub confidence: f64,
}

impl SeriesPoint {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            label: date_label(date),
            buy: 0,
            sell: 0,
            hold: 0,
            confidence: 0.0,
        }
    }

    fn from_record(date: NaiveDate, record: &DailyRecord) -> Self {
        Self {
            date,
            label: date_label(date),
            buy: record.signal_counts.buy,
            sell: record.signal_counts.sell,
            hold: record.signal_counts.hold,
            confidence: record.confidence,
        }
    }
}

/// Date-keyed access to daily records, however they were obtained.
pub trait RecordLookup {
    fn records_for(&self, date: NaiveDate) -> Option<&[DailyRecord]>;
}

impl RecordLookup for HashMap<NaiveDate, Vec<DailyRecord>> {
    fn records_for(&self, date: NaiveDate) -> Option<&[DailyRecord]> {
        self.get(&date).map(Vec::as_slice)
    }
}

impl RecordLookup for BTreeMap<NaiveDate, Vec<DailyRecord>> {
    fn records_for(&self, date: NaiveDate) -> Option<&[DailyRecord]> {
        self.get(&date).map(Vec::as_slice)
    }
}

/// Picks the record that represents a whole day.
pub trait DayReducer {
    fn select<'r>(&self, records: &'r [DailyRecord]) -> Option<&'r DailyRecord>;
}

/// The most recent intraday snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSnapshot;

impl DayReducer for LastSnapshot {
    fn select<'r>(&self, records: &'r [DailyRecord]) -> Option<&'r DailyRecord> {
        records.last()
    }
}

/// The snapshot the bot was most confident about; earliest wins ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxConfidence;

impl DayReducer for MaxConfidence {
    fn select<'r>(&self, records: &'r [DailyRecord]) -> Option<&'r DailyRecord> {
        records.iter().fold(None, |best: Option<&DailyRecord>, r| match best {
            Some(b) if b.confidence >= r.confidence => Some(b),
            _ => Some(r),
        })
    }
}

impl<F> DayReducer for F
where
    F: for<'r> Fn(&'r [DailyRecord]) -> Option<&'r DailyRecord>,
{
    fn select<'r>(&self, records: &'r [DailyRecord]) -> Option<&'r DailyRecord> {
        self(records)
    }
}

/// `days` calendar dates ending at `today`, oldest first.
pub fn date_window(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as u64)
        .rev()
        .map(|offset| {
            today
                .checked_sub_days(Days::new(offset))
                .unwrap_or(NaiveDate::MIN)
        })
        .collect()
}

/// `MM/DD`
pub fn date_label(date: NaiveDate) -> String {
    date.format("%m/%d").to_string()
}

/// One point per day of the window; missing or empty days are zero-filled.
pub fn aggregate<L, R>(days: usize, today: NaiveDate, lookup: &L, reducer: &R) -> Vec<SeriesPoint>
where
    L: RecordLookup + ?Sized,
    R: DayReducer + ?Sized,
{
    date_window(today, days)
        .into_iter()
        .map(|date| {
            lookup
                .records_for(date)
                .and_then(|records| reducer.select(records))
                .map(|record| SeriesPoint::from_record(date, record))
                .unwrap_or_else(|| SeriesPoint::empty(date))
        })
        .collect()
}

/// Column-aligned arrays for a chart: one entry per point in every column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartColumns {
    pub labels: Vec<String>,
    pub buy: Vec<u32>,
    pub sell: Vec<u32>,
    pub hold: Vec<u32>,
    /// Confidence scaled to 0..=100.
    pub confidence_pct: Vec<f64>,
}

impl ChartColumns {
    pub fn from_points(points: &[SeriesPoint]) -> Self {
        let mut cols = ChartColumns::default();
        for p in points {
            cols.labels.push(p.label.clone());
            cols.buy.push(p.buy);
            cols.sell.push(p.sell);
            cols.hold.push(p.hold);
            cols.confidence_pct.push(p.confidence * 100.0);
        }
        cols
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SignalCounts;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(buy: u32, sell: u32, hold: u32, confidence: f64) -> DailyRecord {
        DailyRecord {
            confidence,
            signal_counts: SignalCounts { buy, sell, hold },
            ..Default::default()
        }
    }

    #[test]
    fn test_length_is_always_days() {
        let today = day(2026, 10, 16);
        let mut lookup = HashMap::new();
        lookup.insert(today, vec![record(1, 2, 3, 0.5)]);
        lookup.insert(day(2026, 1, 1), vec![record(9, 9, 9, 0.9)]);

        for days in [0, 1, 7, 14, 30] {
            let series = aggregate(days, today, &lookup, &LastSnapshot);
            assert_eq!(series.len(), days);
        }
    }

    #[test]
    fn test_only_middle_day_has_data() {
        let today = day(2026, 10, 16);
        let mut lookup = HashMap::new();
        lookup.insert(
            day(2026, 10, 15),
            vec![record(1, 1, 1, 0.2), record(4, 2, 6, 0.65)],
        );

        let series = aggregate(3, today, &lookup, &LastSnapshot);
        assert_eq!(series[0], SeriesPoint::empty(day(2026, 10, 14)));
        assert_eq!(series[2], SeriesPoint::empty(today));

        let mid = &series[1];
        assert_eq!((mid.buy, mid.sell, mid.hold), (4, 2, 6));
        assert_eq!(mid.confidence, 0.65);
        assert_eq!(mid.label, "10/15");
    }

    #[test]
    fn test_empty_day_list_is_zero_filled() {
        let today = day(2026, 10, 16);
        let mut lookup = BTreeMap::new();
        lookup.insert(today, Vec::new());
        let series = aggregate(1, today, &lookup, &LastSnapshot);
        assert_eq!(series[0], SeriesPoint::empty(today));
    }

    #[test]
    fn test_window_crosses_month_and_year() {
        let window = date_window(day(2027, 1, 2), 4);
        let labels: Vec<String> = window.into_iter().map(date_label).collect();
        assert_eq!(labels, vec!["12/30", "12/31", "01/01", "01/02"]);
    }

    #[test]
    fn test_alternate_reducers() {
        let today = day(2026, 10, 16);
        let mut lookup = HashMap::new();
        lookup.insert(
            today,
            vec![record(1, 0, 0, 0.3), record(2, 0, 0, 0.8), record(3, 0, 0, 0.4)],
        );

        let best = aggregate(1, today, &lookup, &MaxConfidence);
        assert_eq!(best[0].buy, 2);

        fn first(records: &[DailyRecord]) -> Option<&DailyRecord> {
            records.first()
        }
        let earliest = aggregate(1, today, &lookup, &first);
        assert_eq!(earliest[0].buy, 1);
    }

    #[test]
    fn test_last_snapshot_with_null_price_still_wins() {
        let today = day(2026, 10, 16);
        let records = crate::records::parse_daily_records(
            r#"[
                {"timestamp": "2026-10-16 00:00:00", "confidence": 0.4, "signal_counts": {"buy": 1}},
                {
                    "timestamp": "2026-10-16 04:00:00",
                    "confidence": 0.75,
                    "signal_counts": {"buy": 0, "sell": 7, "hold": 2},
                    "current_price": [{"trade_price": null, "error": "timeout"}]
                }
            ]"#,
        )
        .unwrap();
        let mut lookup = HashMap::new();
        lookup.insert(today, records);

        let series = aggregate(1, today, &lookup, &LastSnapshot);
        assert_eq!((series[0].buy, series[0].sell, series[0].hold), (0, 7, 2));
        assert_eq!(series[0].confidence, 0.75);
    }

    #[test]
    fn test_chart_columns_are_aligned() {
        let today = day(2026, 10, 16);
        let mut lookup = HashMap::new();
        lookup.insert(today, vec![record(2, 1, 4, 0.725)]);
        let series = aggregate(5, today, &lookup, &LastSnapshot);
        let cols = ChartColumns::from_points(&series);

        assert_eq!(cols.len(), 5);
        assert_eq!(cols.buy.len(), 5);
        assert_eq!(cols.confidence_pct.len(), 5);
        assert_eq!(cols.hold[4], 4);
        assert!((cols.confidence_pct[4] - 72.5).abs() < 1e-9);
        assert_eq!(cols.confidence_pct[0], 0.0);
    }
}
