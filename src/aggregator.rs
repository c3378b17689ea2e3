//! Temporal aggregation
//!
//! This module computes the summary metrics of one window:
//! - Event totals and distinct event days
//! - Mean pain across every resolved pain level in the window
//! - Consistency (share of window days with an event)
//! - Medication tallies by name, matched exactly as written
//!
//! Each call extracts, filters and buckets from scratch and keeps nothing.

use crate::error::ComputeError;
use crate::types::{MonthlyStats, RawRecord, View, WeeklyStats, WindowAggregate};
use crate::window::{bucket_by_day, bucket_by_week, select, Window, WindowEntry};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregator producing window statistics from raw records
pub struct TemporalAggregator;

impl TemporalAggregator {
    /// Run the policy named by `view`
    pub fn aggregate(
        view: View,
        records: &[RawRecord],
        now: NaiveDateTime,
    ) -> Result<WindowAggregate, ComputeError> {
        match view {
            View::Weekly => Self::weekly(records, now).map(WindowAggregate::Weekly),
            View::Monthly => Self::monthly(records, now).map(WindowAggregate::Monthly),
        }
    }

    /// Statistics over the seven days before `now`
    pub fn weekly(records: &[RawRecord], now: NaiveDateTime) -> Result<WeeklyStats, ComputeError> {
        if records.is_empty() {
            return Ok(WeeklyStats::default());
        }

        let window = Window::trailing_week(now)?;
        let entries = select(records, &window);
        log::debug!(
            "weekly window from {}: {} of {} records",
            window.cutoff,
            entries.len(),
            records.len()
        );

        let summary = WindowSummary::compute(&entries, window.length_days);
        let daily_data = bucket_by_day(&entries, &window);
        let daily_data_sorted = daily_data.iter().rev().cloned().collect();

        Ok(WeeklyStats {
            total_headaches: summary.total_events,
            headache_days: summary.event_days,
            avg_pain: summary.avg_pain,
            consistency: summary.consistency,
            total_drugs: summary.total_drugs,
            drugs_by_type: summary.drugs_by_type,
            week_start: Some(window.first_day),
            week_end: Some(window.last_day),
            daily_data,
            daily_data_sorted,
        })
    }

    /// Statistics over the calendar month containing `now`
    pub fn monthly(
        records: &[RawRecord],
        now: NaiveDateTime,
    ) -> Result<MonthlyStats, ComputeError> {
        if records.is_empty() {
            return Ok(MonthlyStats::default());
        }

        let window = Window::month_to_date(now)?;
        let entries = select(records, &window);
        log::debug!(
            "monthly window from {}: {} of {} records",
            window.first_day,
            entries.len(),
            records.len()
        );

        // Denominator is the whole month even when only part of it has elapsed
        let summary = WindowSummary::compute(&entries, window.length_days);

        Ok(MonthlyStats {
            total_headaches: summary.total_events,
            headache_days: summary.event_days,
            avg_pain: summary.avg_pain,
            consistency: summary.consistency,
            total_drugs: summary.total_drugs,
            drugs_by_type: summary.drugs_by_type,
            month_start: Some(window.first_day),
            days_in_month: Some(window.length_days),
            weekly_data: bucket_by_week(&entries, window.first_day),
        })
    }
}

/// Metrics shared by both views
struct WindowSummary {
    total_events: u32,
    event_days: u32,
    avg_pain: f64,
    consistency: f64,
    total_drugs: u32,
    drugs_by_type: BTreeMap<String, u32>,
}

impl WindowSummary {
    fn compute(entries: &[WindowEntry], window_days: u32) -> Self {
        let event_days = entries
            .iter()
            .map(|e| e.date)
            .collect::<BTreeSet<NaiveDate>>()
            .len() as u32;

        let pain_levels: Vec<f64> = entries.iter().filter_map(|e| e.pain_level).collect();

        let mut drugs_by_type: BTreeMap<String, u32> = BTreeMap::new();
        for drug in entries.iter().filter_map(|e| e.drug.as_ref()) {
            *drugs_by_type.entry(drug.clone()).or_insert(0) += 1;
        }

        Self {
            total_events: entries.len() as u32,
            event_days,
            avg_pain: mean_pain(&pain_levels),
            consistency: consistency(event_days, window_days),
            total_drugs: drugs_by_type.values().sum(),
            drugs_by_type,
        }
    }
}

/// Arithmetic mean to one decimal; 0 for no values
pub fn mean_pain(levels: &[f64]) -> f64 {
    if levels.is_empty() {
        return 0.0;
    }
    round_tenth(levels.iter().sum::<f64>() / levels.len() as f64)
}

/// Percentage of window days with an event, one decimal, within [0, 100]
pub fn consistency(event_days: u32, window_days: u32) -> f64 {
    if event_days == 0 || window_days == 0 {
        return 0.0;
    }
    let pct = f64::from(event_days) / f64::from(window_days) * 100.0;
    round_tenth(pct.min(100.0))
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn row(date: &str, pain: &str, drug: &str) -> RawRecord {
        [("Date", date), ("Pain Level", pain), ("Medication", drug)]
            .into_iter()
            .collect()
    }

    /// Ten records over three days of the week ending 11/12/2025,
    /// three of them carrying pain levels 4, 6 and 8.
    fn ten_records() -> Vec<RawRecord> {
        vec![
            row("11/6/2025", "4", "Ibuprofen"),
            row("11/6/2025", "", ""),
            row("11/6/2025", "", ""),
            row("11/9/2025 7:30 AM", "6", ""),
            row("11/9/2025", "", "Tylenol"),
            row("11/9/2025", "", ""),
            row("11/12/2025 9:14 PM", "8", "Ibuprofen"),
            row("11/12/2025", "", ""),
            row("11/12/2025", "", ""),
            row("11/12/2025", "", ""),
        ]
    }

    #[test]
    fn test_weekly_scenario() {
        let stats = TemporalAggregator::weekly(&ten_records(), at(2025, 11, 12, 22)).unwrap();

        assert_eq!(stats.total_headaches, 10);
        assert_eq!(stats.headache_days, 3);
        assert_eq!(stats.avg_pain, 6.0);
        assert_eq!(stats.consistency, 42.9);
        assert_eq!(stats.total_drugs, 3);
        assert_eq!(stats.drugs_by_type.get("Ibuprofen"), Some(&2));
        assert_eq!(stats.drugs_by_type.get("Tylenol"), Some(&1));
    }

    #[test]
    fn test_weekly_buckets_agree_with_totals() {
        let stats = TemporalAggregator::weekly(&ten_records(), at(2025, 11, 12, 22)).unwrap();

        let bucket_total: u32 = stats.daily_data.iter().map(|d| d.count).sum();
        let bucket_days = stats.daily_data.iter().filter(|d| d.has_headache).count() as u32;
        assert_eq!(bucket_total, stats.total_headaches);
        assert_eq!(bucket_days, stats.headache_days);
    }

    #[test]
    fn test_weekly_sorted_view_is_reversed() {
        let stats = TemporalAggregator::weekly(&ten_records(), at(2025, 11, 12, 22)).unwrap();

        let forward: Vec<NaiveDate> = stats.daily_data.iter().map(|d| d.date).collect();
        let mut backward: Vec<NaiveDate> = stats.daily_data_sorted.iter().map(|d| d.date).collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert!(forward.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bucket_order_independent_of_input_order() {
        let mut shuffled = ten_records();
        shuffled.reverse();
        shuffled.swap(2, 7);

        let now = at(2025, 11, 12, 22);
        let a = TemporalAggregator::weekly(&ten_records(), now).unwrap();
        let b = TemporalAggregator::weekly(&shuffled, now).unwrap();
        assert_eq!(a.daily_data.len(), b.daily_data.len());
        for (x, y) in a.daily_data.iter().zip(&b.daily_data) {
            assert_eq!(x.date, y.date);
            assert_eq!(x.count, y.count);
            assert_eq!(x.avg_pain, y.avg_pain);
        }
        assert_eq!(a.consistency, b.consistency);
    }

    #[test]
    fn test_future_record_counts_but_has_no_bucket() {
        let mut records = ten_records();
        records.push(row("11/20/2025", "2", ""));

        let stats = TemporalAggregator::weekly(&records, at(2025, 11, 12, 22)).unwrap();
        assert_eq!(stats.total_headaches, 11);
        assert_eq!(stats.headache_days, 4);

        let bucket_total: u32 = stats.daily_data.iter().map(|d| d.count).sum();
        assert_eq!(bucket_total, 10);
    }

    #[test]
    fn test_midnight_reference_buckets_todays_record() {
        let records: Vec<RawRecord> = vec![[("Date", "11/12/2025"), ("Pain", "5")]
            .into_iter()
            .collect()];
        let stats = TemporalAggregator::weekly(&records, at(2025, 11, 12, 0)).unwrap();

        assert_eq!(stats.total_headaches, 1);
        let bucket_total: u32 = stats.daily_data.iter().map(|d| d.count).sum();
        assert_eq!(bucket_total, stats.total_headaches);
        assert_eq!(
            stats.daily_data[6].date,
            NaiveDate::from_ymd_opt(2025, 11, 12).unwrap()
        );
        assert_eq!(stats.daily_data[6].count, 1);
    }

    #[test]
    fn test_monthly_scenario_31_day_month() {
        let records = vec![
            row("10/1/2025", "3", ""),
            row("10/15/2025", "5", "Aspirin"),
            row("10/31/2025", "7", ""),
            row("9/30/2025", "9", "Aspirin"),
        ];
        let stats = TemporalAggregator::monthly(&records, at(2025, 10, 31, 20)).unwrap();

        assert_eq!(stats.total_headaches, 3);
        assert_eq!(stats.headache_days, 3);
        assert_eq!(stats.consistency, 9.7);
        assert_eq!(stats.avg_pain, 5.0);
        assert_eq!(stats.days_in_month, Some(31));
        assert_eq!(stats.total_drugs, 1);

        let counts: Vec<u32> = stats.weekly_data.iter().map(|w| w.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_monthly_denominator_is_full_month_early_on() {
        let records = vec![row("2/1/2025", "4", ""), row("2/2/2025", "4", "")];
        let stats = TemporalAggregator::monthly(&records, at(2025, 2, 2, 12)).unwrap();

        // 2 of 28 days, not 2 of 2 elapsed days
        assert_eq!(stats.consistency, 7.1);
    }

    #[test]
    fn test_next_month_record_folds_into_last_week() {
        let records = vec![row("11/5/2025", "4", ""), row("12/3/2025", "6", "")];
        let stats = TemporalAggregator::monthly(&records, at(2025, 11, 20, 12)).unwrap();

        assert_eq!(stats.total_headaches, 2);
        assert_eq!(stats.headache_days, 2);
        assert_eq!(stats.weekly_data[0].count, 1);
        assert_eq!(stats.weekly_data[3].count, 1);
        assert_eq!(stats.consistency, 6.7);
        assert!(stats.consistency <= 100.0);
    }

    #[test]
    fn test_drug_names_are_case_sensitive() {
        let records = vec![
            row("11/10/2025", "", "Ibuprofen"),
            row("11/10/2025", "", "ibuprofen"),
            row("11/11/2025", "", "Tylenol"),
        ];
        let stats = TemporalAggregator::weekly(&records, at(2025, 11, 12, 8)).unwrap();

        assert_eq!(stats.drugs_by_type.len(), 3);
        assert_eq!(stats.drugs_by_type.get("Ibuprofen"), Some(&1));
        assert_eq!(stats.drugs_by_type.get("ibuprofen"), Some(&1));
        assert_eq!(stats.drugs_by_type.get("Tylenol"), Some(&1));
        assert_eq!(stats.total_drugs, 3);
    }

    #[test]
    fn test_empty_input_is_zeroed_not_an_error() {
        let weekly = TemporalAggregator::weekly(&[], NaiveDateTime::MIN).unwrap();
        assert_eq!(weekly, WeeklyStats::default());
        assert!(weekly.daily_data.is_empty());

        let monthly = TemporalAggregator::monthly(&[], at(2025, 10, 31, 0)).unwrap();
        assert_eq!(monthly.consistency, 0.0);
        assert!(monthly.weekly_data.is_empty());
    }

    #[test]
    fn test_nothing_in_window_keeps_zero_filled_buckets() {
        let records = vec![row("1/1/2020", "5", "Aspirin")];
        let stats = TemporalAggregator::weekly(&records, at(2025, 11, 12, 8)).unwrap();

        assert_eq!(stats.total_headaches, 0);
        assert_eq!(stats.avg_pain, 0.0);
        assert_eq!(stats.consistency, 0.0);
        assert_eq!(stats.daily_data.len(), 7);
        assert!(stats.drugs_by_type.is_empty());
    }

    #[test]
    fn test_consistency_bounds() {
        assert_eq!(consistency(0, 7), 0.0);
        assert_eq!(consistency(3, 0), 0.0);
        assert_eq!(consistency(7, 7), 100.0);
        assert_eq!(consistency(9, 7), 100.0);
    }

    #[test]
    fn test_aggregate_dispatches_on_view() {
        let now = at(2025, 11, 12, 22);
        let weekly = TemporalAggregator::aggregate(View::Weekly, &ten_records(), now).unwrap();
        let monthly = TemporalAggregator::aggregate(View::Monthly, &ten_records(), now).unwrap();

        assert_eq!(weekly.view(), View::Weekly);
        assert_eq!(monthly.view(), View::Monthly);
        assert_eq!(monthly.total_headaches(), 10);
    }
}
