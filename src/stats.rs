use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{DailyCount, Report, ReportStats, Trend};

const SECONDS_PER_DAY: i64 = 86_400;

pub fn report_stats(reports: &[Report], now: DateTime<Utc>) -> ReportStats {
    let today = now.date_naive();
    let total = reports.len();
    let today_count = reports
        .iter()
        .filter(|report| report.created_at.date_naive() == today)
        .count();

    // Started days count in full: a first report 10.5 days ago spans 11 days.
    let oldest = reports
        .iter()
        .map(|report| report.created_at)
        .min()
        .unwrap_or(now);
    let days = ceil_div((now - oldest).num_seconds(), SECONDS_PER_DAY).max(1);
    let weeks = ceil_div(days, 7).max(1);
    let months = ceil_div(days, 30).max(1);

    let daily_average = total as f64 / days as f64;

    ReportStats {
        total,
        today: today_count,
        daily_average,
        weekly_average: total as f64 / weeks as f64,
        monthly_average: total as f64 / months as f64,
        trend: trend(today_count, daily_average),
    }
}

/// Compares today's count with the daily average as displayed (one decimal).
pub fn trend(today: usize, daily_average: f64) -> Trend {
    let shown = (daily_average * 10.0).round() / 10.0;
    let today = today as f64;

    if today > shown {
        Trend::Up
    } else if today < shown {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Per-day counts for the `days` days ending at `today`, oldest first.
pub fn daily_counts(reports: &[Report], today: NaiveDate, days: i64) -> Vec<DailyCount> {
    (0..days.max(0))
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let count = reports
                .iter()
                .filter(|report| report.created_at.date_naive() == date)
                .count();
            DailyCount { date, count }
        })
        .collect()
}

pub fn monthly_counts(reports: &[Report], year: i32) -> [usize; 12] {
    let mut counts = [0usize; 12];

    for report in reports {
        let date = report.created_at.date_naive();
        if date.year() == year {
            counts[date.month0() as usize] += 1;
        }
    }

    counts
}

/// Reports created at or after `now` minus `days` whole days.
pub fn recent_count<'a>(
    reports: impl IntoIterator<Item = &'a Report>,
    now: DateTime<Utc>,
    days: i64,
) -> usize {
    let cutoff = now - Duration::days(days.max(0));
    reports
        .into_iter()
        .filter(|report| report.created_at >= cutoff)
        .count()
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn report_on(date: NaiveDate) -> Report {
        report_at(date, 12)
    }

    fn report_at(date: NaiveDate, hour: u32) -> Report {
        let created_at = Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap());
        Report {
            id: Uuid::new_v4(),
            title: "Standing water".to_string(),
            description: "Tyres stacked behind the school".to_string(),
            location: Location {
                latitude: -8.05,
                longitude: -34.9,
                address: "Rua da Aurora".to_string(),
            },
            image_url: None,
            created_at,
            user_name: "Avery Lee".to_string(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn evening_of(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(18, 0, 0).unwrap())
    }

    #[test]
    fn empty_history_has_zero_averages() {
        let stats = report_stats(&[], evening_of(day(2026, 3, 10)));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.today, 0);
        assert_eq!(stats.daily_average, 0.0);
        assert_eq!(stats.trend, Trend::Flat);
    }

    #[test]
    fn averages_span_days_since_first_report() {
        let today = day(2026, 3, 10);
        let reports = vec![
            report_on(day(2026, 2, 28)),
            report_on(day(2026, 3, 5)),
            report_on(today),
            report_on(today),
        ];

        let stats = report_stats(&reports, evening_of(today));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.today, 2);
        assert!((stats.daily_average - 4.0 / 11.0).abs() < 1e-9);
        assert!((stats.weekly_average - 2.0).abs() < 1e-9);
        assert!((stats.monthly_average - 4.0).abs() < 1e-9);
        assert_eq!(stats.trend, Trend::Up);
    }

    #[test]
    fn partial_first_day_counts_as_a_whole_day() {
        let now = evening_of(day(2026, 3, 10));
        let reports: Vec<Report> = (0..11).map(|_| report_on(day(2026, 2, 28))).collect();

        let stats = report_stats(&reports, now);
        assert_eq!(stats.daily_average, 1.0);
        assert_eq!(stats.weekly_average, 5.5);
    }

    #[test]
    fn reports_from_the_last_hours_span_one_day() {
        let now = evening_of(day(2026, 3, 10));
        let reports = vec![report_on(day(2026, 3, 10))];

        let stats = report_stats(&reports, now);
        assert_eq!(stats.daily_average, 1.0);
        assert_eq!(stats.trend, Trend::Flat);
    }

    #[test]
    fn trend_uses_displayed_average() {
        assert_eq!(trend(1, 0.96), Trend::Flat);
        assert_eq!(trend(0, 0.04), Trend::Flat);
        assert_eq!(trend(0, 0.2), Trend::Down);
        assert_eq!(trend(3, 2.0), Trend::Up);
    }

    #[test]
    fn daily_counts_cover_last_week_oldest_first() {
        let today = day(2026, 3, 10);
        let reports = vec![
            report_on(day(2026, 3, 4)),
            report_on(day(2026, 3, 3)),
            report_on(today),
        ];

        let counts = daily_counts(&reports, today, 7);
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], DailyCount { date: day(2026, 3, 4), count: 1 });
        assert_eq!(counts[6], DailyCount { date: today, count: 1 });
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 2);
    }

    #[test]
    fn monthly_counts_ignore_other_years() {
        let reports = vec![
            report_on(day(2026, 1, 15)),
            report_on(day(2026, 1, 20)),
            report_on(day(2026, 12, 1)),
            report_on(day(2025, 1, 15)),
        ];

        let counts = monthly_counts(&reports, 2026);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[11], 1);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn recent_count_respects_window() {
        let today = day(2026, 3, 10);
        let reports = vec![
            report_on(day(2026, 2, 7)),
            report_on(day(2026, 2, 9)),
            report_on(today),
        ];

        assert_eq!(recent_count(&reports, evening_of(today), 30), 2);
    }

    #[test]
    fn recent_count_cuts_the_boundary_day_at_the_same_hour() {
        let boundary = day(2026, 2, 8);
        let reports = vec![report_at(boundary, 12), report_at(boundary, 18), report_at(boundary, 20)];

        assert_eq!(recent_count(&reports, evening_of(day(2026, 3, 10)), 30), 2);
    }
}
