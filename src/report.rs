use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Profile, RankEntry, Report, Trend};
use crate::{progression, stats};

pub fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "above the daily average",
        Trend::Down => "below the daily average",
        Trend::Flat => "at the daily average",
    }
}

pub fn build_user_report(profile: &Profile, reports: &[Report], now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let progress = progression::resolve_progress(profile.points);
    let activity = stats::report_stats(reports, now);
    let last_week = stats::daily_counts(reports, today, 7);

    let mut output = String::new();

    let _ = writeln!(output, "# Breeding Site Watch Summary");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        profile.name, profile.email, today
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Progress");
    let _ = writeln!(output, "- Points: {}", profile.points);
    let _ = writeln!(output, "- Title: {}", progress.current_title);
    let _ = writeln!(output, "- Next title: {}", progress.next_title_label());

    if progress.is_max_level() {
        let _ = writeln!(output, "- Maximum level reached");
    } else {
        let _ = writeln!(
            output,
            "- Progress: {}% ({} points needed)",
            progress.rounded_percent(),
            progress.points_to_next
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activity");
    let _ = writeln!(output, "- Total reports: {}", activity.total);
    let _ = writeln!(
        output,
        "- Today: {} ({})",
        activity.today,
        trend_label(activity.trend)
    );
    let _ = writeln!(
        output,
        "- Averages: {:.1}/day, {:.1}/week, {:.1}/month",
        activity.daily_average, activity.weekly_average, activity.monthly_average
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last 7 Days");
    for day in &last_week {
        let _ = writeln!(output, "- {}: {}", day.date.format("%a %d/%m"), day.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Reports");

    if reports.is_empty() {
        let _ = writeln!(output, "No reports submitted yet.");
    } else {
        let mut recent = reports.to_vec();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for report in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} on {}: {}",
                report.title,
                report.created_at.date_naive(),
                report.location.address
            );
        }
    }

    output
}

pub fn build_ranking_report(entries: &[RankEntry]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Community Ranking");
    let _ = writeln!(output);

    if entries.is_empty() {
        let _ = writeln!(output, "No participants yet.");
        return output;
    }

    for (position, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} - {} ({} points, {} reports)",
            position + 1,
            entry.name,
            entry.title,
            entry.points,
            entry.report_count
        );
    }

    output
}
