//! Text report rendering
//!
//! Formatting only: every number in these reports comes out of
//! tally-core. The shapes mirror the reports the practice has always
//! used - a full analysis summary, and daily/weekly/monthly sheets.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write;
use tally_api::{DailyMetrics, EarningsSummary, SessionRecord};
use tally_core::{daily_metrics, service_breakdown, service_earnings, session_breakdown};
use tally_util::{format_date, Money};

/// The full analysis summary.
pub fn summary_report(summary: &EarningsSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "EARNINGS ANALYSIS SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out);

    let _ = writeln!(out, "OVERALL STATISTICS");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let _ = writeln!(out, "Total Sessions: {}", summary.total_sessions);
    match &summary.date_range {
        Some(range) => {
            let _ = writeln!(
                out,
                "Date Range: {} to {}",
                format_date(range.start),
                format_date(range.end)
            );
        }
        None => {
            let _ = writeln!(out, "Date Range: N/A");
        }
    }
    let _ = writeln!(out, "Total Earnings: {}", summary.total_earnings);
    let _ = writeln!(out);

    let _ = writeln!(out, "EARNINGS BY LOCATION");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for (location, earnings) in &summary.earnings_by_location {
        let _ = writeln!(out, "{}: {}", location, earnings);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "SESSION STATISTICS");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let stats = &summary.statistics;
    let _ = writeln!(out, "Average per Session: {}", stats.mean);
    let _ = writeln!(out, "Median per Session: {}", stats.median);
    let _ = writeln!(out, "Range: {} - {}", stats.min, stats.max);
    let _ = writeln!(out, "Std Dev: {}", stats.std_dev);
    let _ = writeln!(out);

    let _ = writeln!(out, "SERVICE BREAKDOWN");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for (service, count) in &summary.service_breakdown {
        let _ = writeln!(out, "{}: {}", service, count);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "TIP STATISTICS");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let tips = &summary.tips;
    let _ = writeln!(out, "Total Tips: {}", tips.total_tips);
    let _ = writeln!(out, "Average Tip: {}", tips.average_tip);
    let _ = writeln!(out, "Sessions with Tips: {}", tips.sessions_with_tips);
    let _ = writeln!(out, "Tip as % of Earnings: {:.1}%", tips.tip_percentage);
    let _ = writeln!(out);

    let _ = writeln!(out, "BEST EARNING DAYS");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for (i, day) in summary.best_days.iter().enumerate() {
        let _ = writeln!(out, "{}. {}: {}", i + 1, format_date(day.date), day.total);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "PRODUCTIVITY METRICS");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let productivity = &summary.productivity;
    let _ = writeln!(out, "Working Days: {}", productivity.work_days);
    let _ = writeln!(
        out,
        "Average Sessions/Day: {:.1}",
        productivity.sessions_per_day
    );
    let _ = writeln!(
        out,
        "Average Earnings/Day: {}",
        productivity.average_daily_earnings
    );

    out
}

/// One day in detail, session by session.
pub fn daily_report(date: NaiveDate, sessions: &[SessionRecord]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "EARNINGS REPORT - {}", format_date(date));
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);

    if sessions.is_empty() {
        let _ = writeln!(out, "No sessions recorded for this date.");
        return out;
    }

    let _ = writeln!(out, "Total Sessions: {}", sessions.len());

    let mut earnings_total = Money::ZERO;
    let mut tips_total = Money::ZERO;

    for session in sessions {
        let _ = writeln!(out);
        let _ = writeln!(out, "Session {}", session.id);
        let _ = writeln!(out, "{}", "-".repeat(30));

        for service in &session.services {
            let label = service.service_type.as_deref().unwrap_or("unknown");
            let earnings = service_earnings(service);
            let _ = writeln!(
                out,
                "  {}: {}min @ {}/hr = {}",
                label,
                service.duration.unwrap_or(0.0),
                Money::from_dollars(service.rate.unwrap_or(0.0)),
                earnings
            );
        }

        for add_on in &session.add_ons {
            let _ = writeln!(
                out,
                "  Add-on: {} = {}",
                add_on.name.as_deref().unwrap_or("unknown"),
                add_on.price
            );
        }

        if session.tips.is_positive() {
            let _ = writeln!(out, "  Tips: {}", session.tips);
        }

        let breakdown = session_breakdown(session);
        earnings_total += breakdown.services + breakdown.add_ons;
        tips_total += breakdown.tips;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "DAILY SUMMARY");
    let _ = writeln!(out, "Total Earnings: {}", earnings_total);
    let _ = writeln!(out, "Total Tips: {}", tips_total);
    let _ = writeln!(out, "Gross Total: {}", earnings_total + tips_total);
    let _ = writeln!(out);
    let _ = writeln!(out, "Services Breakdown:");
    for (service, count) in service_breakdown(sessions) {
        let _ = writeln!(out, "  {}: {}", service, count);
    }

    out
}

/// Monday-to-Sunday week, one line per working day.
pub fn weekly_report(start: NaiveDate, end: NaiveDate, sessions: &[SessionRecord]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "WEEKLY EARNINGS REPORT");
    let _ = writeln!(out, "Week of {} to {}", format_date(start), format_date(end));
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);

    let daily = daily_metrics(sessions);
    write_day_lines(&mut out, &daily);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "Weekly Totals:");
    write_period_totals(&mut out, &daily, false);

    out
}

/// Calendar month, one line per working day plus averages.
pub fn monthly_report(month: &str, sessions: &[SessionRecord]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "MONTHLY EARNINGS REPORT");
    let _ = writeln!(out, "Month of {}", month);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);

    let daily = daily_metrics(sessions);
    write_day_lines(&mut out, &daily);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "Monthly Totals:");
    let _ = writeln!(out, "  Working Days: {}", daily.len());
    write_period_totals(&mut out, &daily, true);

    out
}

fn write_day_lines(out: &mut String, daily: &BTreeMap<NaiveDate, DailyMetrics>) {
    for (date, metrics) in daily {
        let _ = writeln!(
            out,
            "{}: {} sessions, {} (Tips: {})",
            format_date(*date),
            metrics.sessions,
            metrics.total(),
            metrics.tips
        );
    }
}

fn write_period_totals(
    out: &mut String,
    daily: &BTreeMap<NaiveDate, DailyMetrics>,
    with_averages: bool,
) {
    let total_sessions: u64 = daily.values().map(|m| m.sessions).sum();
    let earnings: Money = daily.values().map(|m| m.services + m.add_ons).sum();
    let tips: Money = daily.values().map(|m| m.tips).sum();
    let gross = earnings + tips;

    let _ = writeln!(out, "  Total Sessions: {}", total_sessions);
    let _ = writeln!(out, "  Total Earnings: {}", earnings);
    let _ = writeln!(out, "  Total Tips: {}", tips);
    let _ = writeln!(out, "  Gross Total: {}", gross);

    if with_averages && total_sessions > 0 && !daily.is_empty() {
        let per_session = Money::from_cents(
            (gross.cents() as f64 / total_sessions as f64).round() as i64,
        );
        let per_day =
            Money::from_cents((gross.cents() as f64 / daily.len() as f64).round() as i64);
        let _ = writeln!(out, "  Average per Session: {}", per_session);
        let _ = writeln!(out, "  Average per Working Day: {}", per_day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_api::{AddOn, Service};
    use tally_util::SessionId;

    fn sample() -> Vec<SessionRecord> {
        vec![
            SessionRecord {
                id: SessionId::new("s1"),
                location: "halo".into(),
                date: "2026-02-17".parse().unwrap(),
                services: vec![Service {
                    service_type: Some("massage".into()),
                    duration: Some(60.0),
                    rate: Some(90.0),
                }],
                add_ons: vec![AddOn {
                    name: Some("oil".into()),
                    price: Money::from_dollars(10.0),
                }],
                tips: Money::from_dollars(20.0),
                review: None,
                rating: None,
                has_client_review: false,
            },
            SessionRecord {
                id: SessionId::new("s2"),
                location: "soul-bridge".into(),
                date: "2026-02-18".parse().unwrap(),
                services: vec![],
                add_ons: vec![],
                tips: Money::from_dollars(50.0),
                review: None,
                rating: None,
                has_client_review: false,
            },
        ]
    }

    #[test]
    fn summary_report_prints_core_figures() {
        let summary = tally_core::summarize(&sample());
        let report = summary_report(&summary);

        assert!(report.contains("EARNINGS ANALYSIS SUMMARY"));
        assert!(report.contains("Total Sessions: 2"));
        assert!(report.contains("Date Range: 2026-02-17 to 2026-02-18"));
        assert!(report.contains("Total Earnings: $170.00"));
        assert!(report.contains("halo: $120.00"));
        assert!(report.contains("massage: 1"));
        assert!(report.contains("Sessions with Tips: 2"));
        assert!(report.contains("Working Days: 2"));
    }

    #[test]
    fn daily_report_itemizes_sessions() {
        let sessions = sample();
        let day: Vec<SessionRecord> = sessions
            .iter()
            .filter(|s| s.date == "2026-02-17".parse::<NaiveDate>().unwrap())
            .cloned()
            .collect();

        let report = daily_report("2026-02-17".parse().unwrap(), &day);

        assert!(report.contains("EARNINGS REPORT - 2026-02-17"));
        assert!(report.contains("Session s1"));
        assert!(report.contains("massage: 60min @ $90.00/hr = $90.00"));
        assert!(report.contains("Add-on: oil = $10.00"));
        assert!(report.contains("Tips: $20.00"));
        assert!(report.contains("Total Earnings: $100.00"));
        assert!(report.contains("Gross Total: $120.00"));
    }

    #[test]
    fn daily_report_handles_empty_day() {
        let report = daily_report("2026-02-20".parse().unwrap(), &[]);
        assert!(report.contains("No sessions recorded for this date."));
    }

    #[test]
    fn weekly_report_sums_days() {
        let report = weekly_report(
            "2026-02-16".parse().unwrap(),
            "2026-02-22".parse().unwrap(),
            &sample(),
        );

        assert!(report.contains("Week of 2026-02-16 to 2026-02-22"));
        assert!(report.contains("2026-02-17: 1 sessions, $120.00 (Tips: $20.00)"));
        assert!(report.contains("Total Sessions: 2"));
        assert!(report.contains("Gross Total: $170.00"));
    }

    #[test]
    fn monthly_report_includes_averages() {
        let report = monthly_report("2026-02", &sample());

        assert!(report.contains("Month of 2026-02"));
        assert!(report.contains("Working Days: 2"));
        assert!(report.contains("Average per Session: $85.00"));
        assert!(report.contains("Average per Working Day: $85.00"));
    }
}
