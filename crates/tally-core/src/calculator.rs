//! The earnings calculator
//!
//! A session's gross total is the sum of its service earnings
//! (`rate / 60 * duration`, each line item rounded to the cent), its
//! flat add-on prices, and its tips. Summation happens in whole cents,
//! so partition totals reconcile with the grand total exactly.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tally_api::{
    AddOn, DailyMetrics, DateRange, DayTotal, EarningsSummary, Productivity, Service,
    SessionBreakdown, SessionRecord, SessionStatistics, TipStatistics,
};
use tally_util::Money;

/// Number of entries `summarize` keeps in its best-days ranking.
pub const DEFAULT_BEST_DAYS: usize = 5;

/// Label used when a service or add-on has no name.
const UNNAMED: &str = "unknown";

/// Earnings of one service line item. A service missing either its
/// rate or its duration contributes zero; that is not an error.
pub fn service_earnings(service: &Service) -> Money {
    match (service.rate, service.duration) {
        (Some(rate), Some(duration)) => Money::from_dollars(rate / 60.0 * duration),
        _ => Money::ZERO,
    }
}

fn addon_price(add_on: &AddOn) -> Money {
    add_on.price
}

/// One session's gross earnings: services + add-ons + tips.
pub fn session_total(session: &SessionRecord) -> Money {
    session_breakdown(session).total
}

/// One session's earnings split into its three components.
pub fn session_breakdown(session: &SessionRecord) -> SessionBreakdown {
    let services: Money = session.services.iter().map(service_earnings).sum();
    let add_ons: Money = session.add_ons.iter().map(addon_price).sum();
    let tips = session.tips;

    SessionBreakdown {
        services,
        add_ons,
        tips,
        total: services + add_ons + tips,
    }
}

/// Grand total over all sessions.
pub fn total(sessions: &[SessionRecord]) -> Money {
    sessions.iter().map(session_total).sum()
}

/// Totals partitioned by business location.
pub fn totals_by_location(sessions: &[SessionRecord]) -> BTreeMap<String, Money> {
    let mut totals = BTreeMap::new();
    for session in sessions {
        *totals.entry(session.location.clone()).or_insert(Money::ZERO) +=
            session_total(session);
    }
    totals
}

/// Totals partitioned by date.
pub fn totals_by_date(sessions: &[SessionRecord]) -> BTreeMap<NaiveDate, Money> {
    let mut totals = BTreeMap::new();
    for session in sessions {
        *totals.entry(session.date).or_insert(Money::ZERO) += session_total(session);
    }
    totals
}

/// Statistics over the multiset of per-session totals. All zeros for an
/// empty input; sample (n-1) standard deviation when count > 1, else 0.
pub fn statistics(sessions: &[SessionRecord]) -> SessionStatistics {
    let mut totals: Vec<i64> = sessions.iter().map(|s| session_total(s).cents()).collect();
    if totals.is_empty() {
        return SessionStatistics::default();
    }
    totals.sort_unstable();

    let count = totals.len();
    let sum: i64 = totals.iter().sum();
    let mean = sum as f64 / count as f64;

    let std_dev = if count > 1 {
        let variance = totals
            .iter()
            .map(|&cents| {
                let diff = cents as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    SessionStatistics {
        count: count as u64,
        mean: Money::from_cents(mean.round() as i64),
        median: median_cents(&totals),
        min: Money::from_cents(totals[0]),
        max: Money::from_cents(totals[count - 1]),
        std_dev: Money::from_cents(std_dev.round() as i64),
    }
}

/// Median of a sorted slice of cent amounts, rounded to the cent for an
/// even count.
fn median_cents(sorted: &[i64]) -> Money {
    let n = sorted.len();
    if n == 0 {
        return Money::ZERO;
    }
    if n % 2 == 1 {
        Money::from_cents(sorted[n / 2])
    } else {
        let mid = (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0;
        Money::from_cents(mid.round() as i64)
    }
}

/// Tip statistics. Only sessions with tips > 0 count toward the average
/// and median; the percentage relates total tips to non-tip earnings
/// and is 0 whenever that denominator is not positive.
pub fn tip_statistics(sessions: &[SessionRecord]) -> TipStatistics {
    let mut tips: Vec<i64> = sessions
        .iter()
        .map(|s| s.tips)
        .filter(|t| t.is_positive())
        .map(Money::cents)
        .collect();
    if tips.is_empty() {
        return TipStatistics::default();
    }
    tips.sort_unstable();

    let total_tips = Money::from_cents(tips.iter().sum());
    let count = tips.len();
    let average = total_tips.cents() as f64 / count as f64;

    let other_earnings = total(sessions) - total_tips;
    let tip_percentage = if other_earnings.is_positive() {
        total_tips.cents() as f64 / other_earnings.cents() as f64 * 100.0
    } else {
        0.0
    };

    TipStatistics {
        total_tips,
        average_tip: Money::from_cents(average.round() as i64),
        median_tip: median_cents(&tips),
        sessions_with_tips: count as u64,
        tip_percentage,
    }
}

/// The `limit` highest-earning days, descending by total, ties broken
/// by date ascending.
pub fn best_days(sessions: &[SessionRecord], limit: usize) -> Vec<DayTotal> {
    let mut days: Vec<DayTotal> = totals_by_date(sessions)
        .into_iter()
        .map(|(date, total)| DayTotal { date, total })
        .collect();
    days.sort_by(|a, b| b.total.cmp(&a.total).then(a.date.cmp(&b.date)));
    days.truncate(limit);
    days
}

/// Working-day productivity. Every ratio is 0 when there are no working
/// days.
pub fn productivity(sessions: &[SessionRecord]) -> Productivity {
    let work_days = totals_by_date(sessions).len() as u64;
    let total_sessions = sessions.len() as u64;
    if work_days == 0 {
        return Productivity::default();
    }

    let average_daily = total(sessions).cents() as f64 / work_days as f64;

    Productivity {
        work_days,
        total_sessions,
        sessions_per_day: total_sessions as f64 / work_days as f64,
        average_daily_earnings: Money::from_cents(average_daily.round() as i64),
    }
}

/// Count of line items per service type.
pub fn service_breakdown(sessions: &[SessionRecord]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for session in sessions {
        for service in &session.services {
            let label = service
                .service_type
                .clone()
                .unwrap_or_else(|| UNNAMED.to_string());
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    counts
}

/// Revenue per add-on name.
pub fn addon_revenue(sessions: &[SessionRecord]) -> BTreeMap<String, Money> {
    let mut revenue = BTreeMap::new();
    for session in sessions {
        for add_on in &session.add_ons {
            let label = add_on.name.clone().unwrap_or_else(|| UNNAMED.to_string());
            *revenue.entry(label).or_insert(Money::ZERO) += add_on.price;
        }
    }
    revenue
}

/// Per-day session count and earnings split.
pub fn daily_metrics(sessions: &[SessionRecord]) -> BTreeMap<NaiveDate, DailyMetrics> {
    let mut daily: BTreeMap<NaiveDate, DailyMetrics> = BTreeMap::new();
    for session in sessions {
        let breakdown = session_breakdown(session);
        let metrics = daily.entry(session.date).or_default();
        metrics.sessions += 1;
        metrics.services += breakdown.services;
        metrics.add_ons += breakdown.add_ons;
        metrics.tips += breakdown.tips;
    }
    daily
}

/// Inclusive span of dates present in the input.
pub fn date_range(sessions: &[SessionRecord]) -> Option<DateRange> {
    let start = sessions.iter().map(|s| s.date).min()?;
    let end = sessions.iter().map(|s| s.date).max()?;
    Some(DateRange { start, end })
}

/// Assemble the full earnings summary for a set of sessions.
pub fn summarize(sessions: &[SessionRecord]) -> EarningsSummary {
    let mut sessions_by_location: BTreeMap<String, u64> = BTreeMap::new();
    let mut sessions_by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for session in sessions {
        *sessions_by_location
            .entry(session.location.clone())
            .or_insert(0) += 1;
        *sessions_by_date.entry(session.date).or_insert(0) += 1;
    }

    EarningsSummary {
        total_sessions: sessions.len() as u64,
        total_earnings: total(sessions),
        date_range: date_range(sessions),
        sessions_by_location,
        sessions_by_date,
        earnings_by_location: totals_by_location(sessions),
        daily: daily_metrics(sessions),
        statistics: statistics(sessions),
        tips: tip_statistics(sessions),
        best_days: best_days(sessions, DEFAULT_BEST_DAYS),
        productivity: productivity(sessions),
        service_breakdown: service_breakdown(sessions),
        addon_revenue: addon_revenue(sessions),
    }
}
