//! Admin dashboard counts: documents created per 28-day window over the last
//! twelve windows.

use learnhub_auth::User;
use learnhub_catalog::Course;
use serde::Serialize;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, Time};

use crate::order::Order;

pub const WINDOW_DAYS: i64 = 28;
pub const WINDOWS: i64 = 12;

/// A document with a creation time.
pub trait Dated {
    fn created_at(&self) -> OffsetDateTime;
}

impl Dated for User {
    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Dated for Course {
    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Dated for Order {
    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowCount {
    /// End of the window, e.g. "18 Oct 2026".
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCounts {
    pub last_12_months: Vec<WindowCount>,
}

/// Counts `docs` per window, oldest window first.
///
/// Windows end at midnight. The newest one ends at the midnight after `now`,
/// so it includes today. Each window is `[end - 28 days, end)`.
pub fn last_12_months<D: Dated>(docs: &[D], now: OffsetDateTime) -> MonthlyCounts {
    let anchor = now.replace_time(Time::MIDNIGHT) + Duration::days(1);

    let last_12_months = (0..WINDOWS)
        .rev()
        .map(|i| {
            let end = anchor - Duration::days(i * WINDOW_DAYS);
            let start = end - Duration::days(WINDOW_DAYS);
            let count = docs
                .iter()
                .map(Dated::created_at)
                .filter(|at| *at >= start && *at < end)
                .count();
            WindowCount {
                month: label(end),
                count,
            }
        })
        .collect();

    MonthlyCounts { last_12_months }
}

fn label(at: OffsetDateTime) -> String {
    at.format(format_description!("[day padding:none] [month repr:short] [year]"))
        .unwrap_or_else(|_| at.date().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn order_at(at: OffsetDateTime) -> Order {
        Order::new("c1", "u1", None, at)
    }

    #[test]
    fn test_windows_and_labels() {
        let now = datetime!(2026-10-18 15:00 UTC);
        let counts = last_12_months::<Order>(&[], now);

        assert_eq!(counts.last_12_months.len(), 12);
        assert_eq!(counts.last_12_months[11].month, "19 Oct 2026");
        assert_eq!(counts.last_12_months[10].month, "21 Sep 2026");
        assert!(counts.last_12_months.iter().all(|w| w.count == 0));
    }

    #[test]
    fn test_counts_fall_into_half_open_windows() {
        let now = datetime!(2026-10-18 15:00 UTC);
        let orders = vec![
            order_at(datetime!(2026-10-18 09:00 UTC)),
            order_at(datetime!(2026-09-21 00:00 UTC)),
            order_at(datetime!(2026-09-20 23:59 UTC)),
            // older than every window
            order_at(datetime!(2025-01-01 00:00 UTC)),
        ];

        let counts = last_12_months(&orders, now);
        let newest = &counts.last_12_months[11];
        let previous = &counts.last_12_months[10];
        assert_eq!(newest.count, 2);
        assert_eq!(previous.count, 1);
        let total: usize = counts.last_12_months.iter().map(|w| w.count).sum();
        assert_eq!(total, 3);
    }
}
