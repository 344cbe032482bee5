//! Derived habit statistics.
//!
//! # Responsibility
//! - Compute monthly completion counts and percentages per habit.
//! - Compute the current streak of consecutive completed days.
//! - Summarize one calendar month across all habits.
//!
//! # Invariants
//! - Every function is total: malformed log entries are skipped, never raised.
//! - Days are walked with calendar arithmetic, so month and year boundaries
//!   and leap days need no special casing.
//! - Percentages round half up and are 0 when the denominator is 0.

use crate::model::habit::{is_iso_date_literal, Habit};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Parses one log entry, returning `None` for entries that are not a
/// `YYYY-MM-DD` literal or not a real calendar date.
pub fn parse_log_date(value: &str) -> Option<NaiveDate> {
    if !is_iso_date_literal(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Number of days in `month` (1-12) of `year`; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map_or(0, |next| (next - first).num_days() as u32)
}

/// Distinct completed days of `year`-`month`.
pub fn monthly_done_count<I, S>(logs: I, year: i32, month: u32) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    valid_dates(logs)
        .into_iter()
        .filter(|date| date.year() == year && date.month() == month)
        .count() as u32
}

/// Completed share of the month, as a rounded integer percent.
pub fn monthly_percent<I, S>(logs: I, year: i32, month: u32, days_in_month: u32) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    percent(
        u64::from(monthly_done_count(logs, year, month)),
        u64::from(days_in_month),
    )
}

/// Length of the run of consecutive days ending at the latest logged day.
///
/// Returns 0 when no entry is a valid date.
pub fn streak<I, S>(logs: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dates = valid_dates(logs);
    let Some(mut current) = dates.last().copied() else {
        return 0;
    };

    let mut count = 1;
    while let Some(previous) = current.pred_opt() {
        if !dates.contains(&previous) {
            break;
        }
        count += 1;
        current = previous;
    }
    count
}

/// Completed share of all habit-day cells of the month.
pub fn aggregate_percent(habits: &[Habit], year: i32, month: u32, days_in_month: u32) -> u32 {
    let done: u64 = habits
        .iter()
        .map(|habit| u64::from(monthly_done_count(&habit.logs, year, month)))
        .sum();
    percent(done, habits.len() as u64 * u64::from(days_in_month))
}

/// One habit's standing for a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitProgress {
    pub done: u32,
    pub days_in_month: u32,
    pub percent: u32,
    pub streak: u32,
}

impl HabitProgress {
    pub fn for_month(habit: &Habit, year: i32, month: u32) -> Self {
        let days_in_month = days_in_month(year, month);
        let done = monthly_done_count(&habit.logs, year, month);
        Self {
            done,
            days_in_month,
            percent: percent(u64::from(done), u64::from(days_in_month)),
            streak: streak(&habit.logs),
        }
    }
}

/// Habit with the most completed days in a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopHabit {
    pub title: String,
    pub done: u32,
}

/// Dashboard summary for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub total_habits: usize,
    pub completion_percent: u32,
    pub best_streak: u32,
    pub top_habit: TopHabit,
}

/// Summarizes `habits` for `year`-`month`.
///
/// The top habit is the first one, in the given order, with the strictly
/// greatest done count; it is `-` with 0 days when nothing was done.
pub fn summarize_month(habits: &[Habit], year: i32, month: u32) -> MonthSummary {
    let days = days_in_month(year, month);
    let mut best_streak = 0;
    let mut top_habit = TopHabit {
        title: "-".to_string(),
        done: 0,
    };

    for habit in habits {
        best_streak = best_streak.max(streak(&habit.logs));

        let done = monthly_done_count(&habit.logs, year, month);
        if done > top_habit.done {
            top_habit = TopHabit {
                title: habit.title.clone(),
                done,
            };
        }
    }

    MonthSummary {
        year,
        month,
        days_in_month: days,
        total_habits: habits.len(),
        completion_percent: aggregate_percent(habits, year, month, days),
        best_streak,
        top_habit,
    }
}

fn valid_dates<I, S>(logs: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    logs.into_iter()
        .filter_map(|log| parse_log_date(log.as_ref()))
        .collect()
}

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    // f64::round is half-away-from-zero, i.e. half up for these values.
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::{
        aggregate_percent, days_in_month, monthly_done_count, monthly_percent, parse_log_date,
        streak, summarize_month, HabitProgress,
    };
    use crate::model::habit::Habit;
    use chrono::Utc;

    fn habit_with_logs(title: &str, logs: &[&str]) -> Habit {
        let mut habit = Habit::new(title, 1.0, "General", Utc::now());
        habit.logs = logs.iter().map(|log| log.to_string()).collect();
        habit
    }

    #[test]
    fn streak_of_empty_logs_is_zero() {
        assert_eq!(streak(Vec::<String>::new()), 0);
        assert_eq!(streak(["not-a-date", "2024-02-30"]), 0);
    }

    #[test]
    fn streak_walks_across_month_boundary() {
        assert_eq!(streak(["2024-01-30", "2024-01-31", "2024-02-01"]), 3);
    }

    #[test]
    fn streak_walks_across_year_boundary_and_leap_day() {
        assert_eq!(streak(["2023-12-31", "2024-01-01"]), 2);
        assert_eq!(streak(["2024-02-28", "2024-02-29", "2024-03-01"]), 3);
        assert_eq!(streak(["2023-02-28", "2023-03-01"]), 2);
    }

    #[test]
    fn streak_counts_only_the_run_ending_at_latest_day() {
        assert_eq!(
            streak(["2024-03-01", "2024-03-02", "2024-03-05", "2024-03-06"]),
            2
        );
        assert_eq!(streak(["2024-03-09"]), 1);
        assert_eq!(streak(["2024-03-02", "2024-03-02", "2024-03-01"]), 2);
    }

    #[test]
    fn streak_skips_malformed_entries() {
        assert_eq!(streak(["2024-03-01", "garbage", "2024-03-02", "2024-3-3"]), 2);
    }

    #[test]
    fn monthly_count_and_percent() {
        let logs: Vec<String> = (1..=15).map(|day| format!("2024-06-{day:02}")).collect();
        assert_eq!(monthly_done_count(&logs, 2024, 6), 15);
        assert_eq!(monthly_percent(&logs, 2024, 6, 30), 50);
        assert_eq!(monthly_done_count(&logs, 2024, 7), 0);
        assert_eq!(monthly_percent(&logs, 2024, 6, 0), 0);
    }

    #[test]
    fn monthly_percent_rounds_half_up() {
        // 1 / 8 = 12.5%
        assert_eq!(monthly_percent(["2024-06-01"], 2024, 6, 8), 13);
        // 1 / 3 = 33.3%
        assert_eq!(monthly_percent(["2024-06-01"], 2024, 6, 3), 33);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn parse_log_date_rejects_impossible_dates() {
        assert!(parse_log_date("2024-02-29").is_some());
        assert!(parse_log_date("2023-02-29").is_none());
        assert!(parse_log_date("2024-13-01").is_none());
        assert!(parse_log_date("٢٠٢٤-٠١-٠١").is_none());
    }

    #[test]
    fn aggregate_percent_over_all_habits() {
        let habits = vec![
            habit_with_logs("a", &["2024-04-01", "2024-04-02", "2024-04-03"]),
            habit_with_logs("b", &["2024-04-01", "2024-03-31"]),
        ];
        // 4 done of 2 * 30 cells = 6.67%
        assert_eq!(aggregate_percent(&habits, 2024, 4, 30), 7);
        assert_eq!(aggregate_percent(&[], 2024, 4, 30), 0);
    }

    #[test]
    fn progress_for_month() {
        let habit = habit_with_logs("a", &["2024-02-28", "2024-02-29", "2024-03-01"]);
        let progress = HabitProgress::for_month(&habit, 2024, 2);
        assert_eq!(progress.done, 2);
        assert_eq!(progress.days_in_month, 29);
        assert_eq!(progress.percent, 7);
        assert_eq!(progress.streak, 3);
    }

    #[test]
    fn summary_picks_first_top_habit_and_best_streak() {
        let habits = vec![
            habit_with_logs("Read", &["2024-05-01", "2024-05-02"]),
            habit_with_logs("Run", &["2024-05-10", "2024-05-20"]),
            habit_with_logs("Swim", &["2024-04-28", "2024-04-29", "2024-04-30"]),
        ];
        let summary = summarize_month(&habits, 2024, 5);
        assert_eq!(summary.total_habits, 3);
        assert_eq!(summary.days_in_month, 31);
        assert_eq!(summary.top_habit.title, "Read");
        assert_eq!(summary.top_habit.done, 2);
        assert_eq!(summary.best_streak, 3);
        // 4 of 93 cells
        assert_eq!(summary.completion_percent, 4);
    }

    #[test]
    fn summary_of_nothing_done() {
        let summary = summarize_month(&[], 2024, 5);
        assert_eq!(summary.total_habits, 0);
        assert_eq!(summary.completion_percent, 0);
        assert_eq!(summary.best_streak, 0);
        assert_eq!(summary.top_habit.title, "-");
        assert_eq!(summary.top_habit.done, 0);
    }
}
