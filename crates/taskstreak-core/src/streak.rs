use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::date::DateKey;

/// Completions recorded per calendar day.
pub type DailyCompletions = BTreeMap<DateKey, u32>;

/// Derived streak metrics plus the raw history they are computed from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current: u32,
    /// Never decreases over the lifetime of a state.
    pub best: u32,
    /// Every day that ever had a completion, ascending.
    pub history_dates: BTreeSet<DateKey>,
    pub last_date: Option<DateKey>,
    pub daily_completions: DailyCompletions,
}

/// Raw inputs for [`derive_streak`]. `current` is never an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakDraft {
    pub daily_completions: DailyCompletions,
    pub history_dates: Vec<DateKey>,
    pub best: u32,
}

impl From<&StreakState> for StreakDraft {
    fn from(state: &StreakState) -> Self {
        Self {
            daily_completions: state.daily_completions.clone(),
            history_dates: state.history_dates.iter().copied().collect(),
            best: state.best,
        }
    }
}

impl StreakState {
    /// Recompute against `today` without adding any history.
    pub fn refreshed(&self, today: DateKey) -> StreakState {
        derive_streak(StreakDraft::from(self), today)
    }

    pub fn completions_on(&self, day: DateKey) -> u32 {
        self.daily_completions.get(&day).copied().unwrap_or(0)
    }
}

/// Rebuild the full streak state from history.
///
/// History is the union of the draft's seed dates and every day with a positive
/// count. `best` is the larger of the supplied value and the longest run found.
pub fn derive_streak(draft: StreakDraft, today: DateKey) -> StreakState {
    let daily_completions = normalize_daily_completions(draft.daily_completions);
    let history: BTreeSet<DateKey> = draft
        .history_dates
        .into_iter()
        .chain(daily_completions.keys().copied())
        .collect();
    let sorted: Vec<DateKey> = history.iter().copied().collect();

    StreakState {
        current: current_streak(&sorted, today),
        best: draft.best.max(best_streak(&sorted)),
        last_date: sorted.last().copied(),
        history_dates: history,
        daily_completions,
    }
}

/// Drop days whose count is zero.
pub fn normalize_daily_completions(daily: DailyCompletions) -> DailyCompletions {
    daily.into_iter().filter(|(_, count)| *count > 0).collect()
}

/// Longest run of consecutive days in an ascending, deduplicated slice.
pub fn best_streak(history: &[DateKey]) -> u32 {
    if history.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut run = 1;
    for pair in history.windows(2) {
        if pair[0].days_until(pair[1]) == 1 {
            run += 1;
        } else {
            run = 1;
        }
        best = best.max(run);
    }
    best
}

/// Length of the run ending at the latest day, or 0 once a full day has been missed.
pub fn current_streak(history: &[DateKey], today: DateKey) -> u32 {
    let Some(last) = history.last() else {
        return 0;
    };
    if last.days_until(today) > 1 {
        return 0;
    }
    let mut run = 1;
    for pair in history.windows(2).rev() {
        if pair[0].days_until(pair[1]) == 1 {
            run += 1;
        } else {
            break;
        }
    }
    run
}

pub fn increment_daily_completions(mut daily: DailyCompletions, day: DateKey) -> DailyCompletions {
    let slot = daily.entry(day).or_insert(0);
    *slot = slot.saturating_add(1);
    daily
}

/// Total completions over the `days` calendar days ending with `today`.
pub fn completions_for_last_days(daily: &DailyCompletions, days: u32, today: DateKey) -> u64 {
    (0..i64::from(days))
        .map(|offset| today.add_days(-offset))
        .map(|day| u64::from(daily.get(&day).copied().unwrap_or(0)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).expect("valid key")
    }

    fn keys(items: &[&str]) -> Vec<DateKey> {
        items.iter().map(|s| key(s)).collect()
    }

    fn draft(history: &[&str], best: u32) -> StreakDraft {
        StreakDraft {
            daily_completions: DailyCompletions::new(),
            history_dates: keys(history),
            best,
        }
    }

    #[test]
    fn empty_history_has_no_streak() {
        let streak = derive_streak(StreakDraft::default(), key("2024-01-03"));
        assert_eq!(streak, StreakState::default());
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let streak = derive_streak(
            draft(&["2024-01-01", "2024-01-02", "2024-01-03"], 0),
            key("2024-01-03"),
        );
        assert_eq!(streak.current, 3);
        assert!(streak.best >= 3);
        assert_eq!(streak.last_date, Some(key("2024-01-03")));
    }

    #[test]
    fn gap_breaks_continuity() {
        let streak = derive_streak(draft(&["2024-01-01", "2024-01-03"], 0), key("2024-01-03"));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.best, 1);
    }

    #[test]
    fn streak_survives_until_end_of_next_day() {
        let history = keys(&["2024-01-01", "2024-01-02"]);
        assert_eq!(current_streak(&history, key("2024-01-03")), 2);
        assert_eq!(current_streak(&history, key("2024-01-04")), 0);
    }

    #[test]
    fn two_days_without_completion_resets_current() {
        let history = keys(&["2023-12-20", "2023-12-21", "2023-12-22", "2023-12-23", "2024-01-01"]);
        let streak = derive_streak(
            StreakDraft {
                history_dates: history,
                ..StreakDraft::default()
            },
            key("2024-01-03"),
        );
        assert_eq!(streak.current, 0);
        assert_eq!(streak.best, 4);
    }

    #[test]
    fn supplied_best_is_never_lowered() {
        let streak = derive_streak(draft(&["2024-01-01"], 9), key("2024-01-01"));
        assert_eq!(streak.best, 9);
        assert_eq!(streak.current, 1);
    }

    #[test]
    fn history_merges_seed_dates_and_positive_counts() {
        let mut daily = DailyCompletions::new();
        daily.insert(key("2024-01-02"), 3);
        daily.insert(key("2024-01-05"), 0);
        let streak = derive_streak(
            StreakDraft {
                daily_completions: daily,
                history_dates: keys(&["2024-01-03", "2024-01-01", "2024-01-03"]),
                best: 0,
            },
            key("2024-01-03"),
        );
        assert_eq!(
            streak.history_dates.into_iter().collect::<Vec<_>>(),
            keys(&["2024-01-01", "2024-01-02", "2024-01-03"])
        );
        assert!(!streak.daily_completions.contains_key(&key("2024-01-05")));
        assert_eq!(streak.current, 3);
    }

    #[test]
    fn many_completions_in_one_day_count_once() {
        let daily = [(key("2024-01-01"), 1), (key("2024-01-02"), 12)]
            .into_iter()
            .collect();
        let streak = derive_streak(
            StreakDraft {
                daily_completions: daily,
                ..StreakDraft::default()
            },
            key("2024-01-02"),
        );
        assert_eq!(streak.current, 2);
        assert_eq!(streak.completions_on(key("2024-01-02")), 12);
    }

    #[test]
    fn best_scans_the_longest_run() {
        let history = keys(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-04",
            "2024-01-05",
            "2024-01-06",
            "2024-01-08",
        ]);
        assert_eq!(best_streak(&history), 3);
        assert_eq!(best_streak(&[]), 0);
    }

    #[test]
    fn sums_completions_over_a_window() {
        let today = key("2024-01-10");
        let mut daily = DailyCompletions::new();
        daily = increment_daily_completions(daily, today);
        daily = increment_daily_completions(daily, today);
        daily = increment_daily_completions(daily, key("2024-01-04"));
        daily = increment_daily_completions(daily, key("2024-01-03"));
        assert_eq!(completions_for_last_days(&daily, 7, today), 3);
        assert_eq!(completions_for_last_days(&daily, 1, today), 2);
        assert_eq!(completions_for_last_days(&daily, 0, today), 0);
    }
}
