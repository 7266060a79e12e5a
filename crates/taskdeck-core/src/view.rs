use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use deunicode::deunicode;
use serde::{Deserialize, Serialize};

use crate::task::{Status, Task};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => task.status == Status::Pending,
            Self::Completed => task.status == Status::Completed,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(anyhow!("invalid filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Created,
    Priority,
    Alphabetical,
}

impl SortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Priority => "priority",
            Self::Alphabetical => "alphabetical",
        }
    }

    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            // Equal timestamps fall back to the id, which tracks insertion.
            Self::Created => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
            Self::Priority => b.priority.severity().cmp(&a.priority.severity()),
            Self::Alphabetical => compare_titles(&a.title, &b.title).then_with(|| a.id.cmp(&b.id)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "date" => Ok(Self::Created),
            "priority" | "pri" => Ok(Self::Priority),
            "alphabetical" | "alpha" | "title" => Ok(Self::Alphabetical),
            other => Err(anyhow!("invalid sort option: {other}")),
        }
    }
}

/// Title comparison that ignores case and diacritics first, then falls back
/// to the lowercased and exact text so the ordering stays total.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    sort_key(a)
        .cmp(&sort_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

fn sort_key(title: &str) -> String {
    deunicode(title).to_lowercase()
}

/// Filters then sorts `tasks` without touching the source slice.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn select(tasks: &[Task], filter: Filter, sort: SortKey) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect();

    // `sort_by` is stable, which the priority ordering relies on for ties.
    out.sort_by(|a, b| sort.compare(a, b));

    tracing::debug!(selected = out.len(), "computed view");
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{Filter, SortKey, compare_titles, select};
    use crate::task::{Priority, Status, Task, TaskId};

    fn fixture() -> Vec<Task> {
        let base = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let mut tasks = vec![
            Task::new_pending(TaskId::new(1), "banana bread".to_string(), Priority::Low, base),
            Task::new_pending(
                TaskId::new(2),
                "Apple pie".to_string(),
                Priority::High,
                base + Duration::minutes(1),
            ),
            Task::new_pending(
                TaskId::new(3),
                "cherry jam".to_string(),
                Priority::Medium,
                base + Duration::minutes(2),
            ),
            Task::new_pending(
                TaskId::new(4),
                "apricot tart".to_string(),
                Priority::High,
                base + Duration::minutes(3),
            ),
        ];
        tasks[2].status = Status::Completed;
        tasks
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id.value()).collect()
    }

    #[rstest]
    #[case(Filter::All, vec![4, 3, 2, 1])]
    #[case(Filter::Pending, vec![4, 2, 1])]
    #[case(Filter::Completed, vec![3])]
    fn filters_by_status(#[case] filter: Filter, #[case] expected: Vec<u64>) {
        let tasks = fixture();
        assert_eq!(ids(&select(&tasks, filter, SortKey::Created)), expected);
    }

    #[test]
    fn priority_sort_is_stable_for_ties() {
        let tasks = fixture();
        let view = select(&tasks, Filter::All, SortKey::Priority);
        assert_eq!(ids(&view), vec![2, 4, 3, 1]);
    }

    #[test]
    fn alphabetical_sort_ignores_case() {
        let tasks = fixture();
        let view = select(&tasks, Filter::All, SortKey::Alphabetical);
        assert_eq!(ids(&view), vec![2, 4, 1, 3]);
    }

    #[test]
    fn created_sort_breaks_timestamp_ties_by_id() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let tasks = vec![
            Task::new_pending(TaskId::new(1), "first".to_string(), Priority::Medium, now),
            Task::new_pending(TaskId::new(2), "second".to_string(), Priority::Medium, now),
        ];
        assert_eq!(ids(&select(&tasks, Filter::All, SortKey::Created)), vec![2, 1]);
    }

    #[test]
    fn select_leaves_source_untouched() {
        let tasks = fixture();
        let before = tasks.clone();
        let _ = select(&tasks, Filter::Pending, SortKey::Alphabetical);
        assert_eq!(tasks, before);
    }

    #[test]
    fn alphabetical_sort_folds_accents() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let tasks = vec![
            Task::new_pending(TaskId::new(1), "Zebra crossing".to_string(), Priority::Medium, now),
            Task::new_pending(TaskId::new(2), "Éclair recipe".to_string(), Priority::Medium, now),
            Task::new_pending(TaskId::new(3), "banana bread".to_string(), Priority::Medium, now),
            Task::new_pending(TaskId::new(4), "eclair tray".to_string(), Priority::Medium, now),
        ];

        let view = select(&tasks, Filter::All, SortKey::Alphabetical);
        assert_eq!(ids(&view), vec![3, 2, 4, 1]);
    }

    #[test]
    fn accented_and_plain_spellings_still_order_deterministically() {
        assert!(compare_titles("éclair", "eclair").is_gt());
        assert!(compare_titles("Éclair", "éclair").is_lt());
    }

    #[test]
    fn compare_titles_is_total() {
        assert_eq!(compare_titles("abc", "ABC"), "abc".cmp("ABC"));
        assert!(compare_titles("Zebra", "apple").is_gt());
    }

    #[rstest]
    #[case("all", Filter::All)]
    #[case(" Pending ", Filter::Pending)]
    #[case("done", Filter::Completed)]
    fn filter_parses(#[case] raw: &str, #[case] expected: Filter) {
        assert_eq!(raw.parse::<Filter>().unwrap(), expected);
    }

    #[test]
    fn sort_key_rejects_unknown_names() {
        assert!("random".parse::<SortKey>().is_err());
        assert_eq!("alpha".parse::<SortKey>().unwrap(), SortKey::Alphabetical);
    }
}
