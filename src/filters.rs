use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Task;

// Every filter keeps the source order and never deduplicates.

pub fn today(tasks: &[Task], reference: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.date == reference)
        .cloned()
        .collect()
}

pub fn recurring(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.is_recurring())
        .cloned()
        .collect()
}

pub fn missed(tasks: &[Task], reference: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.is_missed(reference))
        .cloned()
        .collect()
}

/// Share of completed tasks as a whole percentage; an empty list is 0%.
pub fn progress_percent(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|task| task.completed).count();
    ((completed as f64 / tasks.len() as f64) * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Today,
    Recurring,
    Missed,
}

impl View {
    pub fn apply(&self, tasks: &[Task], reference: NaiveDate) -> Vec<Task> {
        match self {
            View::Today => today(tasks, reference),
            View::Recurring => recurring(tasks),
            View::Missed => missed(tasks, reference),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Today => "Today's Tasks",
            View::Recurring => "Recurring Tasks",
            View::Missed => "Missed Tasks",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view {0:?} (expected today, recurring or missed)")]
pub struct ParseViewError(String);

impl FromStr for View {
    type Err = ParseViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(View::Today),
            "recurring" => Ok(View::Recurring),
            "missed" => Ok(View::Missed),
            _ => Err(ParseViewError(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recurrence;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task(id: &str, date: NaiveDate, completed: bool, recurring: Recurrence) -> Task {
        Task {
            id: id.to_string(),
            text: format!("task-{id}"),
            completed,
            date,
            recurring,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            make_task("a", day(2024, 3, 1), false, Recurrence::None),
            make_task("b", day(2024, 3, 2), true, Recurrence::Daily),
            make_task("c", day(2024, 3, 1), true, Recurrence::None),
            make_task("d", day(2024, 2, 29), false, Recurrence::Yearly),
            make_task("e", day(2024, 3, 2), false, Recurrence::None),
            make_task("f", day(2024, 3, 2), false, Recurrence::None),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn today_keeps_only_reference_day_in_source_order() {
        let tasks = sample();
        assert_eq!(ids(&today(&tasks, day(2024, 3, 2))), vec!["b", "e", "f"]);
        assert_eq!(ids(&today(&tasks, day(2024, 3, 1))), vec!["a", "c"]);
        assert!(today(&tasks, day(2025, 1, 1)).is_empty());
    }

    #[test]
    fn today_and_other_days_partition_the_list() {
        let tasks = sample();
        for reference in [day(2024, 3, 1), day(2024, 3, 2), day(2024, 2, 29), day(2030, 1, 1)] {
            let matching = today(&tasks, reference);
            let others: Vec<Task> = tasks.iter().filter(|t| t.date != reference).cloned().collect();
            assert_eq!(matching.len() + others.len(), tasks.len());
            for task in &tasks {
                let hits = matching.iter().filter(|t| *t == task).count()
                    + others.iter().filter(|t| *t == task).count();
                assert_eq!(hits, 1, "task {} must appear exactly once", task.id);
            }
        }
    }

    #[test]
    fn recurring_keeps_any_label_but_none() {
        assert_eq!(ids(&recurring(&sample())), vec!["b", "d"]);
    }

    #[test]
    fn missed_keeps_open_tasks_before_reference() {
        let tasks = sample();
        assert_eq!(ids(&missed(&tasks, day(2024, 3, 2))), vec!["a", "d"]);
        assert_eq!(ids(&missed(&tasks, day(2024, 3, 3))), vec!["a", "d", "e", "f"]);
        assert!(missed(&tasks, day(2024, 2, 29)).is_empty());
    }

    #[test]
    fn missed_excludes_completed_task_from_yesterday() {
        let reference = day(2024, 3, 2);
        let tasks = vec![
            make_task("open", day(2024, 3, 1), false, Recurrence::None),
            make_task("done", day(2024, 3, 1), true, Recurrence::None),
        ];
        assert_eq!(ids(&missed(&tasks, reference)), vec!["open"]);
    }

    #[test]
    fn filters_keep_duplicates() {
        let task = make_task("a", day(2024, 3, 1), false, Recurrence::Daily);
        let tasks = vec![task.clone(), task];
        assert_eq!(today(&tasks, day(2024, 3, 1)).len(), 2);
        assert_eq!(recurring(&tasks).len(), 2);
    }

    #[test]
    fn progress_percent_rounds_and_handles_empty() {
        assert_eq!(progress_percent(&[]), 0);
        let tasks = sample();
        // 2 of 6 completed.
        assert_eq!(progress_percent(&tasks), 33);
        let day_two = today(&tasks, day(2024, 3, 2));
        assert_eq!(progress_percent(&day_two), 33);
        let day_one = today(&tasks, day(2024, 3, 1));
        assert_eq!(progress_percent(&day_one), 50);
        let mut all_done = tasks.clone();
        all_done.iter_mut().for_each(|t| t.completed = true);
        assert_eq!(progress_percent(&all_done), 100);
        let two_thirds = vec![
            make_task("x", day(2024, 3, 1), true, Recurrence::None),
            make_task("y", day(2024, 3, 1), true, Recurrence::None),
            make_task("z", day(2024, 3, 1), false, Recurrence::None),
        ];
        assert_eq!(progress_percent(&two_thirds), 67);
    }

    #[test]
    fn view_dispatches_and_parses() {
        let tasks = sample();
        let reference = day(2024, 3, 2);
        assert_eq!(View::Today.apply(&tasks, reference), today(&tasks, reference));
        assert_eq!(View::Recurring.apply(&tasks, reference), recurring(&tasks));
        assert_eq!(View::Missed.apply(&tasks, reference), missed(&tasks, reference));
        assert_eq!("Missed".parse::<View>().unwrap(), View::Missed);
        assert!("later".parse::<View>().is_err());
    }
}
