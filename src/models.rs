use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub type TaskId = String;

pub const SCHEMA_VERSION: u32 = 1;

/// Recurrence label of a task. It classifies the task; it never spawns new records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub const LABELS: [Recurrence; 4] = [
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Yearly,
    ];

    pub fn is_none(&self) -> bool {
        matches!(self, Recurrence::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recurrence {0:?} (expected none, daily, weekly, monthly or yearly)")]
pub struct ParseRecurrenceError(String);

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" => Ok(Recurrence::Yearly),
            _ => Err(ParseRecurrenceError(value.to_string())),
        }
    }
}

// Older payloads either omit `recurring` or write `null` for a one-off task.
fn deserialize_recurrence<'de, D>(deserializer: D) -> Result<Recurrence, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Recurrence>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Recurrence::is_none",
        deserialize_with = "deserialize_recurrence"
    )]
    pub recurring: Recurrence,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>, date: NaiveDate, recurring: Recurrence) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            date,
            recurring,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !self.recurring.is_none()
    }

    /// An open task whose day has already passed.
    pub fn is_missed(&self, reference: NaiveDate) -> bool {
        !self.completed && self.date < reference
    }
}

/// The persisted envelope around the task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TasksFile {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

impl TasksFile {
    pub fn current(tasks: Vec<Task>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn task_serializes_date_as_iso_and_omits_none_recurrence() {
        let task = Task::new("1".to_string(), "Buy milk", day(2024, 3, 1), Recurrence::None);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["completed"], false);
        assert!(json.get("recurring").is_none());

        let weekly = Task::new("2".to_string(), "Laundry", day(2024, 3, 1), Recurrence::Weekly);
        let json = serde_json::to_value(&weekly).unwrap();
        assert_eq!(json["recurring"], "weekly");
    }

    #[test]
    fn task_deserializes_missing_and_null_recurrence_as_none() {
        let missing = r#"{"id":"1","text":"a","completed":false,"date":"2024-03-01"}"#;
        let task: Task = serde_json::from_str(missing).expect("task should deserialize");
        assert_eq!(task.recurring, Recurrence::None);

        let null = r#"{"id":"1","text":"a","completed":true,"date":"2024-03-01","recurring":null}"#;
        let task: Task = serde_json::from_str(null).expect("task should deserialize");
        assert_eq!(task.recurring, Recurrence::None);
        assert!(task.completed);

        let yearly = r#"{"id":"1","text":"a","completed":false,"date":"2024-03-01","recurring":"yearly"}"#;
        let task: Task = serde_json::from_str(yearly).expect("task should deserialize");
        assert_eq!(task.recurring, Recurrence::Yearly);
    }

    #[test]
    fn task_rejects_invalid_dates() {
        let json = r#"{"id":"1","text":"a","completed":false,"date":"2024-02-30"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
        let json = r#"{"id":"1","text":"a","completed":false,"date":"yesterday"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn recurrence_parses_case_insensitively() {
        assert_eq!("Daily".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert_eq!(" monthly ".parse::<Recurrence>().unwrap(), Recurrence::Monthly);
        assert_eq!("none".parse::<Recurrence>().unwrap(), Recurrence::None);
        assert!("fortnightly".parse::<Recurrence>().is_err());
        for label in Recurrence::LABELS {
            assert_eq!(label.as_str().parse::<Recurrence>().unwrap(), label);
        }
    }

    #[test]
    fn missed_requires_open_task_strictly_before_reference() {
        let mut task = Task::new("1".to_string(), "a", day(2024, 3, 1), Recurrence::None);
        assert!(task.is_missed(day(2024, 3, 2)));
        assert!(!task.is_missed(day(2024, 3, 1)));
        task.completed = true;
        assert!(!task.is_missed(day(2024, 3, 2)));
    }

    #[test]
    fn tasks_file_current_uses_schema_version() {
        let file = TasksFile::current(Vec::new());
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        let json = serde_json::to_string(&file).unwrap();
        assert_eq!(json, r#"{"schema_version":1,"tasks":[]}"#);
    }
}
