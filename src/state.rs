use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Task;
use crate::preferences::ThemeMode;

/// Shared in-process view: the last successfully loaded tasks and the theme.
///
/// Created once at startup and handed to whatever needs it. Clones share the
/// same data. Writers replace whole values, so readers always see a
/// consistent snapshot, possibly a stale one after a failed refresh.
#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

#[derive(Debug, Default)]
struct AppData {
    tasks: Vec<Task>,
    theme: ThemeMode,
    system_prefers_dark: bool,
}

impl AppState {
    pub fn new(tasks: Vec<Task>, theme: ThemeMode, system_prefers_dark: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                tasks,
                theme,
                system_prefers_dark,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppData> {
        // Every write swaps a whole field, so a poisoned guard still holds consistent data.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn replace_tasks(&self, tasks: Vec<Task>) {
        self.lock().tasks = tasks;
    }

    pub fn theme(&self) -> ThemeMode {
        self.lock().theme
    }

    pub fn set_theme(&self, theme: ThemeMode) {
        self.lock().theme = theme;
    }

    pub fn set_system_prefers_dark(&self, prefers_dark: bool) {
        self.lock().system_prefers_dark = prefers_dark;
    }

    pub fn is_dark(&self) -> bool {
        let guard = self.lock();
        guard.theme.is_dark(guard.system_prefers_dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recurrence;
    use chrono::NaiveDate;

    fn make_task(id: &str) -> Task {
        Task::new(
            id.to_string(),
            format!("task-{id}"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Recurrence::None,
        )
    }

    #[test]
    fn clones_share_the_snapshot() {
        let state = AppState::default();
        let other = state.clone();
        assert!(other.tasks().is_empty());

        state.replace_tasks(vec![make_task("a"), make_task("b")]);
        let ids: Vec<String> = other.tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn theme_updates_are_visible_to_all_handles() {
        let state = AppState::new(Vec::new(), ThemeMode::System, true);
        let reader = state.clone();
        assert!(reader.is_dark());

        state.set_system_prefers_dark(false);
        assert!(!reader.is_dark());

        state.set_theme(ThemeMode::Dark);
        assert_eq!(reader.theme(), ThemeMode::Dark);
        assert!(reader.is_dark());

        state.set_theme(ThemeMode::Light);
        assert!(!reader.is_dark());
    }
}
