use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::filters::{progress_percent, View};
use crate::models::{Recurrence, Task};
use crate::preferences::{PreferenceStore, Preferences, ThemeMode};
use crate::state::AppState;
use crate::stats::{build_month, MonthCalendar, YearMonth};
use crate::storage::KeyValueStore;
use crate::store::{StoreError, TaskStore};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(self.error.unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn storage_err<T>(operation: &str, error: &StoreError) -> CommandResult<T> {
    log::warn!("{operation} failed: {error}");
    err(&format!("storage error: {error}"))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatePayload {
    pub tasks: Vec<Task>,
    pub theme: ThemeMode,
    pub is_dark: bool,
}

/// The read/write surface the presentation layer drives.
///
/// Mutations go through the task store and are followed by a reload of the
/// shared snapshot. Views and calendars are computed from that snapshot, so a
/// screen calls [`Commands::refresh`] when it becomes visible and reads from
/// there.
pub struct Commands<S> {
    tasks: TaskStore<S>,
    preferences: PreferenceStore<S>,
    state: AppState,
    clock: Arc<dyn Clock>,
    app_version: String,
}

impl<S: KeyValueStore + Clone> Commands<S> {
    pub fn new(storage: S, state: AppState, app_version: impl Into<String>) -> Self {
        Self::with_clock(storage, state, Arc::new(SystemClock), app_version)
    }

    pub fn with_clock(
        storage: S,
        state: AppState,
        clock: Arc<dyn Clock>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            tasks: TaskStore::with_clock(storage.clone(), clock.clone()),
            preferences: PreferenceStore::new(storage),
            state,
            clock,
            app_version: app_version.into(),
        }
    }
}

impl<S: KeyValueStore> Commands<S> {
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Reloads the full task list into the shared snapshot. On failure the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> CommandResult<Vec<Task>> {
        match self.tasks.load_all().await {
            Ok(tasks) => {
                self.state.replace_tasks(tasks.clone());
                ok(tasks)
            }
            Err(error) => storage_err("refresh", &error),
        }
    }

    async fn reload_after_write(&self) {
        match self.tasks.load_all().await {
            Ok(tasks) => self.state.replace_tasks(tasks),
            Err(error) => {
                log::warn!("reload after write failed, keeping previous snapshot: {error}")
            }
        }
    }

    pub async fn create_task(&self, text: &str, recurring: Recurrence) -> CommandResult<Task> {
        match self.tasks.create(text, recurring).await {
            Ok(Some(task)) => {
                self.reload_after_write().await;
                ok(task)
            }
            Ok(None) => err("task text is empty"),
            Err(error) => storage_err("create_task", &error),
        }
    }

    /// Flips completion. `data` tells whether a task with `id` existed.
    pub async fn toggle_task(&self, id: &str) -> CommandResult<bool> {
        match self.tasks.toggle_complete(id).await {
            Ok(toggled) => {
                if toggled.is_some() {
                    self.reload_after_write().await;
                }
                ok(toggled.is_some())
            }
            Err(error) => storage_err("toggle_task", &error),
        }
    }

    pub async fn delete_task(&self, id: &str) -> CommandResult<bool> {
        match self.tasks.delete(id).await {
            Ok(removed) => {
                if removed {
                    self.reload_after_write().await;
                }
                ok(removed)
            }
            Err(error) => storage_err("delete_task", &error),
        }
    }

    pub fn view(&self, view: View) -> Vec<Task> {
        view.apply(&self.state.tasks(), self.today())
    }

    /// Completion percentage of today's tasks.
    pub fn daily_progress(&self) -> u8 {
        progress_percent(&self.view(View::Today))
    }

    pub fn month(&self, month: YearMonth) -> MonthCalendar {
        build_month(&self.state.tasks(), month)
    }

    pub fn current_month(&self) -> MonthCalendar {
        self.month(YearMonth::containing(self.today()))
    }

    pub fn state_payload(&self) -> StatePayload {
        StatePayload {
            tasks: self.state.tasks(),
            theme: self.state.theme(),
            is_dark: self.state.is_dark(),
        }
    }

    /// Loads stored preferences and applies the theme to the shared state.
    pub async fn load_preferences(&self) -> CommandResult<Preferences> {
        match self.preferences.load().await {
            Ok(prefs) => {
                self.state.set_theme(prefs.theme);
                ok(prefs)
            }
            Err(error) => storage_err("load_preferences", &error),
        }
    }

    pub async fn set_theme(&self, theme: ThemeMode) -> CommandResult<ThemeMode> {
        if let Err(error) = self.preferences.save_theme(theme).await {
            return storage_err("set_theme", &error);
        }
        self.state.set_theme(theme);
        ok(theme)
    }

    /// Startup pass for a host. Applies the stored theme and records onboarding
    /// for this version; returns whether the welcome should be shown. Preference
    /// failures are logged and defaults used, so task commands stay available.
    pub async fn begin_session(&self) -> bool {
        let prefs = self.preferences.load_or_default().await;
        self.state.set_theme(prefs.theme);
        if !prefs.onboarding_required(&self.app_version) {
            return false;
        }
        if let Err(error) = self.preferences.complete_onboarding(&self.app_version).await {
            log::warn!("recording onboarding failed: {error}");
        }
        true
    }

    pub async fn onboarding_required(&self) -> CommandResult<bool> {
        match self.preferences.load().await {
            Ok(prefs) => ok(prefs.onboarding_required(&self.app_version)),
            Err(error) => storage_err("onboarding_required", &error),
        }
    }

    pub async fn complete_onboarding(&self) -> CommandResult<bool> {
        match self.preferences.complete_onboarding(&self.app_version).await {
            Ok(()) => ok(true),
            Err(error) => storage_err("complete_onboarding", &error),
        }
    }
}
