//! Durable task collection.
//!
//! The whole collection lives under one storage key and is rewritten on every
//! mutation. Mutations queue on a FIFO lock so each read-modify-write finishes
//! before the next one reads; reads never wait.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::models::{Recurrence, Task, TaskId, TasksFile, SCHEMA_VERSION};
use crate::storage::{KeyValueStore, StorageError};

pub const TASKS_KEY: &str = "tasks";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    StorageRead(#[source] StorageError),
    #[error("storage write failed: {0}")]
    StorageWrite(#[source] StorageError),
    #[error("corrupt data: {0}")]
    CorruptData(String),
}

/// Decodes a stored collection. Schema 0 is the bare array written before the
/// envelope existed; anything newer than [`SCHEMA_VERSION`] is refused.
pub fn decode_tasks(payload: &str) -> Result<Vec<Task>, StoreError> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(|err| {
        StoreError::CorruptData(format!("task collection is not json: {err}"))
    })?;

    // Decode the matching shape from the text so the error keeps its position.
    if value.is_array() {
        return serde_json::from_str::<Vec<Task>>(payload).map_err(|err| {
            StoreError::CorruptData(format!("legacy task list does not parse: {err}"))
        });
    }
    if !value.is_object() {
        return Err(StoreError::CorruptData(
            "task collection is neither a list nor an envelope".to_string(),
        ));
    }

    let file: TasksFile = serde_json::from_str(payload).map_err(|err| {
        StoreError::CorruptData(format!("task envelope does not parse: {err}"))
    })?;
    if file.schema_version > SCHEMA_VERSION {
        return Err(StoreError::CorruptData(format!(
            "unsupported schema version {} (newest known is {SCHEMA_VERSION})",
            file.schema_version
        )));
    }
    Ok(file.tasks)
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, StoreError> {
    serde_json::to_string(&TasksFile::current(tasks.to_vec()))
        .map_err(|err| StoreError::CorruptData(format!("task collection does not serialize: {err}")))
}

pub struct TaskStore<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    last_issued_id: AtomicI64,
    write_queue: Mutex<()>,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            last_issued_id: AtomicI64::new(0),
            write_queue: Mutex::new(()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        let payload = self
            .storage
            .get(TASKS_KEY)
            .await
            .map_err(StoreError::StorageRead)?;
        match payload {
            None => Ok(Vec::new()),
            Some(payload) => decode_tasks(&payload),
        }
    }

    /// Appends a new open task dated today. Blank text creates nothing.
    pub async fn create(&self, text: &str, recurring: Recurrence) -> Result<Option<Task>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("create skipped: blank text");
            return Ok(None);
        }

        let _turn = self.write_queue.lock().await;
        let mut tasks = self.load_all().await?;
        let task = Task::new(
            self.next_id(&tasks),
            text,
            self.clock.today(),
            recurring,
        );
        tasks.push(task.clone());
        self.save(&tasks).await?;
        log::debug!(
            "task created id={} date={} recurring={}",
            task.id,
            task.date,
            task.recurring
        );
        Ok(Some(task))
    }

    /// Flips `completed` on the task with `id` and returns the updated task.
    pub async fn toggle_complete(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let _turn = self.write_queue.lock().await;
        let mut tasks = self.load_all().await?;
        let toggled = match tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                task.clone()
            }
            None => {
                log::debug!("toggle skipped: no task id={id}");
                return Ok(None);
            }
        };
        self.save(&tasks).await?;
        log::debug!("task toggled id={} completed={}", toggled.id, toggled.completed);
        Ok(Some(toggled))
    }

    /// Removes the task with `id`. Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _turn = self.write_queue.lock().await;
        let mut tasks = self.load_all().await?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            log::debug!("delete skipped: no task id={id}");
            return Ok(false);
        }
        self.save(&tasks).await?;
        log::debug!("task deleted id={id}");
        Ok(true)
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let payload = encode_tasks(tasks)?;
        self.storage
            .set(TASKS_KEY, &payload)
            .await
            .map_err(StoreError::StorageWrite)
    }

    // Callers hold the write queue, so plain load/store on the counter is enough.
    fn next_id(&self, existing: &[Task]) -> TaskId {
        let mut candidate = self.clock.now_millis();
        let last = self.last_issued_id.load(Ordering::SeqCst);
        if candidate <= last {
            candidate = last + 1;
        }
        while existing.iter().any(|task| task.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last_issued_id.store(candidate, Ordering::SeqCst);
        candidate.to_string()
    }
}
