//! Task persistence and aggregation for DayByDay.
//!
//! The [`store`] module owns the durable task collection, [`filters`] derives
//! the today / recurring / missed views, and [`stats`] turns the collection
//! into per-day completion counts for the calendar heat-map. A presentation
//! layer drives all of it through [`commands::Commands`].

pub mod clock;
pub mod commands;
pub mod config;
pub mod filters;
pub mod logging;
pub mod models;
pub mod preferences;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;

pub use commands::{CommandResult, Commands};
pub use filters::View;
pub use models::{Recurrence, Task, TaskId};
pub use state::AppState;
pub use stats::{build_month, CalendarDay, DayStats, MonthCalendar, YearMonth};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
pub use store::{StoreError, TaskStore};
