//! Core of TaskStreak: calendar-day keys, streak derivation, the task model and the
//! reducer that moves application state from one snapshot to the next.
//! Nothing in here performs I/O apart from the storage contract definitions.

pub mod clock;
pub mod date;
pub mod query;
pub mod reducer;
pub mod storage;
pub mod streak;
pub mod tasks;
