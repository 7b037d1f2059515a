//! # SubsTrack Scheduler
//!
//! Subscription lifecycle evaluation and notification fan-out.
//!
//! ## Design Principles
//! - One list read and one list write per tick, no locks
//! - Per-subscription work produces in-memory updates only
//! - Failures become values (`Decision`, `ChannelResult`), never tick aborts
//! - File-based persistence (JSON), tokio timers only
//!
//! ## Architecture
//! ```text
//! TickRunner (tokio interval)
//!   ├── ConfigProvider::get_config
//!   ├── SubscriptionStore::get_all
//!   ├── SubscriptionEvaluator::evaluate  (one task per subscription)
//!   │     ├── auto-renewal catch-up (add_period)
//!   │     ├── reminder window + ONCE/DAILY suppression
//!   │     └── NotifyRouter::dispatch
//!   │           ├── telegram
//!   │           ├── email
//!   │           ├── webhook
//!   │           └── bark
//!   └── write-back: get_all → merge by id → put_all (once)
//! ```

pub mod calendar;
pub mod engine;
pub mod notify;
pub mod period;
pub mod runner;
pub mod store;

#[cfg(test)]
mod test_support;

pub use calendar::CalendarZone;
pub use engine::{Decision, ReminderAction, ReminderEngine, SubscriptionEvaluator};
pub use notify::NotifyRouter;
pub use period::add_period;
pub use runner::{RunStatistics, TickRunner};
pub use store::{JsonFileStore, MemoryStore};
