//! # SubsTrack Core
//! Core traits, types, and configuration shared by the channel adapters and
//! the subscription lifecycle scheduler.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use config::{NotificationConfig, ReminderMode};
pub use error::{Result, SubsTrackError};
pub use traits::{ConfigProvider, NotifyChannel, SubscriptionStore};
pub use types::{
    ChannelResult, ChannelValidation, NotificationOptions, NotificationOutcome, PeriodUnit,
    Subscription,
};
