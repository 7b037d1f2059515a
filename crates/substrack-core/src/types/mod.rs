//! Domain types shared by the channel adapters and the scheduler.

pub mod notification;
pub mod subscription;

pub use notification::{ChannelResult, ChannelValidation, NotificationOptions, NotificationOutcome};
pub use subscription::{PeriodUnit, Subscription};
