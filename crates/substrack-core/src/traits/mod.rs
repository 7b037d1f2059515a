//! Trait seams between the lifecycle engine and its collaborators.

pub mod channel;
pub mod store;

pub use channel::NotifyChannel;
pub use store::{ConfigProvider, SubscriptionStore};
