//! Real-time push: who follows which question, and delivering updates to them.

mod dispatcher;
mod hub;
mod registry;

pub use dispatcher::{BroadcastDispatcher, UpdateNotifier};
#[cfg(test)]
pub use dispatcher::MockUpdateNotifier;
pub use hub::{events, ConnectionHub, DeliveryReport, PushChannel, PushMessage};
pub use registry::{GroupKey, SubscriptionRegistry};
