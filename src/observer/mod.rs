//! Observers: subscriptions, attachments, per-entity containment state

pub mod observer;

pub use observer::{Observer, ObserverConfig, ObserverId};
