//! Event dispatch: transition tracking, callback delivery, deferred commands

pub mod commands;
pub mod dispatcher;
pub mod events;

pub use commands::Commands;
pub use dispatcher::Dispatcher;
pub use events::{
    CallbackRegistry, Cleanup, EventFn, GroupEvent, GroupEventFn, ObserveFn, ObserveGroupFn,
    ZoneEvent,
};
