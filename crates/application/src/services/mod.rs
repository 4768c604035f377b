//! External service traits and in-memory implementations used by handlers.

pub mod notification;

pub use notification::{InMemoryNotifier, Notification, Notifier, NotifyError};
