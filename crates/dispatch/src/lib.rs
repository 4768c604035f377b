//! Domain event delivery.
//!
//! Events raised by an aggregate are held in its pending buffer until the
//! aggregate has been saved. The caller then drains them with [`collect`] and
//! hands them to an [`EventDispatcher`], which delivers each one to the
//! handlers registered for its event type:
//! - [`EventHandler`] trait for independent reactions to events
//! - [`EventDispatcher`] with an explicit registration table
//! - [`DispatchReport`] listing delivery failures, which never reach the
//!   command caller

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;

pub use dispatcher::{DispatchConfig, DispatchReport, EventDispatcher, HandlerFailure, collect};
pub use error::{HandlerError, Result};
pub use handler::EventHandler;
pub use handlers::{LoggingHandler, RecordingHandler};
