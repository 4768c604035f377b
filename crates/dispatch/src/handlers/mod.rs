//! General-purpose handlers.

pub mod logging;
pub mod recording;

pub use logging::LoggingHandler;
pub use recording::RecordingHandler;
