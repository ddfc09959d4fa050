//! Domain events and the process-wide listener registry.
//!
//! Services announce what happened; listeners decide what to do about
//! it. Dispatch is best-effort: a failing listener is logged and never
//! fails the operation that fired the event.

pub mod event;
pub mod logging;
pub mod registry;

pub use event::TeamEvent;
pub use logging::LoggingListener;
pub use registry::{dispatch, register_event_listeners, Listener};
