//! Observability for the codec and subscription handlers
//!
//! Structured JSON logging with typed events. Logging is read-only: it
//! never changes a codec result.
//!
//! ```ignore
//! use aerosub::observability::{Event, Logger};
//!
//! Logger::emit(Event::SubscriptionSaved, &[("id", "sub-1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
