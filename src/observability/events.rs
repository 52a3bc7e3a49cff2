//! Observable codec and subscription events

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Codec
    /// Raw query rejected by the parser
    QueryRejected,
    /// Encoder emitted the sentinel tag for an unknown operator
    UnknownOperatorEmitted,
    /// Encoder met a function with no wire encoding
    UnsupportedFunction,

    // Batch
    /// A single batch item failed
    BatchItemFailed,

    // Subscriptions
    SubscriptionSaved,
    SubscriptionDeleted,
    /// Store failed a whole request
    StoreFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::UnknownOperatorEmitted => "UNKNOWN_OPERATOR_EMITTED",
            Event::UnsupportedFunction => "UNSUPPORTED_FUNCTION",
            Event::BatchItemFailed => "BATCH_ITEM_FAILED",
            Event::SubscriptionSaved => "SUBSCRIPTION_SAVED",
            Event::SubscriptionDeleted => "SUBSCRIPTION_DELETED",
            Event::StoreFailed => "STORE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::UnknownOperatorEmitted | Event::BatchItemFailed | Event::QueryRejected => {
                Severity::Warn
            }
            Event::StoreFailed => Severity::Error,
            Event::UnsupportedFunction => Severity::Fatal,
            Event::ConfigLoaded | Event::SubscriptionSaved | Event::SubscriptionDeleted => {
                Severity::Info
            }
        }
    }

    /// Returns true if this event indicates an internal invariant violation
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::UnsupportedFunction.as_str(), "UNSUPPORTED_FUNCTION");
        assert_eq!(Event::BatchItemFailed.to_string(), "BATCH_ITEM_FAILED");
    }

    #[test]
    fn test_only_unsupported_function_is_fatal() {
        assert!(Event::UnsupportedFunction.is_fatal());
        assert!(!Event::UnknownOperatorEmitted.is_fatal());
        assert!(!Event::BatchItemFailed.is_fatal());
        assert!(!Event::StoreFailed.is_fatal());
    }

    #[test]
    fn test_no_per_call_chatter() {
        // Successful encodes and parses log nothing; every event is INFO or louder
        let all = [
            Event::ConfigLoaded,
            Event::QueryRejected,
            Event::UnknownOperatorEmitted,
            Event::UnsupportedFunction,
            Event::BatchItemFailed,
            Event::SubscriptionSaved,
            Event::SubscriptionDeleted,
            Event::StoreFailed,
        ];
        assert!(all.iter().all(|e| e.severity() >= Severity::Info));
        assert_eq!(Event::StoreFailed.severity(), Severity::Error);
    }
}
