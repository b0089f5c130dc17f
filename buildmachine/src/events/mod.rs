//! Step lifecycle events.
//!
//! Steps report what they are doing to an [`EventSink`] in addition to
//! logging it. The reporting layer can subscribe by supplying its own sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use std::sync::Arc;

/// Returns the sink used when none is configured.
#[must_use]
pub fn default_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpEventSink)
}
