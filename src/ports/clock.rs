//! Clock port for stamping file modification times.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// The file store stamps `last_modified` through this port so tests can pin
/// modification times with a fixed clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
