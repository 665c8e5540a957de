//! Timestamp utilities

use chrono::{DateTime, SubsecRound, Utc};

/// Get current UTC timestamp, truncated to millisecond precision
///
/// Stored timestamps round-trip through SQLite text columns, so values are
/// kept at the precision the database keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
