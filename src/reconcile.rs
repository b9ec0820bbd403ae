//! Minimal diff between the overlay and the snapshot: exactly the entries
//! that must be persisted, nothing else.

use chrono::NaiveDate;

use crate::status::AttendanceStatus;
use crate::store::{OverlayStore, RemoteSnapshot};

/// Dates whose overlay status differs from the snapshot, ascending by date.
pub type ChangeSet = Vec<(NaiveDate, AttendanceStatus)>;

/// Pure and idempotent. A key appears iff the overlay holds a concrete
/// status for it that differs from the snapshot's; unmarked days never
/// appear (the overlay deletes them on write).
pub fn diff(overlay: &OverlayStore, snapshot: &RemoteSnapshot) -> ChangeSet {
    overlay
        .iter()
        .filter(|(date, status)| snapshot.get(*date) != Some(*status))
        .collect()
}
