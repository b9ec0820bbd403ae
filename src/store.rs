//! Keyed attendance state for the visible month: the last-fetched server
//! snapshot plus the operator's unsaved overlay. Both are keyed by calendar
//! date; one status at most per date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::status::{AttendanceStatus, DayState};

/// Last-known authoritative statuses for the visible month, replaced
/// wholesale on every load and folded into after a successful save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    map: BTreeMap<NaiveDate, AttendanceStatus>,
}

impl RemoteSnapshot {
    pub fn new() -> RemoteSnapshot {
        RemoteSnapshot::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.map.get(&date).copied()
    }

    pub fn replace(&mut self, map: BTreeMap<NaiveDate, AttendanceStatus>) {
        self.map = map;
    }

    /// Apply committed upserts without refetching.
    pub fn fold(&mut self, entries: &[(NaiveDate, AttendanceStatus)]) {
        for (date, status) in entries {
            self.map.insert(*date, *status);
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, AttendanceStatus)> + '_ {
        self.map.iter().map(|(d, s)| (*d, *s))
    }
}

/// Unsaved operator edits layered over the snapshot. Setting a day back to
/// unmarked deletes the entry: an untouched-back-to-unmarked day carries no
/// save obligation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayStore {
    map: BTreeMap<NaiveDate, AttendanceStatus>,
}

impl OverlayStore {
    pub fn new() -> OverlayStore {
        OverlayStore::default()
    }

    pub fn set(&mut self, date: NaiveDate, state: DayState) {
        match state {
            DayState::Unmarked => {
                self.map.remove(&date);
            }
            DayState::Marked(status) => {
                self.map.insert(date, status);
            }
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.map.get(&date).copied()
    }

    pub fn remove(&mut self, date: NaiveDate) {
        self.map.remove(&date);
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.map.contains_key(&date)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, AttendanceStatus)> + '_ {
        self.map.iter().map(|(d, s)| (*d, *s))
    }
}

/// What the calendar paints: overlay wins over snapshot, absence is unmarked.
pub fn effective_state(
    overlay: &OverlayStore,
    snapshot: &RemoteSnapshot,
    date: NaiveDate,
) -> DayState {
    match overlay.get(date).or_else(|| snapshot.get(date)) {
        Some(status) => DayState::Marked(status),
        None => DayState::Unmarked,
    }
}
