//! The attendance-editing state machine: one selected (student, course) pair,
//! the visible month's server snapshot, and the operator's unsaved overlay.
//!
//! Scope and month changes invalidate in-flight loads through an epoch
//! counter: a fetch result is applied only if nothing changed while it was in
//! flight, so a slow response for one course can never overwrite the grid
//! after the operator has moved on.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::backend::AcademicBackend;
use crate::clock::{self, Clock};
use crate::error::{Error, Result};
use crate::month::{grid_cells, GridCell, VisibleMonth};
use crate::reconcile;
use crate::status::{AttendanceStatus, DayState};
use crate::store::{effective_state, OverlayStore, RemoteSnapshot};
use crate::sync;

/// The (student, course, enrollment-start) triple that bounds what is loaded
/// and edited. Replacing it tears down both stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionScope {
    pub student_id: i64,
    pub course_id: i64,
    pub enrollment_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The cycle advanced; this is the new effective state of the day.
    Applied(DayState),
    /// The cell is outside the editing window; nothing changed.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { count: usize },
    /// Empty diff. `edits_attempted` distinguishes "toggled back to the
    /// original values" from "never touched the grid".
    NoChanges { edits_attempted: bool },
}

/// One slot of the render model the calendar paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub date: Option<NaiveDate>,
    pub state: DayState,
    pub editable: bool,
    pub dirty: bool,
    pub today: bool,
}

/// Per-status counts over the effective month, as shown next to the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthSummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
}

impl MonthSummary {
    pub fn total(&self) -> usize {
        self.present + self.absent + self.late + self.excused
    }

    /// Present and late both count toward presence.
    pub fn presence_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.present + self.late) as f64 / total as f64 * 100.0
    }
}

pub struct AttendanceSession {
    backend: Arc<dyn AcademicBackend>,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
    scope: SelectionScope,
    visible: VisibleMonth,
    snapshot: RemoteSnapshot,
    overlay: OverlayStore,
    load_epoch: u64,
    touched: bool,
    last_error: Option<String>,
}

impl AttendanceSession {
    /// Establish a selection and load the month containing today.
    pub async fn open(
        backend: Arc<dyn AcademicBackend>,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
        scope: SelectionScope,
    ) -> AttendanceSession {
        let visible = VisibleMonth::of(clock.today());
        let mut session = AttendanceSession {
            backend,
            clock,
            request_timeout,
            scope,
            visible,
            snapshot: RemoteSnapshot::new(),
            overlay: OverlayStore::new(),
            load_epoch: 0,
            touched: false,
            last_error: None,
        };
        session.reload().await;
        session
    }

    pub fn scope(&self) -> &SelectionScope {
        &self.scope
    }

    pub fn visible(&self) -> VisibleMonth {
        self.visible
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_edits(&self) -> usize {
        self.overlay.len()
    }

    pub fn effective(&self, date: NaiveDate) -> DayState {
        effective_state(&self.overlay, &self.snapshot, date)
    }

    pub fn overlay_status(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.overlay.get(date)
    }

    pub fn can_prev(&self) -> bool {
        clock::can_go_prev(self.visible, self.scope.enrollment_start)
    }

    pub fn can_next(&self) -> bool {
        clock::can_go_next(self.visible, self.clock.today())
    }

    /// Generation stamp for loads started now; pass back to
    /// [`apply_snapshot`](Self::apply_snapshot) /
    /// [`apply_load_error`](Self::apply_load_error).
    pub fn current_epoch(&self) -> u64 {
        self.load_epoch
    }

    /// Fetch and fold the visible month. Duplicate dates in the response
    /// collapse last-read-wins.
    pub async fn fetch_month(&self) -> Result<BTreeMap<NaiveDate, AttendanceStatus>> {
        let fut = self.backend.attendance_in_range(
            self.scope.student_id,
            self.scope.course_id,
            self.visible.first_day(),
            self.visible.last_day(),
        );
        let rows = match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(self.request_timeout.as_millis() as u64)),
        };
        let mut map = BTreeMap::new();
        for row in rows {
            map.insert(row.date, row.status);
        }
        Ok(map)
    }

    /// Returns false (and changes nothing) when the result is stale.
    pub fn apply_snapshot(
        &mut self,
        epoch: u64,
        map: BTreeMap<NaiveDate, AttendanceStatus>,
    ) -> bool {
        if epoch != self.load_epoch {
            debug!(epoch, current = self.load_epoch, "discarding stale snapshot");
            return false;
        }
        self.snapshot.replace(map);
        self.last_error = None;
        true
    }

    /// A failed load keeps the previous snapshot; the error stays readable
    /// until the next successful load.
    pub fn apply_load_error(&mut self, epoch: u64, err: &Error) -> bool {
        if epoch != self.load_epoch {
            debug!(epoch, current = self.load_epoch, "discarding stale load error");
            return false;
        }
        warn!(%err, "attendance load failed; keeping previous snapshot");
        self.last_error = Some(err.to_string());
        true
    }

    pub async fn reload(&mut self) {
        let epoch = self.load_epoch;
        match self.fetch_month().await {
            Ok(map) => {
                self.apply_snapshot(epoch, map);
            }
            Err(err) => {
                self.apply_load_error(epoch, &err);
            }
        }
    }

    fn invalidate(&mut self) {
        self.load_epoch += 1;
        self.overlay.clear();
        self.touched = false;
    }

    /// Guarded navigation; a blocked move returns false and changes nothing.
    /// An allowed move discards unsaved edits and reloads.
    pub async fn month_prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.visible = self.visible.prev();
        self.invalidate();
        self.reload().await;
        true
    }

    pub async fn month_next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.visible = self.visible.next();
        self.invalidate();
        self.reload().await;
        true
    }

    /// Advance the click cycle on an editable day. Clicks outside the
    /// editing window (or the visible month) are no-ops, not errors.
    pub fn click(&mut self, date: NaiveDate) -> ClickOutcome {
        if !self.visible.contains(date) {
            return ClickOutcome::Rejected;
        }
        if !clock::is_editable(date, self.scope.enrollment_start, self.clock.today()) {
            return ClickOutcome::Rejected;
        }
        let next = self.effective(date).cycle();
        self.overlay.set(date, next);
        self.touched = true;
        ClickOutcome::Applied(next)
    }

    /// Reconcile and submit. On success the submitted entries fold into the
    /// snapshot and leave the overlay; on failure the overlay is untouched
    /// so the operator can retry.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let changes = reconcile::diff(&self.overlay, &self.snapshot);
        if changes.is_empty() {
            return Ok(SaveOutcome::NoChanges {
                edits_attempted: self.touched,
            });
        }
        sync::submit(
            Arc::clone(&self.backend),
            &self.scope,
            &changes,
            self.request_timeout,
        )
        .await?;
        self.snapshot.fold(&changes);
        for (date, _) in &changes {
            self.overlay.remove(*date);
        }
        self.touched = false;
        Ok(SaveOutcome::Saved {
            count: changes.len(),
        })
    }

    pub fn cells(&self) -> Vec<CellView> {
        let today = self.clock.today();
        grid_cells(self.visible)
            .into_iter()
            .map(|cell| match cell {
                GridCell::Blank => CellView {
                    date: None,
                    state: DayState::Unmarked,
                    editable: false,
                    dirty: false,
                    today: false,
                },
                GridCell::Day(date) => CellView {
                    date: Some(date),
                    state: self.effective(date),
                    editable: clock::is_editable(date, self.scope.enrollment_start, today),
                    dirty: self.overlay.contains(date),
                    today: date == today,
                },
            })
            .collect()
    }

    pub fn summary(&self) -> MonthSummary {
        let mut summary = MonthSummary::default();
        for day in 1..=self.visible.days() {
            let date = NaiveDate::from_ymd_opt(self.visible.year, self.visible.month, day)
                .expect("day within month");
            match self.effective(date) {
                DayState::Marked(AttendanceStatus::Present) => summary.present += 1,
                DayState::Marked(AttendanceStatus::Absent) => summary.absent += 1,
                DayState::Marked(AttendanceStatus::Late) => summary.late += 1,
                DayState::Marked(AttendanceStatus::Excused) => summary.excused += 1,
                DayState::Unmarked => {}
            }
        }
        summary
    }
}
