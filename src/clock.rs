use chrono::{Datelike, NaiveDate};

use crate::month::VisibleMonth;

/// Source of "today". Injected so editing-window checks stay deterministic
/// under test instead of reading the wall clock inline.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date. Used by tests and fixture seeding.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// A day accepts edits only inside the window [enrollment start, today].
/// Attendance is never recorded ahead of time, and never before the student
/// joined the course.
pub fn is_editable(date: NaiveDate, enrollment_start: Option<NaiveDate>, today: NaiveDate) -> bool {
    if date > today {
        return false;
    }
    if let Some(start) = enrollment_start {
        if date < start {
            return false;
        }
    }
    true
}

/// Backward navigation stops at the enrollment month.
pub fn can_go_prev(visible: VisibleMonth, enrollment_start: Option<NaiveDate>) -> bool {
    let Some(start) = enrollment_start else {
        return true;
    };
    let prev = visible.prev();
    (prev.year, prev.month) >= (start.year(), start.month())
}

/// Forward navigation stops at the current month.
pub fn can_go_next(visible: VisibleMonth, today: NaiveDate) -> bool {
    let next = visible.next();
    (next.year, next.month) <= (today.year(), today.month())
}
