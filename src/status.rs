use serde::{Deserialize, Serialize};

/// Persisted attendance statuses. A day with no record is `DayState::Unmarked`,
/// which is never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            "excused" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }
}

/// What the calendar shows for one day: a concrete status or no record at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayState {
    #[default]
    Unmarked,
    Marked(AttendanceStatus),
}

impl DayState {
    /// Advance one step through the click cycle:
    /// unmarked -> present -> absent -> late -> excused -> unmarked.
    pub fn cycle(self) -> DayState {
        use AttendanceStatus::{Absent, Excused, Late, Present};
        match self {
            DayState::Unmarked => DayState::Marked(Present),
            DayState::Marked(Present) => DayState::Marked(Absent),
            DayState::Marked(Absent) => DayState::Marked(Late),
            DayState::Marked(Late) => DayState::Marked(Excused),
            DayState::Marked(Excused) => DayState::Unmarked,
        }
    }

    pub fn status(self) -> Option<AttendanceStatus> {
        match self {
            DayState::Unmarked => None,
            DayState::Marked(s) => Some(s),
        }
    }
}
