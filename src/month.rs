use chrono::{Datelike, NaiveDate};

/// The month the calendar currently shows. Month is always in 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleMonth {
    pub year: i32,
    pub month: u32,
}

impl VisibleMonth {
    pub fn of(date: NaiveDate) -> VisibleMonth {
        VisibleMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> VisibleMonth {
        if self.month == 1 {
            VisibleMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            VisibleMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> VisibleMonth {
        if self.month == 12 {
            VisibleMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            VisibleMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("first day of month")
    }

    pub fn last_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, self.days()).expect("last day of month")
    }

    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 30,
    }
}

/// One slot in the Sunday-first calendar layout. Blanks pad the first week so
/// day 1 lands on its weekday column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day(NaiveDate),
}

pub fn grid_cells(month: VisibleMonth) -> Vec<GridCell> {
    let leading = month.first_day().weekday().num_days_from_sunday();
    let mut cells = Vec::with_capacity((leading + month.days()) as usize);
    for _ in 0..leading {
        cells.push(GridCell::Blank);
    }
    for day in 1..=month.days() {
        let date =
            NaiveDate::from_ymd_opt(month.year, month.month, day).expect("day within month");
        cells.push(GridCell::Day(date));
    }
    cells
}
