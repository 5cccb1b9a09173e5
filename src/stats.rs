//! Per-day completion statistics for the calendar heat-map.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::Task;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub completed: u32,
    pub total: u32,
}

impl DayStats {
    pub fn new(completed: u32, total: u32) -> Self {
        Self { completed, total }
    }

    pub fn completion_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((self.completed as f64 / self.total as f64).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub stats: DayStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    /// Weekday of the 1st, 0 = Sunday. Renderers pad the first grid row with this many blanks.
    pub first_weekday: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    pub fn total(&self) -> u32 {
        self.days.iter().map(|day| day.stats.total).sum()
    }

    pub fn completed(&self) -> u32 {
        self.days.iter().map(|day| day.stats.completed).sum()
    }
}

/// A calendar month, always valid once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
        Some(Self { first, last })
    }

    pub fn containing(date: NaiveDate) -> Self {
        let last_day = days_in_month(date.year(), date.month());
        Self {
            first: date.with_day(1).unwrap_or(date),
            last: date.with_day(last_day).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn days_in_month(&self) -> u32 {
        self.last.day()
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.first.month0() as usize]
    }

    pub fn prev(&self) -> Option<Self> {
        self.first.pred_opt().map(Self::containing)
    }

    pub fn next(&self) -> Option<Self> {
        self.last.succ_opt().map(Self::containing)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year())
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        _ => 31,
    }
}

pub fn day_stats(tasks: &[Task]) -> BTreeMap<NaiveDate, DayStats> {
    let mut stats: BTreeMap<NaiveDate, DayStats> = BTreeMap::new();
    for task in tasks {
        let entry = stats.entry(task.date).or_default();
        entry.total += 1;
        if task.completed {
            entry.completed += 1;
        }
    }
    stats
}

/// One entry per day of `month`, ascending, empty days included as `{0, 0}`.
pub fn build_month(tasks: &[Task], month: YearMonth) -> MonthCalendar {
    let stats = day_stats(tasks);
    let mut days = Vec::with_capacity(month.days_in_month() as usize);
    let mut cursor = Some(month.first_day());
    while let Some(date) = cursor {
        if date > month.last_day() {
            break;
        }
        days.push(CalendarDay {
            date,
            stats: stats.get(&date).copied().unwrap_or_default(),
        });
        cursor = date.succ_opt();
    }

    MonthCalendar {
        year: month.year(),
        month: month.month(),
        first_weekday: month.first_day().weekday().num_days_from_sunday(),
        days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Background of a day with no tasks (#EEF5DB).
pub const NEUTRAL_COLOR: Rgba = Rgba {
    r: 0xEE,
    g: 0xF5,
    b: 0xDB,
    a: 1.0,
};

const RATE_BLUE: u8 = 85;
const RATE_ALPHA: f32 = 0.8;

/// Heat-map colour: red at 0% completion, green at 100%, neutral without tasks.
pub fn completion_color(stats: DayStats) -> Rgba {
    match stats.completion_rate() {
        None => NEUTRAL_COLOR,
        Some(rate) => Rgba {
            r: (255.0 * (1.0 - rate)).round() as u8,
            g: (255.0 * rate).round() as u8,
            b: RATE_BLUE,
            a: RATE_ALPHA,
        },
    }
}
