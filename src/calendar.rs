use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::{Subtask, Task};

/// Hours in the order the hourly grids list them: 1 AM first, 12 AM last.
const DISPLAY_HOURS: [u32; 24] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Month,
    Week,
    Day,
}

impl Granularity {
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Month => "Month",
            Granularity::Week => "Week",
            Granularity::Day => "Day",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            "week" | "weekly" | "w" => Ok(Granularity::Week),
            "day" | "daily" | "d" => Ok(Granularity::Day),
            other => Err(format!("unknown calendar view: {other} (expected month, week or day)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

/// Anything that can be placed on the calendar by its due timestamp.
pub trait CalendarItem {
    fn due(&self) -> Option<DateTime<Local>>;
}

impl CalendarItem for Task {
    fn due(&self) -> Option<DateTime<Local>> {
        self.end_date
    }
}

impl CalendarItem for Subtask {
    fn due(&self) -> Option<DateTime<Local>> {
        self.end_date
    }
}

#[derive(Debug)]
pub struct DayCell<'a, T> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub items: Vec<&'a T>,
}

#[derive(Debug)]
pub struct SlotCell<'a, T> {
    pub date: NaiveDate,
    pub hour: u32,
    pub items: Vec<&'a T>,
}

#[derive(Debug)]
pub struct HourRow<'a, T> {
    pub hour: u32,
    pub label: String,
    pub cells: Vec<SlotCell<'a, T>>,
}

#[derive(Debug)]
pub struct MonthGrid<'a, T> {
    pub reference: NaiveDate,
    pub cells: Vec<DayCell<'a, T>>,
    /// Items due on the reference date itself, for the list below the grid.
    pub agenda: Vec<&'a T>,
}

impl<'a, T> MonthGrid<'a, T> {
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell<'a, T>]> {
        self.cells.chunks(7)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell<'a, T>> {
        self.cells.iter().find(|cell| cell.date == date)
    }
}

#[derive(Debug)]
pub struct WeekGrid<'a, T> {
    pub days: Vec<NaiveDate>,
    pub rows: Vec<HourRow<'a, T>>,
}

#[derive(Debug)]
pub struct DayGrid<'a, T> {
    pub date: NaiveDate,
    pub rows: Vec<HourRow<'a, T>>,
}

impl<'a, T> DayGrid<'a, T> {
    pub fn row(&self, label: &str) -> Option<&HourRow<'a, T>> {
        let hour = parse_hour(label)?;
        self.rows.iter().find(|row| row.hour == hour)
    }
}

#[derive(Debug)]
pub enum CalendarView<'a, T> {
    Month(MonthGrid<'a, T>),
    Week(WeekGrid<'a, T>),
    Day(DayGrid<'a, T>),
}

pub fn bucket<T: CalendarItem>(
    reference: NaiveDate,
    granularity: Granularity,
    items: &[T],
) -> CalendarView<'_, T> {
    match granularity {
        Granularity::Month => CalendarView::Month(month_grid(reference, items)),
        Granularity::Week => CalendarView::Week(week_grid(reference, items)),
        Granularity::Day => CalendarView::Day(day_grid(reference, items)),
    }
}

/// Full Sunday-to-Saturday weeks covering the reference month.
pub fn month_grid<T: CalendarItem>(reference: NaiveDate, items: &[T]) -> MonthGrid<'_, T> {
    let first_visible = start_of_week(first_of_month(reference));
    let last_visible = start_of_week(last_of_month(reference)) + Duration::days(6);

    let cells = first_visible
        .iter_days()
        .take_while(|date| *date <= last_visible)
        .map(|date| DayCell {
            date,
            in_month: date.year() == reference.year() && date.month() == reference.month(),
            items: items_on(date, items),
        })
        .collect();

    MonthGrid {
        reference,
        cells,
        agenda: items_on(reference, items),
    }
}

pub fn week_grid<T: CalendarItem>(reference: NaiveDate, items: &[T]) -> WeekGrid<'_, T> {
    let days = start_of_week(reference)
        .iter_days()
        .take(7)
        .collect::<Vec<_>>();
    let rows = hour_rows(&days, items);
    WeekGrid { days, rows }
}

pub fn day_grid<T: CalendarItem>(reference: NaiveDate, items: &[T]) -> DayGrid<'_, T> {
    DayGrid {
        date: reference,
        rows: hour_rows(&[reference], items),
    }
}

/// Items whose due timestamp falls on `date`, ignoring the time of day.
pub fn items_on<T: CalendarItem>(date: NaiveDate, items: &[T]) -> Vec<&T> {
    items
        .iter()
        .filter(|item| item.due().is_some_and(|due| due.date_naive() == date))
        .collect()
}

/// Items grouped by due day in ascending order; undated items trail under `None`.
pub fn group_by_due_date<T: CalendarItem>(items: &[T]) -> Vec<(Option<NaiveDate>, Vec<&T>)> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&T>> = BTreeMap::new();
    let mut undated = Vec::new();

    for item in items {
        match item.due() {
            Some(due) => by_day.entry(due.date_naive()).or_default().push(item),
            None => undated.push(item),
        }
    }

    let mut groups = by_day
        .into_iter()
        .map(|(day, items)| (Some(day), items))
        .collect::<Vec<_>>();
    if !undated.is_empty() {
        groups.push((None, undated));
    }
    groups
}

fn hour_rows<'a, T: CalendarItem>(days: &[NaiveDate], items: &'a [T]) -> Vec<HourRow<'a, T>> {
    DISPLAY_HOURS
        .iter()
        .map(|&hour| HourRow {
            hour,
            label: hour_label(hour),
            cells: days
                .iter()
                .map(|&date| SlotCell {
                    date,
                    hour,
                    items: items
                        .iter()
                        .filter(|item| {
                            item.due()
                                .is_some_and(|due| due.date_naive() == date && due.hour() == hour)
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// 12-hour label for an hour of the day: 0 is "12 AM", 12 is "12 PM".
pub fn hour_label(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let clock = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{clock} {suffix}")
}

pub fn parse_hour(label: &str) -> Option<u32> {
    let mut parts = label.split_whitespace();
    let clock = parts.next()?.parse::<u32>().ok()?;
    let suffix = parts.next()?.to_uppercase();
    if parts.next().is_some() || !(1..=12).contains(&clock) {
        return None;
    }

    match suffix.as_str() {
        "AM" => Some(clock % 12),
        "PM" => Some(clock % 12 + 12),
        _ => None,
    }
}

/// Position of `hour` in the hourly grid, found through its display label.
pub fn row_index_for_hour(hour: u32) -> Option<usize> {
    let label = hour_label(hour);
    let target = parse_hour(&label)?;
    DISPLAY_HOURS.iter().position(|&row_hour| row_hour == target)
}

pub fn advance(reference: NaiveDate, granularity: Granularity, direction: Direction) -> NaiveDate {
    let shifted = match (granularity, direction) {
        (Granularity::Month, Direction::Forward) => reference.checked_add_months(Months::new(1)),
        (Granularity::Month, Direction::Back) => reference.checked_sub_months(Months::new(1)),
        (Granularity::Week, Direction::Forward) => reference.checked_add_signed(Duration::days(7)),
        (Granularity::Week, Direction::Back) => reference.checked_sub_signed(Duration::days(7)),
        (Granularity::Day, Direction::Forward) => reference.succ_opt(),
        (Granularity::Day, Direction::Back) => reference.pred_opt(),
    };
    shifted.unwrap_or(reference)
}

pub fn period_title(reference: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Month => reference.format("%B %Y").to_string(),
        Granularity::Week => {
            let start = start_of_week(reference);
            format!(
                "Week of {} - {}",
                start.format("%d %b"),
                (start + Duration::days(6)).format("%d %b %Y")
            )
        }
        Granularity::Day => reference.format("%A, %d %B %Y").to_string(),
    }
}

/// The Sunday on or before `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_sunday() as i64)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    first_of_month(day)
        .checked_add_months(Months::new(1))
        .and_then(|next_month| next_month.pred_opt())
        .unwrap_or(day)
}
