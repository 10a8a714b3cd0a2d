use chrono::{Datelike, Duration, Local, Month, NaiveDate};
use num_traits::FromPrimitive;
use std::ops::{Add, Sub};

use crate::lunar::{self, LunarSource};
use crate::tables::{Annotations, SpecialKind};

pub const GRID_CELLS: usize = 42;
pub const WEEK_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub lunar_date: String,
    pub lunar_month: String,
    pub solar_term: Option<String>,
    pub holiday: Option<String>,
    pub special_type: Option<SpecialKind>,
    pub ticket_text: Option<String>,
}

impl CalendarDay {
    pub fn is_weekend(&self) -> bool {
        self.date.weekday().num_days_from_sunday() % 6 == 0
    }

    /// Holiday name if any, lunar text otherwise.
    pub fn label(&self) -> &str {
        self.holiday.as_deref().unwrap_or(&self.lunar_date)
    }
}

pub fn days_of_month(month: &Month, year: i32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1);
    let next = if month.number_from_month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month.number_from_month() + 1, 1)
    };

    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

fn month_number(year: i32, month0: i64) -> i64 {
    year as i64 * 12 + month0
}

/// A (year, zero-based month) pair. Month indexes outside `0..12` roll over
/// into the neighbouring years.
///
/// Only months whose whole grid lies within chrono's date range exist, see
/// [`MonthIndex::first`] and [`MonthIndex::last`]. Anything beyond is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthIndex {
    year: i32,
    month0: u32,
}

impl MonthIndex {
    pub fn new(year: i32, month0: i32) -> Self {
        Self::from_number(month_number(year, month0 as i64))
    }

    fn from_number(number: i64) -> Self {
        let min = &NaiveDate::MIN;
        let max = &NaiveDate::MAX;
        // The grid of the first month starts before MIN, the last one ends after MAX
        let lo = month_number(min.year(), min.month0() as i64) + 1;
        let hi = month_number(max.year(), max.month0() as i64) - 1;

        let number = number.clamp(lo, hi);
        MonthIndex {
            year: number.div_euclid(12) as i32,
            month0: number.rem_euclid(12) as u32,
        }
    }

    fn number(&self) -> i64 {
        month_number(self.year, self.month0 as i64)
    }

    /// Earliest month that can be shown.
    pub fn first() -> Self {
        Self::from_number(i64::MIN)
    }

    /// Latest month that can be shown.
    pub fn last() -> Self {
        Self::from_number(i64::MAX)
    }

    /// Whether `date` lies in a month that can be shown.
    pub fn in_range(date: &NaiveDate) -> bool {
        let month = month_number(date.year(), date.month0() as i64);
        Self::first().number() <= month && month <= Self::last().number()
    }

    /// `date`, or the nearest day of the first or last month that can be shown.
    pub fn clamp_date(date: NaiveDate) -> NaiveDate {
        let first = Self::first().first_day();
        let last = Self::last().last_day();
        date.clamp(first, last)
    }

    /// Move by `n` months, saturating at [`MonthIndex::first`] and [`MonthIndex::last`].
    pub fn shifted(&self, n: i64) -> Self {
        Self::from_number(self.number().saturating_add(n))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month0(&self) -> u32 {
        self.month0
    }

    pub fn month(&self) -> Month {
        Month::from_u32(self.month0 + 1).unwrap_or(Month::January)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, self.num_days())
            .unwrap_or_else(|| self.first_day())
    }

    pub fn num_days(&self) -> u32 {
        days_of_month(&self.month(), self.year)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month0
    }

    pub fn next(&self) -> Self {
        *self + 1
    }

    pub fn prev(&self) -> Self {
        *self - 1
    }

    pub fn title(&self) -> String {
        format!("{}年{}月", self.year, self.month0 + 1)
    }

    /// Month opened at start-up: January of `target_year` while it still lies
    /// ahead, the month of `today` otherwise.
    pub fn initial(today: &NaiveDate, target_year: i32) -> Self {
        if today.year() < target_year {
            MonthIndex::new(target_year, 0)
        } else {
            MonthIndex::from(*today)
        }
    }
}

impl<T: Datelike> From<T> for MonthIndex {
    fn from(m: T) -> Self {
        MonthIndex::from_number(month_number(m.year(), m.month0() as i64))
    }
}

impl Add<u32> for MonthIndex {
    type Output = MonthIndex;
    fn add(self, rhs: u32) -> Self::Output {
        self.shifted(rhs as i64)
    }
}

impl Sub<u32> for MonthIndex {
    type Output = MonthIndex;
    fn sub(self, rhs: u32) -> Self::Output {
        self.shifted(-(rhs as i64))
    }
}

impl PartialOrd for MonthIndex {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthIndex {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month0).cmp(&(other.year, other.month0))
    }
}

/// First date shown in the grid of `month`: the Sunday on or before the 1st.
pub fn grid_start(month: &MonthIndex) -> NaiveDate {
    let first = month.first_day();
    first
        .checked_sub_signed(Duration::days(first.weekday().num_days_from_sunday() as i64))
        .unwrap_or(first)
}

/// Build the 6×7 cells for `(year, month0)`, `month0` being zero-based.
pub fn build_month<S: LunarSource + ?Sized>(
    year: i32,
    month0: i32,
    today: &NaiveDate,
    annotations: &Annotations,
    lunar_source: &S,
) -> Vec<CalendarDay> {
    let month = MonthIndex::new(year, month0);
    let start = grid_start(&month);

    start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| {
            let lunar = lunar::derive(lunar_source, &date);
            let special = annotations.special_day(&date);

            CalendarDay {
                date,
                is_current_month: month.contains(&date),
                is_today: &date == today,
                lunar_date: lunar.display,
                lunar_month: lunar.month,
                solar_term: annotations.solar_term(&date).map(str::to_owned),
                holiday: special.map(|s| s.name.clone()),
                special_type: special.map(|s| s.kind),
                ticket_text: annotations.ticket_text(&date).map(str::to_owned),
            }
        })
        .collect()
}

/// [`build_month`] against the local clock.
pub fn build_current<S: LunarSource + ?Sized>(
    year: i32,
    month0: i32,
    annotations: &Annotations,
    lunar_source: &S,
) -> Vec<CalendarDay> {
    build_month(
        year,
        month0,
        &Local::now().date_naive(),
        annotations,
        lunar_source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunar::{LunarField, LunarParts};
    use chrono::Weekday;

    /// Day-of-month as lunar day, enough to exercise the merge logic.
    struct Echo;

    impl LunarSource for Echo {
        fn lunar_parts(&self, date: &NaiveDate) -> LunarParts {
            LunarParts {
                month: LunarField::Numeric(date.month()),
                day: LunarField::Numeric(date.day().min(30)),
            }
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid(year: i32, month0: i32, today: NaiveDate) -> Vec<CalendarDay> {
        build_month(year, month0, &today, &Annotations::builtin(), &Echo)
    }

    #[test]
    fn shape_of_every_month() {
        let today = ymd(2026, 10, 19);
        for year in [1999, 2024, 2025, 2026, 2100] {
            for month0 in 0..12 {
                let days = grid(year, month0, today);
                assert_eq!(GRID_CELLS, days.len());
                assert_eq!(Weekday::Sun, days[0].date.weekday());
                assert_eq!(Weekday::Sat, days[GRID_CELLS - 1].date.weekday());
                for pair in days.windows(2) {
                    assert_eq!(pair[0].date + Duration::days(1), pair[1].date);
                }

                let month = MonthIndex::new(year, month0);
                assert_eq!(
                    month.num_days() as usize,
                    days.iter().filter(|d| d.is_current_month).count()
                );

                let first = month.first_day();
                let pos = days.iter().position(|d| d.date == first).unwrap();
                assert_eq!(first.weekday().num_days_from_sunday() as usize, pos);
            }
        }
    }

    #[test]
    fn month_starting_on_sunday() {
        // 2026-02-01 and 2026-03-01 are Sundays
        for month0 in [1, 2] {
            let days = grid(2026, month0, ymd(2026, 10, 19));
            assert_eq!(1, days[0].date.day());
            assert!(days[0].is_current_month);
        }
    }

    #[test]
    fn today_marker() {
        let days = grid(2026, 9, ymd(2026, 10, 19));
        let today: Vec<_> = days.iter().filter(|d| d.is_today).collect();
        assert_eq!(1, today.len());
        assert_eq!(ymd(2026, 10, 19), today[0].date);

        // leading days of the next month still count
        let days = grid(2026, 8, ymd(2026, 10, 3));
        assert_eq!(1, days.iter().filter(|d| d.is_today).count());

        let days = grid(2026, 0, ymd(2026, 10, 19));
        assert_eq!(0, days.iter().filter(|d| d.is_today).count());
    }

    #[test]
    fn annotations_are_merged() {
        let days = grid(2026, 1, ymd(2026, 10, 19));
        let find = |d: NaiveDate| days.iter().find(|c| c.date == d).unwrap();

        let spring = find(ymd(2026, 2, 17));
        assert_eq!(Some("春节".to_owned()), spring.holiday);
        assert_eq!(Some(SpecialKind::Holiday), spring.special_type);
        assert_eq!("春节", spring.label());

        let sale = find(ymd(2026, 2, 2));
        assert_eq!(Some("售除夕票".to_owned()), sale.ticket_text);
        assert_eq!(None, sale.holiday);

        let term = find(ymd(2026, 2, 4));
        assert_eq!(Some("立春".to_owned()), term.solar_term);

        let plain = find(ymd(2026, 2, 10));
        assert_eq!(None, plain.special_type);
        assert_eq!(None, plain.solar_term);
        assert_eq!(None, plain.ticket_text);
        assert_eq!("初十", plain.label());
        assert_eq!("二月", plain.lunar_month);
    }

    #[test]
    fn first_lunar_day_shows_month_name() {
        let days = grid(2026, 2, ymd(2026, 10, 19));
        let first = days.iter().find(|c| c.date == ymd(2026, 3, 1)).unwrap();
        assert_eq!("三月", first.lunar_date);
    }

    #[test]
    fn month_index_rolls_over() {
        assert_eq!(MonthIndex::new(2027, 0), MonthIndex::new(2026, 12));
        assert_eq!(MonthIndex::new(2025, 11), MonthIndex::new(2026, -1));
        assert_eq!(MonthIndex::new(2027, 0), MonthIndex::new(2026, 11).next());
        assert_eq!(MonthIndex::new(2025, 11), MonthIndex::new(2026, 0).prev());
        assert_eq!(MonthIndex::new(2028, 1), MonthIndex::new(2026, 1) + 24);
        assert_eq!(MonthIndex::new(2024, 10), MonthIndex::new(2026, 1) - 15);
        assert!(MonthIndex::new(2026, 1) < MonthIndex::new(2026, 2));
        assert_eq!("2026年2月", MonthIndex::new(2026, 1).title());

        let days = build_month(2026, 12, &ymd(2026, 10, 19), &Annotations::empty(), &Echo);
        assert_eq!(31, days.iter().filter(|d| d.is_current_month).count());
        assert!(days.iter().any(|d| d.date == ymd(2027, 1, 31)));
    }

    #[test]
    fn months_at_the_edge_of_the_date_range() {
        let today = ymd(2026, 10, 19);
        let max = NaiveDate::MAX;
        let min = NaiveDate::MIN;

        let last = MonthIndex::last();
        assert_eq!(MonthIndex::new(max.year(), max.month0() as i32 - 1), last);
        assert_eq!(last, MonthIndex::new(max.year(), max.month0() as i32));
        assert_eq!(last, last.next());
        assert_eq!(last, last + u32::MAX);
        assert_eq!(last, MonthIndex::from(max));

        let first = MonthIndex::first();
        assert_eq!(MonthIndex::new(min.year(), min.month0() as i32 + 1), first);
        assert_eq!(first, first.prev());
        assert_eq!(first, first - u32::MAX);
        assert_eq!(first, MonthIndex::new(i32::MIN, i32::MIN));

        assert!(MonthIndex::in_range(&last.first_day()));
        assert!(!MonthIndex::in_range(&max));
        assert!(!MonthIndex::in_range(&min));
        assert_eq!(last.last_day(), MonthIndex::clamp_date(max));
        assert_eq!(first.first_day(), MonthIndex::clamp_date(min));
        assert_eq!(today, MonthIndex::clamp_date(today));

        for (year, month0) in [
            (max.year(), max.month0() as i32),
            (min.year(), min.month0() as i32),
            (i32::MAX, 0),
        ] {
            let days = build_month(year, month0, &today, &Annotations::empty(), &Echo);
            assert_eq!(GRID_CELLS, days.len());
            for pair in days.windows(2) {
                assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
            }
        }
    }

    #[test]
    fn initial_month() {
        assert_eq!(
            MonthIndex::new(2026, 0),
            MonthIndex::initial(&ymd(2025, 6, 3), 2026)
        );
        assert_eq!(
            MonthIndex::new(2026, 9),
            MonthIndex::initial(&ymd(2026, 10, 19), 2026)
        );
    }

    #[test]
    fn month_lengths() {
        assert_eq!(29, days_of_month(&Month::February, 2024));
        assert_eq!(28, days_of_month(&Month::February, 2026));
        assert_eq!(31, days_of_month(&Month::December, 2026));
        assert_eq!(30, days_of_month(&Month::April, 2026));
    }

    #[test]
    fn weekend() {
        let days = grid(2026, 1, ymd(2026, 10, 19));
        assert!(days[0].is_weekend());
        assert!(days[6].is_weekend());
        assert!(!days[3].is_weekend());
    }
}
