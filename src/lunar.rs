//! Lunar calendar text for grid cells.
//!
//! The numeric conversion (Gregorian date to lunar month and day) is delegated
//! to a [`LunarSource`]; this module only turns its output into the usual
//! display strings: 「初一」…「三十」 for days, 「正月」…「腊月」 for months.

use chrono::{Datelike, NaiveDate};
use icu_calendar::chinese::Chinese;
use icu_calendar::{Date, Ref};

/// Chinese numerals for `1..=9`; index 0 holds 「十」.
pub const NUM_CHINESE: [&str; 10] = ["十", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

const MONTH_NAMES: [&str; 12] = [
    "正月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "冬月", "腊月",
];

const HEAVENLY_STEMS: [&str; 10] = ["癸", "甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬"];
const EARTHLY_BRANCHES: [&str; 12] = [
    "亥", "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌",
];
const ZODIAC: [&str; 12] = [
    "猪", "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗",
];

/// One component of a converted date. Anything the source cannot express as a
/// plain number is handed over as text and displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LunarField {
    Numeric(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunarParts {
    pub month: LunarField,
    pub day: LunarField,
}

/// Gregorian date to lunar month/day conversion.
pub trait LunarSource {
    fn lunar_parts(&self, date: &NaiveDate) -> LunarParts;
}

/// [`LunarSource`] backed by the ICU4X Chinese calendar.
///
/// Leap months are reported as text (「闰六月」).
pub struct IcuLunarSource {
    calendar: Chinese,
}

impl Default for IcuLunarSource {
    fn default() -> Self {
        IcuLunarSource {
            calendar: Chinese::new(),
        }
    }
}

impl IcuLunarSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LunarSource for IcuLunarSource {
    fn lunar_parts(&self, date: &NaiveDate) -> LunarParts {
        let iso = match Date::try_new_iso_date(date.year(), date.month() as u8, date.day() as u8)
        {
            Ok(iso) => iso,
            Err(e) => {
                log::warn!("Lunar conversion of {} failed: {}", date, e);
                return LunarParts {
                    month: LunarField::Text(date.month().to_string()),
                    day: LunarField::Text(date.day().to_string()),
                };
            }
        };

        let lunar = iso.to_calendar(Ref(&self.calendar));
        LunarParts {
            month: month_field(lunar.month().code.0.as_str()),
            day: LunarField::Numeric(lunar.day_of_month().0),
        }
    }
}

/// Interpret an ICU month code (`M01`…`M12`, `M06L` for a leap month).
fn month_field(code: &str) -> LunarField {
    let (num, leap) = match code.strip_prefix('M') {
        Some(rest) => match rest.strip_suffix('L') {
            Some(num) => (num, true),
            None => (rest, false),
        },
        None => return LunarField::Text(code.to_owned()),
    };

    match num.parse::<u32>() {
        Ok(n) if leap => LunarField::Text(format!("闰{}", month_text(n))),
        Ok(n) => LunarField::Numeric(n),
        Err(_) => LunarField::Text(code.to_owned()),
    }
}

/// Day name: 「初一」 to 「初十」 for the first ten days, 「廿一」 to 「廿九」
/// for days 21 to 29.
///
/// Lunar months never exceed 30 days. 31 to 39 are still rendered with the
/// 「卅」 prefix; anything else outside `1..=30` is shown as a plain number.
pub fn day_text(day: u32) -> String {
    let prefix = match day {
        1..=10 => "初",
        11..=19 => "十",
        20 => "二",
        21..=29 => "廿",
        30 => "三",
        31..=39 => {
            log::warn!("Lunar day {} exceeds 30", day);
            "卅"
        }
        _ => {
            log::warn!("Lunar day {} out of range", day);
            return day.to_string();
        }
    };
    prefix.to_owned() + NUM_CHINESE[(day % 10) as usize]
}

/// Month name including 「月」. Months 11 and 12 are 「冬月」 and 「腊月」.
pub fn month_text(month: u32) -> String {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize].to_owned(),
        _ => format!("{}月", month),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunarDate {
    pub month: String,
    pub day: String,
    /// Text shown in the grid: the month name on the first day of a lunar
    /// month, the day name otherwise.
    pub display: String,
}

pub fn derive<S: LunarSource + ?Sized>(source: &S, date: &NaiveDate) -> LunarDate {
    let parts = source.lunar_parts(date);

    let month = match &parts.month {
        LunarField::Numeric(n) => month_text(*n),
        LunarField::Text(raw) => raw.clone(),
    };
    let day = match &parts.day {
        LunarField::Numeric(d) => day_text(*d),
        LunarField::Text(raw) => raw.clone(),
    };
    let display = match (&parts.month, &parts.day) {
        (LunarField::Numeric(_), LunarField::Numeric(1)) => month.clone(),
        _ => day.clone(),
    };

    LunarDate {
        month,
        day,
        display,
    }
}

/// Position in the sexagenary cycle, 1 being 甲子.
pub fn sexagenary_for_year(year: i32) -> u32 {
    (year.rem_euclid(60) as u32 + 2696) % 60 + 1
}

/// Header label for the lunar year beginning in `year`, e.g. 「丙午马年」.
pub fn year_name(year: i32) -> String {
    let num = sexagenary_for_year(year) as usize;
    format!(
        "{}{}{}年",
        HEAVENLY_STEMS[num % 10],
        EARTHLY_BRANCHES[num % 12],
        ZODIAC[num % 12]
    )
}
