//! Year-scoped annotation tables: public holidays, solar terms and railway
//! ticket pre-sale reminders.
//!
//! The 2026 data is compiled in. [`Annotations`] merges it with additional
//! entries from the configuration file once at start-up and is read-only
//! afterwards.

use chrono::NaiveDate;
use phf::phf_map;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::{SolarTermSpec, SpecialDaySpec, TicketSaleSpec};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub const WEEKDAYS_SHORT: [&str; 7] = ["日", "一", "二", "三", "四", "五", "六"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialKind {
    /// Day off (休)
    Holiday,
    /// Make-up working day (班)
    Work,
}

impl SpecialKind {
    pub fn badge(&self) -> &'static str {
        match self {
            SpecialKind::Holiday => "休",
            SpecialKind::Work => "班",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialDay {
    pub name: String,
    pub kind: SpecialKind,
}

// Official 2026 schedule estimated from the usual rules (Spring Festival on Feb 17).
static SPECIAL_DAYS_2026: phf::Map<&'static str, (&'static str, SpecialKind)> = phf_map! {
    "2026-01-01" => ("元旦", SpecialKind::Holiday),

    "2026-02-16" => ("除夕", SpecialKind::Holiday),
    "2026-02-17" => ("春节", SpecialKind::Holiday),
    "2026-02-18" => ("初二", SpecialKind::Holiday),
    "2026-02-19" => ("初三", SpecialKind::Holiday),
    "2026-02-20" => ("初四", SpecialKind::Holiday),
    "2026-02-21" => ("初五", SpecialKind::Holiday),
    "2026-02-22" => ("初六", SpecialKind::Holiday),

    "2026-04-05" => ("清明", SpecialKind::Holiday),
    "2026-04-06" => ("休", SpecialKind::Holiday),

    "2026-05-01" => ("劳动节", SpecialKind::Holiday),

    "2026-06-19" => ("端午", SpecialKind::Holiday),

    "2026-09-25" => ("中秋", SpecialKind::Holiday),

    "2026-10-01" => ("国庆", SpecialKind::Holiday),
    "2026-10-02" => ("休", SpecialKind::Holiday),
    "2026-10-03" => ("休", SpecialKind::Holiday),
    "2026-10-04" => ("休", SpecialKind::Holiday),
    "2026-10-05" => ("休", SpecialKind::Holiday),
    "2026-10-06" => ("休", SpecialKind::Holiday),
    "2026-10-07" => ("休", SpecialKind::Holiday),
};

// Pre-sale opens 14 days ahead of the travel date.
static TICKET_SALES_2026: phf::Map<&'static str, &'static str> = phf_map! {
    "2026-01-19" => "售春运首日",
    "2026-02-02" => "售除夕票",
    "2026-02-03" => "售初一票",
    "2026-02-07" => "售初五票",
    "2026-02-08" => "售初六票",
    "2026-02-23" => "售元宵票",
};

static SOLAR_TERMS_2026: phf::Map<&'static str, &'static str> = phf_map! {
    "2026-01-05" => "小寒",
    "2026-01-20" => "大寒",
    "2026-02-04" => "立春",
    "2026-02-19" => "雨水",
    "2026-03-05" => "惊蛰",
    "2026-03-20" => "春分",
    "2026-04-05" => "清明",
    "2026-04-20" => "谷雨",
    "2026-05-05" => "立夏",
    "2026-05-21" => "小满",
    "2026-06-05" => "芒种",
    "2026-06-21" => "夏至",
    "2026-07-07" => "小暑",
    "2026-07-23" => "大暑",
    "2026-08-07" => "立秋",
    "2026-08-23" => "处暑",
    "2026-09-07" => "白露",
    "2026-09-23" => "秋分",
    "2026-10-08" => "寒露",
    "2026-10-23" => "霜降",
    "2026-11-07" => "立冬",
    "2026-11-22" => "小雪",
    "2026-12-07" => "大雪",
    "2026-12-22" => "冬至",
};

pub fn date_key(date: &NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Merged lookup tables keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    special_days: HashMap<String, SpecialDay>,
    ticket_sales: HashMap<String, String>,
    solar_terms: HashMap<String, String>,
}

impl Annotations {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiled-in 2026 tables.
    pub fn builtin() -> Self {
        Annotations {
            special_days: SPECIAL_DAYS_2026
                .entries()
                .map(|(key, (name, kind))| {
                    (
                        (*key).to_owned(),
                        SpecialDay {
                            name: (*name).to_owned(),
                            kind: *kind,
                        },
                    )
                })
                .collect(),
            ticket_sales: TICKET_SALES_2026
                .entries()
                .map(|(key, text)| ((*key).to_owned(), (*text).to_owned()))
                .collect(),
            solar_terms: SOLAR_TERMS_2026
                .entries()
                .map(|(key, name)| ((*key).to_owned(), (*name).to_owned()))
                .collect(),
        }
    }

    /// Add (or replace) entries from the configuration file.
    pub fn with_overrides(
        mut self,
        special_days: &[SpecialDaySpec],
        ticket_sales: &[TicketSaleSpec],
        solar_terms: &[SolarTermSpec],
    ) -> Self {
        for spec in special_days {
            log::debug!("Special day override {}: {}", spec.date, spec.name);
            self.special_days.insert(
                spec.date.to_string(),
                SpecialDay {
                    name: spec.name.clone(),
                    kind: spec.kind,
                },
            );
        }
        for spec in ticket_sales {
            log::debug!("Ticket sale override {}: {}", spec.date, spec.text);
            self.ticket_sales
                .insert(spec.date.to_string(), spec.text.clone());
        }
        for spec in solar_terms {
            log::debug!("Solar term override {}: {}", spec.date, spec.name);
            self.solar_terms
                .insert(spec.date.to_string(), spec.name.clone());
        }
        self
    }

    pub fn special_day(&self, date: &NaiveDate) -> Option<&SpecialDay> {
        self.special_days.get(&date_key(date))
    }

    pub fn ticket_text(&self, date: &NaiveDate) -> Option<&str> {
        self.ticket_sales.get(&date_key(date)).map(String::as_str)
    }

    pub fn solar_term(&self, date: &NaiveDate) -> Option<&str> {
        self.solar_terms.get(&date_key(date)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.special_days.len() + self.ticket_sales.len() + self.solar_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spring_festival() {
        let annotations = Annotations::builtin();
        let day = annotations.special_day(&ymd(2026, 2, 17)).unwrap();
        assert_eq!("春节", day.name);
        assert_eq!(SpecialKind::Holiday, day.kind);
    }

    #[test]
    fn ticket_sales() {
        let annotations = Annotations::builtin();
        assert_eq!(Some("售除夕票"), annotations.ticket_text(&ymd(2026, 2, 2)));
        assert_eq!(None, annotations.ticket_text(&ymd(2026, 2, 4)));
    }

    #[test]
    fn solar_terms() {
        let annotations = Annotations::builtin();
        for (std, (m, d)) in [("立春", (2, 4)), ("清明", (4, 5)), ("冬至", (12, 22))] {
            assert_eq!(Some(std), annotations.solar_term(&ymd(2026, m, d)));
        }
        assert_eq!(24, SOLAR_TERMS_2026.len());
    }

    #[test]
    fn only_target_year() {
        let annotations = Annotations::builtin();
        assert!(annotations.special_day(&ymd(2025, 1, 1)).is_none());
        assert!(annotations.special_day(&ymd(2027, 2, 17)).is_none());
    }

    #[test]
    fn overrides_replace_and_extend() {
        let annotations = Annotations::builtin().with_overrides(
            &[
                SpecialDaySpec {
                    date: ymd(2026, 2, 14).into(),
                    name: "班".to_owned(),
                    kind: SpecialKind::Work,
                },
                SpecialDaySpec {
                    date: ymd(2026, 4, 6).into(),
                    name: "清明假".to_owned(),
                    kind: SpecialKind::Holiday,
                },
            ],
            &[TicketSaleSpec {
                date: ymd(2026, 9, 10).into(),
                text: "售国庆票".to_owned(),
            }],
            &[],
        );

        assert_eq!(
            SpecialKind::Work,
            annotations.special_day(&ymd(2026, 2, 14)).unwrap().kind
        );
        assert_eq!(
            "清明假",
            annotations.special_day(&ymd(2026, 4, 6)).unwrap().name
        );
        assert_eq!(Some("售国庆票"), annotations.ticket_text(&ymd(2026, 9, 10)));
        assert_eq!(
            Annotations::builtin().len() + 2,
            annotations.len()
        );
    }
}
