//! Non-interactive output for `--show` and `--almanac`.

use chrono::Datelike;
use itertools::Itertools;
use std::fmt::Write;

use super::detail_window::{body_lines, header_lines};
use super::util::{center_in, pad_to_width};
use super::DetailState;
use crate::grid::{CalendarDay, MonthIndex, WEEK_DAYS};
use crate::lunar::{self, LunarDate};
use crate::tables::WEEKDAYS_SHORT;

const COLUMN_WIDTH: usize = 10;

fn plain_cell(day: &CalendarDay) -> String {
    if !day.is_current_month {
        return " ".repeat(COLUMN_WIDTH);
    }

    let mark = if day.is_today { '*' } else { ' ' };
    let badge = day.special_type.map(|k| k.badge()).unwrap_or(" ");
    pad_to_width(
        &format!("{}{:>2}{}{}", mark, day.date.day(), badge, day.label()),
        COLUMN_WIDTH,
    )
}

/// Month grid followed by the month's holidays, solar terms and ticket dates.
pub fn render_month(month: &MonthIndex, days: &[CalendarDay]) -> String {
    let mut out = String::new();
    let width = WEEK_DAYS * COLUMN_WIDTH;

    let title = format!("{}  {}", month.title(), lunar::year_name(month.year()));
    writeln!(out, "{}", center_in(&title, width).trim_end()).ok();

    let header = WEEKDAYS_SHORT
        .iter()
        .map(|d| pad_to_width(&format!("   {}", d), COLUMN_WIDTH))
        .join("");
    writeln!(out, "{}", header.trim_end()).ok();

    for week in days.chunks(WEEK_DAYS) {
        writeln!(out, "{}", week.iter().map(plain_cell).join("")).ok();
    }

    let notes: Vec<String> = days
        .iter()
        .filter(|d| d.is_current_month)
        .filter_map(|d| {
            let mut parts = Vec::new();
            if let (Some(name), Some(kind)) = (&d.holiday, d.special_type) {
                parts.push(format!("{}({})", name, kind.badge()));
            }
            if let Some(term) = &d.solar_term {
                parts.push(term.clone());
            }
            if let Some(ticket) = &d.ticket_text {
                parts.push(format!("12306 {}", ticket));
            }
            if parts.is_empty() {
                None
            } else {
                Some(format!("{:>2}日  {}", d.date.day(), parts.join("  ")))
            }
        })
        .collect();

    if !notes.is_empty() {
        out.push('\n');
        for note in notes {
            writeln!(out, "{}", note).ok();
        }
    }

    out
}

/// Almanac pane content as plain lines.
pub fn render_almanac(day: &CalendarDay, lunar: &LunarDate, state: &DetailState) -> String {
    let mut out = String::new();
    for (_, line) in header_lines(day, lunar) {
        writeln!(out, "{}", line).ok();
    }
    out.push('\n');
    for (_, line) in body_lines(state) {
        writeln!(out, "{}", line).ok();
    }
    out
}
