use chrono::Datelike;
use std::fmt::Write;
use unsegen::base::*;
use unsegen::widget::*;

use super::util::{center_in, pad_to_width, spread};
use super::{Context, Theme};
use crate::grid::{CalendarDay, GRID_CELLS, WEEK_DAYS};
use crate::lunar;
use crate::tables::{SpecialKind, WEEKDAYS_SHORT};

pub const CELL_WIDTH: usize = 12;
pub const CELL_HEIGHT: usize = 3;

/// Text of one grid cell, each line exactly [`CELL_WIDTH`] columns wide:
/// day number and 休/班 badge, holiday or lunar text, solar term and ticket
/// reminder.
pub fn cell_lines(day: &CalendarDay, today_char: Option<char>) -> [String; CELL_HEIGHT] {
    let inner = CELL_WIDTH - 1;

    let mark = if day.is_today {
        today_char.unwrap_or(' ')
    } else {
        ' '
    };
    let number = format!("{}{:>2}", mark, day.date.day());
    let badge = day.special_type.map(|k| k.badge()).unwrap_or("");

    let mut notes = Vec::new();
    if let Some(term) = &day.solar_term {
        notes.push(term.as_str());
    }
    if let Some(ticket) = day.ticket_text.as_deref().filter(|_| day.is_current_month) {
        notes.push(ticket);
    }

    [
        spread(&number, badge, inner) + " ",
        format!(" {}", pad_to_width(day.label(), inner)),
        format!(" {}", pad_to_width(&notes.join(" "), inner)),
    ]
}

#[derive(Clone)]
pub struct MonthPane<'a> {
    context: &'a Context,
}

impl<'a> MonthPane<'a> {
    const HEADER_ROWS: usize = 2;
    const ROWS: usize = GRID_CELLS / WEEK_DAYS;

    pub fn new(context: &'a Context) -> Self {
        MonthPane { context }
    }

    fn title(&self) -> String {
        let month = self.context.displayed_month();
        format!(
            "{}  {}  {}",
            month.title(),
            lunar::year_name(month.year()),
            self.context.lunar_date(&self.context.cursor).month
        )
    }

    fn line_style(
        theme: &Theme,
        day: &CalendarDay,
        line: usize,
        selected: bool,
    ) -> Vec<StyleModifier> {
        let mut styles = vec![theme.day_style];

        if !day.is_current_month {
            styles.push(theme.other_month_style);
        } else {
            match line {
                0 if day.special_type == Some(SpecialKind::Work) => styles.push(theme.work_style),
                0 if day.is_weekend() || day.special_type.is_some() => {
                    styles.push(theme.weekend_style)
                }
                1 if day.holiday.is_some() => styles.push(theme.holiday_style),
                2 if day.solar_term.is_some() => styles.push(theme.solar_term_style),
                2 => styles.push(theme.ticket_style),
                _ => {}
            }
        }

        if day.is_today && line == 0 {
            styles.push(theme.today_day_style);
        }
        if selected {
            styles.push(theme.focus_day_style);
        }
        styles
    }
}

impl Widget for MonthPane<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::exact(WEEK_DAYS * CELL_WIDTH),
            height: RowDemand::exact(Self::HEADER_ROWS + Self::ROWS * CELL_HEIGHT),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let theme = self.context.theme();
        let days = self.context.grid();

        let mut cursor = Cursor::new(&mut window).style_modifier(theme.header_style);

        if let Err(err) = writeln!(
            &mut cursor,
            "{}",
            center_in(&self.title(), WEEK_DAYS * CELL_WIDTH)
        ) {
            log::warn!("Error while writing month title: {}", err);
        }

        cursor.set_style_modifier(theme.weekday_header_style);
        for head in WEEKDAYS_SHORT {
            if let Err(err) = write!(&mut cursor, "{}", center_in(head, CELL_WIDTH)) {
                log::warn!("Error while writing weekday header: {}", err);
            }
        }
        cursor.fill_and_wrap_line();

        for week in days.chunks(WEEK_DAYS) {
            let cells: Vec<_> = week
                .iter()
                .map(|day| cell_lines(day, theme.today_day_char))
                .collect();

            for line in 0..CELL_HEIGHT {
                for (day, lines) in week.iter().zip(&cells) {
                    let selected = day.date == self.context.cursor;

                    cursor.set_style_modifier(theme.day_style);
                    for style in Self::line_style(theme, day, line, selected) {
                        cursor.apply_style_modifier(style);
                    }
                    if let Err(err) = write!(&mut cursor, "{}", lines[line]) {
                        log::warn!("Error while writing day {}: {}", day.date, err);
                    }
                }
                cursor.set_style_modifier(theme.day_style);
                cursor.fill_and_wrap_line();
            }
        }
    }
}
