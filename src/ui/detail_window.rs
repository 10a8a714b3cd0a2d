use std::fmt::Write;
use unsegen::base::*;
use unsegen::widget::*;

use super::context::{Context, DetailState, Theme};
use crate::almanac::localized_date;
use crate::error::{Error, ErrorKind};
use crate::grid::CalendarDay;
use crate::lunar::LunarDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Subtitle,
    Auspicious,
    Inauspicious,
    Text,
    Quote,
    Error,
    Hint,
}

impl LineKind {
    fn style(&self, theme: &Theme) -> StyleModifier {
        match self {
            LineKind::Title => theme.detail_title_style,
            LineKind::Subtitle => theme.solar_term_style,
            LineKind::Auspicious => theme.auspicious_style,
            LineKind::Inauspicious => theme.inauspicious_style,
            LineKind::Text => theme.day_style,
            LineKind::Quote => theme.quote_style,
            LineKind::Error => theme.error_style,
            LineKind::Hint => theme.hint_style,
        }
    }
}

pub type Line = (LineKind, String);

/// Date heading plus lunar date, solar term and holiday.
pub fn header_lines(day: &CalendarDay, lunar: &LunarDate) -> Vec<Line> {
    let mut subtitle = format!("农历 {}{}", lunar.month, lunar.day);
    if let Some(term) = &day.solar_term {
        write!(subtitle, " • {}", term).ok();
    }
    if let (Some(name), Some(kind)) = (&day.holiday, day.special_type) {
        write!(subtitle, " [{} {}]", name, kind.badge()).ok();
    }

    let mut lines = vec![
        (LineKind::Title, localized_date(&day.date)),
        (LineKind::Subtitle, subtitle),
    ];
    if let Some(ticket) = &day.ticket_text {
        lines.push((LineKind::Text, format!("12306 {}", ticket)));
    }
    lines
}

pub fn body_lines(state: &DetailState) -> Vec<Line> {
    match state {
        DetailState::Closed => Vec::new(),
        DetailState::Loading { .. } => vec![(LineKind::Hint, "正在推演天机……".to_owned())],
        DetailState::Loaded { data, .. } => vec![
            (LineKind::Auspicious, format!("宜  {}", data.auspicious.join(" · "))),
            (LineKind::Inauspicious, format!("忌  {}", data.inauspicious.join(" · "))),
            (LineKind::Text, String::new()),
            (LineKind::Text, data.description.clone()),
            (LineKind::Text, String::new()),
            (LineKind::Quote, format!("「{}」", data.daily_quote)),
        ],
        DetailState::MissingCredential { .. } => vec![(
            LineKind::Error,
            Error::from(ErrorKind::MissingCredential)
                .user_message()
                .to_owned(),
        )],
        DetailState::Failed { .. } => vec![(
            LineKind::Error,
            Error::from(ErrorKind::ServiceFailure)
                .user_message()
                .to_owned(),
        )],
    }
}

pub struct DetailWindow<'a> {
    context: &'a Context,
}

impl<'a> DetailWindow<'a> {
    const MIN_WIDTH: usize = 30;

    pub fn new(context: &'a Context) -> Self {
        DetailWindow { context }
    }

    fn lines(&self) -> Vec<Line> {
        let state = self.context.detail();
        let date = match state.date() {
            Some(date) => date,
            None => return Vec::new(),
        };

        let mut lines = match self.context.day(&date) {
            Some(day) => header_lines(&day, &self.context.lunar_date(&date)),
            None => vec![(LineKind::Title, localized_date(&date))],
        };
        lines.push((LineKind::Text, String::new()));
        lines.extend(body_lines(state));
        lines.push((LineKind::Text, String::new()));
        lines.push((LineKind::Hint, "Esc 关闭".to_owned()));
        lines
    }
}

impl Widget for DetailWindow<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::at_least(Self::MIN_WIDTH),
            height: RowDemand::at_least(10),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let theme = self.context.theme();
        let mut cursor = Cursor::new(&mut window).wrapping_mode(WrappingMode::Wrap);

        for (kind, text) in self.lines() {
            let saved_style = cursor.get_style_modifier();
            cursor.apply_style_modifier(kind.style(theme));

            if let Err(err) = write!(&mut cursor, " {}", text) {
                log::warn!("Error while writing almanac: {}", err);
            }
            cursor.fill_and_wrap_line();

            cursor.set_style_modifier(saved_style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::almanac::AlmanacData;
    use crate::tables::SpecialKind;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spring_festival() -> (CalendarDay, LunarDate) {
        (
            CalendarDay {
                date: ymd(2026, 2, 17),
                is_current_month: true,
                is_today: false,
                lunar_date: "正月".to_owned(),
                lunar_month: "正月".to_owned(),
                solar_term: None,
                holiday: Some("春节".to_owned()),
                special_type: Some(SpecialKind::Holiday),
                ticket_text: None,
            },
            LunarDate {
                month: "正月".to_owned(),
                day: "初一".to_owned(),
                display: "正月".to_owned(),
            },
        )
    }

    #[test]
    fn header() {
        let (day, lunar) = spring_festival();
        let lines = header_lines(&day, &lunar);
        assert_eq!((LineKind::Title, "2026年2月17日星期二".to_owned()), lines[0]);
        assert_eq!("农历 正月初一 [春节 休]", lines[1].1);
        assert_eq!(2, lines.len());
    }

    #[test]
    fn loaded_body() {
        let state = DetailState::Loaded {
            date: ymd(2026, 2, 17),
            data: AlmanacData {
                auspicious: vec!["出行".to_owned(), "嫁娶".to_owned()],
                inauspicious: vec!["动土".to_owned()],
                description: "春回大地。".to_owned(),
                daily_quote: "上善若水。".to_owned(),
            },
        };
        let lines = body_lines(&state);
        assert_eq!("宜  出行 · 嫁娶", lines[0].1);
        assert_eq!("忌  动土", lines[1].1);
        assert_eq!((LineKind::Quote, "「上善若水。」".to_owned()), lines[5]);
    }

    #[test]
    fn failure_bodies() {
        let date = ymd(2026, 2, 17);
        assert_eq!(
            "星象模糊，请稍后再试。",
            body_lines(&DetailState::Failed { date })[0].1
        );
        assert!(body_lines(&DetailState::MissingCredential { date })[0]
            .1
            .contains(":key"));
        assert!(body_lines(&DetailState::Closed).is_empty());
    }
}
