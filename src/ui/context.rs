use chrono::{Datelike, Local, NaiveDate};
use std::sync::mpsc;

use unsegen::base::style::*;
use unsegen::widget::builtin::PromptLine;

use crate::almanac::{spawn_fetch, AlmanacClient, AlmanacData, AlmanacReply, RequestTracker, Ticket};
use crate::config::Config;
use crate::events::Event;
use crate::grid::{self, CalendarDay, MonthIndex};
use crate::lunar::{self, LunarDate, LunarSource};
use crate::tables::Annotations;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Command,
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub header_style: StyleModifier,
    pub weekday_header_style: StyleModifier,
    pub day_style: StyleModifier,
    pub weekend_style: StyleModifier,
    pub other_month_style: StyleModifier,
    pub focus_day_style: StyleModifier,
    pub today_day_style: StyleModifier,
    pub today_day_char: Option<char>,
    pub holiday_style: StyleModifier,
    pub work_style: StyleModifier,
    pub solar_term_style: StyleModifier,
    pub ticket_style: StyleModifier,
    pub detail_title_style: StyleModifier,
    pub auspicious_style: StyleModifier,
    pub inauspicious_style: StyleModifier,
    pub quote_style: StyleModifier,
    pub error_style: StyleModifier,
    pub hint_style: StyleModifier,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            header_style: StyleModifier::default()
                .fg_color(Color::Yellow)
                .format(TextFormatModifier::default().bold(true)),
            weekday_header_style: StyleModifier::default().fg_color(Color::Yellow),
            day_style: StyleModifier::default(),
            weekend_style: StyleModifier::default().fg_color(Color::Red),
            other_month_style: StyleModifier::default().fg_color(Color::LightBlack),
            focus_day_style: StyleModifier::default().bg_color(Color::Blue),
            today_day_style: StyleModifier::default().invert(true),
            today_day_char: Some('*'),
            holiday_style: StyleModifier::default().fg_color(Color::LightRed),
            work_style: StyleModifier::default().fg_color(Color::Yellow),
            solar_term_style: StyleModifier::default().fg_color(Color::Green),
            ticket_style: StyleModifier::default().fg_color(Color::Cyan),
            detail_title_style: StyleModifier::default()
                .fg_color(Color::Yellow)
                .format(TextFormatModifier::default().bold(true)),
            auspicious_style: StyleModifier::default().fg_color(Color::Green),
            inauspicious_style: StyleModifier::default().fg_color(Color::Red),
            quote_style: StyleModifier::default().format(TextFormatModifier::default().italic(true)),
            error_style: StyleModifier::default().fg_color(Color::LightRed),
            hint_style: StyleModifier::default().fg_color(Color::LightBlack),
        }
    }
}

/// What the almanac pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Closed,
    Loading { date: NaiveDate, ticket: Ticket },
    Loaded { date: NaiveDate, data: AlmanacData },
    MissingCredential { date: NaiveDate },
    Failed { date: NaiveDate },
}

impl DetailState {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DetailState::Closed => None,
            DetailState::Loading { date, .. }
            | DetailState::Loaded { date, .. }
            | DetailState::MissingCredential { date }
            | DetailState::Failed { date } => Some(*date),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DetailState::Closed)
    }
}

pub struct Context {
    pub mode: Mode,
    pub theme: Theme,
    pub cursor: NaiveDate,
    pub command_line: PromptLine,
    pub last_error_message: Option<String>,
    pub quit: bool,
    now: NaiveDate,
    annotations: Annotations,
    lunar: Box<dyn LunarSource>,
    client: AlmanacClient,
    tracker: RequestTracker,
    detail: DetailState,
    sink: mpsc::Sender<Event>,
}

impl Context {
    pub fn new(
        config: &Config,
        client: AlmanacClient,
        lunar: Box<dyn LunarSource>,
        sink: mpsc::Sender<Event>,
        today: NaiveDate,
    ) -> Self {
        let initial = MonthIndex::initial(&today, config.target_year);
        let cursor = if initial.contains(&today) {
            today
        } else {
            initial.first_day()
        };

        Context {
            mode: Mode::Normal,
            theme: Theme::default(),
            cursor,
            command_line: PromptLine::with_prompt(":".to_owned()),
            last_error_message: None,
            quit: false,
            now: today,
            annotations: config.annotations(),
            lunar,
            client,
            tracker: RequestTracker::new(),
            detail: DetailState::Closed,
            sink,
        }
    }

    pub fn update(&mut self) {
        self.now = Local::now().date_naive();
    }

    pub fn today(&self) -> NaiveDate {
        self.now
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn displayed_month(&self) -> MonthIndex {
        MonthIndex::from(self.cursor)
    }

    pub fn grid(&self) -> Vec<CalendarDay> {
        let month = self.displayed_month();
        grid::build_month(
            month.year(),
            month.month0() as i32,
            &self.now,
            &self.annotations,
            self.lunar.as_ref(),
        )
    }

    pub fn lunar_date(&self, date: &NaiveDate) -> LunarDate {
        lunar::derive(self.lunar.as_ref(), date)
    }

    /// Grid cell of `date` with all annotations, independent of the shown month.
    pub fn day(&self, date: &NaiveDate) -> Option<CalendarDay> {
        grid::build_month(
            date.year(),
            date.month0() as i32,
            &self.now,
            &self.annotations,
            self.lunar.as_ref(),
        )
        .into_iter()
        .find(|d| &d.date == date)
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    /// Move the cursor, staying within the months that can be shown. An
    /// almanac for another day is closed.
    pub fn select(&mut self, date: NaiveDate) {
        let date = MonthIndex::clamp_date(date);
        if self.detail.date().map_or(false, |d| d != date) {
            self.close_detail();
        }
        self.cursor = date;
    }

    pub fn select_today(&mut self) {
        self.select(self.now);
    }

    /// Shift the shown month by `n`, keeping the day of month where possible.
    pub fn move_months(&mut self, n: i64) {
        let month = self.displayed_month().shifted(n);
        let day = self.cursor.day().min(month.num_days());
        let date = NaiveDate::from_ymd_opt(month.year(), month.month0() + 1, day)
            .unwrap_or_else(|| month.first_day());
        self.select(date);
    }

    pub fn has_api_key(&self) -> bool {
        self.client.has_api_key()
    }

    /// Request the almanac of the selected day.
    pub fn open_detail(&mut self) {
        let date = self.cursor;
        let ticket = self.tracker.issue();
        log::debug!("Opening almanac for {} (#{})", date, ticket.id());

        spawn_fetch(
            self.client.clone(),
            date,
            ticket.clone(),
            self.sink.clone(),
        );
        self.detail = DetailState::Loading { date, ticket };
    }

    pub fn close_detail(&mut self) {
        self.tracker.cancel();
        self.detail = DetailState::Closed;
    }

    /// Apply a worker reply. Returns `false` if it was stale and dropped.
    pub fn apply_reply(&mut self, reply: AlmanacReply) -> bool {
        if !self.tracker.accept(&reply.ticket) {
            return false;
        }

        let date = reply.date;
        self.detail = match reply.result {
            Ok(data) => DetailState::Loaded { date, data },
            Err(e) if e.is_missing_credential() => DetailState::MissingCredential { date },
            Err(_) => DetailState::Failed { date },
        };
        true
    }

    /// Store a new API key and retry a failed request.
    pub fn set_api_key(&mut self, key: &str) {
        self.client.set_api_key(key);
        log::info!("API key updated");

        if let DetailState::MissingCredential { date } | DetailState::Failed { date } =
            self.detail
        {
            self.cursor = date;
            self.open_detail();
        }
    }

    pub fn input_sink(&self) -> &PromptLine {
        &self.command_line
    }

    pub fn input_sink_mut(&mut self) -> &mut PromptLine {
        &mut self.command_line
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::almanac::testing::StaticBackend;
    use crate::lunar::{LunarField, LunarParts};
    use std::sync::Arc;
    use std::time::Duration;

    pub struct Echo;

    impl LunarSource for Echo {
        fn lunar_parts(&self, date: &NaiveDate) -> LunarParts {
            LunarParts {
                month: LunarField::Numeric(date.month()),
                day: LunarField::Numeric(date.day().min(30)),
            }
        }
    }

    pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn context(
        backend: Arc<StaticBackend>,
        key: Option<&str>,
        today: NaiveDate,
    ) -> (Context, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        let client = crate::almanac::testing::client(backend, key);
        let ctx = Context::new(&Config::default(), client, Box::new(Echo), tx, today);
        (ctx, rx)
    }

    pub fn next_reply(rx: &mpsc::Receiver<Event>) -> AlmanacReply {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(Event::Almanac(reply)) => return reply,
                Ok(_) => continue,
                Err(e) => panic!("no almanac reply: {}", e),
            }
        }
    }
}
