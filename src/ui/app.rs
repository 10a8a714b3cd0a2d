use chrono::Duration;
use std::fmt::Write;

use crate::events::{Dispatcher, Event};

use super::{Context, DetailWindow, Mode, MonthPane};

use unsegen::base::{Cursor, Terminal, Window};
use unsegen::input::{
    EditBehavior, Key, Navigatable, NavigateBehavior, OperationResult, ScrollBehavior,
};
use unsegen::widget::*;

use super::command::CommandParser;

pub struct App {
    context: Context,
}

impl App {
    pub fn new(context: Context) -> App {
        App { context }
    }

    fn as_widget<'w>(&'w self) -> impl Widget + 'w {
        let mut body = HLayout::new().widget(MonthPane::new(&self.context));
        if self.context.detail().is_open() {
            body = body.widget(DetailWindow::new(&self.context));
        }

        let mut layout = VLayout::new().widget(body);
        layout = match self.context.mode {
            Mode::Command => layout.widget(self.context.input_sink().as_widget()),
            Mode::Normal => layout.widget(StatusLine::new(&self.context)),
        };
        layout
    }

    pub fn run(
        &mut self,
        dispatcher: Dispatcher,
        mut term: Terminal,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut run = true;

        while run {
            if let Ok(event) = dispatcher.next() {
                match event {
                    Event::Update => self.context.update(),
                    Event::Almanac(reply) => {
                        self.context.apply_reply(reply);
                    }
                    Event::Input(input) => {
                        if input.matches(Key::Esc) {
                            if self.context.mode == Mode::Normal {
                                self.context.close_detail();
                            }
                            self.context.mode = Mode::Normal;
                        } else {
                            match self.context.mode {
                                Mode::Normal => {
                                    input
                                        .chain((Key::Char('q'), || run = false))
                                        .chain((Key::Char(':'), || {
                                            self.context.mode = Mode::Command
                                        }))
                                        .chain((Key::Char('\n'), || self.context.open_detail()))
                                        .chain((Key::Char('t'), || self.context.select_today()))
                                        .chain((Key::Char('n'), || self.context.move_months(1)))
                                        .chain((Key::Char('p'), || self.context.move_months(-1)))
                                        .chain(
                                            NavigateBehavior::new(&mut CursorBehaviour(
                                                &mut self.context,
                                            ))
                                            .down_on(Key::Char('j'))
                                            .up_on(Key::Char('k'))
                                            .left_on(Key::Char('h'))
                                            .right_on(Key::Char('l')),
                                        )
                                        .finish();
                                }
                                Mode::Command => {
                                    input
                                        .chain(
                                            EditBehavior::new(self.context.input_sink_mut())
                                                .delete_forwards_on(Key::Delete)
                                                .delete_backwards_on(Key::Backspace)
                                                .left_on(Key::Left)
                                                .right_on(Key::Right),
                                        )
                                        .chain(
                                            ScrollBehavior::new(self.context.input_sink_mut())
                                                .backwards_on(Key::Up)
                                                .forwards_on(Key::Down),
                                        )
                                        .chain(CommandParser::new(&mut self.context))
                                        .finish();

                                    if self.context.quit {
                                        run = false;
                                    }
                                }
                            }
                        }
                    }
                }
            }

            // Draw
            let root = term.create_root_window();
            self.as_widget().draw(root, RenderingHints::new());
            term.present();
        }

        self.context.close_detail();
        Ok(())
    }
}

/// Last command error, or a key reminder.
struct StatusLine<'a> {
    context: &'a Context,
}

impl<'a> StatusLine<'a> {
    fn new(context: &'a Context) -> Self {
        StatusLine { context }
    }
}

impl Widget for StatusLine<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::at_least(1),
            height: RowDemand::exact(1),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let theme = self.context.theme();
        let mut cursor = Cursor::new(&mut window);

        let res = match &self.context.last_error_message {
            Some(msg) => {
                cursor.set_style_modifier(theme.error_style);
                write!(&mut cursor, "{}", msg)
            }
            None if !self.context.has_api_key() => {
                cursor.set_style_modifier(theme.hint_style);
                write!(&mut cursor, "未设置 API 密钥 (:key <API-KEY>)  h/j/k/l 移动  n/p 翻月  t 今天  Enter 黄历  q 退出")
            }
            None => {
                cursor.set_style_modifier(theme.hint_style);
                write!(&mut cursor, "h/j/k/l 移动  n/p 翻月  t 今天  Enter 黄历  q 退出")
            }
        };
        if let Err(err) = res {
            log::warn!("Error while writing status line: {}", err);
        }
    }
}

struct CursorBehaviour<'a>(&'a mut Context);

impl CursorBehaviour<'_> {
    fn shift(&mut self, by: Duration) -> OperationResult {
        let date = self.0.cursor.checked_add_signed(by).unwrap_or(self.0.cursor);
        self.0.select(date);
        Ok(())
    }
}

impl Navigatable for CursorBehaviour<'_> {
    fn move_down(&mut self) -> OperationResult {
        self.shift(Duration::weeks(1))
    }

    fn move_left(&mut self) -> OperationResult {
        self.shift(Duration::days(-1))
    }

    fn move_right(&mut self) -> OperationResult {
        self.shift(Duration::days(1))
    }

    fn move_up(&mut self) -> OperationResult {
        self.shift(Duration::weeks(-1))
    }
}
