use chrono::NaiveDate;
use std::result::Result;
use unsegen::input::*;

use nom::{
    bytes::complete::*,
    character::complete::*,
    combinator::*,
    error::{Error, ErrorKind, ParseError},
    sequence::{pair, preceded, separated_pair, tuple},
    Err, IResult,
};

use super::context::{Context, Mode};
use crate::grid::MonthIndex;

pub struct CommandParser<'a> {
    context: &'a mut Context,
}

/// Look up the next whitespace-delimited word in a command table.
pub fn match_action<'a, Act>(
    commands: &'a [(&'static str, Act)],
) -> impl Fn(&str) -> IResult<&str, (&'static str, &'a Act)> + 'a {
    move |input| {
        let (rest, word) = take_till1::<_, _, Error<&str>>(|c: char| c.is_whitespace())(input)?;
        commands
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(name, act)| (rest, (*name, act)))
            .ok_or_else(|| Err::Error(ParseError::from_error_kind(input, ErrorKind::Tag)))
    }
}

/// `YYYY-MM` or `YYYY-MM-DD`. A missing day means the 1st.
pub fn parse_date(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(
        pair(
            separated_pair(
                map_res(digit1, str::parse::<i32>),
                char('-'),
                map_res(digit1, str::parse::<u32>),
            ),
            opt(preceded(char('-'), map_res(digit1, str::parse::<u32>))),
        ),
        |((year, month), day)| NaiveDate::from_ymd_opt(year, month, day.unwrap_or(1)),
    )(input)
}

fn parse_count(input: &str) -> Result<u32, Error<String>> {
    all_consuming(map_res(digit1, str::parse::<u32>))(input)
        .map(|(_, n)| n)
        .map_err(|_: Err<Error<&str>>| Error::new(input.to_owned(), ErrorKind::Digit))
}

impl<'a> CommandParser<'a> {
    pub fn new(context: &'a mut Context) -> Self {
        CommandParser { context }
    }

    pub fn run_command(&mut self, cmd: &str) -> ActionResult {
        let cmd = cmd.trim();

        // `3next`
        let res = all_consuming(tuple((digit1, match_action(COMMANDS))))(cmd);
        if let Ok((_, (repeat, (_, Action::Repeatable(act))))) = res {
            return act(self.context, parse_count(repeat)?);
        }

        // `next 3`, `goto 2026-02`
        let res = all_consuming(separated_pair(match_action(COMMANDS), space1, rest))(cmd);
        if let Ok((_, ((name, act), arg))) = res {
            return match act {
                Action::Arg(a) => a(self.context, arg.trim()),
                Action::Repeatable(a) => a(self.context, parse_count(arg.trim())?),
                Action::NoArg(_) => Err(Error::new(name.to_owned(), ErrorKind::Eof)),
            };
        }

        let (_, (name, act)) = all_consuming(match_action(COMMANDS))(cmd)
            .map_err(|_: Err<Error<&str>>| Error::new(cmd.to_owned(), ErrorKind::Tag))?;

        match act {
            Action::NoArg(a) => a(self.context),
            Action::Repeatable(a) => a(self.context, 1),
            Action::Arg(_) => Err(Error::new(name.to_owned(), ErrorKind::Complete)),
        }
    }

    fn report_error(&mut self, error: Error<String>) {
        let msg = match error.code {
            ErrorKind::Tag => format!("Unknown command: {}", error.input),
            ErrorKind::Digit => format!("Not a count: {}", error.input),
            ErrorKind::Eof => format!("{} takes no argument", error.input),
            ErrorKind::Complete => format!("{} needs an argument", error.input),
            ErrorKind::TooLarge => format!("Date out of range: {}", error.input),
            _ => format!("Invalid argument: {}", error.input),
        };
        log::debug!("{}", msg);
        self.context.last_error_message = Some(msg);
    }
}

impl Behavior for CommandParser<'_> {
    fn input(mut self, input: Input) -> Option<Input> {
        if let Event::Key(Key::Char('\n')) = input.event {
            let cmd = self.context.input_sink_mut().finish_line().to_owned();
            self.context.mode = Mode::Normal;
            self.context.last_error_message = None;
            if let Err(e) = self.run_command(&cmd) {
                self.report_error(e);
            }
            None
        } else {
            Some(input)
        }
    }
}

pub type ActionResult = Result<(), Error<String>>;

pub enum Action {
    Arg(fn(&mut Context, &str) -> ActionResult),
    NoArg(fn(&mut Context) -> ActionResult),
    Repeatable(fn(&mut Context, u32) -> ActionResult),
}

const COMMANDS: &[(&str, Action)] = &[
    (
        "today",
        Action::NoArg(|c| {
            c.select_today();
            Ok(())
        }),
    ),
    (
        "next",
        Action::Repeatable(|c, n| {
            c.move_months(n as i64);
            Ok(())
        }),
    ),
    (
        "prev",
        Action::Repeatable(|c, n| {
            c.move_months(-(n as i64));
            Ok(())
        }),
    ),
    (
        "goto",
        Action::Arg(|c, arg| {
            let (_, date) = all_consuming(parse_date)(arg)
                .map_err(|_| Error::new(arg.to_owned(), ErrorKind::Verify))?;
            if !MonthIndex::in_range(&date) {
                return Err(Error::new(arg.to_owned(), ErrorKind::TooLarge));
            }
            c.select(date);
            Ok(())
        }),
    ),
    (
        "key",
        Action::Arg(|c, arg| {
            c.set_api_key(arg);
            Ok(())
        }),
    ),
    (
        "q",
        Action::NoArg(|c| {
            c.quit = true;
            Ok(())
        }),
    ),
    (
        "quit",
        Action::NoArg(|c| {
            c.quit = true;
            Ok(())
        }),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::almanac::testing::{StaticBackend, SAMPLE};
    use crate::ui::context::testing::*;
    use crate::grid::GRID_CELLS;
    use crate::ui::DetailState;
    use chrono::Datelike;

    fn run(ctx: &mut Context, cmd: &str) -> ActionResult {
        CommandParser::new(ctx).run_command(cmd)
    }

    #[test]
    fn dates() {
        assert_eq!(Ok(("", ymd(2026, 2, 1))), parse_date("2026-02"));
        assert_eq!(Ok(("", ymd(2026, 2, 17))), parse_date("2026-2-17"));
        assert!(parse_date("2026-13").is_err());
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("feb").is_err());
    }

    #[test]
    fn navigation() {
        let (mut ctx, _rx) = context(StaticBackend::answering(SAMPLE), None, ymd(2026, 10, 19));

        run(&mut ctx, "goto 2026-02-17").unwrap();
        assert_eq!(ymd(2026, 2, 17), ctx.cursor);

        run(&mut ctx, "next").unwrap();
        assert_eq!(ymd(2026, 3, 17), ctx.cursor);

        run(&mut ctx, "prev 3").unwrap();
        assert_eq!(ymd(2025, 12, 17), ctx.cursor);

        run(&mut ctx, "2next").unwrap();
        assert_eq!(ymd(2026, 2, 17), ctx.cursor);

        run(&mut ctx, " today ").unwrap();
        assert_eq!(ymd(2026, 10, 19), ctx.cursor);

        run(&mut ctx, "goto 2027-01").unwrap();
        assert_eq!(ymd(2027, 1, 1), ctx.cursor);
    }

    #[test]
    fn errors() {
        let (mut ctx, _rx) = context(StaticBackend::answering(SAMPLE), None, ymd(2026, 10, 19));

        assert_eq!(ErrorKind::Tag, run(&mut ctx, "jump").unwrap_err().code);
        assert_eq!(ErrorKind::Digit, run(&mut ctx, "next x").unwrap_err().code);
        assert_eq!(ErrorKind::Verify, run(&mut ctx, "goto 2026-13").unwrap_err().code);
        assert_eq!(ErrorKind::Complete, run(&mut ctx, "goto").unwrap_err().code);
        assert_eq!(ErrorKind::Eof, run(&mut ctx, "today 3").unwrap_err().code);
        assert_eq!(ymd(2026, 10, 19), ctx.cursor);
    }

    #[test]
    fn navigation_stays_within_date_range() {
        let (mut ctx, _rx) = context(StaticBackend::answering(SAMPLE), None, ymd(2026, 10, 19));
        let max = NaiveDate::MAX;

        let goto = format!("goto {}-{:02}", max.year(), max.month());
        assert_eq!(ErrorKind::TooLarge, run(&mut ctx, &goto).unwrap_err().code);
        assert_eq!(ymd(2026, 10, 19), ctx.cursor);

        run(&mut ctx, "next 4000000000").unwrap();
        assert_eq!(MonthIndex::last(), ctx.displayed_month());
        assert_eq!(GRID_CELLS, ctx.grid().len());

        run(&mut ctx, "4000000000prev").unwrap();
        assert_eq!(MonthIndex::first(), ctx.displayed_month());
        assert_eq!(GRID_CELLS, ctx.grid().len());
    }

    #[test]
    fn quit() {
        let (mut ctx, _rx) = context(StaticBackend::answering(SAMPLE), None, ymd(2026, 10, 19));
        run(&mut ctx, "q").unwrap();
        assert!(ctx.quit);
    }

    #[test]
    fn key_retries_almanac() {
        let (mut ctx, rx) = context(StaticBackend::answering(SAMPLE), None, ymd(2026, 2, 17));
        ctx.open_detail();
        ctx.apply_reply(next_reply(&rx));
        assert!(matches!(ctx.detail(), DetailState::MissingCredential { .. }));

        run(&mut ctx, "key  secret-key ").unwrap();
        assert!(ctx.has_api_key());
        assert!(ctx.apply_reply(next_reply(&rx)));
        assert!(matches!(ctx.detail(), DetailState::Loaded { .. }));
    }
}
