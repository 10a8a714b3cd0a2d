extern crate huangli as lib;

use chrono::{Local, NaiveDate};
use flexi_logger::{FileSpec, Logger};
use lib::almanac::AlmanacClient;
use lib::events::Dispatcher;
use lib::grid::{self, MonthIndex};
use lib::lunar::IcuLunarSource;
use lib::tables::DATE_KEY_FORMAT;
use lib::ui::{plain, App, Context, DetailState};
use nix::sys::{signal, termios};
use std::io::stdout;
use std::path::PathBuf;
use structopt::StructOpt;
use unsegen::base::Terminal;

fn parse_month(arg: &str) -> Result<MonthIndex, String> {
    let (_, date) = nom::combinator::all_consuming(lib::ui::command::parse_date)(arg)
        .map_err(|_| format!("'{}' is not of the form YYYY-MM", arg))?;
    if !MonthIndex::in_range(&date) {
        return Err(format!(
            "'{}' is outside of {} to {}",
            arg,
            MonthIndex::first().title(),
            MonthIndex::last().title()
        ));
    }
    Ok(MonthIndex::from(date))
}

fn parse_day(arg: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(arg, DATE_KEY_FORMAT)
        .map_err(|e| format!("'{}' is not of the form YYYY-MM-DD: {}", arg, e))
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "hl",
    author = "Julian Bigge <j.reedts@gmail.com>",
    about = "Huangli - A Gregorian/Lunar TUI calendar with almanac."
)]
pub struct Args {
    #[structopt(
        name = "CONFIG",
        short = "c",
        long = "config",
        help = "path to config file",
        parse(from_os_str)
    )]
    pub configfile: Option<PathBuf>,

    #[structopt(
        short = "s",
        long = "show",
        help = "only print the month non-interactively"
    )]
    pub show: bool,

    #[structopt(
        long = "month",
        help = "month to open, as YYYY-MM",
        parse(try_from_str = parse_month)
    )]
    pub month: Option<MonthIndex>,

    #[structopt(
        long = "almanac",
        help = "print the almanac of a day (YYYY-MM-DD) and exit",
        parse(try_from_str = parse_day)
    )]
    pub almanac: Option<NaiveDate>,

    #[structopt(long = "log-file", help = "path to log file", parse(from_os_str))]
    pub log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();

    const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let mut logger = Logger::try_with_env_or_str(DEFAULT_LOG_LEVEL)?;

    if let Some(log_file) = args.log_file {
        logger = logger
            .log_to_file(FileSpec::try_from(log_file)?)
            .print_message();
    }

    let _logger = logger.start()?;

    let config = lib::config::load_suitable_config(args.configfile.as_deref())?;
    let annotations = config.annotations();
    let lunar = IcuLunarSource::new();
    let today = Local::now().date_naive();
    let client = AlmanacClient::from_config(&config)?;

    if let Some(date) = args.almanac {
        let month = MonthIndex::from(date);
        let days = grid::build_month(
            month.year(),
            month.month0() as i32,
            &today,
            &annotations,
            &lunar,
        );
        let day = days
            .iter()
            .find(|d| d.date == date)
            .ok_or("date outside of its month grid")?;

        let state = match client.fetch(&date) {
            Ok(data) => DetailState::Loaded { date, data },
            Err(e) if e.is_missing_credential() => DetailState::MissingCredential { date },
            Err(_) => DetailState::Failed { date },
        };

        print!(
            "{}",
            plain::render_almanac(day, &lib::lunar::derive(&lunar, &date), &state)
        );
        return Ok(());
    }

    if args.show {
        let month = args
            .month
            .unwrap_or_else(|| MonthIndex::initial(&today, config.target_year));
        let days = grid::build_current(month.year(), month.month0() as i32, &annotations, &lunar);
        print!("{}", plain::render_month(&month, &days));
        return Ok(());
    }

    const STDIN: std::os::unix::io::RawFd = 0;
    let orig_attr = std::sync::Mutex::new(termios::tcgetattr(STDIN)?);

    std::panic::set_hook(Box::new(move |info| {
        // Switch to main terminal screen
        println!("{}{}", termion::screen::ToMainScreen, termion::cursor::Show);

        if let Ok(attr) = orig_attr.lock() {
            let _ = termios::tcsetattr(STDIN, termios::SetArg::TCSANOW, &attr);
        }

        println!("Huangli ran into a fatal error!");
        println!("Consider filing an issue with a log file and the backtrace below.");

        println!("{}", info);
        println!("{:?}", backtrace::Backtrace::new());
    }));

    // Handled by the dispatcher's signal thread only
    let mut signals_to_wait = signal::SigSet::empty();
    signals_to_wait.add(signal::SIGWINCH);
    signals_to_wait.thread_block()?;

    let dispatcher = Dispatcher::from_config(&config, signals_to_wait);

    let stdout = stdout();
    let term = Terminal::new(stdout.lock())?;

    let mut context = Context::new(
        &config,
        client,
        Box::new(lunar),
        dispatcher.event_sink(),
        today,
    );
    if let Some(month) = args.month {
        context.select(month.first_day());
    }

    let mut app = App::new(context);

    app.run(dispatcher, term)
}
