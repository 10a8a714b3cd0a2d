use std::io;
use std::sync::mpsc;
use std::thread;

use nix::sys::signal::SigSet;
use unsegen::input::Input;

use crate::almanac::AlmanacReply;
use crate::config::Config;

pub enum Event {
    Input(Input),
    Update,
    Almanac(AlmanacReply),
}

pub struct Dispatcher {
    rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    _input_handle: thread::JoinHandle<()>,
    _update_handle: thread::JoinHandle<()>,
    _signal_handle: thread::JoinHandle<()>,
}

impl Dispatcher {
    /// `signals` must already be blocked in the calling thread so that only
    /// the signal thread receives them.
    pub fn from_config(config: &Config, signals: SigSet) -> Dispatcher {
        let tick_rate = config.tick_rate();
        let (tx, rx) = mpsc::channel();

        let input_handle = {
            let tx = tx.clone();
            thread::spawn(move || {
                let stdin = io::stdin();
                let stdin = stdin.lock();
                for key in Input::read_all(stdin).flatten() {
                    if tx.send(Event::Input(key)).is_err() {
                        return;
                    }
                }
            })
        };

        let update_handle = {
            let tx = tx.clone();
            thread::spawn(move || loop {
                if tx.send(Event::Update).is_err() {
                    return;
                }
                thread::sleep(tick_rate);
            })
        };

        let signal_handle = {
            let tx = tx.clone();
            thread::spawn(move || loop {
                match signals.wait() {
                    Ok(signal) => {
                        log::debug!("Received {:?}", signal);
                        if tx.send(Event::Update).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        log::warn!("Waiting for signals failed: {}", e);
                        return;
                    }
                }
            })
        };

        Dispatcher {
            rx,
            tx,
            _input_handle: input_handle,
            _update_handle: update_handle,
            _signal_handle: signal_handle,
        }
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }

    pub fn event_sink(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }
}
