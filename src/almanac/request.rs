use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use super::{AlmanacClient, AlmanacData};
use crate::error::Result;
use crate::events::Event;

/// Identifies one almanac request. Clones share the cancellation flag.
#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl Ticket {
    fn new(id: u64) -> Self {
        Ticket {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ticket {}

pub struct AlmanacReply {
    pub ticket: Ticket,
    pub date: NaiveDate,
    pub result: Result<AlmanacData>,
}

/// Keeps track of the single request whose reply may still be applied.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: u64,
    current: Option<Ticket>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current request, if any, and hand out a fresh ticket.
    pub fn issue(&mut self) -> Ticket {
        self.cancel();
        self.next_id += 1;
        let ticket = Ticket::new(self.next_id);
        self.current = Some(ticket.clone());
        ticket
    }

    pub fn cancel(&mut self) {
        if let Some(ticket) = self.current.take() {
            log::debug!("Cancelling almanac request #{}", ticket.id);
            ticket.cancel();
        }
    }

    pub fn current(&self) -> Option<&Ticket> {
        self.current.as_ref()
    }

    /// Whether a reply for `ticket` should be applied. Accepting retires the
    /// ticket.
    pub fn accept(&mut self, ticket: &Ticket) -> bool {
        match &self.current {
            Some(current) if current == ticket && !ticket.is_cancelled() => {
                self.current = None;
                true
            }
            _ => {
                log::debug!("Dropping stale almanac reply #{}", ticket.id);
                false
            }
        }
    }
}

/// Run `client.fetch(date)` on a worker thread and post the reply as
/// [`Event::Almanac`]. Nothing is posted once the ticket is cancelled.
pub fn spawn_fetch(
    client: AlmanacClient,
    date: NaiveDate,
    ticket: Ticket,
    sink: mpsc::Sender<Event>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if ticket.is_cancelled() {
            return;
        }

        let result = client.fetch(&date);

        if ticket.is_cancelled() {
            log::debug!("Almanac request #{} finished after cancellation", ticket.id);
            return;
        }

        let _ = sink.send(Event::Almanac(AlmanacReply {
            ticket,
            date,
            result,
        }));
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use std::time::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn only_latest_ticket_is_accepted() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_ne!(first.id(), second.id());

        assert!(!tracker.accept(&first));
        assert!(tracker.accept(&second));
        // already consumed
        assert!(!tracker.accept(&second));
    }

    #[test]
    fn cancelled_ticket_is_rejected() {
        let mut tracker = RequestTracker::new();
        let ticket = tracker.issue();
        tracker.cancel();
        assert!(ticket.is_cancelled());
        assert!(tracker.current().is_none());
        assert!(!tracker.accept(&ticket));
    }

    #[test]
    fn worker_posts_reply() {
        let (tx, rx) = mpsc::channel();
        let mut tracker = RequestTracker::new();
        let ticket = tracker.issue();

        let handle = spawn_fetch(
            client(StaticBackend::answering(SAMPLE), Some("k")),
            ymd(2026, 2, 17),
            ticket,
            tx,
        );
        handle.join().unwrap();

        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Event::Almanac(reply)) => {
                assert!(tracker.accept(&reply.ticket));
                assert_eq!(ymd(2026, 2, 17), reply.date);
                assert_eq!("知止而后有定。", reply.result.unwrap().daily_quote);
            }
            _ => panic!("expected almanac reply"),
        }
    }

    #[test]
    fn cancelled_worker_stays_silent() {
        let (tx, rx) = mpsc::channel();
        let mut tracker = RequestTracker::new();
        let ticket = tracker.issue();
        tracker.cancel();

        let backend = StaticBackend::answering(SAMPLE);
        spawn_fetch(client(backend.clone(), Some("k")), ymd(2026, 2, 17), ticket, tx)
            .join()
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(0, backend.calls());
    }
}
