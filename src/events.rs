//! Notification fan-out for initialization progress.
//!
//! The manager publishes [`InitEvent`]s through an [`EventHub`]; every
//! subscriber owns an [`EventStream`] backed by its own unbounded
//! channel, so a slow consumer never blocks the worker thread.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::error::VoxrecError;
use crate::types::InitEvent;
use crate::Result;

/// Publisher side: delivers each event to every live subscriber.
#[derive(Default)]
pub(crate) struct EventHub {
    senders: Mutex<Vec<Sender<InitEvent>>>,
}

impl EventHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open a subscription receiving every event emitted from now on.
    pub(crate) fn subscribe(&self) -> EventStream {
        let (sender, receiver) = crossbeam_channel::unbounded();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(sender);
        }
        EventStream { receiver }
    }

    /// Deliver one event. Subscribers whose stream has been dropped are
    /// pruned here.
    pub(crate) fn emit(&self, event: InitEvent) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.retain(|sender| sender.send(event.clone()).is_ok());
        }
    }
}

/// Receiving end of one subscription to initialization notifications.
///
/// Dropping the stream ends the subscription; the publisher notices on
/// its next emit.
pub struct EventStream {
    receiver: Receiver<InitEvent>,
}

impl EventStream {
    /// Receive the next event, blocking until one arrives.
    pub fn recv(&self) -> Result<InitEvent> {
        self.receiver.recv().map_err(|_| VoxrecError::StreamStopped)
    }

    /// Receive the next event without blocking.
    pub fn try_recv(&self) -> Option<InitEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive the next event, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<InitEvent> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => VoxrecError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => VoxrecError::StreamStopped,
        })
    }

    /// Drain events until the terminal [`InitEvent::Finished`] of the
    /// current cycle and return its aggregate outcome. `timeout` bounds
    /// the whole wait, not each event.
    pub fn wait_finished(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(VoxrecError::Timeout);
            }
            if let InitEvent::Finished(success) = self.recv_timeout(remaining)? {
                return Ok(success);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn every_subscriber_receives_each_event() {
        let hub = EventHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();

        hub.emit(InitEvent::SequenceStarted);

        assert_eq!(first.recv().unwrap(), InitEvent::SequenceStarted);
        assert_eq!(second.recv().unwrap(), InitEvent::SequenceStarted);
        assert!(first.try_recv().is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_emit() {
        let hub = EventHub::new();
        let stream = hub.subscribe();
        let _kept = hub.subscribe();
        drop(stream);

        hub.emit(InitEvent::Finished(true));
        assert_eq!(hub.senders.lock().unwrap().len(), 1);
    }

    #[test]
    fn wait_finished_skips_intermediate_events() {
        let hub = EventHub::new();
        let stream = hub.subscribe();

        hub.emit(InitEvent::SequenceStarted);
        hub.emit(InitEvent::StageStarted(Stage::License));
        hub.emit(InitEvent::StageFinished(Stage::License, true));
        hub.emit(InitEvent::Finished(false));

        assert!(!stream.wait_finished(Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn wait_finished_times_out_without_a_terminal_event() {
        let hub = EventHub::new();
        let stream = hub.subscribe();
        hub.emit(InitEvent::StageStarted(Stage::Sensor));

        match stream.wait_finished(Duration::from_millis(50)) {
            Err(VoxrecError::Timeout) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
