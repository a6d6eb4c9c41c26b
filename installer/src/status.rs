//! One-way status conduit from the pipeline to whoever displays progress.
//!
//! The pipeline talks to a [`StatusSink`]. In background mode the sink is the
//! sending half of a bounded single-producer/single-consumer channel whose
//! receiving half is drained by the presentation loop on its own thread. In
//! foreground mode the sink is [`ConsoleSink`].

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

use tracing::debug;

/// Immutable progress text, ordered by emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage(String);

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusMessage {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Destination for pipeline progress.
pub trait StatusSink {
    fn send(&self, message: StatusMessage);
}

/// Create a bounded status channel.
///
/// `capacity` is the number of messages buffered before the producer blocks.
/// The consumer never blocks on the producer.
pub fn channel(capacity: usize) -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        StatusSender { tx },
        StatusReceiver {
            rx,
            closed: false,
        },
    )
}

/// Producer half. Not `Clone`: exactly one producer exists per channel.
#[derive(Debug)]
pub struct StatusSender {
    tx: SyncSender<StatusMessage>,
}

impl StatusSink for StatusSender {
    fn send(&self, message: StatusMessage) {
        // A closed receiver means the presentation has already shut down.
        if self.tx.send(message).is_err() {
            debug!("status receiver closed; dropping message");
        }
    }
}

/// Consumer half, owned by the presentation thread.
#[derive(Debug)]
pub struct StatusReceiver {
    rx: Receiver<StatusMessage>,
    closed: bool,
}

impl StatusReceiver {
    /// Take every queued message without blocking, in emission order.
    pub fn drain(&mut self) -> Vec<StatusMessage> {
        let mut messages = Vec::new();
        self.drain_into(&mut messages);
        messages
    }

    /// Wait up to `timeout` for the first message, then drain the rest.
    ///
    /// Returns early with an empty batch once the producer has hung up.
    pub fn drain_timeout(&mut self, timeout: Duration) -> Vec<StatusMessage> {
        let mut messages = Vec::new();
        if self.closed {
            return messages;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(message) => messages.push(message),
            Err(RecvTimeoutError::Timeout) => return messages,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                return messages;
            }
        }
        self.drain_into(&mut messages);
        messages
    }

    /// True once the producer is gone and every message has been taken.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn drain_into(&mut self, messages: &mut Vec<StatusMessage>) {
        loop {
            match self.rx.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }
}

/// Foreground sink: one line per message on stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn send(&self, message: StatusMessage) {
        println!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn drain_returns_messages_in_emission_order() {
        let (tx, mut rx) = channel(8);
        tx.send("one".into());
        tx.send("two".into());
        tx.send("three".into());
        let drained: Vec<String> = rx.drain().iter().map(|m| m.to_string()).collect();
        assert_eq!(drained, vec!["one", "two", "three"]);
        assert!(rx.drain().is_empty());
        assert!(!rx.is_closed());
    }

    #[test]
    fn closes_after_sender_drops_and_queue_is_empty() {
        let (tx, mut rx) = channel(8);
        tx.send("last".into());
        drop(tx);
        let drained = rx.drain();
        assert_eq!(drained, vec![StatusMessage::new("last")]);
        assert!(rx.is_closed());
        assert!(rx.drain_timeout(Duration::from_millis(1)).is_empty());
    }

    #[test]
    fn drain_timeout_returns_empty_on_idle_tick() {
        let (_tx, mut rx) = channel(1);
        assert!(rx.drain_timeout(Duration::from_millis(5)).is_empty());
        assert!(!rx.is_closed());
    }

    #[test]
    fn bounded_channel_delivers_everything_across_threads() {
        let (tx, mut rx) = channel(2);
        let producer = thread::spawn(move || {
            for i in 0..100 {
                tx.send(StatusMessage::new(format!("msg {i}")));
            }
        });

        let mut received = Vec::new();
        while !rx.is_closed() {
            received.extend(rx.drain_timeout(Duration::from_millis(10)));
        }
        producer.join().expect("producer");

        let expected: Vec<StatusMessage> = (0..100)
            .map(|i| StatusMessage::new(format!("msg {i}")))
            .collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn send_after_receiver_drop_is_ignored() {
        let (tx, rx) = channel(1);
        drop(rx);
        tx.send("nobody listening".into());
    }
}
