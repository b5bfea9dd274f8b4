use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::chat::TurnOutcome;
use crate::logs::LogEntry;

#[derive(Clone, Debug)]
pub enum Event {
    /// Terminal tick event
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize event
    Resize(u16, u16),
    /// A spawned send finished, successfully or with a notice
    TurnFinished(TurnOutcome),
    /// The session refused the send (blank input or a turn already running)
    TurnRejected(String),
    /// Fresh snapshot from the log broadcaster
    LogsUpdated(Vec<LogEntry>),
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    last_tick: Instant,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            last_tick: Instant::now(),
            tick_rate,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Next event from the app channel, the terminal or the tick timer.
    /// Returns `None` when nothing happened during this poll.
    pub async fn next(&mut self) -> Option<Event> {
        if let Ok(event) = timeout(Duration::from_millis(10), self.receiver.recv()).await {
            return event;
        }

        if event::poll(Duration::from_millis(0)).unwrap_or(false) {
            match event::read() {
                // Windows reports key releases too
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    return Some(Event::Key(key))
                }
                Ok(CrosstermEvent::Resize(w, h)) => return Some(Event::Resize(w, h)),
                _ => {}
            }
        }

        if self.last_tick.elapsed() >= self.tick_rate {
            self.last_tick = Instant::now();
            return Some(Event::Tick);
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_events_are_delivered() {
        let mut handler = EventHandler::new(Duration::from_secs(60));
        handler
            .sender()
            .send(Event::TurnRejected("turn in progress".to_string()))
            .unwrap();

        match handler.next().await {
            Some(Event::TurnRejected(reason)) => assert_eq!(reason, "turn in progress"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
