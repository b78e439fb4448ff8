use backon::BackoffBuilder;
use std::time::Duration;

/// What to do once a watch connection is gone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconnect {
    /// Reopen right away
    Now,
    /// Reopen after waiting this long
    After(Duration),
    /// The backoff has no attempts left
    GiveUp,
}

/// Paces the reconnects of a supervised watch.
///
/// A connection that delivered something and then ended is reopened immediately. Failed
/// connections, and connections the server closed before they delivered any event or bookmark,
/// wait for the next delay of the backoff built by `B`. Every delivery starts that backoff over.
pub struct ReconnectPolicy<B: BackoffBuilder> {
    builder: B,
    delays: Option<B::Backoff>,
    delivered: bool,
}

impl<B: BackoffBuilder + Clone> ReconnectPolicy<B> {
    /// Paces reconnects with delays from `builder`
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            delays: None,
            delivered: false,
        }
    }

    /// A new connection was opened
    pub fn opened(&mut self) {
        self.delivered = false;
    }

    /// The open connection delivered an event or a bookmark
    pub fn delivered(&mut self) {
        self.delivered = true;
        self.delays = None;
    }

    /// Opening the connection failed, or it failed midway
    pub fn failed(&mut self) -> Reconnect {
        self.back_off()
    }

    /// The server ended the connection without an error
    pub fn closed(&mut self) -> Reconnect {
        if self.delivered {
            Reconnect::Now
        } else {
            self.back_off()
        }
    }

    fn back_off(&mut self) -> Reconnect {
        let builder = &self.builder;
        match self.delays.get_or_insert_with(|| builder.clone().build()).next() {
            Some(delay) => Reconnect::After(delay),
            None => Reconnect::GiveUp,
        }
    }
}
