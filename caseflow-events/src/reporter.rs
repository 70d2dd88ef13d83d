//! Process-wide write-failure fan-out.
//!
//! Failed writes are published here instead of being returned to whoever
//! issued them. Any number of subscribers (notification surfaces, tests)
//! receive every failure emitted after they subscribed.

use caseflow_core::WriteFailure;
use once_cell::sync::Lazy;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Events buffered per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

static GLOBAL: Lazy<ErrorReporter> = Lazy::new(|| ErrorReporter::new(DEFAULT_CAPACITY));

/// Handle to a failure channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    tx: broadcast::Sender<WriteFailure>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ErrorReporter {
    /// Create an isolated channel buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// The singleton channel shared by the whole process.
    pub fn global() -> ErrorReporter {
        GLOBAL.clone()
    }

    /// Publish `failure` to every current subscriber.
    ///
    /// Never blocks and never fails. With no subscribers the event is only
    /// logged.
    pub fn emit(&self, failure: WriteFailure) {
        warn!(
            path = %failure.path,
            operation = %failure.operation,
            batch_id = %failure.batch_id,
            "Write rejected"
        );
        match self.tx.send(failure) {
            Ok(receivers) => debug!(receivers, "Published write failure"),
            Err(_) => debug!("No subscribers for write failure"),
        }
    }

    pub fn subscribe(&self) -> ErrorSubscription {
        ErrorSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Registration on an [`ErrorReporter`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ErrorSubscription {
    rx: broadcast::Receiver<WriteFailure>,
}

impl ErrorSubscription {
    /// Next failure, waiting if none is buffered.
    ///
    /// Events lost to lag are skipped. Returns `None` once every reporter
    /// handle is gone.
    pub async fn recv(&mut self) -> Option<WriteFailure> {
        loop {
            match self.rx.recv().await {
                Ok(failure) => return Some(failure),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Error subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered failure without waiting.
    pub fn try_recv(&mut self) -> Option<WriteFailure> {
        loop {
            match self.rx.try_recv() {
                Ok(failure) => return Some(failure),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Error subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Every buffered failure, oldest first.
    pub fn drain(&mut self) -> Vec<WriteFailure> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
