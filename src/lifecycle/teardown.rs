//! Cancellation of a claim view's background work.

use tokio::sync::watch;

/// Owner side: triggering (or dropping) it tears the view down.
#[derive(Debug)]
pub struct Teardown {
    tx: watch::Sender<bool>,
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A handle for a task that must stop on teardown.
    pub fn signal(&self) -> TeardownSignal {
        TeardownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

/// Task side of a [`Teardown`].
#[derive(Debug, Clone)]
pub struct TeardownSignal {
    rx: watch::Receiver<bool>,
}

impl TeardownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once teardown is triggered or its owner is gone.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|torn_down| *torn_down).await;
    }
}
