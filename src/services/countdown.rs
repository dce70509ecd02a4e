use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::models::{ContractSnapshot, TxOutcome};

use super::session::SharedSession;

pub fn countdown_message(remaining_secs: u64) -> String {
    format!("Just {}s more!", remaining_secs)
}

/// Wait between a mined result request and the read of its winner.
///
/// Publishes the remaining seconds once per tick. When the wait elapses it
/// runs exactly one reconciliation with the winner notice enabled; a
/// cancelled countdown never reconciles.
#[derive(Debug)]
pub struct ResultCountdown {
    transaction: TxOutcome,
    remaining: watch::Receiver<u64>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Option<ContractSnapshot>>,
}

impl ResultCountdown {
    pub fn start(
        session: SharedSession,
        transaction: TxOutcome,
        wait: Duration,
        tick: Duration,
    ) -> Self {
        let (remaining_tx, remaining) = watch::channel(wait.as_secs());
        let (cancel, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let deadline = Instant::now() + wait;
            let mut ticker = tokio::time::interval_at(Instant::now() + tick, tick);
            let mut cancel_closed = false;

            loop {
                tokio::select! {
                    biased;
                    res = &mut cancel_rx, if !cancel_closed => {
                        if res.is_ok() {
                            tracing::info!("Result countdown cancelled");
                            return None;
                        }
                        // Handle dropped without cancelling: keep counting.
                        cancel_closed = true;
                    }
                    _ = tokio::time::sleep_until(deadline) => break,
                    _ = ticker.tick() => {
                        let left = deadline.saturating_duration_since(Instant::now()).as_secs();
                        let _ = remaining_tx.send(left);
                        tracing::debug!("{}", countdown_message(left));
                    }
                }
            }

            let _ = remaining_tx.send(0);
            let mut session = session.lock().await;
            let snapshot = session.refresh(true).await.cloned();
            snapshot
        });

        Self {
            transaction,
            remaining,
            cancel: Some(cancel),
            handle,
        }
    }

    pub fn transaction(&self) -> &TxOutcome {
        &self.transaction
    }

    /// Receiver of the remaining seconds, for display.
    pub fn remaining(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Waits for the countdown; `None` when it was cancelled or the final pass failed.
    pub async fn finished(mut self) -> Option<ContractSnapshot> {
        let cancel = self.cancel.take();
        let result = (&mut self.handle).await.ok().flatten();
        drop(cancel);
        result
    }
}
