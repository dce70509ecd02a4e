use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{ContractSnapshot, WinnerNotice, WinnerRecord};

use super::contract::LotteryContract;
use super::reconciler::{reconcile, DedupePolicy, HistoryLog};

pub type SharedSession = Arc<Mutex<LotterySession>>;

/// Single owner of the derived lottery view: the latest snapshot and the winner history.
///
/// Callers share it as [`SharedSession`]; holding the lock for a whole
/// [`LotterySession::refresh`] keeps reconciliation passes from overlapping.
pub struct LotterySession {
    contract: Arc<dyn LotteryContract>,
    history: HistoryLog,
    snapshot: Option<ContractSnapshot>,
    announced_round: Option<u64>,
    pending_notice: Option<WinnerNotice>,
}

impl LotterySession {
    pub fn new(contract: Arc<dyn LotteryContract>, policy: DedupePolicy) -> Self {
        Self {
            contract,
            history: HistoryLog::new(policy),
            snapshot: None,
            announced_round: None,
            pending_notice: None,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Runs one reconciliation pass and publishes its snapshot.
    ///
    /// A failed pass is logged and otherwise ignored: the previous snapshot
    /// and history stay in place.
    pub async fn refresh(&mut self, notify_if_winner: bool) -> Option<&ContractSnapshot> {
        match reconcile(self.contract.as_ref(), &mut self.history, notify_if_winner).await {
            Ok(pass) => {
                for record in &pass.new_records {
                    tracing::info!("Lottery #{} winner: {:#x}", record.round, record.winner);
                }
                if let Some(notice) = pass.notice {
                    if self.announced_round != Some(notice.round) {
                        tracing::info!("{}", notice.message());
                        self.announced_round = Some(notice.round);
                        self.pending_notice = Some(notice);
                    }
                }
                self.snapshot = Some(pass.snapshot);
            }
            Err(e) => {
                tracing::warn!("Lottery state refresh failed: {}", e);
            }
        }
        self.snapshot.as_ref()
    }

    pub fn snapshot(&self) -> Option<&ContractSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn history(&self) -> &[WinnerRecord] {
        self.history.records()
    }

    /// Hands out the congratulation message at most once.
    pub fn take_notice(&mut self) -> Option<WinnerNotice> {
        self.pending_notice.take()
    }
}
