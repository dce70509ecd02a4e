use ethers::types::Address;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{ContractSnapshot, WinnerNotice, WinnerRecord},
    utils::is_null_address,
};

use super::contract::LotteryContract;

/// Key used to decide whether a finalized round is already in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupePolicy {
    #[default]
    ByRound,
    /// A winner address is recorded only for the first round it is discovered in.
    ByWinner,
}

impl DedupePolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "round" | "by_round" => Ok(Self::ByRound),
            "winner" | "address" | "by_winner" => Ok(Self::ByWinner),
            other => Err(AppError::Config(format!(
                "Unknown HISTORY_DEDUPE value '{}', expected 'round' or 'winner'",
                other
            ))),
        }
    }
}

/// Append-only log of finalized rounds, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    policy: DedupePolicy,
    records: Vec<WinnerRecord>,
}

impl HistoryLog {
    pub fn new(policy: DedupePolicy) -> Self {
        Self {
            policy,
            records: Vec::new(),
        }
    }

    pub fn policy(&self) -> DedupePolicy {
        self.policy
    }

    pub fn records(&self) -> &[WinnerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, round: u64, winner: &Address) -> bool {
        match self.policy {
            DedupePolicy::ByRound => self.records.iter().any(|r| r.round == round),
            DedupePolicy::ByWinner => self.records.iter().any(|r| r.winner == *winner),
        }
    }

    /// Returns `false` for null winners and for records already present.
    pub fn try_append(&mut self, record: WinnerRecord) -> bool {
        if is_null_address(&record.winner) || self.contains(record.round, &record.winner) {
            return false;
        }
        self.records.push(record);
        true
    }
}

/// Outcome of one successful reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilePass {
    pub snapshot: ContractSnapshot,
    pub new_records: Vec<WinnerRecord>,
    pub notice: Option<WinnerNotice>,
}

/// Re-reads the contract and backfills finalized rounds into `history`.
///
/// Every round from the current one down to 1 is queried on every pass.
/// `history` is only touched once all reads have succeeded, so a failed
/// pass leaves it exactly as it was.
pub async fn reconcile(
    contract: &dyn LotteryContract,
    history: &mut HistoryLog,
    notify_if_winner: bool,
) -> Result<ReconcilePass> {
    let (organizer, pot, participants, round) = tokio::try_join!(
        contract.organizer(),
        contract.collected_funds(),
        contract.participants(),
        contract.lottery_round(),
    )?;
    let snapshot = ContractSnapshot::new(organizer, pot, participants, round);

    let mut staged = HistoryLog::new(history.policy());
    let mut candidates = Vec::new();
    let mut notice = None;

    for i in (1..=round).rev() {
        let winner = contract.lottery_winner(i).await?;
        if is_null_address(&winner) {
            continue;
        }

        if i == round && notify_if_winner {
            notice = Some(WinnerNotice {
                round: i,
                winner,
                pot_display: snapshot.pot_display.clone(),
            });
        }

        // Dedupe against both the committed log and this pass.
        if !history.contains(i, &winner) && staged.try_append(WinnerRecord { round: i, winner }) {
            candidates.push(WinnerRecord { round: i, winner });
        }
    }

    for record in &candidates {
        history.try_append(record.clone());
    }

    tracing::debug!(
        "Reconciled round {}: {} participants, pot {} ether, {} new winner(s)",
        snapshot.round,
        snapshot.participant_count(),
        snapshot.pot_display,
        candidates.len()
    );

    Ok(ReconcilePass {
        snapshot,
        new_records: candidates,
        notice,
    })
}
