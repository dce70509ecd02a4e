use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::Serialize;

use crate::utils::format_pot;

// ==================== SNAPSHOT ====================
/// Contract state read during one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSnapshot {
    pub organizer: Address,
    pub pot: U256,
    pub pot_display: String,
    pub participants: Vec<Address>,
    pub round: u64,
    pub fetched_at: DateTime<Utc>,
}

impl ContractSnapshot {
    pub fn new(organizer: Address, pot: U256, participants: Vec<Address>, round: u64) -> Self {
        Self {
            organizer,
            pot,
            pot_display: format_pot(pot),
            participants,
            round,
            fetched_at: Utc::now(),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

// ==================== HISTORY ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerRecord {
    pub round: u64,
    pub winner: Address,
}

/// One-time congratulation for the winner of the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerNotice {
    pub round: u64,
    pub winner: Address,
    pub pot_display: String,
}

impl WinnerNotice {
    pub fn message(&self) -> String {
        format!(
            "{:#x} won {} Ether! Congratulations 🥳",
            self.winner, self.pot_display
        )
    }
}

// ==================== TRANSACTIONS ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}
