// src/models/mod.rs
pub mod lottery;

pub use lottery::{ContractSnapshot, TxOutcome, WinnerNotice, WinnerRecord};
