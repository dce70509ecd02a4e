// Utility helpers shared by the relay and the console

use ethers::types::{Address, Bytes, Transaction, U256};
use ethers::utils::{format_units, parse_ether, rlp};
use std::str::FromStr;

use crate::{
    constants::ENTRY_FEE_ETHER,
    error::{AppError, Result},
};

pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::BadRequest(format!("Invalid address: {}", value)));
    }
    Address::from_str(hex_part).map_err(|e| AppError::BadRequest(format!("Invalid address: {}", e)))
}

pub fn is_null_address(address: &Address) -> bool {
    address.is_zero()
}

/// Checksum-free lowercase `0x` rendering used in envelopes and history.
pub fn format_address(address: &Address) -> String {
    format!("{:#x}", address)
}

/// Fixed participation value in wei.
pub fn entry_fee_wei() -> Result<U256> {
    parse_ether(ENTRY_FEE_ETHER)
        .map_err(|e| AppError::Internal(format!("Invalid entry fee constant: {}", e)))
}

/// Renders a wei amount as ether with trailing zeros trimmed (`30000000000000000` -> `0.03`).
pub fn format_pot(wei: U256) -> String {
    let Ok(raw) = format_units(wei, "ether") else {
        return wei.to_string();
    };
    match raw.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => format!("{raw}.0"),
    }
}

/// Decodes a pre-signed raw transaction, checks it is a participation transfer
/// and returns it with the recovered sender.
pub fn decode_participation(raw_hex: &str, contract: Address, fee: U256) -> Result<(Bytes, Address)> {
    let trimmed = raw_hex.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| AppError::BadRequest(format!("signed_tx is not valid hex: {}", e)))?;

    let tx: Transaction = rlp::decode(&bytes)
        .map_err(|e| AppError::BadRequest(format!("signed_tx is not a signed transaction: {}", e)))?;

    if tx.to != Some(contract) {
        return Err(AppError::BadRequest(
            "signed_tx must be sent to the lottery contract".to_string(),
        ));
    }
    if tx.value != fee {
        return Err(AppError::BadRequest(format!(
            "signed_tx must transfer exactly {} ether",
            ENTRY_FEE_ETHER
        )));
    }

    let participant = tx
        .recover_from()
        .map_err(|e| AppError::BadRequest(format!("signed_tx signature is invalid: {}", e)))?;

    Ok((Bytes::from(bytes), participant))
}

#[cfg(test)]
pub(crate) const TEST_KEY: &str =
    "0x0123456789012345678901234567890123456789012345678901234567890123";

/// Hex of a legacy transfer signed with `TEST_KEY`.
#[cfg(test)]
pub(crate) fn signed_transfer(to: Address, value: U256) -> String {
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::{transaction::eip2718::TypedTransaction, TransactionRequest};

    let wallet: LocalWallet = TEST_KEY.parse().expect("valid key");
    let request = TransactionRequest::new()
        .to(to)
        .value(value)
        .nonce(0u64)
        .gas(21_000u64)
        .gas_price(1_000_000_000u64)
        .chain_id(11_155_111u64);
    let typed: TypedTransaction = request.into();
    let signature = wallet.sign_transaction_sync(&typed).expect("sign");
    format!("0x{}", hex::encode(typed.rlp_signed(&signature)))
}
