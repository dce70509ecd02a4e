use super::contract::LotteryContract;
use super::revert::LotteryFailure;

/// Fails with `WrongNetwork` unless the contract's provider is on `expected`.
pub async fn ensure_network(
    contract: &dyn LotteryContract,
    expected: u64,
) -> Result<(), LotteryFailure> {
    let actual = contract
        .chain_id()
        .await
        .map_err(|e| LotteryFailure::Unknown(e.raw_message()))?;

    if actual != expected {
        tracing::warn!("Connected to chain {}, expected {}", actual, expected);
        return Err(LotteryFailure::WrongNetwork { expected, actual });
    }
    Ok(())
}
