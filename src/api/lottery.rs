use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::MIN_PARTICIPANTS,
    error::{AppError, Result},
    services::revert::{
        classify, RevertKind, PARTICIPATE_REVERTS, RESULTS_REVERTS, ROTATE_REVERTS,
    },
    utils::{decode_participation, entry_fee_wei, format_address, is_null_address},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct OrganizerResponse {
    pub organizer: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryRoundResponse {
    pub lottery_round: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WinnerResponse {
    pub winner: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    #[serde(rename = "Participants")]
    pub participants: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedFundsResponse {
    pub total_funds: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipateRequest {
    /// Hex-encoded signed transaction; the relay wallet enters when absent.
    #[serde(default)]
    pub signed_tx: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParticipateResponse {
    pub participant: String,
    pub tx_hash: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx_hash: String,
    pub message: String,
}

// Relay errors carry the user-facing category when the reason is known.
fn classified(err: AppError, table: &[RevertKind]) -> AppError {
    AppError::BadRequest(classify(&err, table).to_string())
}

fn parse_round(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid lottery round: {}", raw)))
}

/// GET /api/organizer
pub async fn get_organizer(State(state): State<AppState>) -> Result<Json<OrganizerResponse>> {
    let organizer = format_address(&state.lottery.organizer().await?);
    tracing::info!("Organizer : {}", organizer);

    Ok(Json(OrganizerResponse {
        message: format!(
            "\"Organizer: {}\" is fetched successfully from blockchain",
            organizer
        ),
        organizer,
    }))
}

/// GET /api/lotteryRound
pub async fn get_lottery_round(
    State(state): State<AppState>,
) -> Result<Json<LotteryRoundResponse>> {
    let round = state.lottery.lottery_round().await?;
    tracing::info!("Lottery Round : {}", round);

    Ok(Json(LotteryRoundResponse {
        lottery_round: round.to_string(),
        message: format!(
            "\"Lottery Round: {}\" is fetched successfully from blockchain",
            round
        ),
    }))
}

/// GET /api/lotteryWinners/{round}
pub async fn get_lottery_winner(
    State(state): State<AppState>,
    Path(round): Path<String>,
) -> Result<Json<WinnerResponse>> {
    let round = parse_round(&round)?;
    let winner = state.lottery.lottery_winner(round).await?;
    if is_null_address(&winner) {
        return Err(AppError::BadRequest(format!(
            "The Lottery round {} is not completed and winner is not declared",
            round
        )));
    }

    let winner = format_address(&winner);
    tracing::info!("Lottery Winner for round {} is {}", round, winner);

    Ok(Json(WinnerResponse {
        message: format!("Lottery Winner for round {} is {}", round, winner),
        winner,
    }))
}

/// GET /api/getParticipantsList
pub async fn get_participants(
    State(state): State<AppState>,
) -> Result<Json<ParticipantsResponse>> {
    let participants: Vec<String> = state
        .lottery
        .participants()
        .await?
        .iter()
        .map(format_address)
        .collect();
    for participant in &participants {
        tracing::debug!("{}", participant);
    }

    Ok(Json(ParticipantsResponse {
        message: format!(
            "\"Participants: {}\" is fetched successfully from blockchain",
            participants.join(",")
        ),
        participants,
    }))
}

/// GET /api/getCollectedFunds
pub async fn get_collected_funds(
    State(state): State<AppState>,
) -> Result<Json<CollectedFundsResponse>> {
    let total = state.lottery.collected_funds().await?;
    tracing::info!("The total amount collected for this round is {}", total);

    Ok(Json(CollectedFundsResponse {
        total_funds: total.to_string(),
        message: format!(
            "\"Total Fund: {}\" is fetched successfully from blockchain",
            total
        ),
    }))
}

/// POST /api/participate
pub async fn participate(
    State(state): State<AppState>,
    Json(req): Json<ParticipateRequest>,
) -> Result<Json<ParticipateResponse>> {
    let fee = entry_fee_wei()?;

    let (participant, outcome) = match req.signed_tx.as_deref() {
        Some(raw) => {
            let (bytes, participant) = decode_participation(raw, state.lottery.address(), fee)?;
            let outcome = state
                .lottery
                .submit_raw(bytes)
                .await
                .map_err(|e| classified(e, PARTICIPATE_REVERTS))?;
            (participant, outcome)
        }
        None => {
            let outcome = state
                .lottery
                .enter(fee)
                .await
                .map_err(|e| classified(e, PARTICIPATE_REVERTS))?;
            (state.lottery.signer_address(), outcome)
        }
    };

    let participant = format_address(&participant);
    tracing::info!("{} participated in tx {:#x}", participant, outcome.tx_hash);

    Ok(Json(ParticipateResponse {
        message: format!(
            "\"{}\" is successfully participated in the lottery",
            participant
        ),
        participant,
        tx_hash: format!("{:#x}", outcome.tx_hash),
    }))
}

/// POST /api/getLotteryResults
pub async fn get_lottery_results(State(state): State<AppState>) -> Result<Json<TxResponse>> {
    let participants = state.lottery.participants().await?;
    if participants.len() < MIN_PARTICIPANTS {
        return Err(AppError::BadRequest(
            RevertKind::NotEnoughParticipants.reason().to_string(),
        ));
    }

    let outcome = state
        .lottery
        .get_lottery_results()
        .await
        .map_err(|e| classified(e, RESULTS_REVERTS))?;

    Ok(Json(TxResponse {
        tx_hash: format!("{:#x}", outcome.tx_hash),
        message: "Random number request initiated. Wait for the result.".to_string(),
    }))
}

/// POST /api/setNewOrganizer
pub async fn set_new_organizer(State(state): State<AppState>) -> Result<Json<TxResponse>> {
    let outcome = state
        .lottery
        .set_new_organizer()
        .await
        .map_err(|e| classified(e, ROTATE_REVERTS))?;

    Ok(Json(TxResponse {
        tx_hash: format!("{:#x}", outcome.tx_hash),
        message: "New organizer set successfully.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::services::contract::mock::{addr, MockLottery};
    use crate::utils::{signed_transfer, TEST_KEY};
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::U256;
    use std::sync::Arc;

    fn state(mock: Arc<MockLottery>) -> AppState {
        AppState {
            lottery: mock,
            config: test_config(),
        }
    }

    #[tokio::test]
    async fn organizer_envelope_has_message() {
        let mock = Arc::new(MockLottery::new(1));
        let Json(body) = get_organizer(State(state(mock))).await.unwrap();
        assert_eq!(body.organizer, format_address(&addr(0x0a)));
        assert!(body.message.contains("is fetched successfully from blockchain"));
    }

    #[tokio::test]
    async fn round_is_serialized_as_string() {
        let mock = Arc::new(MockLottery::new(7));
        let Json(body) = get_lottery_round(State(state(mock))).await.unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["lotteryRound"], "7");
    }

    #[tokio::test]
    async fn unfinalized_round_is_rejected() {
        let mock = Arc::new(MockLottery::new(2));
        let err = get_lottery_winner(State(state(mock)), Path("2".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err.raw_message(),
            "The Lottery round 2 is not completed and winner is not declared"
        );
    }

    #[tokio::test]
    async fn finalized_round_returns_winner() {
        let mock = Arc::new(MockLottery::new(2).with_winner(1, addr(0x11)));
        let Json(body) = get_lottery_winner(State(state(mock)), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(body.winner, format_address(&addr(0x11)));
    }

    #[tokio::test]
    async fn non_numeric_round_is_bad_request() {
        let mock = Arc::new(MockLottery::new(2));
        let err = get_lottery_winner(State(state(mock.clone())), Path("abc".to_string()))
            .await
            .unwrap_err();
        assert!(err.raw_message().contains("Invalid lottery round"));
        assert_eq!(mock.count_calls("lottery_winner"), 0);
    }

    #[tokio::test]
    async fn participants_field_is_capitalized() {
        let mock = Arc::new(MockLottery::new(1).with_participants(vec![addr(1), addr(2)]));
        let Json(body) = get_participants(State(state(mock))).await.unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Participants"].as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn collected_funds_in_wei() {
        let mock = Arc::new(MockLottery::new(1).with_pot(U256::from(30_000_000_000_000_000u64)));
        let Json(body) = get_collected_funds(State(state(mock))).await.unwrap();
        assert_eq!(body.total_funds, "30000000000000000");
    }

    #[tokio::test]
    async fn participate_without_payload_uses_relay_wallet() {
        let mock = Arc::new(MockLottery::new(1));
        let Json(body) = participate(State(state(mock.clone())), Json(ParticipateRequest::default()))
            .await
            .unwrap();
        assert_eq!(body.participant, format_address(&addr(0x5e)));
        assert_eq!(mock.count_calls("enter"), 1);
    }

    #[tokio::test]
    async fn participate_rejects_malformed_payload() {
        let mock = Arc::new(MockLottery::new(1));
        let req = ParticipateRequest {
            signed_tx: Some("0x1234".to_string()),
        };
        assert!(participate(State(state(mock.clone())), Json(req)).await.is_err());
        assert_eq!(mock.count_calls("submit_raw"), 0);
    }

    #[tokio::test]
    async fn presigned_entry_reports_recovered_participant() {
        let mock = Arc::new(MockLottery::new(1));
        let req = ParticipateRequest {
            signed_tx: Some(signed_transfer(addr(0xaa), entry_fee_wei().unwrap())),
        };
        let Json(body) = participate(State(state(mock.clone())), Json(req)).await.unwrap();

        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        assert_eq!(body.participant, format_address(&wallet.address()));
        assert_eq!(mock.count_calls("submit_raw"), 1);
        assert_eq!(mock.count_calls("enter"), 0);
    }

    #[tokio::test]
    async fn presigned_entry_rejection_is_classified() {
        let mock = Arc::new(MockLottery::new(1));
        mock.fail_revert("submit_raw", "Organizer cannot participate");
        let req = ParticipateRequest {
            signed_tx: Some(signed_transfer(addr(0xaa), entry_fee_wei().unwrap())),
        };
        let err = participate(State(state(mock)), Json(req)).await.unwrap_err();
        assert_eq!(err.raw_message(), "Organizer cannot participate");
    }

    #[tokio::test]
    async fn participate_error_is_classified() {
        let mock = Arc::new(MockLottery::new(1));
        mock.fail_rpc("enter", "execution reverted: Organizer cannot participate");
        let err = participate(State(state(mock)), Json(ParticipateRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.raw_message(), "Organizer cannot participate");
    }

    #[tokio::test]
    async fn results_require_three_participants() {
        let mock = Arc::new(MockLottery::new(1).with_participants(vec![addr(1), addr(2)]));
        let err = get_lottery_results(State(state(mock.clone()))).await.unwrap_err();
        assert_eq!(err.raw_message(), "Lottery must have at least 3 participants");
        assert_eq!(mock.count_calls("get_lottery_results"), 0);
    }

    #[tokio::test]
    async fn results_initiated_message() {
        let mock = Arc::new(
            MockLottery::new(1).with_participants(vec![addr(1), addr(2), addr(3)]),
        );
        let Json(body) = get_lottery_results(State(state(mock))).await.unwrap();
        assert_eq!(body.message, "Random number request initiated. Wait for the result.");
    }

    #[tokio::test]
    async fn rotate_reports_success() {
        let mock = Arc::new(MockLottery::new(1));
        let Json(body) = set_new_organizer(State(state(mock))).await.unwrap();
        assert_eq!(body.message, "New organizer set successfully.");
    }

    #[tokio::test]
    async fn rotate_error_passes_raw_message() {
        let mock = Arc::new(MockLottery::new(1));
        mock.fail_rpc("set_new_organizer", "nonce too low");
        let err = set_new_organizer(State(state(mock))).await.unwrap_err();
        assert_eq!(err.raw_message(), "nonce too low");
    }
}
