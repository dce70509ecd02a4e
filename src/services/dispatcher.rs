use std::sync::Arc;
use std::time::Duration;

use crate::{
    constants::{MIN_PARTICIPANTS, RESULT_TICK_SECS},
    models::TxOutcome,
    utils::entry_fee_wei,
};

use super::contract::LotteryContract;
use super::countdown::ResultCountdown;
use super::network::ensure_network;
use super::revert::{
    classify, LotteryFailure, RevertKind, PARTICIPATE_REVERTS, RESULTS_REVERTS, ROTATE_REVERTS,
};
use super::session::SharedSession;

/// Sends lottery transactions for one connected wallet and keeps its session in sync.
pub struct LotteryDispatcher {
    contract: Arc<dyn LotteryContract>,
    session: SharedSession,
    result_wait: Duration,
}

impl LotteryDispatcher {
    /// Checks the network, then runs the initial reconciliation for the new contract handle.
    pub async fn connect(
        contract: Arc<dyn LotteryContract>,
        session: SharedSession,
        expected_chain_id: u64,
        result_wait: Duration,
    ) -> Result<Self, LotteryFailure> {
        ensure_network(contract.as_ref(), expected_chain_id).await?;
        session.lock().await.refresh(false).await;

        Ok(Self {
            contract,
            session,
            result_wait,
        })
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// Sends the fixed entry fee to the contract.
    pub async fn participate(&self) -> Result<TxOutcome, LotteryFailure> {
        let fee = entry_fee_wei().map_err(|e| LotteryFailure::Unknown(e.raw_message()))?;

        let outcome = self
            .contract
            .enter(fee)
            .await
            .map_err(|e| classify(&e, PARTICIPATE_REVERTS))?;
        tracing::info!(
            "The transaction hash for participating in lottery is {:#x}",
            outcome.tx_hash
        );

        self.session.lock().await.refresh(false).await;
        Ok(outcome)
    }

    /// Asks the contract to draw a winner and starts the wait for the result.
    pub async fn request_results(&self) -> Result<ResultCountdown, LotteryFailure> {
        let participants = self
            .contract
            .participants()
            .await
            .map_err(|e| classify(&e, RESULTS_REVERTS))?;
        if participants.len() < MIN_PARTICIPANTS {
            return Err(LotteryFailure::Known(RevertKind::NotEnoughParticipants));
        }

        let outcome = self
            .contract
            .get_lottery_results()
            .await
            .map_err(|e| classify(&e, RESULTS_REVERTS))?;
        tracing::info!(
            "Random number request {:#x} mined; waiting {}s for the result",
            outcome.tx_hash,
            self.result_wait.as_secs()
        );

        Ok(ResultCountdown::start(
            self.session.clone(),
            outcome,
            self.result_wait,
            Duration::from_secs(RESULT_TICK_SECS),
        ))
    }

    /// Rotates the organizer, which also opens the next round.
    pub async fn rotate_organizer(&self) -> Result<TxOutcome, LotteryFailure> {
        let outcome = self
            .contract
            .set_new_organizer()
            .await
            .map_err(|e| classify(&e, ROTATE_REVERTS))?;
        tracing::info!("New organizer set in {:#x}", outcome.tx_hash);

        self.session.lock().await.refresh(false).await;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{RESULT_WAIT_SECS, SEPOLIA_CHAIN_ID};
    use crate::services::contract::mock::{addr, MockLottery};
    use crate::services::reconciler::DedupePolicy;
    use crate::services::session::LotterySession;
    use tokio::time::Instant;

    async fn dispatcher(mock: Arc<MockLottery>) -> LotteryDispatcher {
        let session = LotterySession::new(mock.clone(), DedupePolicy::ByRound).shared();
        LotteryDispatcher::connect(
            mock,
            session,
            SEPOLIA_CHAIN_ID,
            Duration::from_secs(RESULT_WAIT_SECS),
        )
        .await
        .expect("connect")
    }

    #[tokio::test]
    async fn connect_rejects_wrong_network_before_reading() {
        let mock = Arc::new(MockLottery::new(1).with_chain_id(1));
        let session = LotterySession::new(mock.clone(), DedupePolicy::ByRound).shared();

        let result = LotteryDispatcher::connect(
            mock.clone(),
            session,
            SEPOLIA_CHAIN_ID,
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(LotteryFailure::WrongNetwork { .. })));
        assert_eq!(mock.calls(), vec!["chain_id".to_string()]);
    }

    #[tokio::test]
    async fn connect_runs_initial_refresh() {
        let mock = Arc::new(MockLottery::new(1).with_winner(1, addr(0x11)));
        let dispatcher = dispatcher(mock).await;

        let session = dispatcher.session();
        let session = session.lock().await;
        assert_eq!(session.snapshot().map(|s| s.round), Some(1));
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn participate_refreshes_after_mining() {
        let mock = Arc::new(MockLottery::new(1));
        let dispatcher = dispatcher(mock.clone()).await;

        dispatcher.participate().await.expect("participate");

        assert_eq!(mock.count_calls("enter"), 1);
        assert_eq!(mock.count_calls("lottery_round"), 2);
    }

    #[tokio::test]
    async fn participate_classifies_organizer_revert() {
        let mock = Arc::new(MockLottery::new(1));
        let dispatcher = dispatcher(mock.clone()).await;
        mock.fail_rpc(
            "enter",
            "execution reverted: Organizer cannot participate",
        );

        let err = dispatcher.participate().await.unwrap_err();
        assert_eq!(err.to_string(), "Organizer cannot participate");
        assert_eq!(mock.count_calls("lottery_round"), 1);
    }

    #[tokio::test]
    async fn participate_passes_unknown_errors_through() {
        let mock = Arc::new(MockLottery::new(1));
        let dispatcher = dispatcher(mock.clone()).await;
        mock.fail_rpc("enter", "foo bar");

        let err = dispatcher.participate().await.unwrap_err();
        assert_eq!(err, LotteryFailure::Unknown("foo bar".to_string()));
    }

    #[tokio::test]
    async fn participate_maps_not_started() {
        let mock = Arc::new(MockLottery::new(0));
        let dispatcher = dispatcher(mock.clone()).await;
        mock.fail_revert(
            "enter",
            "Lottery is not yet started. Please choose an organizer.",
        );

        let err = dispatcher.participate().await.unwrap_err();
        assert_eq!(err.kind(), Some(RevertKind::NotStarted));
    }

    #[tokio::test]
    async fn results_need_three_participants() {
        let mock = Arc::new(MockLottery::new(1).with_participants(vec![addr(1), addr(2)]));
        let dispatcher = dispatcher(mock.clone()).await;

        let err = dispatcher.request_results().await.unwrap_err();
        assert_eq!(err.to_string(), "Lottery must have at least 3 participants");
        assert_eq!(mock.count_calls("get_lottery_results"), 0);
    }

    #[tokio::test]
    async fn results_classify_only_organizer() {
        let mock = Arc::new(
            MockLottery::new(1).with_participants(vec![addr(1), addr(2), addr(3)]),
        );
        let dispatcher = dispatcher(mock.clone()).await;
        mock.fail_revert("get_lottery_results", "Only the organizer can get the results");

        let err = dispatcher.request_results().await.unwrap_err();
        assert_eq!(err.kind(), Some(RevertKind::OnlyOrganizer));
    }

    #[tokio::test(start_paused = true)]
    async fn results_reconcile_with_notice_after_wait() {
        let mock = Arc::new(
            MockLottery::new(1).with_participants(vec![addr(1), addr(2), addr(3)]),
        );
        let dispatcher = dispatcher(mock.clone()).await;
        let rounds_before = mock.count_calls("lottery_round");

        let countdown = dispatcher.request_results().await.expect("request");
        let confirmed_at = Instant::now();
        // Winner drawn while the countdown runs.
        mock.set_winner(1, addr(0x22));

        let snapshot = countdown.finished().await.expect("snapshot");
        let waited = confirmed_at.elapsed();
        assert!(waited >= Duration::from_secs(RESULT_WAIT_SECS));
        assert!(waited < Duration::from_secs(RESULT_WAIT_SECS + RESULT_TICK_SECS));
        assert_eq!(snapshot.round, 1);
        assert_eq!(mock.count_calls("lottery_round"), rounds_before + 1);

        let session = dispatcher.session();
        let notice = session.lock().await.take_notice().expect("notice");
        assert_eq!(notice.winner, addr(0x22));
    }

    #[tokio::test]
    async fn rotate_classifies_mid_round_revert() {
        let mock = Arc::new(MockLottery::new(1));
        let dispatcher = dispatcher(mock.clone()).await;
        mock.fail_revert(
            "set_new_organizer",
            "Cannot change organizer in the middle of a lottery",
        );

        let err = dispatcher.rotate_organizer().await.unwrap_err();
        assert_eq!(err.kind(), Some(RevertKind::OrganizerChangeMidRound));
    }

    #[tokio::test]
    async fn rotate_refreshes_on_success() {
        let mock = Arc::new(MockLottery::new(1));
        let dispatcher = dispatcher(mock.clone()).await;

        dispatcher.rotate_organizer().await.expect("rotate");
        assert_eq!(mock.count_calls("set_new_organizer"), 1);
        assert_eq!(mock.count_calls("lottery_round"), 2);
    }
}
