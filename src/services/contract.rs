use ethers::{
    contract::{abigen, ContractError, EthError},
    middleware::SignerMiddleware,
    providers::{
        Http, JsonRpcClient, JsonRpcError, Middleware, MiddlewareError, PendingTransaction,
        Provider,
    },
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, Transaction, TransactionRequest, U256, U64},
    utils::rlp,
};
use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::TxOutcome,
    utils::parse_address,
};

abigen!(
    LotteryAbi,
    r#"[
        function organizer() view returns (address)
        function getCollectedFunds() view returns (uint256)
        function getParticipantsList() view returns (address[])
        function lotteryRound() view returns (uint256)
        function lotteryWinners(uint256) view returns (address)
        function getLotteryResults()
        function setNewOrganizer()
    ]"#
);

/// Read/write surface of the external lottery contract.
#[async_trait::async_trait]
pub trait LotteryContract: Send + Sync {
    fn address(&self) -> Address;

    /// Account that signs `enter`, `get_lottery_results` and `set_new_organizer`.
    fn signer_address(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;

    async fn organizer(&self) -> Result<Address>;

    async fn collected_funds(&self) -> Result<U256>;

    async fn participants(&self) -> Result<Vec<Address>>;

    async fn lottery_round(&self) -> Result<u64>;

    async fn lottery_winner(&self, round: u64) -> Result<Address>;

    /// Plain value transfer to the contract, signed by the configured wallet.
    async fn enter(&self, value: U256) -> Result<TxOutcome>;

    /// Simulates, then broadcasts, a transaction signed elsewhere.
    async fn submit_raw(&self, raw: Bytes) -> Result<TxOutcome>;

    async fn get_lottery_results(&self) -> Result<TxOutcome>;

    async fn set_new_organizer(&self) -> Result<TxOutcome>;
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// `LotteryContract` backed by an HTTP JSON-RPC provider and a local wallet.
pub struct EthersLottery {
    client: Arc<SignerClient>,
    contract: LotteryAbi<SignerClient>,
    address: Address,
}

impl EthersLottery {
    pub async fn connect(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.ethereum_rpc_url.trim())
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let chain_id = provider.get_chainid().await.map_err(rpc_error)?;

        let wallet = config
            .lottery_private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| AppError::Config(format!("Invalid signing key: {}", e)))?
            .with_chain_id(chain_id.as_u64());

        let address = parse_address(&config.lottery_contract_address)?;
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = LotteryAbi::new(address, client.clone());

        tracing::info!(
            "Connected to lottery {:#x} on chain {} as {:#x}",
            address,
            chain_id,
            client.address()
        );

        Ok(Self {
            client,
            contract,
            address,
        })
    }
}

fn contract_error<M: Middleware>(err: ContractError<M>) -> AppError {
    match err.decode_revert::<String>() {
        Some(reason) => AppError::Revert(reason),
        None => AppError::BlockchainRpc(err.to_string()),
    }
}

/// Revert reason carried as ABI-encoded `Error(string)` in a JSON-RPC error's `data`.
fn revert_reason(response: &JsonRpcError) -> Option<String> {
    let data = response.as_revert_data()?;
    String::decode_with_selector(&data)
}

fn rpc_error<E: MiddlewareError>(err: E) -> AppError {
    match err.as_error_response().and_then(revert_reason) {
        Some(reason) => AppError::Revert(reason),
        None => AppError::BlockchainRpc(err.to_string()),
    }
}

/// Rebuilds a call request from a pre-signed transaction so it can be simulated.
fn presigned_call(raw: &Bytes) -> Result<TransactionRequest> {
    let tx: Transaction = rlp::decode(raw.as_ref())
        .map_err(|e| AppError::BadRequest(format!("signed_tx is not a signed transaction: {}", e)))?;
    let from = tx
        .recover_from()
        .map_err(|e| AppError::BadRequest(format!("signed_tx signature is invalid: {}", e)))?;

    let mut request = TransactionRequest::new()
        .from(from)
        .value(tx.value)
        .data(tx.input.clone());
    if let Some(to) = tx.to {
        request = request.to(to);
    }
    Ok(request)
}

fn round_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(AppError::BlockchainRpc(format!(
            "lottery round {} does not fit in u64",
            value
        )));
    }
    Ok(value.as_u64())
}

async fn confirm<P: JsonRpcClient>(
    pending: PendingTransaction<'_, P>,
    label: &str,
) -> Result<TxOutcome> {
    let tx_hash = *pending;
    tracing::info!("{} submitted: {:#x}", label, tx_hash);

    let receipt = pending
        .await
        .map_err(rpc_error)?
        .ok_or_else(|| AppError::TransactionDropped(format!("{} {:#x}", label, tx_hash)))?;

    if receipt.status == Some(U64::zero()) {
        return Err(AppError::BlockchainRpc(format!(
            "{} transaction {:#x} reverted",
            label, receipt.transaction_hash
        )));
    }

    Ok(TxOutcome {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()),
    })
}

#[async_trait::async_trait]
impl LotteryContract for EthersLottery {
    fn address(&self) -> Address {
        self.address
    }

    fn signer_address(&self) -> Address {
        self.client.address()
    }

    async fn chain_id(&self) -> Result<u64> {
        self.client
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(rpc_error)
    }

    async fn organizer(&self) -> Result<Address> {
        self.contract.organizer().call().await.map_err(contract_error)
    }

    async fn collected_funds(&self) -> Result<U256> {
        self.contract
            .get_collected_funds()
            .call()
            .await
            .map_err(contract_error)
    }

    async fn participants(&self) -> Result<Vec<Address>> {
        self.contract
            .get_participants_list()
            .call()
            .await
            .map_err(contract_error)
    }

    async fn lottery_round(&self) -> Result<u64> {
        let round = self
            .contract
            .lottery_round()
            .call()
            .await
            .map_err(contract_error)?;
        round_to_u64(round)
    }

    async fn lottery_winner(&self, round: u64) -> Result<Address> {
        self.contract
            .lottery_winners(U256::from(round))
            .call()
            .await
            .map_err(contract_error)
    }

    async fn enter(&self, value: U256) -> Result<TxOutcome> {
        let tx = TransactionRequest::new()
            .from(self.client.address())
            .to(self.address)
            .value(value);

        // Simulate first so a revert surfaces before anything is broadcast.
        self.client
            .call(&tx.clone().into(), None)
            .await
            .map_err(rpc_error)?;

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(rpc_error)?;
        confirm(pending, "participate").await
    }

    async fn submit_raw(&self, raw: Bytes) -> Result<TxOutcome> {
        let request = presigned_call(&raw)?;
        self.client
            .call(&request.into(), None)
            .await
            .map_err(rpc_error)?;

        let pending = self
            .client
            .send_raw_transaction(raw)
            .await
            .map_err(rpc_error)?;
        confirm(pending, "participate (pre-signed)").await
    }

    async fn get_lottery_results(&self) -> Result<TxOutcome> {
        let call = self.contract.get_lottery_results();
        call.call().await.map_err(contract_error)?;
        let pending = call.send().await.map_err(contract_error)?;
        confirm(pending, "getLotteryResults").await
    }

    async fn set_new_organizer(&self) -> Result<TxOutcome> {
        let call = self.contract.set_new_organizer();
        call.call().await.map_err(contract_error)?;
        let pending = call.send().await.map_err(contract_error)?;
        confirm(pending, "setNewOrganizer").await
    }
}
