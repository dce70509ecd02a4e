// All service modules
pub mod contract;
pub mod countdown;
pub mod dispatcher;
pub mod network;
pub mod reconciler;
pub mod revert;
pub mod session;

// Re-export for convenience
pub use contract::{EthersLottery, LotteryContract};
pub use countdown::ResultCountdown;
pub use dispatcher::LotteryDispatcher;
pub use reconciler::{reconcile, DedupePolicy, HistoryLog, ReconcilePass};
pub use revert::{classify, LotteryFailure, RevertKind};
pub use session::{LotterySession, SharedSession};
