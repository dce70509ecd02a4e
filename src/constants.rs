/// Application constants

// Contract sentinel for "no value set"
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// Participation
pub const ENTRY_FEE_ETHER: &str = "0.01";
pub const MIN_PARTICIPANTS: usize = 3;

// Result finalization wait
pub const RESULT_WAIT_SECS: u64 = 120;
pub const RESULT_TICK_SECS: u64 = 1;

// Networks
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

// Server
pub const DEFAULT_RELAY_PORT: u16 = 3001;
