/// Default reporting currency
pub const DEFAULT_BASE_CURRENCY: &str = "CAD";

/// Exchange suffix appended to symbols listed on the Toronto exchange
pub const DEFAULT_MARKET_SUFFIX: &str = ".TO";

/// Currency whose listings carry the market suffix
pub const DEFAULT_SUFFIX_CURRENCY: &str = "CAD";

/// Currency of the second share class reached by journalling
pub const DEFAULT_JOURNAL_CURRENCY: &str = "USD";

/// Suffix that marks the USD share class of a dual-listed fund
pub const DEFAULT_DUAL_CLASS_SUFFIX: &str = "-U";

/// Funds that trade in both a CAD and a USD share class
pub const DEFAULT_DUAL_CLASS_SYMBOLS: [&str; 2] = ["DLR", "ZSP"];

/// Currencies every ledger starts with at a zero balance
pub const DEFAULT_CASH_CURRENCIES: [&str; 2] = ["CAD", "USD"];

/// Shares of underlying per option contract
pub const DEFAULT_OPTION_CONTRACT_MULTIPLIER: i64 = 100;

/// Days an oracle lookup may step back over market holidays and data gaps
pub const DEFAULT_MAX_LOOKUP_STEP_BACK_DAYS: u32 = 7;

/// Replay logs progress once per this many transactions
pub const REPLAY_PROGRESS_INTERVAL: usize = 50;
