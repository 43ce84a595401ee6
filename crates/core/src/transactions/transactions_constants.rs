// Activity types
//
// Each constant is one value of the export's "Activity Type" column.

/// Cash paid into the account from outside. External flow.
pub const ACTIVITY_TYPE_DEPOSITS: &str = "Deposits";

/// Cash dividend paid into the account.
pub const ACTIVITY_TYPE_DIVIDENDS: &str = "Dividends";

/// One leg of a currency conversion. Each leg books to its own currency.
pub const ACTIVITY_TYPE_FX_CONVERSION: &str = "FX conversion";

/// Cash paid out of the account. External flow.
pub const ACTIVITY_TYPE_WITHDRAWALS: &str = "Withdrawals";

/// Equity or option buy/sell. Signed quantity, cash moves by net amount.
pub const ACTIVITY_TYPE_TRADES: &str = "Trades";

/// Cash or in-kind movement to/from another account. External flow.
pub const ACTIVITY_TYPE_TRANSFERS: &str = "Transfers";

/// Expiries, tax on fees, journalling and option adjustments.
pub const ACTIVITY_TYPE_OTHER: &str = "Other";

pub const ACTIVITY_TYPE_FEES_AND_REBATES: &str = "Fees and rebates";

/// Splits, name changes and cash in lieu.
pub const ACTIVITY_TYPE_CORPORATE_ACTIONS: &str = "Corporate actions";

/// Activity types that move money across the account boundary
pub const EXTERNAL_FLOW_ACTIVITY_TYPES: [&str; 3] = [
    ACTIVITY_TYPE_DEPOSITS,
    ACTIVITY_TYPE_WITHDRAWALS,
    ACTIVITY_TYPE_TRANSFERS,
];

// Action codes

/// Transfer in.
pub const ACTION_TRANSFER_IN: &str = "TF6";

/// Transfer out.
pub const ACTION_TRANSFER_OUT: &str = "TFO";

/// Option expiry.
pub const ACTION_OPTION_EXPIRY: &str = "EXP";

/// Tax on fees.
pub const ACTION_TAX_ON_FEES: &str = "GST";

/// Journalling between currency share classes.
pub const ACTION_JOURNAL: &str = "BRW";

/// Option contract adjustment after a split of the underlying.
pub const ACTION_OPTION_ADJUSTMENT: &str = "ADJ";

/// Cash in lieu of fractional shares.
pub const ACTION_CASH_IN_LIEU: &str = "CIL";

/// Reverse split / split.
pub const ACTION_REVERSE_SPLIT: &str = "REV";

/// Name change.
pub const ACTION_NAME_CHANGE: &str = "NAC";

/// Corporate-action codes whose symbols are resolved through a lookup table
pub const SYMBOL_REWRITE_ACTIONS: [&str; 2] = [ACTION_REVERSE_SPLIT, ACTION_NAME_CHANGE];

/// First description word marking an option trade
pub const OPTION_DESCRIPTION_PREFIXES: [&str; 2] = ["PUT", "CALL"];
