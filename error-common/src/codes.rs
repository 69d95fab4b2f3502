// Standardized error codes for the ledger engine

pub mod validation {
    pub const EMPTY_ENTRY: &str = "LEDGER_1001";
    pub const UNBALANCED_ENTRY: &str = "LEDGER_1002";
    pub const INACTIVE_ACCOUNT: &str = "LEDGER_1003";
    pub const SYNTHETIC_ACCOUNT: &str = "LEDGER_1004";
    pub const UNKNOWN_ACCOUNT: &str = "LEDGER_1005";
    pub const INVALID_LINE: &str = "LEDGER_1006";
    pub const AMOUNT_OVERFLOW: &str = "LEDGER_1007";
    pub const INVALID_AMOUNT: &str = "LEDGER_1008";
    pub const INVALID_PERIOD: &str = "LEDGER_1009";
    pub const MALFORMED_REQUEST: &str = "LEDGER_1010";
    pub const MISSING_DESCRIPTION: &str = "LEDGER_1011";
}

pub mod structural {
    pub const CODE_COLLISION: &str = "LEDGER_2001";
    pub const ORPHANED_ACCOUNT: &str = "LEDGER_2002";
    pub const PARENT_NOT_SYNTHETIC: &str = "LEDGER_2003";
    pub const EMPTY_SYNTHETIC: &str = "LEDGER_2004";
    pub const INVALID_CODE: &str = "LEDGER_2005";
    pub const TYPE_MISMATCH: &str = "LEDGER_2006";
}

pub mod lookup {
    pub const UNKNOWN_ACCOUNT_CODE: &str = "LEDGER_3001";
}

pub mod computation {
    pub const GUARDED_DIVISION: &str = "LEDGER_4001";
}

pub mod storage {
    pub const STORE_FAILURE: &str = "LEDGER_5001";
}

pub mod configuration {
    pub const INVALID_CONFIGURATION: &str = "LEDGER_6001";
}
