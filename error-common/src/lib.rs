//! Common error reporting utilities for the ledger engine
//!
//! Every failure that crosses a crate boundary is rendered as an
//! [`ErrorReport`]: a serializable object with a stable error code, a
//! category, a human-readable message and enough context (entry id,
//! account code, computed delta) to diagnose the problem without
//! re-deriving it.
//!
//! # Error Categories
//!
//! - **Validation**: a proposed journal entry was rejected before any write
//! - **Structural**: the chart of accounts is inconsistent
//! - **NotFound**: an unknown account code was queried
//! - **Computation**: a guarded arithmetic edge case
//! - **Storage**: the ledger store failed to read or write
//! - **Configuration**: configuration could not be loaded or is invalid
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ErrorContext, ErrorKind, ErrorReport};
//!
//! let report = ErrorReport::new(
//!     ErrorKind::Validation,
//!     codes::validation::UNBALANCED_ENTRY,
//!     "entry is unbalanced",
//! )
//! .with_context(ErrorContext::new().with_delta(1000));
//!
//! assert_eq!(report.code, "LEDGER_1002");
//! assert_eq!(report.context.delta, Some(1000));
//! ```

pub mod types;
pub mod context;
pub mod codes;
pub mod reporting;

pub use types::*;
pub use context::*;
pub use reporting::*;
