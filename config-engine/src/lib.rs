//! Configuration management for the ledger engine
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults ([`LedgerConfig::default`])
//! 2. a YAML or TOML file (by extension; missing files are skipped)
//! 3. environment variables prefixed `LEDGER_`, `__` separating nested keys
//!    (`LEDGER_OBLIGATIONS__PAYABLES_PREFIXES='["2.1","2.2"]'`)
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigEngine, ConfigSource};
//!
//! let config = ConfigEngine::new()
//!     .add_source(ConfigSource::file("ledger.yaml"))
//!     .add_source(ConfigSource::env())
//!     .load()?;
//! println!("payables under {:?}", config.obligations.payables_prefixes);
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod engine;
pub mod error;
pub mod providers;
pub mod schema;
pub mod templates;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use providers::*;
pub use schema::*;
pub use templates::render_yaml;
