// Contractor Lookup - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod contracts;
pub mod data;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod profile;
pub mod session;

// Re-export commonly used types
pub use config::{init_logging, DataArgs};
pub use contracts::{
    aggregate, format_currency, normalize_amount,
    ContractLine, ContractSummary, ContractsOutcome,
};
pub use data::{ContractRow, Dataset, RegistryRow};
pub use engine::{LookupEngine, SearchOutcome};
pub use error::{LookupError, LookupResult};
pub use matcher::{Query, RegistryMatcher, SubstringMatcher};
pub use profile::{BusinessProfile, Violation};
pub use session::{SearchStatus, Session, SessionId, SessionStore, SessionView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
