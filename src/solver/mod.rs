//! The HOST search: a rooted spanning arborescence of minimal cost under hard
//! exclusivity constraints and higher-order cost terms.
mod arborescence;
pub mod config;
pub mod search;
mod state;

pub use config::SearchConfig;
pub use search::{HostSearch, SearchOutcome, SearchPhase};
