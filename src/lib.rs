pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{AutocompleteTimings, ClientSettings, TomlConfig};

pub use adapters::{http::HttpLeadApi, storage::LocalStorage};
pub use core::{
    cascade::{CascadeController, CascadeEvent},
    search::{ExportOutcome, SearchController, SearchOutcome},
};
pub use utils::error::{LeadError, Result};
