#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::SearchForm;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// 自動完成的時間參數（毫秒）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteTimings {
    pub region_debounce: Duration,
    pub municipality_debounce: Duration,
    pub neighborhood_debounce: Duration,
    pub blur_grace: Duration,
    pub min_query_chars: usize,
}

impl Default for AutocompleteTimings {
    fn default() -> Self {
        Self {
            region_debounce: Duration::from_millis(300),
            municipality_debounce: Duration::from_millis(300),
            neighborhood_debounce: Duration::from_millis(500),
            blur_grace: Duration::from_millis(200),
            min_query_chars: 2,
        }
    }
}

/// 執行時使用的完整設定，由 TOML 檔與命令列合併而來
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub output_path: String,
    pub timings: AutocompleteTimings,
    pub form_defaults: SearchForm,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            timings: AutocompleteTimings::default(),
            form_defaults: SearchForm::default(),
        }
    }
}

impl Validate for ClientSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("server.base_url", &self.base_url)?;
        validation::validate_path("export.output_path", &self.output_path)?;
        validation::validate_range("server.timeout_seconds", self.timeout.as_secs(), 1, 600)?;

        let timings = [
            ("autocomplete.region_debounce_ms", self.timings.region_debounce),
            (
                "autocomplete.municipality_debounce_ms",
                self.timings.municipality_debounce,
            ),
            (
                "autocomplete.neighborhood_debounce_ms",
                self.timings.neighborhood_debounce,
            ),
            ("autocomplete.blur_grace_ms", self.timings.blur_grace),
        ];
        for (field, value) in timings {
            validation::validate_range(field, value.as_millis() as u64, 0, 10_000)?;
        }

        validation::validate_positive_number(
            "autocomplete.min_query_chars",
            self.timings.min_query_chars,
            1,
        )?;
        Ok(())
    }
}
