use crate::config::{
    AutocompleteTimings, ClientSettings, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECONDS,
};
use crate::domain::model::{SearchForm, Source};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub autocomplete: Option<AutocompleteConfig>,
    pub export: Option<ExportConfig>,
    pub search: Option<SearchDefaultsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutocompleteConfig {
    pub region_debounce_ms: Option<u64>,
    pub municipality_debounce_ms: Option<u64>,
    pub neighborhood_debounce_ms: Option<u64>,
    pub blur_grace_ms: Option<u64>,
    pub min_query_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDefaultsConfig {
    pub default_sources: Option<Vec<String>>,
    pub phone_required_default: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LeadError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LeadError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BOTLEADS_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LeadError::Config {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timings(&self) -> AutocompleteTimings {
        let defaults = AutocompleteTimings::default();
        let Some(cfg) = &self.autocomplete else {
            return defaults;
        };

        AutocompleteTimings {
            region_debounce: cfg
                .region_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.region_debounce),
            municipality_debounce: cfg
                .municipality_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.municipality_debounce),
            neighborhood_debounce: cfg
                .neighborhood_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.neighborhood_debounce),
            blur_grace: cfg
                .blur_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.blur_grace),
            min_query_chars: cfg.min_query_chars.unwrap_or(defaults.min_query_chars),
        }
    }

    /// 取得表單預設值（來源清單、是否只要有電話的結果）
    pub fn form_defaults(&self) -> Result<SearchForm> {
        let mut form = SearchForm::default();
        if let Some(search) = &self.search {
            if let Some(sources) = &search.default_sources {
                form.sources = sources
                    .iter()
                    .map(|s| s.parse::<Source>())
                    .collect::<Result<Vec<_>>>()?;
            }
            if let Some(phone_required) = search.phone_required_default {
                form.phone_required = phone_required;
            }
        }
        Ok(form)
    }

    pub fn output_path(&self) -> &str {
        self.export
            .as_ref()
            .and_then(|e| e.output_path.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    pub fn settings(&self) -> Result<ClientSettings> {
        Ok(ClientSettings {
            base_url: self.server.base_url.clone(),
            timeout: Duration::from_secs(
                self.server.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ),
            output_path: self.output_path().to_string(),
            timings: self.timings(),
            form_defaults: self.form_defaults()?,
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.base_url", &self.server.base_url)?;

        // 寫了 [export] 區段就必須給 output_path
        if let Some(export) = &self.export {
            let output_path =
                validation::validate_required_field("export.output_path", &export.output_path)?;
            validation::validate_non_empty_string("export.output_path", output_path)?;
        }

        self.settings()?.validate()
    }
}
