use crate::config::{ClientSettings, TomlConfig};
use crate::domain::model::{SearchForm, Source};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "botleads")]
#[command(about = "Terminal client for the BotLeads lead-search service")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Server base URL (overrides the config file)")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Directory for exported spreadsheets")]
    pub output_path: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check that the server is reachable
    Health,
    /// List states, optionally filtered by name or abbreviation
    Regions {
        #[arg(long)]
        filter: Option<String>,
    },
    /// List the municipalities of a state
    Municipalities {
        #[arg(long)]
        region: String,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Suggest neighborhood names inside a municipality
    Neighborhoods {
        #[arg(long)]
        region: String,
        #[arg(long)]
        municipality: String,
        query: String,
    },
    /// Search leads and optionally export them
    Search(SearchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub region: String,

    #[arg(long)]
    pub municipality: String,

    #[arg(long)]
    pub neighborhood: Option<String>,

    #[arg(long)]
    pub kind: String,

    #[arg(long, value_delimiter = ',', help = "google_maps, facebook, instagram")]
    pub sources: Vec<String>,

    #[arg(long, help = "Include results without a phone number")]
    pub any_phone: bool,

    #[arg(long, help = "Download the results as an .xlsx spreadsheet")]
    pub export: bool,

    #[arg(long, help = "Also write the results to a local CSV file")]
    pub csv: Option<String>,

    #[arg(long, help = "Write the rendered result cards to an HTML fragment")]
    pub html: Option<PathBuf>,
}

impl SearchArgs {
    pub fn to_form(&self, defaults: &SearchForm) -> Result<SearchForm> {
        let sources = if self.sources.is_empty() {
            defaults.sources.clone()
        } else {
            self.sources
                .iter()
                .map(|s| s.parse::<Source>())
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SearchForm {
            region: self.region.clone(),
            municipality: self.municipality.clone(),
            neighborhood: self.neighborhood.clone().unwrap_or_default(),
            kind: self.kind.clone(),
            phone_required: defaults.phone_required && !self.any_phone,
            sources,
        })
    }
}

impl CliConfig {
    /// 設定檔優先序：命令列 > TOML 檔 > 內建預設
    pub fn settings(&self) -> Result<ClientSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                file.settings()?
            }
            None => ClientSettings::default(),
        };

        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(output_path) = &self.output_path {
            settings.output_path = output_path.clone();
        }
        Ok(settings)
    }
}
