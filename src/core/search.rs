use crate::core::render::lead_cards;
use crate::domain::model::{Lead, SearchForm, SearchRequest, SearchResponse};
use crate::domain::ports::{ExportState, LeadApi, ResultsView, Storage, SubmitState};
use crate::utils::error::{LeadError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const REQUIRED_FIELDS_ERROR: &str =
    "Por favor, preencha todos os campos obrigatórios (Estado, Município e Tipo de estabelecimento).";
pub const NO_SOURCE_ERROR: &str =
    "Por favor, selecione pelo menos uma fonte de busca (Google Maps, Facebook ou Instagram).";
pub const SEARCH_FALLBACK_ERROR: &str = "Erro ao buscar leads. Tente novamente.";
pub const EXPORT_FALLBACK_ERROR: &str = "Erro ao exportar para Excel. Tente novamente.";
pub const NOTHING_TO_EXPORT: &str = "Nenhum lead para exportar.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Invalid(String),
    Empty,
    Found(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Nothing,
    Saved { path: String, bytes: usize },
    Failed(String),
}

/// 送出前的檢查：州、市、類型不可空白，且至少勾選一個來源
pub fn validate_form(form: &SearchForm) -> Result<()> {
    if form.region.trim().is_empty()
        || form.municipality.trim().is_empty()
        || form.kind.trim().is_empty()
    {
        return Err(LeadError::Validation {
            message: REQUIRED_FIELDS_ERROR.to_string(),
        });
    }

    if form.sources.is_empty() {
        return Err(LeadError::Validation {
            message: NO_SOURCE_ERROR.to_string(),
        });
    }
    Ok(())
}

/// `leads_2025-01-31T14-05-09.xlsx`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("leads_{}.xlsx", now.format("%Y-%m-%dT%H-%M-%S"))
}

pub struct SearchController<V: ResultsView, S: Storage> {
    api: Arc<dyn LeadApi>,
    view: V,
    storage: S,
    defaults: SearchForm,
    state: SubmitState,
    current_leads: Vec<Lead>,
}

impl<V: ResultsView, S: Storage> SearchController<V, S> {
    pub fn new(api: Arc<dyn LeadApi>, view: V, storage: S, defaults: SearchForm) -> Self {
        Self {
            api,
            view,
            storage,
            defaults,
            state: SubmitState::Idle,
            current_leads: Vec::new(),
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn leads(&self) -> &[Lead] {
        &self.current_leads
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn submit(&mut self, form: &SearchForm) -> SearchOutcome {
        self.view.hide_error();
        self.view.clear_results();

        if let Err(e) = validate_form(form) {
            let message = e.user_message(REQUIRED_FIELDS_ERROR);
            self.view.show_error(&message);
            return SearchOutcome::Invalid(message);
        }

        self.state = SubmitState::Searching;
        self.view.set_loading(true);
        self.view.set_submit_state(SubmitState::Searching);

        let request = SearchRequest::from(form);
        tracing::info!(
            "🔍 Buscando '{}' em {} / {}",
            request.tipo,
            request.municipio,
            request.estado
        );

        let outcome = match self.api.search(&request).await {
            Ok(response) => self.display_results(response),
            Err(e) => {
                tracing::error!("❌ Search failed: {} (Category: {:?})", e, e.category());
                let message = e.user_message(SEARCH_FALLBACK_ERROR);
                self.view.show_error(&message);
                SearchOutcome::Failed(message)
            }
        };

        self.view.set_loading(false);
        self.state = SubmitState::Idle;
        self.view.set_submit_state(SubmitState::Idle);
        outcome
    }

    fn display_results(&mut self, response: SearchResponse) -> SearchOutcome {
        let leads = match response.leads {
            Some(leads) if response.sucesso && !leads.is_empty() => leads,
            _ => {
                self.current_leads.clear();
                self.view.render_empty_state();
                self.view.set_export_state(ExportState::Hidden);
                return SearchOutcome::Empty;
            }
        };

        let total = response.total.unwrap_or(leads.len());
        tracing::info!("✅ {} lead(s) encontrado(s)", total);

        self.view
            .set_results_count(&format!("{} lead(s) encontrado(s)", total));
        self.view.set_export_state(ExportState::Ready);
        self.render_results(&leads);
        self.current_leads = leads;
        SearchOutcome::Found(total)
    }

    pub fn render_results(&mut self, leads: &[Lead]) {
        let cards = lead_cards(leads);
        self.view.render_cards(&cards);
        self.view.scroll_to_results();
    }

    /// 回到預設值，回傳重設後的表單
    pub fn reset(&mut self) -> SearchForm {
        self.view.reset_form(&self.defaults);
        self.view.hide_error();
        self.view.clear_results();
        self.current_leads.clear();
        self.view.set_export_state(ExportState::Hidden);
        self.defaults.clone()
    }

    pub async fn export(&mut self) -> ExportOutcome {
        if self.current_leads.is_empty() {
            self.view.show_error(NOTHING_TO_EXPORT);
            return ExportOutcome::Nothing;
        }

        self.view.set_export_state(ExportState::Exporting);
        let outcome = match self.download_export().await {
            Ok((path, bytes)) => {
                tracing::info!("📁 Planilha salva em: {} ({} bytes)", path, bytes);
                ExportOutcome::Saved { path, bytes }
            }
            Err(e) => {
                tracing::error!("❌ Export failed: {}", e);
                let message = e.user_message(EXPORT_FALLBACK_ERROR);
                self.view.show_error(&message);
                ExportOutcome::Failed(message)
            }
        };
        self.view.set_export_state(ExportState::Ready);
        outcome
    }

    async fn download_export(&self) -> Result<(String, usize)> {
        let bytes = self.api.export_excel(&self.current_leads).await?;
        let filename = export_filename(Utc::now());
        let path = self.storage.write_file(&filename, &bytes).await?;
        Ok((path, bytes.len()))
    }

    /// 離線備份：在本地寫出與試算表相同欄位的 CSV
    pub async fn export_csv(&mut self, filename: &str) -> Result<String> {
        if self.current_leads.is_empty() {
            self.view.show_error(NOTHING_TO_EXPORT);
            return Err(LeadError::EmptyExport);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Nome",
            "Endereço",
            "Telefone",
            "Latitude",
            "Longitude",
            "Tipo",
            "Fonte",
        ])?;
        for lead in &self.current_leads {
            writer.write_record([
                lead.name.clone(),
                lead.address.clone(),
                lead.phone.clone().unwrap_or_else(|| "N/A".to_string()),
                lead.latitude.map(|v| format!("{:.6}", v)).unwrap_or_default(),
                lead.longitude.map(|v| format!("{:.6}", v)).unwrap_or_default(),
                lead.kind.clone(),
                lead.source.clone().unwrap_or_else(|| "Google Maps".to_string()),
            ])?;
        }
        let data = writer.into_inner().map_err(|e| LeadError::Io(e.into_error()))?;

        let path = self.storage.write_file(filename, &data).await?;
        tracing::info!("📁 CSV salvo em: {}", path);
        Ok(path)
    }
}
