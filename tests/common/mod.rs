#![allow(dead_code)]

use async_trait::async_trait;
use botleads_client::core::render::LeadCard;
use botleads_client::domain::model::{
    HealthStatus, Lead, Municipality, NeighborhoodQuery, Region, SearchForm, SearchRequest,
    SearchResponse,
};
use botleads_client::domain::ports::{
    CascadeField, CascadeView, DropdownItem, ExportState, FieldState, LeadApi, ResultsView,
    SubmitState,
};
use botleads_client::{LeadError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn region(id: u64, name: &str, abbreviation: &str) -> Region {
    Region {
        id,
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
    }
}

pub fn municipality(id: u64, name: &str) -> Municipality {
    Municipality {
        id,
        name: name.to_string(),
    }
}

/// 記憶體內的假 API，municipality 回應可設定延遲
#[derive(Default)]
pub struct FakeApi {
    pub regions: Option<Vec<Region>>,
    pub municipalities: HashMap<u64, (Duration, Vec<Municipality>)>,
    pub neighborhoods: Option<Vec<String>>,
    pub neighborhood_delays: HashMap<String, Duration>,
    pub neighborhood_queries: Mutex<Vec<NeighborhoodQuery>>,
}

impl FakeApi {
    pub fn brazil() -> Self {
        let mut municipalities = HashMap::new();
        municipalities.insert(
            35,
            (
                Duration::from_millis(50),
                vec![municipality(3509502, "Campinas"), municipality(3548500, "Santos")],
            ),
        );
        municipalities.insert(
            33,
            (
                Duration::from_millis(50),
                vec![municipality(3303302, "Niterói")],
            ),
        );

        Self {
            regions: Some(vec![
                region(33, "Rio de Janeiro", "RJ"),
                region(43, "Rio Grande do Sul", "RS"),
                region(35, "São Paulo", "SP"),
            ]),
            municipalities,
            neighborhoods: Some(vec!["Cambuí".to_string(), "Centro".to_string()]),
            neighborhood_delays: HashMap::new(),
            neighborhood_queries: Mutex::new(Vec::new()),
        }
    }

    /// 讓某個查詢字串的回應延遲回來
    pub fn with_neighborhood_delay(mut self, query: &str, delay: Duration) -> Self {
        self.neighborhood_delays.insert(query.to_string(), delay);
        self
    }

    pub fn neighborhood_calls(&self) -> usize {
        self.neighborhood_queries.lock().unwrap().len()
    }
}

fn unavailable(what: &str) -> LeadError {
    LeadError::Server {
        status: 500,
        message: format!("{what} indisponível"),
    }
}

#[async_trait]
impl LeadApi for FakeApi {
    async fn regions(&self) -> Result<Vec<Region>> {
        self.regions.clone().ok_or_else(|| unavailable("estados"))
    }

    async fn municipalities(&self, region_id: u64) -> Result<Vec<Municipality>> {
        let (delay, list) = self
            .municipalities
            .get(&region_id)
            .cloned()
            .ok_or_else(|| unavailable("municípios"))?;
        tokio::time::sleep(delay).await;
        Ok(list)
    }

    async fn neighborhoods(&self, query: &NeighborhoodQuery) -> Result<Vec<String>> {
        self.neighborhood_queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.neighborhood_delays.get(&query.query) {
            tokio::time::sleep(*delay).await;
        }
        let names = self.neighborhoods.clone().ok_or_else(|| unavailable("bairros"))?;
        let wanted = query.query.to_lowercase();
        Ok(names
            .into_iter()
            .filter(|n| n.to_lowercase().contains(&wanted))
            .collect())
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchResponse> {
        Err(unavailable("busca"))
    }

    async fn export_excel(&self, _leads: &[Lead]) -> Result<Vec<u8>> {
        Err(unavailable("exportação"))
    }

    async fn health(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            status: "ok".into(),
            message: String::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    SetField(CascadeField, FieldState),
    List(CascadeField, Vec<String>),
    Empty(CascadeField),
    Loading(CascadeField, String),
    Error(CascadeField, String),
    Hide(CascadeField),
    Notify(String),
}

/// 把每次畫面呼叫依序記下來
#[derive(Clone, Default)]
pub struct RecordingView {
    pub calls: Arc<Mutex<Vec<ViewCall>>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn last_field(&self, field: CascadeField) -> Option<FieldState> {
        self.calls().into_iter().rev().find_map(|call| match call {
            ViewCall::SetField(f, state) if f == field => Some(state),
            _ => None,
        })
    }

    fn push(&self, call: ViewCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CascadeView for RecordingView {
    fn set_field(&mut self, field: CascadeField, state: &FieldState) {
        self.push(ViewCall::SetField(field, state.clone()));
    }

    fn render_list(&mut self, field: CascadeField, items: &[DropdownItem]) {
        self.push(ViewCall::List(
            field,
            items.iter().map(|i| i.label.clone()).collect(),
        ));
    }

    fn render_empty(&mut self, field: CascadeField) {
        self.push(ViewCall::Empty(field));
    }

    fn render_loading(&mut self, field: CascadeField, message: &str) {
        self.push(ViewCall::Loading(field, message.to_string()));
    }

    fn render_error(&mut self, field: CascadeField, message: &str) {
        self.push(ViewCall::Error(field, message.to_string()));
    }

    fn hide_dropdown(&mut self, field: CascadeField) {
        self.push(ViewCall::Hide(field));
    }

    fn notify(&mut self, message: &str) {
        self.push(ViewCall::Notify(message.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsCall {
    ShowError(String),
    HideError,
    Loading(bool),
    Submit(SubmitState),
    Export(ExportState),
    Count(String),
    Cards(Vec<LeadCard>),
    EmptyState,
    Clear,
    Scroll,
    ResetForm(SearchForm),
}

#[derive(Clone, Default)]
pub struct RecordingResultsView {
    pub calls: Arc<Mutex<Vec<ResultsCall>>>,
}

impl RecordingResultsView {
    pub fn calls(&self) -> Vec<ResultsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ResultsCall::ShowError(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: ResultsCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ResultsView for RecordingResultsView {
    fn show_error(&mut self, message: &str) {
        self.push(ResultsCall::ShowError(message.to_string()));
    }

    fn hide_error(&mut self) {
        self.push(ResultsCall::HideError);
    }

    fn set_loading(&mut self, loading: bool) {
        self.push(ResultsCall::Loading(loading));
    }

    fn set_submit_state(&mut self, state: SubmitState) {
        self.push(ResultsCall::Submit(state));
    }

    fn set_export_state(&mut self, state: ExportState) {
        self.push(ResultsCall::Export(state));
    }

    fn set_results_count(&mut self, text: &str) {
        self.push(ResultsCall::Count(text.to_string()));
    }

    fn render_cards(&mut self, cards: &[LeadCard]) {
        self.push(ResultsCall::Cards(cards.to_vec()));
    }

    fn render_empty_state(&mut self) {
        self.push(ResultsCall::EmptyState);
    }

    fn clear_results(&mut self) {
        self.push(ResultsCall::Clear);
    }

    fn scroll_to_results(&mut self) {
        self.push(ResultsCall::Scroll);
    }

    fn reset_form(&mut self, defaults: &SearchForm) {
        self.push(ResultsCall::ResetForm(defaults.clone()));
    }
}
