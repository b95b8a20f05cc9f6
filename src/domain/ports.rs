use crate::domain::model::{
    HealthStatus, Lead, Municipality, NeighborhoodQuery, Region, SearchForm, SearchRequest,
    SearchResponse,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 後端 JSON API 的抽象；實作見 `adapters::http::HttpLeadApi`
#[async_trait]
pub trait LeadApi: Send + Sync {
    async fn regions(&self) -> Result<Vec<Region>>;
    async fn municipalities(&self, region_id: u64) -> Result<Vec<Municipality>>;
    async fn neighborhoods(&self, query: &NeighborhoodQuery) -> Result<Vec<String>>;
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
    async fn export_excel(&self, leads: &[Lead]) -> Result<Vec<u8>>;
    async fn health(&self) -> Result<HealthStatus>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeField {
    Region,
    Municipality,
    Neighborhood,
}

impl CascadeField {
    pub const ALL: [CascadeField; 3] = [
        CascadeField::Region,
        CascadeField::Municipality,
        CascadeField::Neighborhood,
    ];
}

/// 一個輸入框（含對應的隱藏 id 欄位）應呈現的完整狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub hidden_id: Option<String>,
    pub enabled: bool,
    pub placeholder: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownItem {
    pub id: String,
    pub label: String,
}

impl From<&Region> for DropdownItem {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.to_string(),
            label: region.name.clone(),
        }
    }
}

impl From<&Municipality> for DropdownItem {
    fn from(municipality: &Municipality) -> Self {
        Self {
            id: municipality.id.to_string(),
            label: municipality.name.clone(),
        }
    }
}

impl From<&String> for DropdownItem {
    fn from(name: &String) -> Self {
        Self {
            id: name.clone(),
            label: name.clone(),
        }
    }
}

/// 串接選單的畫面介面，控制器只透過它改變畫面
pub trait CascadeView: Send + 'static {
    fn set_field(&mut self, field: CascadeField, state: &FieldState);
    fn render_list(&mut self, field: CascadeField, items: &[DropdownItem]);
    fn render_empty(&mut self, field: CascadeField);
    fn render_loading(&mut self, field: CascadeField, message: &str);
    fn render_error(&mut self, field: CascadeField, message: &str);
    fn hide_dropdown(&mut self, field: CascadeField);
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Hidden,
    Ready,
    Exporting,
}

pub trait ResultsView: Send {
    fn show_error(&mut self, message: &str);
    fn hide_error(&mut self);
    fn set_loading(&mut self, loading: bool);
    fn set_submit_state(&mut self, state: SubmitState);
    fn set_export_state(&mut self, state: ExportState);
    fn set_results_count(&mut self, text: &str);
    fn render_cards(&mut self, cards: &[crate::core::render::LeadCard]);
    fn render_empty_state(&mut self);
    fn clear_results(&mut self);
    fn scroll_to_results(&mut self);
    fn reset_form(&mut self, defaults: &SearchForm);
}
