//! 州 → 市 → 區 的串接自動完成。
//!
//! 控制器由單一任務擁有，使用者事件與內部完成事件（debounce 觸發、請求結果、
//! 失焦計時）都經由同一條 channel 進來，依序在 [`CascadeController::handle`] 處理，
//! 因此選擇狀態不需要任何鎖。網路請求在背景任務中執行，結果帶著請求編號送回，
//! 過期的回應直接丟棄。

use crate::config::AutocompleteTimings;
use crate::core::debounce::Debouncer;
use crate::core::sequence::RequestSequence;
use crate::domain::model::{CascadeState, Municipality, NeighborhoodQuery, Region};
use crate::domain::ports::{CascadeField, CascadeView, DropdownItem, FieldState, LeadApi};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub const REGION_PLACEHOLDER: &str = "Digite para buscar o estado";
pub const MUNICIPALITY_PLACEHOLDER: &str = "Digite para buscar o município";
pub const MUNICIPALITY_LOCKED_PLACEHOLDER: &str = "Selecione primeiro um estado";
pub const NEIGHBORHOOD_PLACEHOLDER: &str =
    "Digite para buscar o bairro (opcional - deixe em branco para buscar no município inteiro)";
pub const NEIGHBORHOOD_LOCKED_PLACEHOLDER: &str = "Selecione primeiro um município";
pub const LOADING_MUNICIPALITIES: &str = "Carregando municípios...";
pub const MUNICIPALITIES_ERROR: &str = "Erro ao carregar municípios";
pub const SEARCHING_NEIGHBORHOODS: &str = "Buscando bairros...";
pub const SELECT_REGION_FIRST: &str = "Por favor, selecione primeiro um estado.";
pub const SELECT_MUNICIPALITY_FIRST: &str = "Por favor, selecione primeiro um município.";

#[derive(Debug)]
pub enum CascadeEvent {
    RegionInput(String),
    RegionFocus,
    RegionBlur,
    SelectRegion(Region),
    MunicipalityInput(String),
    MunicipalityFocus,
    MunicipalityBlur,
    SelectMunicipality(Municipality),
    NeighborhoodInput(String),
    NeighborhoodFocus,
    NeighborhoodBlur,
    SelectNeighborhood(String),
    ClickOutside,

    // 以下由控制器自己送出
    RegionQuery(String),
    MunicipalityQuery(String),
    NeighborhoodQuery(String),
    RegionsLoaded(Result<Vec<Region>>),
    MunicipalitiesLoaded {
        ticket: u64,
        result: Result<Vec<Municipality>>,
    },
    NeighborhoodsLoaded {
        ticket: u64,
        result: Result<Vec<String>>,
    },
    HideDropdown(CascadeField),
}

/// 名稱或縮寫包含查詢字串（不分大小寫）；查詢太短時回傳整份清單
pub fn filter_regions(regions: &[Region], query: &str, min_chars: usize) -> Vec<Region> {
    if query.chars().count() < min_chars {
        return regions.to_vec();
    }
    let query = query.to_lowercase();
    regions
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query) || r.abbreviation.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

pub fn filter_municipalities(
    municipalities: &[Municipality],
    query: &str,
    min_chars: usize,
) -> Vec<Municipality> {
    if query.chars().count() < min_chars {
        return municipalities.to_vec();
    }
    let query = query.to_lowercase();
    municipalities
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// 以名稱或縮寫做完全比對（不分大小寫）
pub fn find_region<'a>(regions: &'a [Region], name_or_abbreviation: &str) -> Option<&'a Region> {
    let wanted = name_or_abbreviation.trim().to_lowercase();
    regions
        .iter()
        .find(|r| r.name.to_lowercase() == wanted || r.abbreviation.to_lowercase() == wanted)
}

pub fn find_municipality<'a>(
    municipalities: &'a [Municipality],
    name: &str,
) -> Option<&'a Municipality> {
    let wanted = name.trim().to_lowercase();
    municipalities
        .iter()
        .find(|m| m.name.to_lowercase() == wanted)
}

pub struct CascadeController<V: CascadeView> {
    api: Arc<dyn LeadApi>,
    view: V,
    events: UnboundedSender<CascadeEvent>,
    timings: AutocompleteTimings,
    state: CascadeState,
    regions: Vec<Region>,
    municipalities: Vec<Municipality>,
    region_debounce: Debouncer,
    municipality_debounce: Debouncer,
    neighborhood_debounce: Debouncer,
    municipality_requests: RequestSequence,
    neighborhood_requests: RequestSequence,
}

impl<V: CascadeView> CascadeController<V> {
    pub fn new(
        api: Arc<dyn LeadApi>,
        view: V,
        events: UnboundedSender<CascadeEvent>,
        timings: AutocompleteTimings,
    ) -> Self {
        Self {
            region_debounce: Debouncer::new(timings.region_debounce),
            municipality_debounce: Debouncer::new(timings.municipality_debounce),
            neighborhood_debounce: Debouncer::new(timings.neighborhood_debounce),
            api,
            view,
            events,
            timings,
            state: CascadeState::default(),
            regions: Vec::new(),
            municipalities: Vec::new(),
            municipality_requests: RequestSequence::new(),
            neighborhood_requests: RequestSequence::new(),
        }
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn municipalities(&self) -> &[Municipality] {
        &self.municipalities
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// 處理事件，直到處理完第一個讓 `done` 回傳 true 的事件為止
    pub async fn run_until<F>(
        &mut self,
        events: &mut UnboundedReceiver<CascadeEvent>,
        mut done: F,
    ) -> bool
    where
        F: FnMut(&CascadeEvent) -> bool,
    {
        while let Some(event) = events.recv().await {
            let finished = done(&event);
            self.handle(event);
            if finished {
                return true;
            }
        }
        false
    }

    pub fn handle(&mut self, event: CascadeEvent) {
        match event {
            CascadeEvent::RegionInput(text) => self.on_region_input(text),
            CascadeEvent::RegionFocus => self.on_region_focus(),
            CascadeEvent::RegionBlur => self.schedule_hide(CascadeField::Region),
            CascadeEvent::SelectRegion(region) => self.select_region(region),
            CascadeEvent::MunicipalityInput(text) => self.on_municipality_input(text),
            CascadeEvent::MunicipalityFocus => self.on_municipality_focus(),
            CascadeEvent::MunicipalityBlur => self.schedule_hide(CascadeField::Municipality),
            CascadeEvent::SelectMunicipality(m) => self.select_municipality(m),
            CascadeEvent::NeighborhoodInput(text) => self.on_neighborhood_input(text),
            CascadeEvent::NeighborhoodFocus => self.on_neighborhood_focus(),
            CascadeEvent::NeighborhoodBlur => self.schedule_hide(CascadeField::Neighborhood),
            CascadeEvent::SelectNeighborhood(name) => self.select_neighborhood(name),
            CascadeEvent::ClickOutside => self.hide_all(),
            CascadeEvent::RegionQuery(text) => self.filter_region_dropdown(&text),
            CascadeEvent::MunicipalityQuery(text) => self.filter_municipality_dropdown(&text),
            CascadeEvent::NeighborhoodQuery(text) => self.search_neighborhoods(text),
            CascadeEvent::RegionsLoaded(result) => self.apply_regions(result),
            CascadeEvent::MunicipalitiesLoaded { ticket, result } => {
                self.apply_municipalities(ticket, result)
            }
            CascadeEvent::NeighborhoodsLoaded { ticket, result } => {
                self.apply_neighborhoods(ticket, result)
            }
            CascadeEvent::HideDropdown(field) => self.view.hide_dropdown(field),
        }
    }

    // ---- 州 ----

    pub fn load_regions(&self) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.regions().await;
            let _ = events.send(CascadeEvent::RegionsLoaded(result));
        });
    }

    fn apply_regions(&mut self, result: Result<Vec<Region>>) {
        match result {
            Ok(regions) => {
                tracing::info!("Estados carregados: {}", regions.len());
                self.regions = regions;
            }
            Err(e) => {
                // 只記錄，不重試，清單維持空的
                tracing::error!("❌ Erro ao carregar estados: {}", e);
            }
        }
    }

    pub fn on_region_input(&mut self, text: String) {
        let events = self.events.clone();
        self.region_debounce.schedule(async move {
            let _ = events.send(CascadeEvent::RegionQuery(text));
        });
    }

    pub fn on_region_focus(&mut self) {
        if !self.regions.is_empty() {
            let items: Vec<DropdownItem> = self.regions.iter().map(DropdownItem::from).collect();
            self.show_items(CascadeField::Region, &items);
        }
    }

    fn filter_region_dropdown(&mut self, query: &str) {
        if query.chars().count() < self.timings.min_query_chars {
            self.on_region_focus();
            return;
        }
        let filtered = filter_regions(&self.regions, query, self.timings.min_query_chars);
        let items: Vec<DropdownItem> = filtered.iter().map(DropdownItem::from).collect();
        self.show_items(CascadeField::Region, &items);
    }

    pub fn select_region(&mut self, region: Region) {
        tracing::debug!("Estado selecionado: {} ({})", region.name, region.id);
        self.view.set_field(
            CascadeField::Region,
            &FieldState {
                value: region.name.clone(),
                hidden_id: Some(region.id.to_string()),
                enabled: true,
                placeholder: REGION_PLACEHOLDER.to_string(),
                required: true,
            },
        );

        let region_id = region.id;
        self.state.select_region(region);
        self.municipalities.clear();
        self.municipality_debounce.cancel();
        self.neighborhood_debounce.cancel();
        self.neighborhood_requests.invalidate();

        self.view.set_field(
            CascadeField::Municipality,
            &FieldState {
                value: String::new(),
                hidden_id: None,
                enabled: false,
                placeholder: MUNICIPALITY_LOCKED_PLACEHOLDER.to_string(),
                required: true,
            },
        );
        self.lock_neighborhood();
        self.view.hide_dropdown(CascadeField::Region);

        self.load_municipalities(region_id);
    }

    // ---- 市 ----

    pub fn load_municipalities(&mut self, region_id: u64) {
        let ticket = self.municipality_requests.next();
        self.view
            .render_loading(CascadeField::Municipality, LOADING_MUNICIPALITIES);

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.municipalities(region_id).await;
            let _ = events.send(CascadeEvent::MunicipalitiesLoaded { ticket, result });
        });
    }

    fn apply_municipalities(&mut self, ticket: u64, result: Result<Vec<Municipality>>) {
        if !self.municipality_requests.is_latest(ticket) {
            tracing::debug!("Discarding stale municipality response #{}", ticket);
            return;
        }

        match result {
            Ok(municipalities) => {
                tracing::info!("Municípios carregados: {}", municipalities.len());
                self.municipalities = municipalities;
                self.state.municipality = None;

                self.view.set_field(
                    CascadeField::Municipality,
                    &FieldState {
                        value: String::new(),
                        hidden_id: None,
                        enabled: true,
                        placeholder: MUNICIPALITY_PLACEHOLDER.to_string(),
                        required: true,
                    },
                );
                self.show_all_municipalities();
                self.lock_neighborhood();
            }
            Err(e) => {
                tracing::error!("❌ Erro ao carregar municípios: {}", e);
                self.view
                    .render_error(CascadeField::Municipality, MUNICIPALITIES_ERROR);
            }
        }
    }

    pub fn on_municipality_input(&mut self, text: String) {
        if self.state.region.is_none() {
            return;
        }
        let events = self.events.clone();
        self.municipality_debounce.schedule(async move {
            let _ = events.send(CascadeEvent::MunicipalityQuery(text));
        });
    }

    pub fn on_municipality_focus(&mut self) {
        if self.state.region.is_none() {
            self.view.notify(SELECT_REGION_FIRST);
            return;
        }
        if !self.municipalities.is_empty() {
            self.show_all_municipalities();
        }
    }

    fn show_all_municipalities(&mut self) {
        let items: Vec<DropdownItem> = self.municipalities.iter().map(DropdownItem::from).collect();
        self.show_items(CascadeField::Municipality, &items);
    }

    fn filter_municipality_dropdown(&mut self, query: &str) {
        if self.state.region.is_none() {
            return;
        }
        if query.chars().count() < self.timings.min_query_chars {
            if !self.municipalities.is_empty() {
                self.show_all_municipalities();
            }
            return;
        }
        let filtered =
            filter_municipalities(&self.municipalities, query, self.timings.min_query_chars);
        let items: Vec<DropdownItem> = filtered.iter().map(DropdownItem::from).collect();
        self.show_items(CascadeField::Municipality, &items);
    }

    pub fn select_municipality(&mut self, municipality: Municipality) {
        tracing::debug!(
            "Município selecionado: {} ({})",
            municipality.name,
            municipality.id
        );
        self.view.set_field(
            CascadeField::Municipality,
            &FieldState {
                value: municipality.name.clone(),
                hidden_id: Some(municipality.id.to_string()),
                enabled: true,
                placeholder: MUNICIPALITY_PLACEHOLDER.to_string(),
                required: true,
            },
        );
        self.state.select_municipality(municipality);
        self.neighborhood_debounce.cancel();
        self.neighborhood_requests.invalidate();

        self.view.set_field(
            CascadeField::Neighborhood,
            &FieldState {
                value: String::new(),
                hidden_id: None,
                enabled: true,
                placeholder: NEIGHBORHOOD_PLACEHOLDER.to_string(),
                required: false,
            },
        );
        self.view.hide_dropdown(CascadeField::Municipality);
    }

    // ---- 區 ----

    pub fn on_neighborhood_input(&mut self, text: String) {
        if !self.state.neighborhood_enabled() {
            return;
        }
        // 自由輸入的區名一律保留，不需要和建議清單一致
        self.state.neighborhood = text.clone();
        let events = self.events.clone();
        self.neighborhood_debounce.schedule(async move {
            let _ = events.send(CascadeEvent::NeighborhoodQuery(text));
        });
    }

    pub fn on_neighborhood_focus(&mut self) {
        if self.state.municipality.is_none() {
            self.view.notify(SELECT_MUNICIPALITY_FIRST);
        }
    }

    fn search_neighborhoods(&mut self, query: String) {
        let (Some(region), Some(municipality)) = (&self.state.region, &self.state.municipality)
        else {
            self.neighborhood_requests.invalidate();
            self.view.hide_dropdown(CascadeField::Neighborhood);
            return;
        };
        // 查詢變短時，還在路上的較長查詢結果也不能再打開選單
        if query.chars().count() < self.timings.min_query_chars {
            self.neighborhood_requests.invalidate();
            self.view.hide_dropdown(CascadeField::Neighborhood);
            return;
        }

        let request = NeighborhoodQuery {
            municipio: municipality.name.clone(),
            estado: region.name.clone(),
            query,
        };
        let ticket = self.neighborhood_requests.next();
        self.view
            .render_loading(CascadeField::Neighborhood, SEARCHING_NEIGHBORHOODS);

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.neighborhoods(&request).await;
            let _ = events.send(CascadeEvent::NeighborhoodsLoaded { ticket, result });
        });
    }

    fn apply_neighborhoods(&mut self, ticket: u64, result: Result<Vec<String>>) {
        if !self.neighborhood_requests.is_latest(ticket) {
            tracing::debug!("Discarding stale neighborhood response #{}", ticket);
            return;
        }

        match result {
            Ok(names) if !names.is_empty() => {
                let items: Vec<DropdownItem> = names.iter().map(DropdownItem::from).collect();
                self.view.render_list(CascadeField::Neighborhood, &items);
            }
            Ok(_) => self.view.hide_dropdown(CascadeField::Neighborhood),
            Err(e) => {
                tracing::warn!("Erro ao buscar bairros: {}", e);
                self.view.hide_dropdown(CascadeField::Neighborhood);
            }
        }
    }

    pub fn select_neighborhood(&mut self, name: String) {
        self.view.set_field(
            CascadeField::Neighborhood,
            &FieldState {
                value: name.clone(),
                hidden_id: None,
                enabled: true,
                placeholder: NEIGHBORHOOD_PLACEHOLDER.to_string(),
                required: false,
            },
        );
        self.state.neighborhood = name;
        self.view.hide_dropdown(CascadeField::Neighborhood);
    }

    // ---- 下拉選單 ----

    fn lock_neighborhood(&mut self) {
        self.state.neighborhood.clear();
        self.view.set_field(
            CascadeField::Neighborhood,
            &FieldState {
                value: String::new(),
                hidden_id: None,
                enabled: false,
                placeholder: NEIGHBORHOOD_LOCKED_PLACEHOLDER.to_string(),
                required: false,
            },
        );
    }

    fn show_items(&mut self, field: CascadeField, items: &[DropdownItem]) {
        if items.is_empty() {
            self.view.render_empty(field);
        } else {
            self.view.render_list(field, items);
        }
    }

    /// 失焦後延遲關閉，讓滑鼠點選項目的事件先處理
    fn schedule_hide(&self, field: CascadeField) {
        let events = self.events.clone();
        let grace = self.timings.blur_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = events.send(CascadeEvent::HideDropdown(field));
        });
    }

    pub fn hide_all(&mut self) {
        for field in CascadeField::ALL {
            self.view.hide_dropdown(field);
        }
    }
}
