use crate::core::render::{LeadCard, EMPTY_DROPDOWN_TEXT};
use crate::domain::model::SearchForm;
use crate::domain::ports::{
    CascadeField, CascadeView, DropdownItem, ExportState, FieldState, ResultsView, SubmitState,
};
use std::collections::HashMap;

/// 下拉選單目前的內容
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DropdownState {
    #[default]
    Hidden,
    Loading(String),
    Error(String),
    Empty,
    Items(Vec<DropdownItem>),
}

/// 終端機版的串接選單畫面：保留每個欄位最後的狀態，由呼叫端決定何時輸出
#[derive(Debug, Default)]
pub struct TerminalCascadeView {
    dropdowns: HashMap<CascadeField, DropdownState>,
    last_shown: HashMap<CascadeField, DropdownState>,
}

impl TerminalCascadeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dropdown(&self, field: CascadeField) -> &DropdownState {
        static HIDDEN: DropdownState = DropdownState::Hidden;
        self.dropdowns.get(&field).unwrap_or(&HIDDEN)
    }

    /// 最後一次顯示過的內容（隱藏前的那份）
    pub fn last_shown(&self, field: CascadeField) -> &DropdownState {
        static HIDDEN: DropdownState = DropdownState::Hidden;
        self.last_shown.get(&field).unwrap_or(&HIDDEN)
    }

    pub fn print_dropdown(&self, field: CascadeField) {
        match self.last_shown(field) {
            DropdownState::Items(items) => {
                for item in items {
                    println!("{}\t{}", item.id, item.label);
                }
            }
            DropdownState::Empty => println!("{}", EMPTY_DROPDOWN_TEXT),
            DropdownState::Error(message) | DropdownState::Loading(message) => {
                eprintln!("⚠️  {}", message)
            }
            DropdownState::Hidden => {}
        }
    }

    fn show(&mut self, field: CascadeField, state: DropdownState) {
        self.last_shown.insert(field, state.clone());
        self.dropdowns.insert(field, state);
    }
}

impl CascadeView for TerminalCascadeView {
    fn set_field(&mut self, field: CascadeField, state: &FieldState) {
        tracing::debug!(
            "{:?} field -> value={:?} enabled={} placeholder={:?}",
            field,
            state.value,
            state.enabled,
            state.placeholder
        );
    }

    fn render_list(&mut self, field: CascadeField, items: &[DropdownItem]) {
        self.show(field, DropdownState::Items(items.to_vec()));
    }

    fn render_empty(&mut self, field: CascadeField) {
        self.show(field, DropdownState::Empty);
    }

    fn render_loading(&mut self, field: CascadeField, message: &str) {
        eprintln!("⏳ {}", message);
        self.dropdowns
            .insert(field, DropdownState::Loading(message.to_string()));
    }

    fn render_error(&mut self, field: CascadeField, message: &str) {
        self.show(field, DropdownState::Error(message.to_string()));
    }

    fn hide_dropdown(&mut self, field: CascadeField) {
        self.dropdowns.insert(field, DropdownState::Hidden);
    }

    fn notify(&mut self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

/// 終端機版的結果畫面
#[derive(Debug, Default)]
pub struct TerminalResultsView {
    pub last_error: Option<String>,
    pub export_state: Option<ExportState>,
}

impl TerminalResultsView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultsView for TerminalResultsView {
    fn show_error(&mut self, message: &str) {
        eprintln!("❌ {}", message);
        self.last_error = Some(message.to_string());
    }

    fn hide_error(&mut self) {
        self.last_error = None;
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            eprintln!("⏳ Buscando...");
        }
    }

    fn set_submit_state(&mut self, state: SubmitState) {
        tracing::debug!("Submit control -> {:?}", state);
    }

    fn set_export_state(&mut self, state: ExportState) {
        if state == ExportState::Exporting {
            eprintln!("⏳ Exportando...");
        }
        self.export_state = Some(state);
    }

    fn set_results_count(&mut self, text: &str) {
        println!("✅ {}", text);
    }

    fn render_cards(&mut self, cards: &[LeadCard]) {
        for card in cards {
            println!();
            println!("Lead #{} - {}", card.number, card.name);
            println!("  📍 Endereço:    {}", card.address);
            println!("  📞 Telefone:    {}", card.phone);
            println!("  🌐 Localização: {}", card.coordinates);
            println!("  🏷️  Tipo:        {}", card.kind);
            println!("  {} Fonte:       {}", card.source_icon(), card.source);
            for link in [&card.profile_link, &card.map_link, &card.call_link]
                .into_iter()
                .flatten()
            {
                println!("  🔗 {}: {}", link.label, link.href);
            }
        }
    }

    fn render_empty_state(&mut self) {
        println!("🔍 Nenhum lead encontrado");
        println!("Tente ajustar os parâmetros de busca e tente novamente.");
    }

    fn clear_results(&mut self) {}

    fn scroll_to_results(&mut self) {}

    fn reset_form(&mut self, defaults: &SearchForm) {
        tracing::debug!("Form reset to defaults: {:?}", defaults);
    }
}
