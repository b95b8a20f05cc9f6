//! 結果卡片與下拉選單的標記產生。
//!
//! 所有插入的文字欄位都經過 [`escape_html`]；三個條件連結（個人頁、地圖、撥號）
//! 直接放入 `href`，不做跳脫。

use crate::domain::model::Lead;
use crate::domain::ports::DropdownItem;
use regex::Regex;
use std::sync::LazyLock;

pub const EMPTY_DROPDOWN_TEXT: &str = "Nenhum resultado encontrado";
pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_SOURCE: &str = "Google Maps";
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLink {
    pub href: String,
    pub label: String,
}

/// 一筆 lead 的顯示內容，欄位保留原始文字，跳脫在 `to_html` 時才做
#[derive(Debug, Clone, PartialEq)]
pub struct LeadCard {
    pub number: usize,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub coordinates: String,
    pub kind: String,
    pub source: String,
    pub source_class: Option<String>,
    pub profile_link: Option<CardLink>,
    pub map_link: Option<CardLink>,
    pub call_link: Option<CardLink>,
}

fn is_available(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty() && *v != NOT_AVAILABLE)
}

pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    // 加 0.0 讓 -0.0 變成 0.0，避免印出 "-0.000000"
    format!("{:.6}, {:.6}", latitude + 0.0, longitude + 0.0)
}

impl LeadCard {
    pub fn new(lead: &Lead, number: usize) -> Self {
        let source_name = lead.source.as_deref().filter(|s| !s.is_empty());
        let latitude = lead.latitude.unwrap_or(0.0);
        let longitude = lead.longitude.unwrap_or(0.0);

        let profile_link = is_available(&lead.profile_link).map(|href| CardLink {
            href: href.to_string(),
            label: match source_name {
                Some("Facebook") => "Ver Facebook".to_string(),
                Some("Instagram") => "Ver Instagram".to_string(),
                _ => "Ver Perfil".to_string(),
            },
        });

        // 兩個座標都要有，且不能同時為 0
        let map_link = match (lead.latitude, lead.longitude) {
            (Some(lat), Some(lng)) if lat != 0.0 || lng != 0.0 => {
                let query: String =
                    url::form_urlencoded::byte_serialize(format!("{},{}", lat, lng).as_bytes())
                        .collect();
                Some(CardLink {
                    href: format!("{}{}", MAPS_SEARCH_URL, query),
                    label: "Ver no Maps".to_string(),
                })
            }
            _ => None,
        };

        let call_link = is_available(&lead.phone).map(|phone| CardLink {
            href: format!("tel:{}", WHITESPACE.replace_all(phone, "")),
            label: "Ligar".to_string(),
        });

        Self {
            number,
            name: lead.name.clone(),
            address: lead.address.clone(),
            phone: lead.phone.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            coordinates: format_coordinates(latitude, longitude),
            kind: lead.kind.clone(),
            source: source_name.unwrap_or(DEFAULT_SOURCE).to_string(),
            source_class: source_name
                .map(|s| format!("fonte-{}", s.to_lowercase().replacen(' ', "-", 1))),
            profile_link,
            map_link,
            call_link,
        }
    }

    pub fn source_icon(&self) -> &'static str {
        match self.source.as_str() {
            "Facebook" => "📘",
            "Instagram" => "📷",
            _ => "🗺️",
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<div class=\"lead-card\">\n");
        html.push_str(&format!(
            "  <div class=\"lead-header\">\n    <div class=\"lead-number {}\">Lead #{}</div>\n    <h3 class=\"lead-name\">{}</h3>\n  </div>\n",
            self.source_class.as_deref().unwrap_or(""),
            self.number,
            escape_html(&self.name)
        ));
        html.push_str("  <div class=\"lead-info\">\n");
        let rows = [
            ("📍", "Endereço:", escape_html(&self.address)),
            ("📞", "Telefone:", escape_html(&self.phone)),
            ("🌐", "Localização:", self.coordinates.clone()),
            ("🏷️", "Tipo:", escape_html(&self.kind)),
            (self.source_icon(), "Fonte:", escape_html(&self.source)),
        ];
        for (icon, label, value) in rows {
            html.push_str(&format!(
                "    <div class=\"lead-item\"><span class=\"lead-icon\">{}</span><span class=\"lead-label\">{}</span><span class=\"lead-value\">{}</span></div>\n",
                icon, label, value
            ));
        }
        html.push_str("  </div>\n  <div class=\"lead-actions\">\n");
        if let Some(link) = &self.profile_link {
            html.push_str(&format!(
                "    <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"btn btn-small btn-outline\"><span class=\"btn-icon\">🔗</span>{}</a>\n",
                link.href, link.label
            ));
        }
        if let Some(link) = &self.map_link {
            html.push_str(&format!(
                "    <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"btn btn-small btn-outline\"><span class=\"btn-icon\">🗺️</span>{}</a>\n",
                link.href, link.label
            ));
        }
        if let Some(link) = &self.call_link {
            html.push_str(&format!(
                "    <a href=\"{}\" class=\"btn btn-small btn-outline\"><span class=\"btn-icon\">📞</span>{}</a>\n",
                link.href, link.label
            ));
        }
        html.push_str("  </div>\n</div>\n");
        html
    }
}

pub fn lead_cards(leads: &[Lead]) -> Vec<LeadCard> {
    leads
        .iter()
        .enumerate()
        .map(|(index, lead)| LeadCard::new(lead, index + 1))
        .collect()
}

pub fn results_html(summary: &str, cards: &[LeadCard]) -> String {
    let mut html = format!(
        "<div class=\"results-count\">{}</div>\n<div class=\"leads-container\">\n",
        escape_html(summary)
    );
    for card in cards {
        html.push_str(&card.to_html());
    }
    html.push_str("</div>\n");
    html
}

pub fn empty_state_html() -> &'static str {
    "<div class=\"empty-state\"><div class=\"empty-state-icon\">🔍</div><h3>Nenhum lead encontrado</h3><p>Tente ajustar os parâmetros de busca e tente novamente.</p></div>"
}

pub fn dropdown_html(items: &[DropdownItem]) -> String {
    if items.is_empty() {
        return format!(
            "<div class=\"autocomplete-item-empty\">{}</div>",
            EMPTY_DROPDOWN_TEXT
        );
    }

    items
        .iter()
        .map(|item| {
            format!(
                "<div class=\"autocomplete-item\" data-id=\"{}\"><span class=\"autocomplete-icon\">📍</span><span>{}</span></div>",
                escape_html(&item.id),
                escape_html(&item.label)
            )
        })
        .collect::<Vec<_>>()
        .join("")
}
