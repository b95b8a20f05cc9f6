use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::LeadError;

/// 州（estado），整個 session 只抓一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "sigla")]
    pub abbreviation: String,
}

/// 市（município），屬於唯一一個州，州變更時重新抓取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
}

/// 搜尋結果，唯讀，由伺服器提供
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Lead {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "endereco", default)]
    pub address: String,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(rename = "fonte", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "link_perfil", default, skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,
}

/// 搜尋來源（結果提供者）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    GoogleMaps,
    Facebook,
    Instagram,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::GoogleMaps, Source::Facebook, Source::Instagram];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::GoogleMaps => "google_maps",
            Source::Facebook => "facebook",
            Source::Instagram => "instagram",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::GoogleMaps => "Google Maps",
            Source::Facebook => "Facebook",
            Source::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "google_maps" | "google" | "maps" => Ok(Source::GoogleMaps),
            "facebook" => Ok(Source::Facebook),
            "instagram" => Ok(Source::Instagram),
            other => Err(LeadError::InvalidConfigValue {
                field: "sources".to_string(),
                value: other.to_string(),
                reason: "Valid sources: google_maps, facebook, instagram".to_string(),
            }),
        }
    }
}

/// 表單目前的值，對應畫面上的欄位
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub region: String,
    pub municipality: String,
    pub neighborhood: String,
    pub kind: String,
    pub phone_required: bool,
    pub sources: Vec<Source>,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            region: String::new(),
            municipality: String::new(),
            neighborhood: String::new(),
            kind: String::new(),
            phone_required: true,
            sources: vec![Source::GoogleMaps],
        }
    }
}

/// `/api/buscar` 的請求內容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub estado: String,
    pub municipio: String,
    pub bairro: Option<String>,
    pub tipo: String,
    pub apenas_com_telefone: bool,
    pub fontes: Vec<Source>,
}

impl From<&SearchForm> for SearchRequest {
    fn from(form: &SearchForm) -> Self {
        let neighborhood = form.neighborhood.trim();
        Self {
            estado: form.region.trim().to_string(),
            municipio: form.municipality.trim().to_string(),
            bairro: (!neighborhood.is_empty()).then(|| neighborhood.to_string()),
            tipo: form.kind.trim().to_string(),
            apenas_com_telefone: form.phone_required,
            fontes: form.sources.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodQuery {
    pub municipio: String,
    pub estado: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub leads: &'a [Lead],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionsResponse {
    #[serde(default)]
    pub sucesso: bool,
    #[serde(default)]
    pub estados: Option<Vec<Region>>,
    #[serde(default)]
    pub erro: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalitiesResponse {
    #[serde(default)]
    pub sucesso: bool,
    #[serde(default)]
    pub municipios: Option<Vec<Municipality>>,
    #[serde(default)]
    pub erro: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeighborhoodsResponse {
    #[serde(default)]
    pub sucesso: bool,
    #[serde(default)]
    pub bairros: Option<Vec<String>>,
    #[serde(default)]
    pub erro: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub sucesso: bool,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub leads: Option<Vec<Lead>>,
    #[serde(default)]
    pub erro: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub erro: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// 串接選擇的狀態：一個州、最多一個市、最多一個區名
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeState {
    pub region: Option<Region>,
    pub municipality: Option<Municipality>,
    pub neighborhood: String,
}

impl CascadeState {
    pub fn select_region(&mut self, region: Region) {
        self.region = Some(region);
        self.municipality = None;
        self.neighborhood.clear();
    }

    pub fn select_municipality(&mut self, municipality: Municipality) {
        self.municipality = Some(municipality);
        self.neighborhood.clear();
    }

    pub fn neighborhood_enabled(&self) -> bool {
        self.region.is_some() && self.municipality.is_some()
    }

    /// 把目前的選擇填入搜尋表單
    pub fn fill_form(&self, form: &mut SearchForm) {
        form.region = self
            .region
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_default();
        form.municipality = self
            .municipality
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_default();
        form.neighborhood = self.neighborhood.clone();
    }
}
