use crate::domain::model::{
    ErrorBody, ExportRequest, HealthStatus, Lead, MunicipalitiesResponse, Municipality,
    NeighborhoodQuery, NeighborhoodsResponse, Region, RegionsResponse, SearchRequest,
    SearchResponse,
};
use crate::domain::ports::LeadApi;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const SEARCH_FALLBACK: &str = "Erro ao buscar leads";
const EXPORT_FALLBACK: &str = "Erro ao exportar Excel";

/// `LeadApi` 的 reqwest 實作，所有路徑都相對於 `base_url`
#[derive(Debug, Clone)]
pub struct HttpLeadApi {
    client: Client,
    base_url: Url,
}

impl HttpLeadApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// 非 2xx 時讀取 `{erro}`，沒有就用 fallback
    async fn read_json<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
        let response = Self::check_status(response, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: Response, fallback: &str) -> Result<Response> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(LeadError::Server {
            status: status.as_u16(),
            message: body
                .erro
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        })
    }

    fn unsuccessful(erro: Option<String>, fallback: &str) -> LeadError {
        LeadError::Server {
            status: 200,
            message: erro.unwrap_or_else(|| fallback.to_string()),
        }
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn regions(&self) -> Result<Vec<Region>> {
        let url = self.endpoint("api/estados")?;
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.get(url).send().await?;
        let body: RegionsResponse = Self::read_json(response, "Erro ao carregar estados").await?;

        match (body.sucesso, body.estados) {
            (true, Some(regions)) => Ok(regions),
            _ => Err(Self::unsuccessful(body.erro, "Erro ao carregar estados")),
        }
    }

    async fn municipalities(&self, region_id: u64) -> Result<Vec<Municipality>> {
        let url = self.endpoint("api/municipios")?;
        tracing::debug!("Making API request to: {} (estado_id={})", url, region_id);

        let response = self
            .client
            .get(url)
            .query(&[("estado_id", region_id)])
            .send()
            .await?;
        let body: MunicipalitiesResponse =
            Self::read_json(response, "Erro ao carregar municípios").await?;

        match (body.sucesso, body.municipios) {
            (true, Some(municipalities)) => Ok(municipalities),
            _ => Err(Self::unsuccessful(body.erro, "Erro ao carregar municípios")),
        }
    }

    async fn neighborhoods(&self, query: &NeighborhoodQuery) -> Result<Vec<String>> {
        let url = self.endpoint("api/buscar-bairros")?;
        tracing::debug!("Making API request to: {} (query={})", url, query.query);

        let response = self.client.post(url).json(query).send().await?;
        let body: NeighborhoodsResponse =
            Self::read_json(response, "Erro ao buscar bairros").await?;

        match (body.sucesso, body.bairros) {
            (true, Some(neighborhoods)) => Ok(neighborhoods),
            _ => Err(Self::unsuccessful(body.erro, "Erro ao buscar bairros")),
        }
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.endpoint("api/buscar")?;
        tracing::debug!(
            "Making API request to: {} ({} / {} / {})",
            url,
            request.estado,
            request.municipio,
            request.tipo
        );

        let response = self.client.post(url).json(request).send().await?;
        Self::read_json(response, SEARCH_FALLBACK).await
    }

    async fn export_excel(&self, leads: &[Lead]) -> Result<Vec<u8>> {
        let url = self.endpoint("api/exportar-excel")?;
        tracing::debug!("Exporting {} leads via {}", leads.len(), url);

        let response = self
            .client
            .post(url)
            .json(&ExportRequest { leads })
            .send()
            .await?;
        let response = Self::check_status(response, EXPORT_FALLBACK).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("api/health")?;
        let response = self.client.get(url).send().await?;
        Self::read_json(response, "Servidor indisponível").await
    }
}
