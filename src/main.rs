use anyhow::{anyhow, bail, Context};
use botleads_client::adapters::terminal::{TerminalCascadeView, TerminalResultsView};
use botleads_client::config::cli::{Command, SearchArgs};
use botleads_client::core::cascade::{find_municipality, find_region};
use botleads_client::core::render::{empty_state_html, lead_cards, results_html};
use botleads_client::domain::ports::{CascadeField, LeadApi};
use botleads_client::utils::{logger, validation::Validate};
use botleads_client::{
    CascadeController, CascadeEvent, CliConfig, ClientSettings, ExportOutcome, HttpLeadApi,
    LocalStorage, SearchController, SearchOutcome,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

type Cascade = CascadeController<TerminalCascadeView>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting botleads CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let http = HttpLeadApi::new(&settings.base_url, settings.timeout)?;
    tracing::info!("🌐 Servidor: {}", http.base_url());
    let api: Arc<dyn LeadApi> = Arc::new(http);

    match &config.command {
        Command::Health => {
            let status = api.health().await.context("health check failed")?;
            println!("✅ {} - {}", status.status, status.message);
        }
        Command::Regions { filter } => run_regions(api, &settings, filter.as_deref()).await?,
        Command::Municipalities { region, filter } => {
            run_municipalities(api, &settings, region, filter.as_deref()).await?
        }
        Command::Neighborhoods {
            region,
            municipality,
            query,
        } => run_neighborhoods(api, &settings, region, municipality, query).await?,
        Command::Search(args) => run_search(api, &settings, args).await?,
    }

    Ok(())
}

fn cascade(
    api: Arc<dyn LeadApi>,
    settings: &ClientSettings,
) -> (Cascade, UnboundedReceiver<CascadeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = CascadeController::new(
        api,
        TerminalCascadeView::new(),
        tx,
        settings.timings.clone(),
    );
    (controller, rx)
}

/// 等待控制器處理完指定事件；逾時代表伺服器沒有回應
async fn pump<F>(
    cascade: &mut Cascade,
    events: &mut UnboundedReceiver<CascadeEvent>,
    settings: &ClientSettings,
    done: F,
) -> anyhow::Result<()>
where
    F: FnMut(&CascadeEvent) -> bool,
{
    let limit = settings.timeout + Duration::from_secs(1);
    match tokio::time::timeout(limit, cascade.run_until(events, done)).await {
        Ok(true) => Ok(()),
        Ok(false) => bail!("event channel closed unexpectedly"),
        Err(_) => bail!("timed out after {:?}", limit),
    }
}

async fn load_regions(
    cascade: &mut Cascade,
    events: &mut UnboundedReceiver<CascadeEvent>,
    settings: &ClientSettings,
) -> anyhow::Result<()> {
    cascade.load_regions();
    pump(cascade, events, settings, |e| matches!(e, CascadeEvent::RegionsLoaded(_))).await?;
    if cascade.regions().is_empty() {
        bail!("Não foi possível carregar os estados");
    }
    Ok(())
}

async fn select_region(
    cascade: &mut Cascade,
    events: &mut UnboundedReceiver<CascadeEvent>,
    settings: &ClientSettings,
    region: &str,
) -> anyhow::Result<()> {
    load_regions(cascade, events, settings).await?;
    let region = find_region(cascade.regions(), region)
        .cloned()
        .ok_or_else(|| anyhow!("Estado não encontrado: {}", region))?;

    cascade.handle(CascadeEvent::SelectRegion(region));
    pump(cascade, events, settings, |e| {
        matches!(e, CascadeEvent::MunicipalitiesLoaded { .. })
    })
    .await?;
    if cascade.municipalities().is_empty() {
        bail!("Erro ao carregar municípios");
    }
    Ok(())
}

async fn select_municipality(
    cascade: &mut Cascade,
    events: &mut UnboundedReceiver<CascadeEvent>,
    settings: &ClientSettings,
    region: &str,
    municipality: &str,
) -> anyhow::Result<()> {
    select_region(cascade, events, settings, region).await?;
    let municipality = find_municipality(cascade.municipalities(), municipality)
        .cloned()
        .ok_or_else(|| anyhow!("Município não encontrado: {}", municipality))?;
    cascade.handle(CascadeEvent::SelectMunicipality(municipality));
    Ok(())
}

async fn run_regions(
    api: Arc<dyn LeadApi>,
    settings: &ClientSettings,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let (mut cascade, mut events) = cascade(api, settings);
    load_regions(&mut cascade, &mut events, settings).await?;

    match filter {
        Some(text) => {
            cascade.handle(CascadeEvent::RegionInput(text.to_string()));
            pump(&mut cascade, &mut events, settings, |e| {
                matches!(e, CascadeEvent::RegionQuery(_))
            })
            .await?;
        }
        None => cascade.handle(CascadeEvent::RegionFocus),
    }

    cascade.view().print_dropdown(CascadeField::Region);
    Ok(())
}

async fn run_municipalities(
    api: Arc<dyn LeadApi>,
    settings: &ClientSettings,
    region: &str,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let (mut cascade, mut events) = cascade(api, settings);
    select_region(&mut cascade, &mut events, settings, region).await?;

    if let Some(text) = filter {
        cascade.handle(CascadeEvent::MunicipalityInput(text.to_string()));
        pump(&mut cascade, &mut events, settings, |e| {
            matches!(e, CascadeEvent::MunicipalityQuery(_))
        })
        .await?;
    }

    cascade.view().print_dropdown(CascadeField::Municipality);
    Ok(())
}

async fn run_neighborhoods(
    api: Arc<dyn LeadApi>,
    settings: &ClientSettings,
    region: &str,
    municipality: &str,
    query: &str,
) -> anyhow::Result<()> {
    if query.chars().count() < settings.timings.min_query_chars {
        bail!(
            "A busca de bairros precisa de pelo menos {} caracteres",
            settings.timings.min_query_chars
        );
    }

    let (mut cascade, mut events) = cascade(api, settings);
    select_municipality(&mut cascade, &mut events, settings, region, municipality).await?;
    cascade.handle(CascadeEvent::NeighborhoodInput(query.to_string()));
    pump(&mut cascade, &mut events, settings, |e| {
        matches!(e, CascadeEvent::NeighborhoodsLoaded { .. })
    })
    .await?;

    cascade.view().print_dropdown(CascadeField::Neighborhood);
    Ok(())
}

async fn run_search(
    api: Arc<dyn LeadApi>,
    settings: &ClientSettings,
    args: &SearchArgs,
) -> anyhow::Result<()> {
    let mut form = args.to_form(&settings.form_defaults)?;

    // 州與市先經過串接選單，換成伺服器上的正式名稱
    let (mut cascade, mut events) = cascade(Arc::clone(&api), settings);
    select_municipality(
        &mut cascade,
        &mut events,
        settings,
        &args.region,
        &args.municipality,
    )
    .await?;
    if let Some(neighborhood) = &args.neighborhood {
        cascade.handle(CascadeEvent::SelectNeighborhood(neighborhood.clone()));
    }
    cascade.state().fill_form(&mut form);

    let storage = LocalStorage::new(settings.output_path.clone());
    let mut search = SearchController::new(
        api,
        TerminalResultsView::new(),
        storage,
        settings.form_defaults.clone(),
    );

    let outcome = search.submit(&form).await;
    if let SearchOutcome::Invalid(message) | SearchOutcome::Failed(message) = &outcome {
        bail!(message.clone());
    }

    if let Some(path) = &args.html {
        let html = match &outcome {
            SearchOutcome::Found(total) => results_html(
                &format!("{} lead(s) encontrado(s)", total),
                &lead_cards(search.leads()),
            ),
            _ => empty_state_html().to_string(),
        };
        tokio::fs::write(path, html)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("📁 HTML salvo em: {}", path.display());
    }

    if outcome == SearchOutcome::Empty {
        return Ok(());
    }

    if let Some(filename) = &args.csv {
        let path = search.export_csv(filename).await?;
        println!("📁 CSV salvo em: {}", path);
    }

    if args.export {
        match search.export().await {
            ExportOutcome::Saved { path, bytes } => {
                println!("📁 Planilha salva em: {} ({} bytes)", path, bytes)
            }
            ExportOutcome::Nothing => {}
            ExportOutcome::Failed(message) => bail!(message),
        }
    }

    Ok(())
}
