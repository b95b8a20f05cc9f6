mod common;

use botleads_client::core::cascade::{
    LOADING_MUNICIPALITIES, MUNICIPALITIES_ERROR, SEARCHING_NEIGHBORHOODS, SELECT_REGION_FIRST,
};
use botleads_client::domain::ports::{CascadeField, LeadApi};
use botleads_client::{AutocompleteTimings, CascadeController, CascadeEvent};
use common::{municipality, region, FakeApi, RecordingView, ViewCall};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

struct Harness {
    controller: CascadeController<RecordingView>,
    events: UnboundedReceiver<CascadeEvent>,
    view: RecordingView,
}

impl Harness {
    fn new(api: Arc<FakeApi>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let view = RecordingView::default();
        let api: Arc<dyn LeadApi> = api;
        let controller =
            CascadeController::new(api, view.clone(), tx, AutocompleteTimings::default());
        Self {
            controller,
            events,
            view,
        }
    }

    /// 取下一個內部事件並交給控制器處理
    async fn step(&mut self) -> String {
        let event = self.events.recv().await.expect("event channel open");
        let name = format!("{:?}", event);
        self.controller.handle(event);
        name
    }

    async fn idle_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.events.recv()).await.is_err()
    }

    async fn with_regions(api: Arc<FakeApi>) -> Self {
        let mut harness = Self::new(api);
        harness.controller.load_regions();
        harness.step().await;
        harness.view.clear();
        harness
    }

    async fn with_municipality(api: Arc<FakeApi>) -> Self {
        let mut harness = Self::with_regions(api).await;
        harness
            .controller
            .handle(CascadeEvent::SelectRegion(region(35, "São Paulo", "SP")));
        harness.step().await;
        harness
            .controller
            .handle(CascadeEvent::SelectMunicipality(municipality(3509502, "Campinas")));
        harness.view.clear();
        harness
    }
}

#[tokio::test(start_paused = true)]
async fn test_focus_shows_cached_regions() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;
    assert_eq!(h.controller.regions().len(), 3);

    h.controller.handle(CascadeEvent::RegionFocus);
    assert_eq!(
        h.view.calls(),
        vec![ViewCall::List(
            CascadeField::Region,
            vec![
                "Rio de Janeiro".to_string(),
                "Rio Grande do Sul".to_string(),
                "São Paulo".to_string()
            ]
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_region_load_failure_leaves_list_empty() {
    let api = FakeApi {
        regions: None,
        ..FakeApi::brazil()
    };
    let mut h = Harness::with_regions(Arc::new(api)).await;

    assert!(h.controller.regions().is_empty());
    h.controller.handle(CascadeEvent::RegionFocus);
    assert!(h.view.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_region_input_is_debounced_and_filtered() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;
    let start = tokio::time::Instant::now();

    h.controller.handle(CascadeEvent::RegionInput("r".into()));
    h.controller.handle(CascadeEvent::RegionInput("ri".into()));
    h.controller.handle(CascadeEvent::RegionInput("rio g".into()));

    let fired = h.step().await;
    assert!(fired.contains("RegionQuery(\"rio g\")"));
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(
        h.view.calls(),
        vec![ViewCall::List(
            CascadeField::Region,
            vec!["Rio Grande do Sul".to_string()]
        )]
    );

    // 之前的輸入不會再觸發
    assert!(h.idle_for(Duration::from_secs(1)).await);
}

#[tokio::test(start_paused = true)]
async fn test_short_region_query_shows_full_list_and_no_match_shows_empty() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    h.controller.handle(CascadeEvent::RegionInput("s".into()));
    h.step().await;
    h.controller.handle(CascadeEvent::RegionInput("zz".into()));
    h.step().await;

    let calls = h.view.calls();
    assert!(matches!(&calls[0], ViewCall::List(CascadeField::Region, items) if items.len() == 3));
    assert_eq!(calls[1], ViewCall::Empty(CascadeField::Region));
}

#[tokio::test(start_paused = true)]
async fn test_select_region_locks_dependents_before_fetch_resolves() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    h.controller
        .handle(CascadeEvent::SelectRegion(region(35, "São Paulo", "SP")));

    // 請求還沒回來，市與區都已清空並停用
    let before = h.view.calls();
    let municipality_field = h.view.last_field(CascadeField::Municipality).unwrap();
    let neighborhood_field = h.view.last_field(CascadeField::Neighborhood).unwrap();
    assert!(!municipality_field.enabled);
    assert!(municipality_field.value.is_empty());
    assert_eq!(municipality_field.hidden_id, None);
    assert!(!neighborhood_field.enabled);
    assert!(neighborhood_field.value.is_empty());
    assert_eq!(
        before.last(),
        Some(&ViewCall::Loading(
            CascadeField::Municipality,
            LOADING_MUNICIPALITIES.to_string()
        ))
    );
    let region_field = h.view.last_field(CascadeField::Region).unwrap();
    assert_eq!(region_field.value, "São Paulo");
    assert_eq!(region_field.hidden_id.as_deref(), Some("35"));
    assert!(h.controller.state().municipality.is_none());

    let fired = h.step().await;
    assert!(fired.starts_with("MunicipalitiesLoaded"));

    let enabled = h.view.last_field(CascadeField::Municipality).unwrap();
    assert!(enabled.enabled);
    assert!(h.view.calls().contains(&ViewCall::List(
        CascadeField::Municipality,
        vec!["Campinas".to_string(), "Santos".to_string()]
    )));
    assert!(!h.view.last_field(CascadeField::Neighborhood).unwrap().enabled);
}

#[tokio::test(start_paused = true)]
async fn test_municipality_failure_renders_inline_error() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    // 43 沒有設定市清單，假 API 回傳錯誤
    h.controller
        .handle(CascadeEvent::SelectRegion(region(43, "Rio Grande do Sul", "RS")));
    h.step().await;

    assert_eq!(
        h.view.calls().last(),
        Some(&ViewCall::Error(
            CascadeField::Municipality,
            MUNICIPALITIES_ERROR.to_string()
        ))
    );
    assert!(!h.view.last_field(CascadeField::Municipality).unwrap().enabled);
    assert!(h.controller.municipalities().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_municipality_response_is_discarded() {
    let mut api = FakeApi::brazil();
    api.municipalities.insert(
        35,
        (Duration::from_secs(2), vec![municipality(3509502, "Campinas")]),
    );
    let mut h = Harness::with_regions(Arc::new(api)).await;

    h.controller
        .handle(CascadeEvent::SelectRegion(region(35, "São Paulo", "SP")));
    h.controller
        .handle(CascadeEvent::SelectRegion(region(33, "Rio de Janeiro", "RJ")));

    // 先回來的是較新的 RJ 請求，之後才是較舊的 SP 請求
    h.step().await;
    h.step().await;

    let names: Vec<&str> = h
        .controller
        .municipalities()
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Niterói"]);
    assert_eq!(h.controller.state().region.as_ref().unwrap().id, 33);
    assert!(!h.view.calls().contains(&ViewCall::List(
        CascadeField::Municipality,
        vec!["Campinas".to_string()]
    )));
}

#[tokio::test(start_paused = true)]
async fn test_municipality_input_requires_region() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    h.controller
        .handle(CascadeEvent::MunicipalityInput("camp".into()));
    assert!(h.idle_for(Duration::from_secs(1)).await);

    h.controller.handle(CascadeEvent::MunicipalityFocus);
    assert_eq!(
        h.view.calls(),
        vec![ViewCall::Notify(SELECT_REGION_FIRST.to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_municipality_filter_matches_name() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;
    h.controller
        .handle(CascadeEvent::SelectRegion(region(35, "São Paulo", "SP")));
    h.step().await;
    h.view.clear();

    h.controller
        .handle(CascadeEvent::MunicipalityInput("SAN".into()));
    h.step().await;

    assert_eq!(
        h.view.calls(),
        vec![ViewCall::List(
            CascadeField::Municipality,
            vec!["Santos".to_string()]
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_select_municipality_enables_optional_neighborhood() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;
    h.controller
        .handle(CascadeEvent::SelectRegion(region(35, "São Paulo", "SP")));
    h.step().await;

    h.controller
        .handle(CascadeEvent::SelectMunicipality(municipality(3509502, "Campinas")));

    let neighborhood = h.view.last_field(CascadeField::Neighborhood).unwrap();
    assert!(neighborhood.enabled);
    assert!(!neighborhood.required);
    assert!(neighborhood.value.is_empty());
    assert!(h.controller.state().neighborhood.is_empty());

    let municipality_field = h.view.last_field(CascadeField::Municipality).unwrap();
    assert_eq!(municipality_field.value, "Campinas");
    assert_eq!(municipality_field.hidden_id.as_deref(), Some("3509502"));
}

#[tokio::test(start_paused = true)]
async fn test_changing_municipality_clears_typed_neighborhood() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("Cambuí".into()));
    assert_eq!(h.controller.state().neighborhood, "Cambuí");

    h.controller
        .handle(CascadeEvent::SelectMunicipality(municipality(3548500, "Santos")));

    assert!(h.controller.state().neighborhood.is_empty());
    assert!(h
        .view
        .last_field(CascadeField::Neighborhood)
        .unwrap()
        .value
        .is_empty());
    // 切換市時，尚未觸發的區查詢也一併取消
    assert!(h.idle_for(Duration::from_secs(1)).await);
    assert_eq!(api.neighborhood_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_neighborhood_search_is_scoped_and_debounced() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;
    let start = tokio::time::Instant::now();

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("ca".into()));
    h.controller
        .handle(CascadeEvent::NeighborhoodInput("cam".into()));

    let fired = h.step().await;
    assert!(fired.contains("NeighborhoodQuery(\"cam\")"));
    assert!(start.elapsed() >= Duration::from_millis(500));
    h.step().await;

    assert_eq!(
        h.view.calls(),
        vec![
            ViewCall::Loading(
                CascadeField::Neighborhood,
                SEARCHING_NEIGHBORHOODS.to_string()
            ),
            ViewCall::List(CascadeField::Neighborhood, vec!["Cambuí".to_string()]),
        ]
    );

    let queries = api.neighborhood_queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].municipio, "Campinas");
    assert_eq!(queries[0].estado, "São Paulo");
    assert_eq!(queries[0].query, "cam");
    assert_eq!(h.controller.state().neighborhood, "cam");
}

#[tokio::test(start_paused = true)]
async fn test_short_neighborhood_query_hides_without_request() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller.handle(CascadeEvent::NeighborhoodInput("c".into()));
    h.step().await;

    assert_eq!(h.view.calls(), vec![ViewCall::Hide(CascadeField::Neighborhood)]);
    assert_eq!(api.neighborhood_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shortened_query_drops_in_flight_suggestions() {
    let api = Arc::new(FakeApi::brazil().with_neighborhood_delay("cam", Duration::from_secs(2)));
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("cam".into()));
    h.step().await;
    h.controller.handle(CascadeEvent::NeighborhoodInput("c".into()));
    let fired = h.step().await;
    assert!(fired.contains("NeighborhoodQuery(\"c\")"));

    // 較長查詢的結果最後才回來，必須被丟棄
    let late = h.step().await;
    assert!(late.starts_with("NeighborhoodsLoaded"));

    assert_eq!(
        h.view.calls(),
        vec![
            ViewCall::Loading(
                CascadeField::Neighborhood,
                SEARCHING_NEIGHBORHOODS.to_string()
            ),
            ViewCall::Hide(CascadeField::Neighborhood),
        ]
    );
    assert_eq!(api.neighborhood_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_neighborhood_response_is_discarded() {
    let api = Arc::new(FakeApi::brazil().with_neighborhood_delay("cam", Duration::from_secs(2)));
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("cam".into()));
    h.step().await;
    h.controller
        .handle(CascadeEvent::NeighborhoodInput("cen".into()));
    h.step().await;

    // 先回來的是較新的 "cen"，之後才是較舊的 "cam"
    h.step().await;
    h.step().await;

    let calls = h.view.calls();
    assert_eq!(
        calls.last(),
        Some(&ViewCall::List(
            CascadeField::Neighborhood,
            vec!["Centro".to_string()]
        ))
    );
    assert!(!calls.contains(&ViewCall::List(
        CascadeField::Neighborhood,
        vec!["Cambuí".to_string()]
    )));
    assert_eq!(api.neighborhood_calls(), 2);
    assert_eq!(h.controller.state().neighborhood, "cen");
}

#[tokio::test(start_paused = true)]
async fn test_neighborhood_without_results_hides_and_keeps_free_text() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("Jardim Inexistente".into()));
    h.step().await;
    h.step().await;

    assert_eq!(
        h.view.calls().last(),
        Some(&ViewCall::Hide(CascadeField::Neighborhood))
    );
    assert_eq!(h.controller.state().neighborhood, "Jardim Inexistente");
}

#[tokio::test(start_paused = true)]
async fn test_neighborhood_input_ignored_without_municipality() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_regions(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("centro".into()));
    assert!(h.idle_for(Duration::from_secs(1)).await);
    assert_eq!(api.neighborhood_calls(), 0);
    // 停用中的欄位不會寫入選擇狀態
    assert!(h.controller.state().neighborhood.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_region_change_cancels_pending_neighborhood_search() {
    let api = Arc::new(FakeApi::brazil());
    let mut h = Harness::with_municipality(Arc::clone(&api)).await;

    h.controller
        .handle(CascadeEvent::NeighborhoodInput("centro".into()));
    h.controller
        .handle(CascadeEvent::SelectRegion(region(33, "Rio de Janeiro", "RJ")));

    let fired = h.step().await;
    assert!(fired.starts_with("MunicipalitiesLoaded"));
    assert!(h.idle_for(Duration::from_secs(1)).await);
    assert_eq!(api.neighborhood_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_select_neighborhood_fills_input() {
    let mut h = Harness::with_municipality(Arc::new(FakeApi::brazil())).await;

    h.controller
        .handle(CascadeEvent::SelectNeighborhood("Cambuí".into()));

    let field = h.view.last_field(CascadeField::Neighborhood).unwrap();
    assert_eq!(field.value, "Cambuí");
    assert_eq!(h.controller.state().neighborhood, "Cambuí");
    assert_eq!(
        h.view.calls().last(),
        Some(&ViewCall::Hide(CascadeField::Neighborhood))
    );
}

#[tokio::test(start_paused = true)]
async fn test_blur_hides_after_grace_period() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    h.controller.handle(CascadeEvent::RegionBlur);
    assert!(h.idle_for(Duration::from_millis(150)).await);

    let fired = h.step().await;
    assert!(fired.contains("HideDropdown(Region)"));
    assert_eq!(h.view.calls(), vec![ViewCall::Hide(CascadeField::Region)]);
}

#[tokio::test(start_paused = true)]
async fn test_click_outside_hides_everything_immediately() {
    let mut h = Harness::with_regions(Arc::new(FakeApi::brazil())).await;

    h.controller.handle(CascadeEvent::ClickOutside);

    assert_eq!(
        h.view.calls(),
        vec![
            ViewCall::Hide(CascadeField::Region),
            ViewCall::Hide(CascadeField::Municipality),
            ViewCall::Hide(CascadeField::Neighborhood),
        ]
    );
}
