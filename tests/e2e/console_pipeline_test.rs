use std::time::Duration;

use api_tester_core::{InvocationStatus, ParameterMap, Payload};
use serde_json::{json, Value};
use test_harness::{MockRegulonApi, TestFixtures, API_PREFIX, TEST_TOKEN};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn response_of(payload: &Payload) -> (u16, Value) {
    match payload {
        Payload::Response { status, body } => (
            *status,
            serde_json::from_str(body).expect("payload is valid JSON"),
        ),
        other => panic!("expected a response payload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_screening_status_round_trip() {
    let api = MockRegulonApi::start().await;
    api.respond("GET", "/screenings/status/abc-123", 200, TestFixtures::screening_status())
        .await;
    let controller = api.controller();

    let params = ParameterMap::new().with("individual_screening_id", "abc-123");
    controller.invoke(1, None, None, &params).await.unwrap();

    let state = controller.state(1).unwrap();
    assert_eq!(state.status(), InvocationStatus::Succeeded);
    let (status, body) = response_of(state.payload());
    assert_eq!(status, 200);
    assert_eq!(body, TestFixtures::screening_status());
}

#[tokio::test]
async fn test_company_search_sends_all_query_parameters() {
    let api = MockRegulonApi::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/companies/search", API_PREFIX)))
        .and(query_param("company_name", "Pepsi"))
        .and(query_param("country", "uk"))
        .and(query_param("page_number", "1"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestFixtures::company_search()))
        .expect(1)
        .mount(api.server())
        .await;
    let controller = api.controller();

    controller.invoke_sample(6).await.unwrap();

    let (status, body) = response_of(controller.state(6).unwrap().payload());
    assert_eq!(status, 200);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_post_sends_json_body_and_headers() {
    let api = MockRegulonApi::start().await;
    let sample = api.controller().registry().get(0).unwrap().sample.clone();
    Mock::given(method("POST"))
        .and(path(format!("{}/screenings", API_PREFIX)))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(sample.body.clone().unwrap()))
        .respond_with(ResponseTemplate::new(201).set_body_json(TestFixtures::screening_submitted()))
        .expect(1)
        .mount(api.server())
        .await;
    let controller = api.controller();

    controller.invoke_sample(0).await.unwrap();

    let (status, body) = response_of(controller.state(0).unwrap().payload());
    assert_eq!(status, 201);
    assert_eq!(body, TestFixtures::screening_submitted());
}

#[tokio::test]
async fn test_patch_monitoring() {
    let api = MockRegulonApi::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!(
            "{}/screenings/517b2242-2f48-4a06-ab36-5694a4066cee/monitoring",
            API_PREFIX
        )))
        .and(body_json(json!({ "monitoring": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestFixtures::monitoring_updated()))
        .mount(api.server())
        .await;
    let controller = api.controller();

    controller.invoke_sample(5).await.unwrap();

    let (status, body) = response_of(controller.state(5).unwrap().payload());
    assert_eq!(status, 200);
    assert_eq!(body["monitoring"], true);
}

#[tokio::test]
async fn test_rejected_credential_is_surfaced_as_response() {
    let api = MockRegulonApi::start().await;
    // An empty credential goes out as "Bearer "; the trailing space does
    // not survive header parsing on the server side.
    Mock::given(header("authorization", "Bearer"))
        .respond_with(ResponseTemplate::new(401).set_body_json(TestFixtures::unauthorized()))
        .expect(1)
        .mount(api.server())
        .await;
    let controller = test_harness::controller_for(&api.api_config(None));

    controller.invoke_sample(11).await.unwrap();

    let state = controller.state(11).unwrap();
    assert_eq!(state.status(), InvocationStatus::Succeeded);
    let (status, body) = response_of(state.payload());
    assert_eq!(status, 401);
    assert_eq!(body, TestFixtures::unauthorized());
}

#[tokio::test]
async fn test_unresolved_placeholder_reaches_the_server() {
    let api = MockRegulonApi::start().await;
    api.respond("GET", "/online_footprints/%7Bid%7D", 404, json!({ "error": "Not Found" }))
        .await;
    let controller = api.controller();

    controller
        .invoke(11, None, None, &ParameterMap::new())
        .await
        .unwrap();

    let (status, _) = response_of(controller.state(11).unwrap().payload());
    assert_eq!(status, 404);
    assert_eq!(api.received_count().await, 1);
}

#[tokio::test]
async fn test_every_sample_runs_concurrently() {
    let api = MockRegulonApi::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(api.server())
        .await;
    let controller = api.controller();

    let handles: Vec<_> = (0..controller.registry().len())
        .map(|index| controller.spawn_sample(index).unwrap())
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let snapshot = controller.snapshot();
    assert!(snapshot
        .iter()
        .all(|state| state.status() == InvocationStatus::Succeeded));
    assert_eq!(api.received_count().await, controller.registry().len());
}

#[tokio::test]
async fn test_slower_overlapping_call_wins() {
    let api = MockRegulonApi::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/screenings/status/slow", API_PREFIX)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "slow" }))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(api.server())
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/screenings/status/fast", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "fast" })))
        .mount(api.server())
        .await;
    let controller = api.controller();

    let slow = controller
        .spawn_invoke(1, None, None, ParameterMap::new().with("individual_screening_id", "slow"))
        .unwrap();
    let fast = controller
        .spawn_invoke(1, None, None, ParameterMap::new().with("individual_screening_id", "fast"))
        .unwrap();

    fast.await.unwrap();
    let (_, body) = response_of(controller.state(1).unwrap().payload());
    assert_eq!(body["id"], "fast");

    slow.await.unwrap();
    let (_, body) = response_of(controller.state(1).unwrap().payload());
    assert_eq!(body["id"], "slow");
}
