use api_tester_core::{ApiConfig, InvocationState, InvocationStatus, ParameterMap, Payload};
use test_harness::{controller_for, unreachable_base_url};

fn unreachable_api() -> ApiConfig {
    ApiConfig {
        base_url: unreachable_base_url(),
        token: Some("irrelevant".to_string()),
        ..ApiConfig::default()
    }
}

#[tokio::test]
async fn test_connection_refused_marks_failed() {
    let controller = controller_for(&unreachable_api());

    let params = ParameterMap::new().with("individual_screening_id", "abc-123");
    let result = controller.invoke(1, None, None, &params).await;
    assert!(result.is_ok(), "transport failures must not escape invoke");

    let state = controller.state(1).unwrap();
    assert_eq!(state.status(), InvocationStatus::Failed);
    match state.payload() {
        Payload::Error(message) => assert!(!message.trim().is_empty()),
        other => panic!("expected an error payload, got {:?}", other),
    }
    assert!(state.payload().to_string().starts_with("Error: "));
}

#[tokio::test]
async fn test_failure_is_confined_to_its_operation() {
    let controller = controller_for(&unreachable_api());

    controller.invoke_sample(8).await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot[8].status(), InvocationStatus::Failed);
    for (index, state) in snapshot.iter().enumerate().filter(|(i, _)| *i != 8) {
        assert_eq!(*state, InvocationState::idle(), "operation {} was touched", index);
    }
}

#[tokio::test]
async fn test_nothing_left_pending_after_failures() {
    let controller = controller_for(&unreachable_api());

    let handles: Vec<_> = (0..controller.registry().len())
        .map(|index| controller.spawn_sample(index).unwrap())
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    assert!(controller
        .snapshot()
        .iter()
        .all(|state| state.status() == InvocationStatus::Failed));
}
