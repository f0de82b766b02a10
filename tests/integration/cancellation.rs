//! Cancellation and busy-session integration tests.
//!
//! These tests verify that a cancelled operation leaves the content graph as
//! it was, that only one operation runs at a time, and that subscribers see
//! the lifecycle as it happens.

use std::time::Duration;

use copyloom::error::Error;
use copyloom::store::{Activity, Event, Outcome};
use copyloom::OperationKind;

use super::fixtures::*;

/// Test: Cancel during generation
/// Given a generate_base whose provider call never returns
/// When cancel is requested
/// Then the call resolves as Cancelled and no node is appended
#[tokio::test]
async fn test_cancel_in_flight_generation() {
    let provider = ScriptedProvider::new(vec![Step::Hang]);
    let orchestrator = orchestrator(&provider);

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_base(&brief()).await });
    wait_for_calls(&provider, 1).await;

    assert!(orchestrator.cancel());
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("cancelled generation did not return")
        .unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(orchestrator.graph().is_empty());
    assert!(!orchestrator.session().is_busy());
    assert_eq!(
        orchestrator.activity(),
        Activity::Cancelled(OperationKind::GenerateBase)
    );
}

/// Test: Cancel during the auxiliary chain
/// Given generation succeeded and scoring hangs
/// When cancel is requested
/// Then the drafted copy is discarded
#[tokio::test]
async fn test_cancel_during_scoring_discards_draft() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Drafted copy that will never land.".to_string()),
        Step::Hang,
    ]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief();
    brief.features.generate_score = true;

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_base(&brief).await });
    wait_for_calls(&provider, 2).await;
    orchestrator.cancel();

    let result = handle.await.unwrap();
    assert!(result.unwrap_err().is_cancelled());
    assert!(orchestrator.graph().is_empty());
}

/// Test: Cancel keeps earlier nodes
/// Given one committed base node
/// When a later alternative is cancelled
/// Then the graph still holds exactly the base node
#[tokio::test]
async fn test_cancel_preserves_existing_graph() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Committed base copy.".to_string()),
        Step::Hang,
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let running = orchestrator.clone();
    let handle =
        tokio::spawn(async move { running.create_alternative(base.id, &brief()).await });
    wait_for_calls(&provider, 2).await;
    orchestrator.cancel();
    assert!(handle.await.unwrap().unwrap_err().is_cancelled());

    let graph = orchestrator.graph();
    assert_eq!(graph.ids(), vec![base.id]);
}

/// Test: Cancel during a later revision
/// Given a 200-word target and two drafts outside tolerance
/// When cancel arrives while the second revision is in flight
/// Then the call is Cancelled, nothing is appended and no further request is made
#[tokio::test]
async fn test_cancel_during_second_revision() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply(words(250)),
        Step::Reply(words(240)),
        Step::Hang,
        Step::Reply(words(200)),
    ]);
    let orchestrator = orchestrator(&provider);

    let running = orchestrator.clone();
    let handle =
        tokio::spawn(async move { running.generate_base(&brief_with_target(200)).await });
    wait_for_calls(&provider, 3).await;
    assert!(provider.prompts()[2].user.contains("240 words"));

    orchestrator.cancel();
    let result = handle.await.unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(orchestrator.graph().is_empty());
    assert_eq!(provider.calls(), 3);
    assert_eq!(provider.remaining(), 1);
}

/// Test: A stored score survives a later cancelled rescore
/// Given a node scored once
/// When a second generate_score is cancelled while its call hangs
/// Then the first score is still on the node
#[tokio::test]
async fn test_cancelled_rescore_keeps_landed_score() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Copy worth scoring.".to_string()),
        Step::Reply(SCORE_JSON.to_string()),
        Step::Hang,
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();
    orchestrator.generate_score(base.id).await.unwrap();

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_score(base.id).await });
    wait_for_calls(&provider, 3).await;
    orchestrator.cancel();

    assert!(handle.await.unwrap().unwrap_err().is_cancelled());
    let node = orchestrator.node(&base.id).unwrap();
    assert_eq!(node.score.unwrap().overall, 82);
    assert_eq!(
        orchestrator.activity(),
        Activity::Cancelled(OperationKind::GenerateScore)
    );
}

/// Test: Second operation while one runs
/// Given a generation in flight
/// When scoring is requested
/// Then it is rejected as Busy and the running operation is untouched
#[tokio::test]
async fn test_concurrent_operation_is_busy() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Existing copy.".to_string()),
        Step::Hang,
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_base(&brief()).await });
    wait_for_calls(&provider, 2).await;

    let err = orchestrator.generate_score(base.id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Busy {
            operation: OperationKind::GenerateBase
        }
    ));
    assert_eq!(provider.calls(), 2);
    assert!(orchestrator.session().is_busy());

    orchestrator.cancel();
    assert!(handle.await.unwrap().is_err());
}

/// Test: Cancel with nothing running is a no-op
#[tokio::test]
async fn test_cancel_when_idle() {
    let provider = ScriptedProvider::replies(&["Copy."]);
    let orchestrator = orchestrator(&provider);

    assert!(!orchestrator.cancel());

    let node = orchestrator.generate_base(&brief()).await.unwrap();
    assert!(!orchestrator.cancel());
    assert!(orchestrator.node(&node.id).is_some());
}

/// Test: Session is reusable after a cancel
#[tokio::test]
async fn test_operation_after_cancel_succeeds() {
    let provider = ScriptedProvider::new(vec![
        Step::Hang,
        Step::Reply("Second attempt copy.".to_string()),
    ]);
    let orchestrator = orchestrator(&provider);

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_base(&brief()).await });
    wait_for_calls(&provider, 1).await;
    orchestrator.cancel();
    handle.await.unwrap().unwrap_err();

    let node = orchestrator.generate_base(&brief()).await.unwrap();
    assert_eq!(orchestrator.graph().ids(), vec![node.id]);
    assert_eq!(provider.remaining(), 0);
}

/// Test: Subscribers observe the lifecycle
/// Given a subscriber registered before generation
/// When generate_base succeeds
/// Then it sees start, progress, the appended node and a successful finish in order
#[tokio::test]
async fn test_subscriber_sees_lifecycle() {
    let provider = ScriptedProvider::replies(&["Lifecycle copy."]);
    let orchestrator = orchestrator(&provider);
    let mut events = orchestrator.subscribe();

    let node = orchestrator.generate_base(&brief()).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(matches!(
        seen.first(),
        Some(Event::OperationStarted {
            operation: OperationKind::GenerateBase
        })
    ));
    assert!(seen.iter().any(|e| matches!(e, Event::Progress { .. })));
    let appended = seen
        .iter()
        .position(|e| matches!(e, Event::NodeAppended { id, .. } if *id == node.id))
        .expect("node appended event");
    let finished = seen
        .iter()
        .position(|e| {
            matches!(
                e,
                Event::OperationFinished {
                    outcome: Outcome::Succeeded,
                    ..
                }
            )
        })
        .expect("finished event");
    assert!(appended < finished);
    assert_eq!(finished, seen.len() - 1);
}

/// Test: Cancelled operation reports a cancelled outcome
#[tokio::test]
async fn test_subscriber_sees_cancelled_outcome() {
    let provider = ScriptedProvider::new(vec![Step::Hang]);
    let orchestrator = orchestrator(&provider);
    let mut events = orchestrator.subscribe();

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_base(&brief()).await });
    wait_for_calls(&provider, 1).await;
    orchestrator.cancel();
    handle.await.unwrap().unwrap_err();

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(Event::OperationFinished {
            operation: OperationKind::GenerateBase,
            outcome: Outcome::Cancelled,
        })
    );
}
