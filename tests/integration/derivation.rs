//! Derivation and assessment integration tests.
//!
//! These tests verify that derived nodes never mutate their parent, that
//! provenance is recorded, and that assessments attach to existing nodes.

use std::time::Duration;

use copyloom::core::{Derivation, NodeKind};
use copyloom::error::Error;
use copyloom::store::{Activity, Message};
use copyloom::{ContentGraph, OperationKind};

use super::fixtures::*;

/// Test: Styled rewrite leaves the parent untouched
/// Given a base node
/// When apply_style("steve-jobs") succeeds
/// Then a styled child exists and the parent text is unchanged
#[tokio::test]
async fn test_apply_style_preserves_parent() {
    let provider = ScriptedProvider::replies(&[
        "Fresh sourdough, delivered to your door every morning before 7am.",
        "Bread. Reinvented. At your door by seven.",
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let styled = orchestrator.apply_style(base.id, "steve-jobs").await.unwrap();

    assert_eq!(styled.derived_from, Some(base.id));
    assert_eq!(
        styled.derivation,
        Derivation::Styled {
            style: "steve-jobs".to_string()
        }
    );
    let graph = orchestrator.graph();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.get(&base.id).unwrap().text, base.text);
    assert_eq!(graph.parent(&styled.id).unwrap().id, base.id);
    assert!(provider.prompts()[1].user.contains(&base.text));
}

/// Test: Unknown style is rejected without a provider call
#[tokio::test]
async fn test_unknown_style_makes_no_call() {
    let provider = ScriptedProvider::replies(&["Base copy."]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let err = orchestrator.apply_style(base.id, "shakespeare-ish").await.unwrap_err();

    assert!(matches!(err, Error::UnknownStyle(_)));
    assert_eq!(provider.calls(), 1);
    assert_eq!(orchestrator.graph().len(), 1);
}

/// Test: Alternative without a target inherits the parent length
/// Given a 100-word base node and a brief with no target
/// When the first alternative is 130 words and the second 101
/// Then the loop revises toward 100 and keeps the 101-word draft
#[tokio::test]
async fn test_alternative_targets_parent_length() {
    let base_text = words(100);
    let long = words(130);
    let close = words(101);
    let provider = ScriptedProvider::replies(&[&base_text, &long, &close]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let alternative = orchestrator
        .create_alternative(base.id, &brief())
        .await
        .unwrap();

    assert_eq!(alternative.kind(), NodeKind::Alternative);
    assert_eq!(alternative.word_count, 101);
    assert_eq!(provider.calls(), 3);
}

/// Test: Derivations chain
/// Given base -> alternative -> humanized
/// Then lineage walks back to the base
#[tokio::test]
async fn test_humanize_alternative_builds_lineage() {
    let provider = ScriptedProvider::replies(&[
        "Base copy here.",
        "Alternative copy here.",
        "Alternative copy, but friendlier.",
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();
    let alternative = orchestrator
        .create_alternative(base.id, &brief())
        .await
        .unwrap();
    let humanized = orchestrator.humanize(alternative.id).await.unwrap();

    let graph = orchestrator.graph();
    let lineage: Vec<_> = graph.lineage(&humanized.id).iter().map(|n| n.id).collect();
    assert_eq!(lineage, vec![alternative.id, base.id]);
    assert_eq!(graph.children(&base.id).len(), 1);
}

/// Test: Missing parent is rejected
#[tokio::test]
async fn test_humanize_missing_node() {
    let provider = ScriptedProvider::replies(&[]);
    let orchestrator = orchestrator(&provider);

    let err = orchestrator
        .humanize(copyloom::NodeId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NodeNotFound(_)));
    assert_eq!(provider.calls(), 0);
}

/// Test: Scoring twice replaces the score
/// Given a base node
/// When generate_score runs twice with different results
/// Then the node carries the second score and no node is added
#[tokio::test]
async fn test_rescoring_is_last_write_wins() {
    let second = SCORE_JSON.replace("\"overall\": 82", "\"overall\": 64");
    let provider = ScriptedProvider::replies(&["Base copy.", SCORE_JSON, &second]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    orchestrator.generate_score(base.id).await.unwrap();
    let latest = orchestrator.generate_score(base.id).await.unwrap();

    assert_eq!(latest.overall, 64);
    let graph = orchestrator.graph();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get(&base.id).unwrap().score.as_ref().unwrap().overall, 64);
}

/// Test: SEO and GEO attach to a derived node only
#[tokio::test]
async fn test_assessments_target_one_node() {
    let provider = ScriptedProvider::replies(&[
        "Base copy.",
        "Humanized copy.",
        SEO_JSON,
        GEO_JSON,
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();
    let humanized = orchestrator.humanize(base.id).await.unwrap();

    orchestrator.generate_seo(humanized.id).await.unwrap();
    orchestrator.generate_geo(humanized.id).await.unwrap();

    let graph = orchestrator.graph();
    let child = graph.get(&humanized.id).unwrap();
    assert!(child.seo.is_some());
    assert_eq!(child.geo.as_ref().unwrap().overall, 61);
    let parent = graph.get(&base.id).unwrap();
    assert!(parent.seo.is_none() && parent.geo.is_none());
}

/// Test: A malformed assessment leaves the previous one in place
#[tokio::test]
async fn test_malformed_score_keeps_previous() {
    let provider = ScriptedProvider::replies(&["Base copy.", SCORE_JSON, "no json here"]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();
    orchestrator.generate_score(base.id).await.unwrap();

    let err = orchestrator.generate_score(base.id).await.unwrap_err();

    assert!(err.provider_kind().is_some());
    assert_eq!(
        orchestrator.node(&base.id).unwrap().score.unwrap().overall,
        82
    );
}

/// Test: A score for a node that vanished mid-call is a failure
/// Given a scoring call in flight
/// When the graph is replaced before the reply lands
/// Then generate_score fails with NodeNotFound and the activity stays failed
#[tokio::test]
async fn test_score_for_vanished_node_fails() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Copy that will be replaced.".to_string()),
        Step::Delayed(Duration::from_millis(100), SCORE_JSON.to_string()),
    ]);
    let orchestrator = orchestrator(&provider);
    let base = orchestrator.generate_base(&brief()).await.unwrap();

    let running = orchestrator.clone();
    let handle = tokio::spawn(async move { running.generate_score(base.id).await });
    wait_for_calls(&provider, 2).await;
    orchestrator
        .store()
        .dispatch(Message::GraphReplaced(ContentGraph::new()));

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(id) if id == base.id));
    assert!(matches!(
        orchestrator.activity(),
        Activity::Failed {
            operation: OperationKind::GenerateScore,
            ..
        }
    ));
}

/// Test: Input evaluation does not touch the graph
#[tokio::test]
async fn test_evaluate_inputs_is_advisory() {
    let provider = ScriptedProvider::replies(&[
        r#"{"score": 55, "summary": "Audience is vague.", "tips": ["Name the city", "Add a price"]}"#,
    ]);
    let orchestrator = orchestrator(&provider);

    let evaluation = orchestrator.evaluate_inputs(&brief()).await.unwrap();

    assert_eq!(evaluation.score, 55);
    assert_eq!(evaluation.tips.len(), 2);
    assert!(orchestrator.graph().is_empty());
}
