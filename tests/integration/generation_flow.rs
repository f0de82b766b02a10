//! Base generation integration tests.
//!
//! These tests verify that generate_base drives the word-count loop to a
//! satisfying or closest draft and chains the enabled auxiliary steps.

use copyloom::core::NodeKind;
use copyloom::error::{Error, Phase, ProviderErrorKind};
use copyloom::store::Activity;
use copyloom::{OperationKind, ProviderError};

use super::fixtures::*;

/// Test: Revision converges within tolerance
/// Given target 200, tolerance 2%, max 3 revisions
/// When the first draft has 250 words and the second 204
/// Then the loop stops after two requests with the 204-word draft
#[tokio::test]
async fn test_revision_converges_on_second_attempt() {
    let first = words(250);
    let second = words(204);
    let provider = ScriptedProvider::replies(&[&first, &second]);
    let orchestrator = orchestrator(&provider);

    let node = orchestrator
        .generate_base(&brief_with_target(200))
        .await
        .unwrap();

    assert_eq!(node.word_count, 204);
    assert_eq!(node.kind(), NodeKind::Base);
    assert_eq!(provider.calls(), 2);

    let revision = &provider.prompts()[1];
    assert!(revision.user.contains("250 words"));
    assert!(revision.user.contains("between 196 and 204 words"));
}

/// Test: Short copy uses the wide band
/// Given target 40 words (short) and a 20% band
/// When the first draft has 45 words
/// Then it is accepted on the first attempt
#[tokio::test]
async fn test_short_target_accepts_first_draft() {
    let draft = words(45);
    let provider = ScriptedProvider::replies(&[&draft]);
    let orchestrator = orchestrator(&provider);

    let node = orchestrator
        .generate_base(&brief_with_target(40))
        .await
        .unwrap();

    assert_eq!(node.word_count, 45);
    assert_eq!(provider.calls(), 1);
}

/// Test: Exhaustion keeps the closest draft
/// Given max 2 revisions and no draft within tolerance
/// When the budget is spent
/// Then the closest draft becomes the node instead of an error
#[tokio::test]
async fn test_exhausted_loop_keeps_closest_draft() {
    let drafts = [words(300), words(230), words(260)];
    let provider = ScriptedProvider::replies(&[&drafts[0], &drafts[1], &drafts[2]]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief_with_target(200);
    brief.word_policy.max_revisions = 2;

    let node = orchestrator.generate_base(&brief).await.unwrap();

    assert_eq!(node.word_count, 230);
    assert_eq!(provider.calls(), 3);
    assert_eq!(orchestrator.graph().len(), 1);
}

/// Test: Strict mode demands an exact count
#[tokio::test]
async fn test_strict_mode_revises_near_miss() {
    let near = words(151);
    let exact = words(150);
    let provider = ScriptedProvider::replies(&[&near, &exact]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief_with_target(150);
    brief.features.strict_word_count = true;

    let node = orchestrator.generate_base(&brief).await.unwrap();

    assert_eq!(node.word_count, 150);
    assert!(provider.prompts()[1].user.contains("exactly 150 words"));
}

/// Test: Section budgets set the target
#[tokio::test]
async fn test_section_budgets_define_target() {
    let draft = words(120);
    let provider = ScriptedProvider::replies(&[&draft]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief();
    brief.sections = vec![
        copyloom::core::SectionSpec::new("Hook", 40),
        copyloom::core::SectionSpec::new("Offer", 80),
    ];

    let node = orchestrator.generate_base(&brief).await.unwrap();

    assert_eq!(node.word_count, 120);
    assert_eq!(provider.calls(), 1);
    assert!(provider.prompts()[0].user.contains("Hook"));
}

/// Test: A transient failure is retried inside the loop budget
#[tokio::test]
async fn test_transient_failure_is_retried() {
    let provider = ScriptedProvider::new(vec![
        Step::Fail(ProviderError::transient("503 upstream")),
        Step::Reply(words(200)),
    ]);
    let orchestrator = orchestrator(&provider);

    let node = orchestrator
        .generate_base(&brief_with_target(200))
        .await
        .unwrap();
    assert_eq!(node.word_count, 200);
    assert_eq!(provider.calls(), 2);
}

/// Test: Auxiliary chain runs in order
/// Given score, SEO and GEO enabled
/// When generation succeeds
/// Then the node carries all three and the provider saw four requests
#[tokio::test]
async fn test_auxiliary_chain_populates_node() {
    let provider = ScriptedProvider::replies(&[
        "Warm sourdough at your door before seven.",
        SCORE_JSON,
        SEO_JSON,
        GEO_JSON,
    ]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief();
    brief.features.generate_score = true;
    brief.features.generate_seo = true;
    brief.features.generate_geo = true;

    let node = orchestrator.generate_base(&brief).await.unwrap();

    assert_eq!(node.score.as_ref().unwrap().overall, 82);
    let seo = node.seo.as_ref().unwrap();
    assert_eq!(seo.url_slugs[0].text, "sourdough-delivery");
    assert_eq!(seo.url_slugs[0].char_count, 18);
    assert_eq!(node.geo.as_ref().unwrap().suggestions, vec!["Add delivery area"]);
    assert_eq!(provider.calls(), 4);
    assert_eq!(
        orchestrator.activity(),
        Activity::Succeeded(OperationKind::GenerateBase)
    );
}

/// Test: Auxiliary failure keeps the node and names the phase
#[tokio::test]
async fn test_geo_failure_reports_phase_and_keeps_node() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply("Warm sourdough at your door.".to_string()),
        Step::Reply(SCORE_JSON.to_string()),
        Step::Fail(ProviderError::auth("key revoked")),
    ]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief();
    brief.features.generate_score = true;
    brief.features.generate_geo = true;

    let err = orchestrator.generate_base(&brief).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Geo));
    assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Auth));
    let Error::Generation { retained, .. } = err else {
        panic!("expected a generation error");
    };
    let graph = orchestrator.graph();
    assert_eq!(retained, graph.ids());
    let node = graph.get(&retained[0]).unwrap();
    assert!(node.score.is_some());
    assert!(node.geo.is_none());
}

/// Test: Generation failure appends nothing
#[tokio::test]
async fn test_malformed_generation_appends_nothing() {
    let provider = ScriptedProvider::new(vec![Step::Reply("   ".to_string())]);
    let orchestrator = orchestrator(&provider);

    let err = orchestrator.generate_base(&brief()).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Generation));
    assert_eq!(err.provider_kind(), Some(ProviderErrorKind::MalformedResponse));
    assert!(orchestrator.graph().is_empty());
}

/// Test: Invalid brief never reaches the provider
#[tokio::test]
async fn test_validation_happens_before_any_call() {
    let provider = ScriptedProvider::replies(&[]);
    let orchestrator = orchestrator(&provider);
    let mut brief = brief();
    brief.business.product_description.clear();

    let err = orchestrator.generate_base(&brief).await.unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(provider.calls(), 0);
}

/// Test: Progress log restarts with each operation
#[tokio::test]
async fn test_progress_log_is_per_operation() {
    let provider = ScriptedProvider::replies(&["First copy.", SCORE_JSON]);
    let orchestrator = orchestrator(&provider);

    let node = orchestrator.generate_base(&brief()).await.unwrap();
    let first_log = orchestrator.progress_log();
    assert!(!first_log.is_empty());

    orchestrator.generate_score(node.id).await.unwrap();
    let second_log = orchestrator.progress_log();
    assert!(second_log[0].starts_with("Scoring"));
    assert!(second_log.iter().all(|line| !first_log.contains(line)));
}
