//! Snapshot persistence integration tests.
//!
//! These tests verify that sessions survive a save and restore through the
//! file store with ids and provenance intact, and that loader identifiers
//! are checked before anything is read.

use tempfile::TempDir;

use copyloom::error::Error;
use copyloom::persistence::{FileSnapshotStore, SnapshotKind, SnapshotRef, SnapshotStore};

use super::fixtures::*;

/// Test: Session round trip
/// Given a session with a base node and a scored humanized child
/// When it is saved and restored into a fresh orchestrator
/// Then nodes, ids, provenance and the brief come back unchanged
#[tokio::test]
async fn test_session_round_trip() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());

    let provider = ScriptedProvider::replies(&["Base copy.", "Friendlier copy.", SCORE_JSON]);
    let source = orchestrator(&provider);
    let base = source.generate_base(&brief()).await.unwrap();
    let child = source.humanize(base.id).await.unwrap();
    source.generate_score(child.id).await.unwrap();

    let reference = source
        .save_snapshot(&snapshots, SnapshotKind::Session)
        .await
        .unwrap();
    assert!(dir
        .path()
        .join("sessions")
        .join(format!("{}.json", reference.id()))
        .exists());

    let target = orchestrator(&ScriptedProvider::replies(&[]));
    let brief = target.restore(&snapshots, &reference).await.unwrap();

    assert_eq!(brief, super::fixtures::brief());
    assert_eq!(target.brief(), Some(brief));
    assert_eq!(target.graph().to_nodes(), source.graph().to_nodes());
    let restored = target.graph();
    assert_eq!(restored.parent(&child.id).unwrap().id, base.id);
    assert!(restored.get(&child.id).unwrap().score.is_some());
}

/// Test: Restore replaces rather than merges
#[tokio::test]
async fn test_restore_replaces_current_graph() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());

    let provider = ScriptedProvider::replies(&["Saved copy.", "Later copy."]);
    let orchestrator = orchestrator(&provider);
    let saved = orchestrator.generate_base(&brief()).await.unwrap();
    let reference = orchestrator
        .save_snapshot(&snapshots, SnapshotKind::SavedOutput)
        .await
        .unwrap();
    orchestrator.generate_base(&brief()).await.unwrap();
    assert_eq!(orchestrator.graph().len(), 2);

    orchestrator.restore(&snapshots, &reference).await.unwrap();

    assert_eq!(orchestrator.graph().ids(), vec![saved.id]);
}

/// Test: Templates carry the brief only
/// Given a session with nodes saved as a template
/// When the template is restored
/// Then the brief is set and the existing graph is left alone
#[tokio::test]
async fn test_template_restores_brief_only() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());

    let provider = ScriptedProvider::replies(&["Copy under the first brief."]);
    let orchestrator = orchestrator(&provider);
    let mut template_brief = brief();
    template_brief.business.call_to_action = "Order tonight".to_string();
    template_brief.tone.tone = "playful".to_string();
    let node = orchestrator.generate_base(&template_brief).await.unwrap();

    let reference = orchestrator
        .save_snapshot(&snapshots, SnapshotKind::Template)
        .await
        .unwrap_or_else(|e| panic!("save failed: {}", e));
    let stored = snapshots.load(&reference).await.unwrap();
    assert!(stored.nodes.is_empty());

    orchestrator.set_brief(brief());
    let restored = orchestrator.restore(&snapshots, &reference).await.unwrap();

    assert_eq!(restored.tone.tone, "playful");
    assert_eq!(
        orchestrator.brief().unwrap().business.call_to_action,
        "Order tonight"
    );
    assert_eq!(orchestrator.graph().ids(), vec![node.id]);
}

/// Test: Saving before any brief exists
#[tokio::test]
async fn test_save_without_brief_fails() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());
    let orchestrator = orchestrator(&ScriptedProvider::replies(&[]));

    let err = orchestrator
        .save_snapshot(&snapshots, SnapshotKind::Session)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(snapshots.list(SnapshotKind::Session).await.unwrap().is_empty());
}

/// Test: Unknown snapshot leaves the session alone
#[tokio::test]
async fn test_restore_missing_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());
    let provider = ScriptedProvider::replies(&["Existing copy."]);
    let orchestrator = orchestrator(&provider);
    let node = orchestrator.generate_base(&brief()).await.unwrap();

    let reference = SnapshotRef::new(SnapshotKind::Session, "does-not-exist").unwrap();
    let err = orchestrator.restore(&snapshots, &reference).await.unwrap_err();

    assert!(matches!(err, Error::SnapshotNotFound(_)));
    assert_eq!(orchestrator.graph().ids(), vec![node.id]);
    assert!(!orchestrator.session().is_busy());
}

/// Test: Loader identifiers are validated up front
/// Given malformed or conflicting identifiers
/// Then resolution fails and no reference exists to fetch with
#[test]
fn test_loader_identifiers_are_validated() {
    assert!(matches!(
        SnapshotRef::from_query(Some("../etc/passwd"), None, None),
        Err(Error::InvalidIdentifier(_))
    ));
    assert!(matches!(
        SnapshotRef::from_query(None, Some(""), None),
        Err(Error::InvalidIdentifier(_))
    ));
    assert!(matches!(
        SnapshotRef::from_query(Some("a"), None, Some("b")),
        Err(Error::Validation(_))
    ));
    assert_eq!(SnapshotRef::from_query(None, None, None).unwrap(), None);

    let reference = SnapshotRef::from_query(None, None, Some("launch_v2"))
        .unwrap()
        .unwrap();
    assert_eq!(reference.kind(), SnapshotKind::SavedOutput);
    assert_eq!(reference.id(), "launch_v2");
}

/// Test: Listing reflects saves per kind
#[tokio::test]
async fn test_list_snapshots_by_kind() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());
    let provider = ScriptedProvider::replies(&["Copy."]);
    let orchestrator = orchestrator(&provider);
    orchestrator.generate_base(&brief()).await.unwrap();

    let first = orchestrator
        .save_snapshot(&snapshots, SnapshotKind::Session)
        .await
        .unwrap();
    let second = orchestrator
        .save_snapshot(&snapshots, SnapshotKind::Session)
        .await
        .unwrap();

    let mut expected = vec![first.id().to_string(), second.id().to_string()];
    expected.sort();
    assert_eq!(snapshots.list(SnapshotKind::Session).await.unwrap(), expected);
    assert!(snapshots.list(SnapshotKind::Template).await.unwrap().is_empty());
}

/// Test: Stored word counts are recounted on restore
/// Given a saved session whose file claims 999 words for three-word copy
/// When it is restored and an alternative is derived
/// Then the node reports 3 words and the alternative targets 3
#[tokio::test]
async fn test_restore_recounts_edited_word_count() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path());
    let provider = ScriptedProvider::replies(&["Base copy here."]);
    let source = orchestrator(&provider);
    let base = source.generate_base(&brief()).await.unwrap();
    let reference = source
        .save_snapshot(&snapshots, SnapshotKind::Session)
        .await
        .unwrap();

    let path = dir
        .path()
        .join("sessions")
        .join(format!("{}.json", reference.id()));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("\"word_count\": 3,").count(), 1);
    std::fs::write(&path, contents.replace("\"word_count\": 3,", "\"word_count\": 999,")).unwrap();

    let provider = ScriptedProvider::replies(&["Another copy here."]);
    let target = orchestrator(&provider);
    target.restore(&snapshots, &reference).await.unwrap();
    assert_eq!(target.node(&base.id).unwrap().word_count, 3);

    let alternative = target.create_alternative(base.id, &brief()).await.unwrap();
    assert_eq!(alternative.word_count, 3);
    assert_eq!(provider.calls(), 1);
}
