//! The orchestrator: top-level coordinator of every user-initiated action.
//!
//! Each public operation claims the session, runs its phases (prompt build,
//! generation, auxiliary sub-generations) against the provider gateway and
//! reports through the store. Nodes reach the graph only fully formed, and
//! only after the last cancellation checkpoint has passed.

use tokio::sync::broadcast;

use super::adherence::AdherenceLoop;
use super::parse;
use super::session::{OperationGuard, OperationKind, SessionController};
use crate::core::{
    Brief, ContentGraph, ContentNode, ContentScore, Derivation, GeoScore, InputEvaluation, NodeId,
    SeoMetadata,
};
use crate::error::{Error, Phase, Result};
use crate::persistence::{Snapshot, SnapshotKind, SnapshotRef, SnapshotStore};
use crate::prompt::{self, assemble, PromptPair, Request};
use crate::provider::ProviderGateway;
use crate::store::{Activity, Event, Message, Store};
use crate::{llog, llog_debug, llog_warn};

/// Text produced by the generation phase, before it becomes a node.
struct Draft {
    text: String,
    tokens_used: u64,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    gateway: ProviderGateway,
    session: SessionController,
    store: Store,
}

impl Orchestrator {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self::with_store(gateway, Store::new())
    }

    pub fn with_store(gateway: ProviderGateway, store: Store) -> Self {
        Self {
            gateway,
            session: SessionController::new(),
            store,
        }
    }

    // ========== Read access ==========

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Copy of the current graph.
    pub fn graph(&self) -> ContentGraph {
        self.store.read().graph.clone()
    }

    pub fn node(&self, id: &NodeId) -> Option<ContentNode> {
        self.store.read().graph.get(id).cloned()
    }

    pub fn brief(&self) -> Option<Brief> {
        self.store.read().brief.clone()
    }

    pub fn progress_log(&self) -> Vec<String> {
        self.store.read().progress.clone()
    }

    pub fn activity(&self) -> Activity {
        self.store.read().activity.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.store.subscribe()
    }

    /// Cancel the in-flight operation. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        self.session.cancel()
    }

    pub fn set_brief(&self, brief: Brief) {
        self.store.dispatch(Message::BriefLoaded(brief));
    }

    /// Discard the working session. Rejected while an operation runs.
    pub fn clear(&self) -> Result<()> {
        if let Some(current) = self.session.current() {
            return Err(Error::Busy {
                operation: current.kind,
            });
        }
        self.store.dispatch(Message::Cleared);
        Ok(())
    }

    // ========== Lifecycle plumbing ==========

    fn begin(&self, kind: OperationKind) -> Result<OperationGuard> {
        let guard = self.session.begin(kind)?;
        llog!("Orchestrator: {} started", kind);
        self.store.dispatch(Message::OperationStarted(kind));
        Ok(guard)
    }

    fn finish<T>(&self, guard: &OperationGuard, result: &Result<T>) {
        let kind = guard.kind();
        match result {
            Ok(_) => {
                llog!("Orchestrator: {} succeeded", kind);
                self.store.dispatch(Message::OperationSucceeded);
            }
            Err(Error::Cancelled) => {
                llog!("Orchestrator: {} cancelled", kind);
                self.store.dispatch(Message::OperationCancelled);
            }
            Err(err) => {
                llog_warn!("Orchestrator: {} failed: {}", kind, err);
                self.store.dispatch(Message::OperationFailed {
                    phase: err.phase(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn progress(&self, line: impl Into<String>) {
        self.store.dispatch(Message::Progress(line.into()));
    }

    /// Tag a failure with the phase it happened in. Cancellation passes through.
    fn phase_failure(&self, phase: Phase, source: Error) -> Error {
        match source {
            Error::Cancelled | Error::Generation { .. } => source,
            source => Error::Generation {
                phase,
                retained: self.store.read().graph.ids(),
                source: Box::new(source),
            },
        }
    }

    fn require_node(&self, id: &NodeId) -> Result<ContentNode> {
        self.node(id).ok_or(Error::NodeNotFound(*id))
    }

    /// Append through the store and confirm the graph accepted the node.
    fn commit(&self, guard: &OperationGuard, node: ContentNode) -> Result<ContentNode> {
        guard.checkpoint()?;
        let id = node.id;
        let events = self.store.dispatch(Message::NodeAppended(node));
        if !events
            .iter()
            .any(|e| matches!(e, Event::NodeAppended { id: appended, .. } if *appended == id))
        {
            return Err(Error::Validation(format!(
                "node {} was rejected by the content graph",
                id.short()
            )));
        }
        self.require_node(&id)
    }

    /// Store an assessment through the store and confirm the node took it.
    fn record(&self, guard: &OperationGuard, id: NodeId, message: Message) -> Result<()> {
        guard.checkpoint()?;
        let events = self.store.dispatch(message);
        if events
            .iter()
            .any(|e| matches!(e, Event::NodeUpdated { id: updated, .. } if *updated == id))
        {
            Ok(())
        } else {
            Err(Error::NodeNotFound(id))
        }
    }

    async fn single_call(&self, prompt: &PromptPair, guard: &OperationGuard) -> Result<Draft> {
        let reply = self.gateway.generate(prompt, guard.token()).await?;
        Ok(Draft {
            text: reply.text,
            tokens_used: reply.tokens_used,
        })
    }

    /// Generation phase: the adherence loop when there is a target, else one call.
    async fn draft(
        &self,
        prompt: &PromptPair,
        target: Option<u32>,
        brief: &Brief,
        guard: &OperationGuard,
    ) -> Result<Draft> {
        let Some(target) = target.filter(|t| *t > 0) else {
            self.progress("Drafting copy");
            return self.single_call(prompt, guard).await;
        };
        let report = |line: &str| self.progress(line);
        let adherence = AdherenceLoop::from_policy(
            &self.gateway,
            target,
            &brief.word_policy,
            brief.features.strict_word_count,
        );
        let outcome = adherence.run(prompt, guard.token(), &report).await?;
        llog_debug!(
            "Orchestrator: draft {:?} after {} attempts, {} words",
            outcome.state,
            outcome.attempts,
            outcome.word_count
        );
        Ok(Draft {
            text: outcome.text,
            tokens_used: outcome.tokens_used,
        })
    }

    // ========== Auxiliary sub-generations ==========

    async fn request_score(
        &self,
        text: &str,
        brief: Option<&Brief>,
        guard: &OperationGuard,
    ) -> Result<ContentScore> {
        let reply = self
            .gateway
            .generate(&prompt::score_prompt(text, brief), guard.token())
            .await?;
        Ok(parse::parse_score(&reply.text)?)
    }

    async fn request_seo(
        &self,
        text: &str,
        brief: Option<&Brief>,
        guard: &OperationGuard,
    ) -> Result<SeoMetadata> {
        let reply = self
            .gateway
            .generate(&prompt::seo_prompt(text, brief), guard.token())
            .await?;
        Ok(parse::parse_seo(&reply.text)?)
    }

    async fn request_geo(&self, text: &str, guard: &OperationGuard) -> Result<GeoScore> {
        let reply = self
            .gateway
            .generate(&prompt::geo_prompt(text), guard.token())
            .await?;
        Ok(parse::parse_geo(&reply.text)?)
    }

    /// Score, then SEO, then GEO, each only if enabled.
    ///
    /// Fills `node` in place and stops at the first failure, which is returned
    /// alongside its phase. Cancellation is returned as an error.
    async fn run_auxiliaries(
        &self,
        node: &mut ContentNode,
        brief: &Brief,
        guard: &OperationGuard,
    ) -> Result<Option<(Phase, Error)>> {
        let features = brief.features;

        if features.generate_score {
            guard.checkpoint()?;
            self.progress("Scoring copy");
            match self.request_score(&node.text, Some(brief), guard).await {
                Ok(score) => node.score = Some(score),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => return Ok(Some((Phase::Scoring, err))),
            }
        }

        if features.generate_seo {
            guard.checkpoint()?;
            self.progress("Writing SEO metadata");
            match self.request_seo(&node.text, Some(brief), guard).await {
                Ok(seo) => node.seo = Some(seo),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => return Ok(Some((Phase::Seo, err))),
            }
        }

        if features.generate_geo {
            guard.checkpoint()?;
            self.progress("Assessing GEO quotability");
            match self.request_geo(&node.text, guard).await {
                Ok(geo) => node.geo = Some(geo),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => return Ok(Some((Phase::Geo, err))),
            }
        }

        Ok(None)
    }

    // ========== Content operations ==========

    /// Generate a fresh base node from `brief`.
    ///
    /// If an enabled auxiliary step fails, the node is still appended with
    /// whatever completed and the failure is returned tagged with its phase.
    pub async fn generate_base(&self, brief: &Brief) -> Result<ContentNode> {
        brief.validate()?;
        let guard = self.begin(OperationKind::GenerateBase)?;
        let result = self.generate_base_inner(brief, &guard).await;
        self.finish(&guard, &result);
        result
    }

    async fn generate_base_inner(&self, brief: &Brief, guard: &OperationGuard) -> Result<ContentNode> {
        self.store.dispatch(Message::BriefLoaded(brief.clone()));

        let prompt = assemble(&Request::Base { brief })
            .map_err(|e| self.phase_failure(Phase::PromptBuild, e))?;
        let draft = self
            .draft(&prompt, brief.effective_target(), brief, guard)
            .await
            .map_err(|e| self.phase_failure(Phase::Generation, e))?;

        let mut node = ContentNode::base(draft.text).with_tokens(draft.tokens_used);
        let auxiliary_failure = self.run_auxiliaries(&mut node, brief, guard).await?;

        let node = self.commit(guard, node)?;
        self.progress(format!("Added base copy ({} words)", node.word_count));

        match auxiliary_failure {
            Some((phase, source)) => Err(self.phase_failure(phase, source)),
            None => Ok(node),
        }
    }

    /// Derive a divergent alternative from `parent_id`.
    ///
    /// Without a target in `brief`, the parent's word count is the target.
    pub async fn create_alternative(&self, parent_id: NodeId, brief: &Brief) -> Result<ContentNode> {
        brief.validate()?;
        let parent = self.require_node(&parent_id)?;
        let guard = self.begin(OperationKind::CreateAlternative)?;
        let result = self.create_alternative_inner(&parent, brief, &guard).await;
        self.finish(&guard, &result);
        result
    }

    async fn create_alternative_inner(
        &self,
        parent: &ContentNode,
        brief: &Brief,
        guard: &OperationGuard,
    ) -> Result<ContentNode> {
        self.store.dispatch(Message::BriefLoaded(brief.clone()));

        let prompt = assemble(&Request::Alternative {
            brief,
            source: parent,
        })
        .map_err(|e| self.phase_failure(Phase::PromptBuild, e))?;
        let target = brief.effective_target().or(Some(parent.word_count));
        let draft = self
            .draft(&prompt, target, brief, guard)
            .await
            .map_err(|e| self.phase_failure(Phase::Generation, e))?;

        let node = ContentNode::derived(parent.id, Derivation::Alternative, draft.text)
            .with_tokens(draft.tokens_used);
        let node = self.commit(guard, node)?;
        self.progress(format!(
            "Added alternative to {} ({} words)",
            parent.id.short(),
            node.word_count
        ));
        Ok(node)
    }

    /// Rewrite `parent_id` in a named style. One provider call, no length loop.
    pub async fn apply_style(&self, parent_id: NodeId, style_id: &str) -> Result<ContentNode> {
        let style = prompt::styles::lookup(style_id)?;
        let parent = self.require_node(&parent_id)?;
        let guard = self.begin(OperationKind::ApplyStyle)?;
        let result = async {
            let prompt = assemble(&Request::Styled {
                source: &parent,
                style,
            })
            .map_err(|e| self.phase_failure(Phase::PromptBuild, e))?;
            self.progress(format!("Rewriting in the {} style", style.name));
            let draft = self
                .single_call(&prompt, &guard)
                .await
                .map_err(|e| self.phase_failure(Phase::Generation, e))?;
            let derivation = Derivation::Styled {
                style: style.id.to_string(),
            };
            let node = ContentNode::derived(parent.id, derivation, draft.text)
                .with_tokens(draft.tokens_used);
            self.commit(&guard, node)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    /// Rewrite `parent_id` so it reads naturally. One provider call.
    pub async fn humanize(&self, parent_id: NodeId) -> Result<ContentNode> {
        let parent = self.require_node(&parent_id)?;
        let guard = self.begin(OperationKind::Humanize)?;
        let result = async {
            let prompt = assemble(&Request::Humanized { source: &parent })
                .map_err(|e| self.phase_failure(Phase::PromptBuild, e))?;
            self.progress("Humanizing copy");
            let draft = self
                .single_call(&prompt, &guard)
                .await
                .map_err(|e| self.phase_failure(Phase::Generation, e))?;
            let node = ContentNode::derived(parent.id, Derivation::Humanized, draft.text)
                .with_tokens(draft.tokens_used);
            self.commit(&guard, node)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    // ========== Assessments on existing nodes ==========
    //
    // Last write wins. A result that arrives after cancellation is dropped;
    // one already stored is kept.

    pub async fn generate_score(&self, node_id: NodeId) -> Result<ContentScore> {
        let node = self.require_node(&node_id)?;
        let guard = self.begin(OperationKind::GenerateScore)?;
        let result: Result<ContentScore> = async {
            self.progress(format!("Scoring {}", node_id.short()));
            let brief = self.brief();
            let score = self
                .request_score(&node.text, brief.as_ref(), &guard)
                .await
                .map_err(|e| self.phase_failure(Phase::Scoring, e))?;
            self.record(&guard, node_id, Message::ScoreUpdated(node_id, score.clone()))?;
            Ok(score)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    pub async fn generate_seo(&self, node_id: NodeId) -> Result<SeoMetadata> {
        let node = self.require_node(&node_id)?;
        let guard = self.begin(OperationKind::GenerateSeo)?;
        let result: Result<SeoMetadata> = async {
            self.progress(format!("Writing SEO metadata for {}", node_id.short()));
            let brief = self.brief();
            let seo = self
                .request_seo(&node.text, brief.as_ref(), &guard)
                .await
                .map_err(|e| self.phase_failure(Phase::Seo, e))?;
            guard.checkpoint()?;
            let over = seo.over_limit().len();
            if over > 0 {
                self.progress(format!("{} SEO field(s) exceed their character limit", over));
            }
            self.record(&guard, node_id, Message::SeoUpdated(node_id, seo.clone()))?;
            Ok(seo)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    pub async fn generate_geo(&self, node_id: NodeId) -> Result<GeoScore> {
        let node = self.require_node(&node_id)?;
        let guard = self.begin(OperationKind::GenerateGeo)?;
        let result: Result<GeoScore> = async {
            self.progress(format!("Assessing GEO quotability of {}", node_id.short()));
            let geo = self
                .request_geo(&node.text, &guard)
                .await
                .map_err(|e| self.phase_failure(Phase::Geo, e))?;
            self.record(&guard, node_id, Message::GeoUpdated(node_id, geo.clone()))?;
            Ok(geo)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    /// Rate the brief itself. Never touches the graph.
    pub async fn evaluate_inputs(&self, brief: &Brief) -> Result<InputEvaluation> {
        brief.validate()?;
        let guard = self.begin(OperationKind::EvaluateInputs)?;
        let result: Result<InputEvaluation> = async {
            self.progress("Evaluating brief");
            let reply = self
                .gateway
                .generate(&prompt::input_evaluation_prompt(brief), guard.token())
                .await
                .map_err(|e| self.phase_failure(Phase::InputEvaluation, e))?;
            let evaluation = parse::parse_input_evaluation(&reply.text)
                .map_err(|e| self.phase_failure(Phase::InputEvaluation, e.into()))?;
            guard.checkpoint()?;
            self.store
                .dispatch(Message::InputsEvaluated(evaluation.clone()));
            Ok(evaluation)
        }
        .await;
        self.finish(&guard, &result);
        result
    }

    // ========== Snapshots ==========

    /// Hand the current brief and graph to `snapshots`.
    pub async fn save_snapshot(
        &self,
        snapshots: &dyn SnapshotStore,
        kind: SnapshotKind,
    ) -> Result<SnapshotRef> {
        let snapshot = {
            let model = self.store.read();
            let brief = model
                .brief
                .clone()
                .ok_or_else(|| Error::Validation("there is no brief to save".to_string()))?;
            Snapshot::new(kind, brief, &model.graph)
        };
        snapshots.save(&snapshot).await
    }

    /// Load a snapshot and replace the session with it.
    ///
    /// Sessions and saved outputs replace the graph wholesale; templates only
    /// restore the brief. Returns the restored brief.
    pub async fn restore(
        &self,
        snapshots: &dyn SnapshotStore,
        reference: &SnapshotRef,
    ) -> Result<Brief> {
        let guard = self.begin(OperationKind::Restore)?;
        let result: Result<Brief> = async {
            self.progress(format!("Loading {}", reference));
            let snapshot = snapshots.load(reference).await?;
            let graph = snapshot.graph()?;
            guard.checkpoint()?;
            if snapshot.kind.carries_nodes() {
                self.store.dispatch(Message::GraphReplaced(graph));
            }
            self.store
                .dispatch(Message::BriefLoaded(snapshot.brief.clone()));
            Ok(snapshot.brief)
        }
        .await;
        self.finish(&guard, &result);
        result
    }
}
