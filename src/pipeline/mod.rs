//! The research reasoning pipeline.
//!
//! One call to [`ResearchPipeline::process`] walks a fresh [`ReasoningState`]
//! through the stages
//!
//! ```text
//! INTAKE → INTENT → SCOPE_CHECK ─┬─ REJECTED
//!                                ├─ CLARIFY
//!                                └─ PLANNING → EXECUTING → SYNTHESIZING → COMPOSING → DONE
//! ```
//!
//! Every stage appends one [`StageRecord`](crate::state::StageRecord) to the
//! trace, which becomes the `reasoning` list of the response. Stages are
//! computation-only except EXECUTING and the guard invocations (intent
//! classification, scope guard), which go through the [`ToolExecutor`].

pub mod composer;
pub mod error;
pub mod executor;
pub mod intent;
pub mod planner;
pub mod scope;
pub mod synthesis;

pub use composer::ResponseComposer;
pub use error::PipelineError;
pub use executor::{ExecutionContext, ExecutionOutcome, ToolExecutor, ToolOutput, ToolStatus};
pub use intent::{IntentAnalysis, IntentAnalyzer};
pub use planner::{InputRef, Plan, Planner, ToolInvocation};
pub use scope::ScopeValidator;
pub use synthesis::{EvidenceSynthesizer, Synthesis};

use crate::config::ScholarConfig;
use crate::logging;
use crate::state::{
    ConversationContext, GenerationSettings, Intent, ReasoningState, Response, Stage, StateDelta,
};
use crate::tools::{factory, Capability, ToolRegistry};
use std::time::Instant;

/// Entry point: question plus conversation context in, grounded response out.
#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    analyzer: IntentAnalyzer,
    validator: ScopeValidator,
    planner: Planner,
    executor: ToolExecutor,
    synthesizer: EvidenceSynthesizer,
    composer: ResponseComposer,
    default_settings: GenerationSettings,
    retrieval_limit: u32,
    content_logging: bool,
}

/// How a guard invocation ended.
enum Guarded<T> {
    Passed(ReasoningState, T),
    Aborted(Response),
}

impl ResearchPipeline {
    /// Assemble a pipeline around an already-built registry.
    pub fn new(config: &ScholarConfig, registry: ToolRegistry) -> Result<Self, PipelineError> {
        let matcher = config.scope.compile()?;
        let validator = ScopeValidator::new(
            config.scope.clone(),
            matcher,
            registry.has(Capability::Retrieve),
        );
        Ok(Self {
            analyzer: IntentAnalyzer::new(),
            validator,
            planner: Planner::new(),
            executor: ToolExecutor::new(registry, config.executor.clone()),
            synthesizer: EvidenceSynthesizer::new(config.synthesis.clone()),
            composer: ResponseComposer::new(),
            default_settings: config.generation.defaults.clone(),
            retrieval_limit: config.retrieval.limit,
            content_logging: config.logging.enable_content_logging,
        })
    }

    /// Validate the configuration and build the registry it describes.
    pub fn from_config(config: &ScholarConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let registry = factory::build_registry(config)?;
        Self::new(config, registry)
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    /// Answer one question.
    ///
    /// Expected conditions (off-topic, missing context, tool failures) come
    /// back as a `Response`; `Err` means an internal invariant broke.
    pub async fn process(
        &self,
        question: &str,
        context: &ConversationContext,
    ) -> Result<Response, PipelineError> {
        let request_id = logging::generate_request_id();
        let started = Instant::now();

        if let Some(preview) = logging::truncate_question(question, self.content_logging) {
            tracing::debug!(request_id = %request_id, question = %preview, "Question received");
        }

        let result = self.run(&request_id, question, context).await;

        match &result {
            Ok(response) => {
                let outcome = logging::outcome_label(response);
                metrics::counter!("scholar_pipeline_outcomes_total", "outcome" => outcome)
                    .increment(1);
                tracing::info!(
                    request_id = %request_id,
                    outcome,
                    confidence = %response.confidence,
                    sources = response.sources.len(),
                    uncertainties = response.uncertainties.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Question processed"
                );
            }
            Err(e) => {
                metrics::counter!("scholar_pipeline_outcomes_total", "outcome" => "error")
                    .increment(1);
                tracing::error!(request_id = %request_id, error = %e, "Pipeline fault");
            }
        }

        result
    }

    async fn run(
        &self,
        request_id: &str,
        question: &str,
        context: &ConversationContext,
    ) -> Result<Response, PipelineError> {
        let settings = context
            .generation
            .clone()
            .unwrap_or_else(|| self.default_settings.clone());
        let ctx = ExecutionContext {
            request_id,
            settings: &settings,
            retrieval_limit: self.retrieval_limit,
        };

        // INTAKE
        let stage_start = Instant::now();
        let state = ReasoningState::new(question)
            .with_attached(&context.papers)
            .merge(StateDelta::default().record(
                Stage::Intake,
                format!("question received with {} attached paper(s)", context.papers.len()),
            ));
        stage_done(Stage::Intake, stage_start, request_id);

        // INTENT
        let stage_start = Instant::now();
        let (state, intent) = match self.classify(question, state, &ctx).await {
            Guarded::Passed(state, intent) => (state, intent),
            Guarded::Aborted(response) => return Ok(response),
        };
        stage_done(Stage::Intent, stage_start, request_id);

        // SCOPE_CHECK
        let stage_start = Instant::now();
        let decision = self
            .validator
            .validate(question, &intent, context.papers.len());
        let state = state.merge(StateDelta::default().record(
            Stage::ScopeCheck,
            describe_scope(&decision.warnings, decision.in_scope, decision.requires_clarification),
        ));
        stage_done(Stage::ScopeCheck, stage_start, request_id);

        if !decision.in_scope {
            return Ok(self.composer.rejected(&state, &decision.warnings.join("; ")));
        }
        if decision.requires_clarification {
            return Ok(self
                .composer
                .clarification(&state, &decision.warnings.join("; ")));
        }

        let state = match self.guard_scope(state, &ctx).await {
            Guarded::Passed(state, None) => state,
            Guarded::Passed(state, Some(reason)) => {
                return Ok(self.composer.rejected(&state, &reason));
            }
            Guarded::Aborted(response) => return Ok(response),
        };

        // PLANNING
        let stage_start = Instant::now();
        let plan = self
            .planner
            .create_plan(&intent, &state.papers, self.executor.registry());
        let state = state.merge(StateDelta {
            uncertainties: plan.unavailable.clone(),
            ..StateDelta::default().record(Stage::Planning, plan.describe())
        });
        stage_done(Stage::Planning, stage_start, request_id);

        // EXECUTING
        let stage_start = Instant::now();
        let outcome = self.executor.execute(&plan, state, &ctx).await;
        if let Some(failure) = &outcome.aborted {
            return Ok(self
                .composer
                .degraded(&outcome.state, failure.capability, &failure.reason));
        }
        let state = outcome.state.merge(
            StateDelta::default().record(Stage::Executing, describe_results(&outcome.results)),
        );
        stage_done(Stage::Executing, stage_start, request_id);

        // SYNTHESIZING
        let stage_start = Instant::now();
        let synthesis = self.synthesizer.synthesize(&state);
        let detail = format!(
            "{} supporting, {} conflicting across {} topic(s); confidence {}",
            synthesis.supporting.len(),
            synthesis.conflicting.len(),
            synthesis.topics.len(),
            synthesis.confidence
        );
        let state = state.merge(synthesis.to_delta().record(Stage::Synthesizing, detail));
        state
            .check_grounding()
            .map_err(PipelineError::StateInvariant)?;
        stage_done(Stage::Synthesizing, stage_start, request_id);

        // COMPOSING → DONE
        let stage_start = Instant::now();
        let response = self.composer.compose(&synthesis, &state);
        stage_done(Stage::Composing, stage_start, request_id);

        Ok(response)
    }

    /// Heuristics first; the classifier tool only when they are inconclusive.
    async fn classify(
        &self,
        question: &str,
        state: ReasoningState,
        ctx: &ExecutionContext<'_>,
    ) -> Guarded<Intent> {
        let analysis = self.analyzer.analyze(question);
        let classifier = self.executor.registry().get(Capability::ClassifyIntent);

        let (state, intent, detail) = match classifier {
            Some(tool) if !analysis.conclusive => {
                let name = tool.name().to_string();
                let outcome = self
                    .executor
                    .execute(&Plan::guard(Capability::ClassifyIntent), state, ctx)
                    .await;
                if let Some(failure) = &outcome.aborted {
                    let state = outcome.state.merge(StateDelta::default().record(
                        Stage::Intent,
                        format!("classification failed: {}", failure.reason),
                    ));
                    return Guarded::Aborted(self.composer.degraded(
                        &state,
                        failure.capability,
                        &failure.reason,
                    ));
                }
                let intent = match outcome.output(Capability::ClassifyIntent) {
                    Some(ToolOutput::Intent(intent)) => *intent,
                    _ => analysis.intent,
                };
                let detail = format!("{} (classified by {})", describe_intent(&intent), name);
                (outcome.state, intent, detail)
            }
            _ => {
                let suffix = if analysis.conclusive {
                    ""
                } else {
                    " (heuristic default)"
                };
                let detail = format!("{}{}", describe_intent(&analysis.intent), suffix);
                (state, analysis.intent, detail)
            }
        };

        let state = state.merge(StateDelta {
            intent: Some(intent),
            ..StateDelta::default().record(Stage::Intent, detail)
        });
        Guarded::Passed(state, intent)
    }

    /// Second-line scope check. Passes `Some(reason)` when the guard rejects.
    async fn guard_scope(
        &self,
        state: ReasoningState,
        ctx: &ExecutionContext<'_>,
    ) -> Guarded<Option<String>> {
        let Some(tool) = self.executor.registry().get(Capability::ValidateScope) else {
            return Guarded::Passed(state, None);
        };
        let name = tool.name().to_string();

        let outcome = self
            .executor
            .execute(&Plan::guard(Capability::ValidateScope), state, ctx)
            .await;
        if let Some(failure) = &outcome.aborted {
            let state = outcome.state.merge(StateDelta::default().record(
                Stage::ScopeCheck,
                format!("scope guard failed: {}", failure.reason),
            ));
            return Guarded::Aborted(self.composer.degraded(
                &state,
                failure.capability,
                &failure.reason,
            ));
        }

        match outcome.output(Capability::ValidateScope) {
            Some(ToolOutput::Scope(verdict)) if !verdict.in_scope => {
                let reason = if verdict.warnings.is_empty() {
                    format!("rejected by {}", name)
                } else {
                    verdict.warnings.join("; ")
                };
                let state = outcome.state.merge(
                    StateDelta::default()
                        .record(Stage::ScopeCheck, format!("{} rejected the request", name)),
                );
                Guarded::Passed(state, Some(reason))
            }
            _ => Guarded::Passed(outcome.state, None),
        }
    }
}

fn stage_done(stage: Stage, started: Instant, request_id: &str) {
    let elapsed = started.elapsed();
    metrics::histogram!("scholar_stage_duration_seconds", "stage" => stage.as_str())
        .record(elapsed.as_secs_f64());
    tracing::debug!(
        request_id = %request_id,
        stage = stage.as_str(),
        elapsed_us = elapsed.as_micros() as u64,
        "Stage completed"
    );
}

fn describe_intent(intent: &Intent) -> String {
    let mut needs = Vec::new();
    if intent.requires_paper_context {
        needs.push("paper context");
    }
    if intent.requires_external_evidence {
        needs.push("external evidence");
    }
    if needs.is_empty() {
        intent.question_type.as_str().to_string()
    } else {
        format!("{}; needs {}", intent.question_type.as_str(), needs.join(" and "))
    }
}

fn describe_scope(warnings: &[String], in_scope: bool, clarify: bool) -> String {
    let verdict = match (in_scope, clarify) {
        (false, _) => "out of scope",
        (true, true) => "clarification needed",
        (true, false) => "in scope",
    };
    if warnings.is_empty() {
        verdict.to_string()
    } else {
        format!("{} ({})", verdict, warnings.join("; "))
    }
}

fn describe_results(results: &[executor::ToolResult]) -> String {
    let ok = results.iter().filter(|r| r.status.is_ok()).count();
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, ToolStatus::Failed { .. }))
        .count();
    let skipped = results.len() - ok - failed;
    format!("{} ok, {} failed, {} skipped", ok, failed, skipped)
}
