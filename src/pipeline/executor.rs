//! Plan execution.
//!
//! Tiers run in order. Within a tier every invocation is independent, so they
//! are dispatched concurrently (bounded by `max_concurrency`) and joined
//! before the next tier starts. Results are merged into the state by the
//! executor alone, in plan order.
//!
//! A failed or timed-out invocation becomes an [`Uncertainty`] and the plan
//! carries on, unless its capability is critical: then the plan stops after
//! the current tier and the failure is returned in
//! [`ExecutionOutcome::aborted`].

use super::planner::{InputRef, Plan, ToolInvocation};
use crate::config::ExecutorConfig;
use crate::state::{
    Claim, GenerationSettings, Intent, Paper, Provenance, ReasoningState, ReliabilityAssessment,
    ScopeDecision, StateDelta, Uncertainty, UncertaintyReason,
};
use crate::tools::{Capability, ParsedPaper, ToolError, ToolRegistry};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};

/// Per-request values the tools need besides the state.
#[derive(Debug, Clone)]
pub struct ExecutionContext<'a> {
    pub request_id: &'a str,
    pub settings: &'a GenerationSettings,
    pub retrieval_limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Papers(Vec<Paper>),
    Parsed(ParsedPaper),
    Assessment(ReliabilityAssessment),
    Intent(Intent),
    Scope(ScopeDecision),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolStatus {
    Ok(ToolOutput),
    Failed { reason: String, timed_out: bool },
    /// Not run: prerequisites failed or there was nothing to operate on
    Skipped { reason: String },
}

impl ToolStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolStatus::Ok(_))
    }

    fn label(&self) -> &'static str {
        match self {
            ToolStatus::Ok(_) => "ok",
            ToolStatus::Failed {
                timed_out: true, ..
            } => "timeout",
            ToolStatus::Failed { .. } => "failed",
            ToolStatus::Skipped { .. } => "skipped",
        }
    }
}

/// Outcome of one concrete tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Id of the plan invocation this call belongs to
    pub invocation: usize,
    pub capability: Capability,
    /// Concrete target; deferred inputs are resolved to single papers
    pub target: InputRef,
    pub status: ToolStatus,
}

/// A critical invocation failed; the plan was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalFailure {
    pub capability: Capability,
    pub reason: String,
    pub timed_out: bool,
}

#[derive(Debug)]
pub struct ExecutionOutcome {
    pub state: ReasoningState,
    pub results: Vec<ToolResult>,
    pub aborted: Option<CriticalFailure>,
}

impl ExecutionOutcome {
    /// Output of the first successful call of a capability.
    pub fn output(&self, capability: Capability) -> Option<&ToolOutput> {
        self.results
            .iter()
            .filter(|r| r.capability == capability)
            .find_map(|r| match &r.status {
                ToolStatus::Ok(output) => Some(output),
                _ => None,
            })
    }
}

enum Job {
    Run {
        invocation: usize,
        capability: Capability,
        target: InputRef,
        paper: Option<Paper>,
    },
    Skip(ToolResult),
}

#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: ToolRegistry,
    config: ExecutorConfig,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(
        &self,
        plan: &Plan,
        mut state: ReasoningState,
        ctx: &ExecutionContext<'_>,
    ) -> ExecutionOutcome {
        let mut results: Vec<ToolResult> = Vec::new();
        let mut aborted: Option<CriticalFailure> = None;

        for tier in 0..plan.tier_count() {
            let jobs = self.expand_tier(plan, tier, &state, &results);
            let tier_start = Instant::now();
            let job_count = jobs.len();

            let finished: Vec<ToolResult> = stream::iter(jobs)
                .map(|job| self.run(job, &state, ctx))
                .buffered(self.config.max_concurrency.max(1))
                .collect()
                .await;

            let mut delta = StateDelta::default();
            for result in &finished {
                metrics::counter!(
                    "scholar_tool_invocations_total",
                    "capability" => result.capability.as_str(),
                    "status" => result.status.label(),
                )
                .increment(1);

                match &result.status {
                    ToolStatus::Ok(output) => absorb_output(&mut delta, output, &state),
                    ToolStatus::Failed { reason, timed_out } => {
                        if result.capability.is_critical() {
                            tracing::error!(
                                request_id = ctx.request_id,
                                capability = %result.capability,
                                reason = %reason,
                                "Critical tool failed; abandoning plan"
                            );
                            aborted.get_or_insert(CriticalFailure {
                                capability: result.capability,
                                reason: reason.clone(),
                                timed_out: *timed_out,
                            });
                        } else {
                            tracing::warn!(
                                request_id = ctx.request_id,
                                capability = %result.capability,
                                target = %result.target,
                                reason = %reason,
                                "Tool failed; continuing without it"
                            );
                            delta
                                .uncertainties
                                .push(failure_uncertainty(result, reason, *timed_out));
                        }
                    }
                    ToolStatus::Skipped { reason } => {
                        tracing::debug!(
                            request_id = ctx.request_id,
                            capability = %result.capability,
                            target = %result.target,
                            reason = %reason,
                            "Invocation skipped"
                        );
                    }
                }
            }

            state = state.merge(delta);
            results.extend(finished);

            tracing::trace!(
                request_id = ctx.request_id,
                tier,
                jobs = job_count,
                elapsed_us = tier_start.elapsed().as_micros() as u64,
                "Tier joined"
            );

            if aborted.is_some() {
                break;
            }
        }

        ExecutionOutcome {
            state,
            results,
            aborted,
        }
    }

    /// Resolve the invocations of a tier into concrete jobs against the
    /// state as of the tier barrier.
    fn expand_tier(
        &self,
        plan: &Plan,
        tier: usize,
        state: &ReasoningState,
        results: &[ToolResult],
    ) -> Vec<Job> {
        let mut jobs = Vec::new();
        for invocation in plan.tier(tier) {
            if prerequisites_failed(invocation, results) {
                jobs.push(skip(invocation, invocation.input.clone(), "prerequisite failed"));
                continue;
            }

            match &invocation.input {
                InputRef::Question => jobs.push(Job::Run {
                    invocation: invocation.id,
                    capability: invocation.capability,
                    target: InputRef::Question,
                    paper: None,
                }),
                InputRef::Paper(id) => match state.paper(id) {
                    Some(paper) => jobs.push(self.paper_job(invocation, paper, state)),
                    None => jobs.push(skip(
                        invocation,
                        invocation.input.clone(),
                        "paper is not in the reasoning state",
                    )),
                },
                InputRef::Retrieved => {
                    let retrieved: Vec<&Paper> = state
                        .papers
                        .iter()
                        .filter(|p| p.provenance == Provenance::Retrieved)
                        .collect();
                    if retrieved.is_empty() {
                        jobs.push(skip(
                            invocation,
                            InputRef::Retrieved,
                            "retrieval returned no papers",
                        ));
                    }
                    for paper in retrieved {
                        jobs.push(self.paper_job(invocation, paper, state));
                    }
                }
            }
        }
        jobs
    }

    fn paper_job(&self, invocation: &ToolInvocation, paper: &Paper, state: &ReasoningState) -> Job {
        let target = InputRef::Paper(paper.id.clone());
        if invocation.capability == Capability::AssessReliability
            && !state.has_claims_for(&paper.id)
        {
            return skip(invocation, target, "no claims extracted");
        }
        Job::Run {
            invocation: invocation.id,
            capability: invocation.capability,
            target,
            paper: Some(paper.clone()),
        }
    }

    async fn run(
        &self,
        job: Job,
        state: &ReasoningState,
        ctx: &ExecutionContext<'_>,
    ) -> ToolResult {
        let (invocation, capability, target, paper) = match job {
            Job::Skip(result) => return result,
            Job::Run {
                invocation,
                capability,
                target,
                paper,
            } => (invocation, capability, target, paper),
        };

        let timeout = if capability.is_critical() {
            self.config.critical_timeout()
        } else {
            self.config.invocation_timeout()
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            timeout,
            self.call(capability, paper.as_ref(), state, ctx),
        )
        .await;

        let status = match outcome {
            Ok(Ok(output)) => ToolStatus::Ok(output),
            Ok(Err(e)) => ToolStatus::Failed {
                timed_out: matches!(e, ToolError::Timeout(_)),
                reason: e.to_string(),
            },
            Err(_) => ToolStatus::Failed {
                reason: format!("no response within {}", format_duration(timeout)),
                timed_out: true,
            },
        };

        tracing::trace!(
            request_id = ctx.request_id,
            capability = %capability,
            target = %target,
            status = status.label(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Invocation completed"
        );

        ToolResult {
            invocation,
            capability,
            target,
            status,
        }
    }

    async fn call(
        &self,
        capability: Capability,
        paper: Option<&Paper>,
        state: &ReasoningState,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ToolOutput, ToolError> {
        let unregistered =
            || ToolError::Configuration(format!("no tool registered for {}", capability));
        let no_paper = || ToolError::Configuration(format!("{} needs a paper", capability));

        match capability {
            Capability::Retrieve => {
                let tool = self.registry.retriever().ok_or_else(unregistered)?;
                tool.retrieve(&state.user_question, ctx.retrieval_limit)
                    .await
                    .map(ToolOutput::Papers)
            }
            Capability::Parse => {
                let tool = self.registry.parser().ok_or_else(unregistered)?;
                let paper = paper.ok_or_else(no_paper)?;
                tool.parse(paper).await.map(ToolOutput::Parsed)
            }
            Capability::AssessReliability => {
                let tool = self.registry.assessor().ok_or_else(unregistered)?;
                let paper = paper.ok_or_else(no_paper)?;
                let claims: Vec<Claim> = state.claims_for(&paper.id).into_iter().cloned().collect();
                tool.assess(paper, &claims).await.map(ToolOutput::Assessment)
            }
            Capability::ClassifyIntent => {
                let tool = self.registry.classifier().ok_or_else(unregistered)?;
                tool.classify(&state.user_question, ctx.settings)
                    .await
                    .map(ToolOutput::Intent)
            }
            Capability::ValidateScope => {
                let tool = self.registry.scope_guard().ok_or_else(unregistered)?;
                let intent = state.intent.ok_or_else(|| {
                    ToolError::Configuration("scope guard needs a classified intent".to_string())
                })?;
                tool.check(&state.user_question, &intent)
                    .await
                    .map(ToolOutput::Scope)
            }
        }
    }
}

/// True when the invocation has prerequisites and none of them succeeded.
fn prerequisites_failed(invocation: &ToolInvocation, results: &[ToolResult]) -> bool {
    !invocation.depends_on.is_empty()
        && invocation.depends_on.iter().all(|dep| {
            !results
                .iter()
                .any(|r| r.invocation == *dep && r.status.is_ok())
        })
}

fn skip(invocation: &ToolInvocation, target: InputRef, reason: &str) -> Job {
    Job::Skip(ToolResult {
        invocation: invocation.id,
        capability: invocation.capability,
        target,
        status: ToolStatus::Skipped {
            reason: reason.to_string(),
        },
    })
}

fn absorb_output(delta: &mut StateDelta, output: &ToolOutput, state: &ReasoningState) {
    match output {
        ToolOutput::Papers(papers) => delta.papers.extend(papers.iter().cloned()),
        ToolOutput::Parsed(parsed) => {
            if let Some(paper) = state.paper(&parsed.paper_id) {
                delta.papers.push(Paper {
                    parsed_sections: Some(parsed.sections.clone()),
                    ..paper.clone()
                });
            }
            delta.claims.extend(parsed.claims.iter().cloned());
        }
        ToolOutput::Assessment(assessment) => delta.assessments.push(assessment.clone()),
        ToolOutput::Intent(intent) => delta.intent = Some(*intent),
        // Scope verdicts are read from the results by the caller
        ToolOutput::Scope(_) => {}
    }
}

fn failure_uncertainty(result: &ToolResult, reason: &str, timed_out: bool) -> Uncertainty {
    if timed_out {
        Uncertainty::new(
            UncertaintyReason::Timeout,
            format!("{} timed out for {}", result.capability, result.target),
        )
    } else {
        Uncertainty::new(
            UncertaintyReason::ToolFailure,
            format!("{} failed for {}: {}", result.capability, result.target, reason),
        )
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}
