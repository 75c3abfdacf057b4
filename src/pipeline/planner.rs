//! Tool planning.
//!
//! A plan is a dependency graph of tool invocations flattened into a total
//! order. Dependencies: retrieval → parsing of what it returns → reliability
//! assessment of each parsed paper. Invocations are numbered in creation
//! order (retrieval first, then papers in arrival order) and sorted
//! topologically layer by layer, so equal inputs always produce the same plan.

use crate::state::{Intent, Paper, PaperId, Uncertainty, UncertaintyReason};
use crate::tools::{Capability, ToolRegistry};
use std::fmt;

/// What an invocation operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputRef {
    /// The user question
    Question,
    /// One paper already in the state
    Paper(PaperId),
    /// Every paper produced by retrieval, resolved when its tier starts
    Retrieved,
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRef::Question => f.write_str("question"),
            InputRef::Paper(id) => write!(f, "paper {}", id),
            InputRef::Retrieved => f.write_str("retrieved papers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Papers,
    ParsedPaper,
    Assessment,
    Intent,
    ScopeDecision,
}

impl OutputKind {
    pub fn for_capability(capability: Capability) -> Self {
        match capability {
            Capability::Retrieve => OutputKind::Papers,
            Capability::Parse => OutputKind::ParsedPaper,
            Capability::AssessReliability => OutputKind::Assessment,
            Capability::ClassifyIntent => OutputKind::Intent,
            Capability::ValidateScope => OutputKind::ScopeDecision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Position in creation order, stable across identical inputs
    pub id: usize,
    pub capability: Capability,
    pub input: InputRef,
    pub expects: OutputKind,
    /// Invocations that must complete first
    pub depends_on: Vec<usize>,
    /// Longest dependency chain below this invocation
    pub tier: usize,
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.capability, self.input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Topologically ordered
    pub invocations: Vec<ToolInvocation>,
    /// Steps the plan wanted but no registered tool could perform
    pub unavailable: Vec<Uncertainty>,
}

impl Plan {
    /// A single critical invocation on the question.
    pub fn guard(capability: Capability) -> Self {
        Plan {
            invocations: vec![ToolInvocation {
                id: 0,
                capability,
                input: InputRef::Question,
                expects: OutputKind::for_capability(capability),
                depends_on: Vec::new(),
                tier: 0,
            }],
            unavailable: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn tier_count(&self) -> usize {
        self.invocations
            .iter()
            .map(|i| i.tier + 1)
            .max()
            .unwrap_or(0)
    }

    /// Invocations of one tier, in plan order.
    pub fn tier(&self, tier: usize) -> impl Iterator<Item = &ToolInvocation> {
        self.invocations.iter().filter(move |i| i.tier == tier)
    }

    pub fn get(&self, id: usize) -> Option<&ToolInvocation> {
        self.invocations.iter().find(|i| i.id == id)
    }

    /// One-line summary for the reasoning trace.
    pub fn describe(&self) -> String {
        if self.invocations.is_empty() {
            return "no tool invocations needed".to_string();
        }
        let steps: Vec<String> = self.invocations.iter().map(|i| i.to_string()).collect();
        format!(
            "{} invocation(s) in {} tier(s): {}",
            self.invocations.len(),
            self.tier_count(),
            steps.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Build the plan for `intent` over the papers already in the state.
    ///
    /// Deterministic given its inputs; capabilities missing from `registry`
    /// are reported in [`Plan::unavailable`] instead of being planned.
    pub fn create_plan(&self, intent: &Intent, papers: &[Paper], registry: &ToolRegistry) -> Plan {
        let mut nodes: Vec<ToolInvocation> = Vec::new();
        let mut unavailable = Vec::new();

        let can_parse = registry.has(Capability::Parse);
        let can_assess = registry.has(Capability::AssessReliability);

        let retrieve = if intent.requires_external_evidence {
            if registry.has(Capability::Retrieve) {
                Some(push(&mut nodes, Capability::Retrieve, InputRef::Question, Vec::new()))
            } else {
                unavailable.push(Uncertainty::new(
                    UncertaintyReason::RetrievalUnavailable,
                    "no retrieval tool configured; only attached papers were considered",
                ));
                None
            }
        } else {
            None
        };

        // Papers with pre-extracted sections are parsed too: parsing is what
        // turns sections into claims.
        let mut parses: Vec<(InputRef, usize)> = Vec::new();
        if can_parse {
            for paper in papers {
                let input = InputRef::Paper(paper.id.clone());
                let id = push(&mut nodes, Capability::Parse, input.clone(), Vec::new());
                parses.push((input, id));
            }
            if let Some(retrieve) = retrieve {
                let id = push(&mut nodes, Capability::Parse, InputRef::Retrieved, vec![retrieve]);
                parses.push((InputRef::Retrieved, id));
            }
        } else if !papers.is_empty() || retrieve.is_some() {
            unavailable.push(Uncertainty::new(
                UncertaintyReason::ToolFailure,
                "no parsing tool configured; papers could not be read",
            ));
        }

        if can_assess {
            for (input, parse) in parses {
                push(&mut nodes, Capability::AssessReliability, input, vec![parse]);
            }
        } else if !parses.is_empty() {
            unavailable.push(Uncertainty::new(
                UncertaintyReason::ToolFailure,
                "no reliability assessor configured; all sources treated as low reliability",
            ));
        }

        Plan {
            invocations: topological_order(nodes),
            unavailable,
        }
    }
}

fn push(
    nodes: &mut Vec<ToolInvocation>,
    capability: Capability,
    input: InputRef,
    depends_on: Vec<usize>,
) -> usize {
    let id = nodes.len();
    nodes.push(ToolInvocation {
        id,
        capability,
        input,
        expects: OutputKind::for_capability(capability),
        depends_on,
        tier: 0,
    });
    id
}

/// Layered Kahn sort. Each layer is emitted in creation order, which makes
/// the layer index the invocation's tier.
fn topological_order(mut nodes: Vec<ToolInvocation>) -> Vec<ToolInvocation> {
    let mut placed: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut order: Vec<usize> = Vec::with_capacity(nodes.len());
    let mut tier = 0;

    while order.len() < nodes.len() {
        let layer: Vec<usize> = nodes
            .iter()
            .filter(|n| placed[n.id].is_none())
            .filter(|n| {
                n.depends_on
                    .iter()
                    .all(|d| placed.get(*d).copied().flatten().is_some_and(|t| t < tier))
            })
            .map(|n| n.id)
            .collect();

        // Dependencies always point at earlier nodes, so every layer is
        // non-empty until all nodes are placed.
        if layer.is_empty() {
            break;
        }
        for id in layer {
            placed[id] = Some(tier);
            order.push(id);
        }
        tier += 1;
    }

    for node in &mut nodes {
        node.tier = placed[node.id].unwrap_or(0);
    }
    let mut by_id: Vec<Option<ToolInvocation>> = nodes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|id| by_id.get_mut(id).and_then(Option::take))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PaperMetadata, PaperOrigin, Provenance, QuestionType};
    use crate::tools::reliability::HeuristicReliabilityAssessor;
    use crate::tools::{PaperParser, PaperRetriever, ParsedPaper, ToolError, ToolHandle};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopRetriever;

    #[async_trait]
    impl PaperRetriever for NoopRetriever {
        fn name(&self) -> &str {
            "noop"
        }
        async fn retrieve(&self, _query: &str, _limit: u32) -> Result<Vec<Paper>, ToolError> {
            Ok(Vec::new())
        }
    }

    struct NoopParser;

    #[async_trait]
    impl PaperParser for NoopParser {
        fn name(&self) -> &str {
            "noop"
        }
        async fn parse(&self, paper: &Paper) -> Result<ParsedPaper, ToolError> {
            Ok(ParsedPaper {
                paper_id: paper.id.clone(),
                sections: Default::default(),
                claims: Vec::new(),
            })
        }
    }

    fn registry(retrieval: bool) -> ToolRegistry {
        let mut registry = ToolRegistry::new()
            .with(ToolHandle::Parse(Arc::new(NoopParser)))
            .with(ToolHandle::AssessReliability(Arc::new(
                HeuristicReliabilityAssessor::new(),
            )));
        if retrieval {
            registry.register(ToolHandle::Retrieve(Arc::new(NoopRetriever)));
        }
        registry
    }

    fn paper(id: &str) -> Paper {
        Paper {
            id: id.to_string(),
            origin: PaperOrigin::File(format!("{}.pdf", id)),
            provenance: Provenance::Attached,
            metadata: PaperMetadata::default(),
            parsed_sections: None,
        }
    }

    fn intent(external: bool, paper_context: bool) -> Intent {
        Intent {
            question_type: QuestionType::Understanding,
            requires_external_evidence: external,
            requires_paper_context: paper_context,
        }
    }

    fn steps(plan: &Plan) -> Vec<String> {
        plan.invocations.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn attached_papers_parsed_then_assessed() {
        let plan = Planner::new().create_plan(
            &intent(false, true),
            &[paper("p1"), paper("p2")],
            &registry(false),
        );
        assert_eq!(
            steps(&plan),
            vec![
                "parse(paper p1)",
                "parse(paper p2)",
                "assess-reliability(paper p1)",
                "assess-reliability(paper p2)",
            ]
        );
        assert_eq!(plan.tier_count(), 2);
        assert!(plan.unavailable.is_empty());
    }

    #[test]
    fn retrieval_precedes_dependent_parsing() {
        let plan =
            Planner::new().create_plan(&intent(true, false), &[paper("p1")], &registry(true));
        assert_eq!(
            steps(&plan),
            vec![
                "retrieve(question)",
                "parse(paper p1)",
                "parse(retrieved papers)",
                "assess-reliability(paper p1)",
                "assess-reliability(retrieved papers)",
            ]
        );
        let tiers: Vec<usize> = plan.invocations.iter().map(|i| i.tier).collect();
        assert_eq!(tiers, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn every_dependency_comes_first() {
        let plan = Planner::new().create_plan(
            &intent(true, true),
            &[paper("a"), paper("b"), paper("c")],
            &registry(true),
        );
        for (position, invocation) in plan.invocations.iter().enumerate() {
            for dep in &invocation.depends_on {
                let dep_position = plan
                    .invocations
                    .iter()
                    .position(|i| i.id == *dep)
                    .unwrap();
                assert!(dep_position < position);
                assert!(plan.get(*dep).unwrap().tier < invocation.tier);
            }
        }
    }

    #[test]
    fn missing_retriever_is_reported() {
        let plan = Planner::new().create_plan(&intent(true, false), &[], &registry(false));
        assert!(plan.is_empty());
        assert_eq!(
            plan.unavailable[0].reason,
            UncertaintyReason::RetrievalUnavailable
        );
    }

    #[test]
    fn plans_are_deterministic() {
        let papers = [paper("x"), paper("y")];
        let a = Planner::new().create_plan(&intent(true, true), &papers, &registry(true));
        let b = Planner::new().create_plan(&intent(true, true), &papers, &registry(true));
        assert_eq!(a, b);
    }

    #[test]
    fn guard_plan_is_single_invocation() {
        let plan = Plan::guard(Capability::ValidateScope);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.invocations[0].expects, OutputKind::ScopeDecision);
        assert_eq!(plan.describe(), "1 invocation(s) in 1 tier(s): validate-scope(question)");
    }
}
