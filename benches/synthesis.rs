//! Benchmarks for evidence synthesis with growing claim counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scholar::config::SynthesisConfig;
use scholar::pipeline::EvidenceSynthesizer;
use scholar::state::{
    Claim, ReasoningState, Reliability, ReliabilityAssessment, Section, StateDelta,
};

const STATEMENTS: &[&str] = &[
    "Method A outperforms method B on classification accuracy",
    "Method B outperforms method A on classification accuracy",
    "The treatment reduced symptom severity in adult patients",
    "The treatment did not reduce symptom severity in adult patients",
    "Sleep deprivation impairs memory consolidation in healthy adults",
    "The sample was drawn from a single urban hospital",
    "Participants were randomly assigned to two equal groups",
    "Follow-up was limited to six months after the intervention",
];

const GRADES: [Reliability; 3] = [Reliability::Low, Reliability::Medium, Reliability::High];

fn create_state(paper_count: usize, claims_per_paper: usize) -> ReasoningState {
    let mut delta = StateDelta::default();
    for p in 0..paper_count {
        let paper_id = format!("paper-{}", p);
        for c in 0..claims_per_paper {
            let section = Section::ALL[c % Section::ALL.len()];
            delta.claims.push(Claim {
                id: format!("{}#{}-{}", paper_id, section.as_str(), c),
                source_paper_id: paper_id.clone(),
                statement: STATEMENTS[(p + c) % STATEMENTS.len()].to_string(),
                section_origin: section,
            });
        }
        delta.assessments.push(ReliabilityAssessment {
            paper_id,
            reliability: GRADES[p % GRADES.len()],
            factors: Vec::new(),
        });
    }
    ReasoningState::new("How do the treatment results compare across these studies?").merge(delta)
}

fn bench_synthesis(c: &mut Criterion) {
    let synthesizer = EvidenceSynthesizer::new(SynthesisConfig::default());
    let mut group = c.benchmark_group("synthesis");

    for papers in [2, 5, 10, 20] {
        let state = create_state(papers, 12);
        group.bench_with_input(BenchmarkId::new("papers", papers), &state, |b, state| {
            b.iter(|| black_box(synthesizer.synthesize(black_box(state))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_synthesis);
criterion_main!(benches);
