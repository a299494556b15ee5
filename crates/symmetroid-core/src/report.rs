// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Text Report
// ─────────────────────────────────────────────────────────────────────
//! Plain-text study report. Layout:
//!
//! ```text
//! spectrahedral nodes: 2
//! symmetroid nodes: 3
//!
//! has psd component: true
//! has nsd component: true
//! fraction of twice-solvable objectives: 0.4
//! fraction of twice-unbounded objectives: 0.1
//!
//! node 1:
//! location: [1, 0, 0]
//! probability: 0.35
//! eigenvalues:
//! [...]
//!
//! symmetroid node 1:
//! location: [...]
//! eigenvalues:
//! [...]
//! ```
//!
//! The sampling section and the per-node probability lines are omitted
//! when no trials have been run. The symmetroid count is the combined
//! total of both node sets.

use std::io::Write;

use symmetroid_types::{RankedNode, SymmetroidResult};

use crate::discovery::NodeSets;
use crate::sampler::SamplingState;

/// Render the report for `nodes` / `ranking` / `state` into `out`.
pub fn write_report<W: Write + ?Sized>(
    out: &mut W,
    nodes: &NodeSets,
    ranking: &[RankedNode],
    state: &SamplingState,
) -> SymmetroidResult<()> {
    writeln!(out, "spectrahedral nodes: {}", nodes.spectrahedral.len())?;
    writeln!(out, "symmetroid nodes: {}", nodes.total())?;
    writeln!(out)?;

    let sampled = state.trials > 0;
    if sampled {
        let (psd, nsd) = (state.psd_component_exists(), state.nsd_component_exists());
        writeln!(out, "has psd component: {psd}")?;
        writeln!(out, "has nsd component: {nsd}")?;
        if psd && nsd {
            writeln!(
                out,
                "fraction of twice-solvable objectives: {}",
                state.fully_bounded_fraction()
            )?;
            writeln!(
                out,
                "fraction of twice-unbounded objectives: {}",
                state.fully_unbounded_fraction()
            )?;
        }
        writeln!(out)?;
    }

    for (i, node) in ranking.iter().enumerate() {
        writeln!(out, "node {}:", i + 1)?;
        writeln!(out, "location: {}", node.point)?;
        if sampled {
            writeln!(out, "probability: {}", node.probability)?;
        }
        writeln!(out, "eigenvalues:")?;
        writeln!(out, "{}", node.signature)?;
        writeln!(out)?;
    }

    for (i, node) in nodes.symmetroid.iter().enumerate() {
        writeln!(out, "symmetroid node {}:", i + 1)?;
        writeln!(out, "location: {}", node.point)?;
        writeln!(out, "eigenvalues:")?;
        writeln!(out, "{}", node.signature)?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use symmetroid_types::{Component, EigenSignature, Point, SingularNode};

    fn sets() -> NodeSets {
        let mut sets = NodeSets::default();
        sets.push(SingularNode::new(
            Point::new(1.0, 0.0, 0.0),
            EigenSignature(vec![2.0, 1.0, 0.0]),
        ));
        sets.push(SingularNode::new(
            Point::new(0.0, 1.0, 0.0),
            EigenSignature(vec![2.0, -1.0, 0.0]),
        ));
        sets
    }

    fn ranking() -> Vec<RankedNode> {
        vec![RankedNode {
            point: Point::new(1.0, 0.0, 0.0),
            probability: 0.5,
            signature: EigenSignature(vec![2.0, 1.0, 0.0]),
        }]
    }

    fn render(nodes: &NodeSets, ranking: &[RankedNode], state: &SamplingState) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, nodes, ranking, state).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_counts_are_combined() {
        let text = render(&sets(), &ranking(), &SamplingState::new());
        assert!(text.starts_with("spectrahedral nodes: 1\nsymmetroid nodes: 2\n\n"));
    }

    #[test]
    fn test_zero_trials_omits_sampling_lines() {
        let text = render(&sets(), &ranking(), &SamplingState::new());
        assert!(!text.contains("has psd component"));
        assert!(!text.contains("probability:"));
        assert!(text.contains("node 1:\nlocation: [1, 0, 0]\neigenvalues:\n"));
        assert!(text.contains("symmetroid node 1:\nlocation: [0, 1, 0]\n"));
    }

    #[test]
    fn test_sampled_report_includes_fractions() {
        let mut state = SamplingState::new();
        state.trials = 4;
        state.fully_bounded_directions = 1;
        state.fully_unbounded_directions = 2;
        let text = render(&sets(), &ranking(), &state);
        assert!(text.contains("has psd component: true\nhas nsd component: true\n"));
        assert!(text.contains("fraction of twice-solvable objectives: 0.25\n"));
        assert!(text.contains("fraction of twice-unbounded objectives: 0.5\n"));
        assert!(text.contains("probability: 0.5\n"));
    }

    #[test]
    fn test_fractions_omitted_without_both_components() {
        let mut state = SamplingState::new();
        state.trials = 3;
        state.latch(Component::Nsd);
        let text = render(&sets(), &ranking(), &state);
        assert!(text.contains("has nsd component: false"));
        assert!(!text.contains("fraction of"));
    }

    #[test]
    fn test_section_order() {
        let mut state = SamplingState::new();
        state.trials = 1;
        let text = render(&sets(), &ranking(), &state);
        let header = text.find("symmetroid nodes:").unwrap();
        let sampling = text.find("has psd component").unwrap();
        let ranked = text.find("node 1:").unwrap();
        let sym = text.find("symmetroid node 1:").unwrap();
        assert!(header < sampling && sampling < ranked && ranked < sym);
    }
}
