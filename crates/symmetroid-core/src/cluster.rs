// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Cluster Matcher
// ─────────────────────────────────────────────────────────────────────
//! Raw minima → per-node occurrence counts.
//!
//! One global absolute radius is used for every node:
//! `max_delta = tolerance × max‖node‖₂`. A node far from the origin
//! therefore widens the radius for small nodes too. A minimum within the
//! radius of several nodes counts once for each of them; overlapping
//! nodes double-count instead of picking a nearest match.
//!
//! A node gains at most one occurrence per trial, so with `trials` as the
//! denominator every probability stays within [0, 1] even when the PSD
//! and NSD minima of one trial land near the same node.

use symmetroid_types::{ProcessedNode, RawMinimum};

/// Relative-tolerance matcher between sampled minima and known nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterMatcher {
    tolerance: f64,
}

/// Summary of one matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchStats {
    /// Minima consumed from the buffer.
    pub minima: usize,
    /// Minima that matched at least one node.
    pub matched: usize,
    /// Total occurrence increments. Exceeds `matched` when nodes overlap;
    /// falls below it when one trial's minima share a node.
    pub increments: u64,
    /// Absolute radius used for this pass.
    pub max_delta: f64,
}

impl ClusterMatcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// tolerance × largest node norm, or 0 with no nodes.
    pub fn max_delta(&self, nodes: &[ProcessedNode]) -> f64 {
        let max_norm = nodes
            .iter()
            .map(|n| n.node.point.norm())
            .fold(0.0, f64::max);
        self.tolerance * max_norm
    }

    /// Count every trial with a minimum within `max_delta` (inclusive) of
    /// each node, then clear `minima` unconditionally.
    pub fn match_minima(
        &self,
        nodes: &mut [ProcessedNode],
        minima: &mut Vec<RawMinimum>,
    ) -> MatchStats {
        let max_delta = self.max_delta(nodes);
        let mut stats = MatchStats {
            minima: minima.len(),
            max_delta,
            ..Default::default()
        };

        if !nodes.is_empty() {
            // Parallel sampling appends out of trial order.
            minima.sort_by_key(|m| m.trial);
            let mut last_trial: Vec<Option<u64>> = vec![None; nodes.len()];
            for m in minima.iter() {
                let mut hit = false;
                for (node, last) in nodes.iter_mut().zip(last_trial.iter_mut()) {
                    if node.node.point.distance(&m.point) > max_delta {
                        continue;
                    }
                    hit = true;
                    if *last != Some(m.trial) {
                        *last = Some(m.trial);
                        node.occurrences += 1;
                        stats.increments += 1;
                    }
                }
                if hit {
                    stats.matched += 1;
                }
            }
        }

        minima.clear();
        log::debug!(
            "cluster pass: {}/{} minima matched, {} increments, max_delta={:.3e}",
            stats.matched,
            stats.minima,
            stats.increments,
            stats.max_delta
        );
        stats
    }
}
