//! Force-directed layout engine.
//!
//! One [`LayoutEngine`] owns the positions and velocities for one snapshot.
//! Each [`LayoutEngine::tick`] applies repulsion, springs, centering, velocity
//! integration and collision relaxation, then cools `alpha`. Pinned nodes are
//! anchors: they exert forces but are never integrated.

mod forces;
mod quadtree;

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::model::GraphSnapshot;
use crate::render::node_radius;
use forces::{RepulsionParams, Spring, accumulate_repulsion, collision_candidates, separation_direction};
use quadtree::QuadTree;

const BARNES_HUT_THETA: f32 = 0.72;
/// Upper bound on the relaxation passes run on the tick that reaches
/// convergence. Settling stops earlier once no pair overlaps.
const MAX_SETTLE_PASSES: usize = 512;

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    pairs: Vec<(usize, usize)>,
}

pub struct LayoutEngine {
    config: LayoutConfig,
    center: Vec2,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    springs: Vec<Spring>,
    pinned: Vec<Option<Vec2>>,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
    scratch: Scratch,
}

impl LayoutEngine {
    /// Seeds positions for `snapshot` around the center of `viewport`.
    ///
    /// Nodes without a collaborator-supplied position are scattered in a disk
    /// drawn from `config.seed`, so equal inputs give equal layouts.
    pub fn new(snapshot: &GraphSnapshot, viewport: Vec2, config: LayoutConfig) -> Self {
        let node_count = snapshot.node_count();
        let center = viewport * 0.5;

        let radii = snapshot
            .nodes()
            .iter()
            .map(|node| node_radius(node.frequency) + config.collision_padding)
            .collect::<Vec<_>>();

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let scatter = config.link_distance * 0.5 * (node_count as f32).sqrt() + 10.0;
        let positions = snapshot
            .nodes()
            .iter()
            .map(|node| match node.initial_position {
                Some(position) => position,
                None if node_count == 1 => center,
                None => {
                    let distance = scatter * rng.gen_range(0.0_f32..1.0).sqrt();
                    let angle = rng.gen_range(0.0..TAU);
                    center + vec2(angle.cos(), angle.sin()) * distance
                }
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; node_count];
        for edge in snapshot.edges() {
            if !edge.is_self_loop() {
                degree[edge.source] += 1;
                degree[edge.target] += 1;
            }
        }
        let springs = snapshot
            .edges()
            .iter()
            .filter(|edge| !edge.is_self_loop())
            .map(|edge| {
                let busiest = degree[edge.source].min(degree[edge.target]).max(1);
                Spring::new(
                    edge.source,
                    edge.target,
                    edge.weight,
                    (radii[edge.source], radii[edge.target]),
                    config.link_distance,
                    config.spring_strength,
                    1.0 / busiest as f32,
                )
            })
            .collect();

        // Nothing to settle for zero or one node.
        let alpha = if node_count < 2 { 0.0 } else { 1.0 };
        debug!(nodes = node_count, edges = snapshot.edge_count(), "layout initialized");

        Self {
            config,
            center,
            positions,
            velocities: vec![Vec2::ZERO; node_count],
            radii,
            springs,
            pinned: vec![None; node_count],
            alpha,
            alpha_target: 0.0,
            ticks: 0,
            scratch: Scratch::default(),
        }
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.positions.get(index).copied()
    }

    /// Radius the collision constraint keeps clear around `index`.
    pub fn collision_radius(&self, index: usize) -> Option<f32> {
        self.radii.get(index).copied()
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn is_converged(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pinned.get(index).is_some_and(Option::is_some)
    }

    /// Anchors `index` at `position`, or releases it with `None`.
    ///
    /// The position is written immediately so readers never observe a pinned
    /// node away from its anchor. Returns `false` for an unknown index.
    pub fn set_pinned(&mut self, index: usize, position: Option<Vec2>) -> bool {
        let Some(slot) = self.pinned.get_mut(index) else {
            return false;
        };

        *slot = position.filter(|position| position.is_finite());
        if let Some(position) = *slot {
            self.positions[index] = position;
            self.velocities[index] = Vec2::ZERO;
        }
        true
    }

    /// Raises alpha to at least `alpha`.
    pub fn reheat(&mut self, alpha: f32) {
        if self.positions.len() >= 2 {
            self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        }
    }

    /// Level alpha relaxes toward; non-zero keeps the simulation running.
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = if self.positions.len() >= 2 {
            target.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Moves the centering target to the middle of a new viewport.
    pub fn resize(&mut self, viewport: Vec2) {
        self.center = viewport * 0.5;
    }

    /// Advances one step and returns positions indexed like the snapshot.
    pub fn tick(&mut self) -> &[Vec2] {
        if self.is_converged() {
            return &self.positions;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks += 1;

        self.accumulate_forces();
        self.integrate();
        for _ in 0..self.config.collision_iterations {
            self.relax_collisions();
        }

        if self.is_converged() {
            let mut passes = 0;
            let mut overlapping = self.relax_collisions();
            while overlapping > 0 && passes < MAX_SETTLE_PASSES {
                overlapping = self.relax_collisions();
                passes += 1;
            }
            if overlapping > 0 {
                warn!(overlapping, passes, "layout converged with overlapping nodes");
            }
            debug!(ticks = self.ticks, passes, "layout converged");
        }

        &self.positions
    }

    fn accumulate_forces(&mut self) {
        let node_count = self.positions.len();
        let alpha = self.alpha;
        let forces = &mut self.scratch.forces;
        forces.clear();
        forces.resize(node_count, Vec2::ZERO);

        if node_count >= 2
            && let Some(tree) = QuadTree::build(&self.positions)
        {
            let params = RepulsionParams {
                strength: self.config.repulsion_strength * alpha,
                min_distance_sq: self.config.min_distance * self.config.min_distance,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                if self.pinned[index].is_none() {
                    accumulate_repulsion(&tree, index, &self.positions, params, force);
                }
            }
        }

        for spring in &self.springs {
            let correction = spring.correction(&self.positions, alpha, self.config.min_distance);
            let (source_share, target_share) =
                match (self.pinned[spring.source], self.pinned[spring.target]) {
                    (Some(_), Some(_)) => continue,
                    (Some(_), None) => (0.0, 1.0),
                    (None, Some(_)) => (1.0, 0.0),
                    (None, None) => (0.5, 0.5),
                };
            forces[spring.source] += correction * source_share;
            forces[spring.target] -= correction * target_share;
        }

        let center_pull = self.config.center_strength * alpha;
        for (index, force) in forces.iter_mut().enumerate() {
            if self.pinned[index].is_none() {
                *force += (self.center - self.positions[index]) * center_pull;
            }
        }
    }

    fn integrate(&mut self) {
        let retention = 1.0 - self.config.velocity_decay;
        let max_speed = self.config.max_speed;

        for index in 0..self.positions.len() {
            if let Some(anchor) = self.pinned[index] {
                self.positions[index] = anchor;
                self.velocities[index] = Vec2::ZERO;
                continue;
            }

            let mut velocity = (self.velocities[index] + self.scratch.forces[index]) * retention;
            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }

            let position = self.positions[index] + velocity;
            if position.is_finite() {
                self.positions[index] = position;
                self.velocities[index] = velocity;
            } else {
                warn!(index, "non-finite position, resetting node to center");
                self.positions[index] = self.center;
                self.velocities[index] = Vec2::ZERO;
            }
        }
    }

    /// One relaxation pass over overlapping pairs. Returns how many pairs
    /// overlapped.
    fn relax_collisions(&mut self) -> usize {
        if self.positions.len() < 2 {
            return 0;
        }
        let Some(tree) = QuadTree::build(&self.positions) else {
            return 0;
        };

        let max_radius = self.radii.iter().copied().fold(0.0_f32, f32::max);
        let reach = max_radius * 2.0;
        let pairs = &mut self.scratch.pairs;
        pairs.clear();
        collision_candidates(&tree, &tree, true, reach * reach, pairs);

        let mut overlapping = 0;
        for &(first, second) in pairs.iter() {
            let first_pinned = self.pinned[first].is_some();
            let second_pinned = self.pinned[second].is_some();
            if first_pinned && second_pinned {
                continue;
            }

            let min_distance = self.radii[first] + self.radii[second];
            let delta = self.positions[first] - self.positions[second];
            let (direction, distance) = separation_direction(delta, first, second);
            if distance >= min_distance {
                continue;
            }

            overlapping += 1;
            let push = direction * (min_distance - distance);
            if first_pinned {
                self.positions[second] -= push;
            } else if second_pinned {
                self.positions[first] += push;
            } else {
                self.positions[first] += push * 0.5;
                self.positions[second] -= push * 0.5;
            }
        }
        overlapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawEdge, RawGraph, RawNode};

    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    fn snapshot(nodes: &[(&str, u32)], edges: &[(&str, &str, f32)]) -> GraphSnapshot {
        GraphSnapshot::ingest(RawGraph {
            nodes: nodes
                .iter()
                .map(|(id, frequency)| RawNode {
                    id: (*id).to_owned(),
                    label: None,
                    category: "sample".to_owned(),
                    frequency: *frequency,
                    documents: Vec::new(),
                    x: None,
                    y: None,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(source, target, weight)| RawEdge {
                    source: (*source).to_owned(),
                    target: (*target).to_owned(),
                    weight: *weight,
                })
                .collect(),
        })
    }

    fn run_to_convergence(engine: &mut LayoutEngine) {
        for _ in 0..5_000 {
            if engine.is_converged() {
                return;
            }
            engine.tick();
        }
        panic!("layout did not converge");
    }

    #[test]
    fn empty_graph_is_idle() {
        let mut engine = LayoutEngine::new(&GraphSnapshot::empty(), VIEWPORT, LayoutConfig::default());
        assert!(engine.is_converged());
        assert!(engine.tick().is_empty());
        assert_eq!(engine.ticks(), 0);
    }

    #[test]
    fn single_node_sits_at_center() {
        let mut engine = LayoutEngine::new(&snapshot(&[("a", 4)], &[]), VIEWPORT, LayoutConfig::default());
        assert!(engine.is_converged());
        assert_eq!(engine.tick(), &[VIEWPORT * 0.5]);

        engine.set_alpha_target(0.3);
        assert!(engine.is_converged());
    }

    #[test]
    fn same_seed_same_layout() {
        let graph = snapshot(
            &[("a", 3), ("b", 1), ("c", 9), ("d", 2)],
            &[("a", "b", 1.0), ("b", "c", 2.0), ("c", "d", 1.0)],
        );
        let mut first = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());
        let mut second = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());
        for _ in 0..50 {
            first.tick();
            second.tick();
        }
        assert_eq!(first.positions(), second.positions());

        let other_seed = LayoutConfig {
            seed: 99,
            ..LayoutConfig::default()
        };
        let third = LayoutEngine::new(&graph, VIEWPORT, other_seed);
        assert_ne!(LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default()).positions(), third.positions());
    }

    #[test]
    fn coincident_start_stays_finite() {
        let mut raw = RawGraph::default();
        for id in ["a", "b", "c"] {
            raw.nodes.push(RawNode {
                id: id.to_owned(),
                label: None,
                category: "condition".to_owned(),
                frequency: 2,
                documents: Vec::new(),
                x: Some(5.0),
                y: Some(5.0),
            });
        }
        let graph = GraphSnapshot::ingest(raw);
        let mut engine = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());

        for _ in 0..20 {
            for position in engine.tick() {
                assert!(position.is_finite());
            }
        }
        let positions = engine.positions();
        assert_ne!(positions[0], positions[1]);
    }

    #[test]
    fn pinned_node_does_not_move_until_released() {
        let graph = snapshot(&[("a", 1), ("b", 1), ("c", 1)], &[("a", "b", 3.0), ("b", "c", 1.0)]);
        let mut engine = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());
        let anchor = vec2(10.0, 20.0);
        assert!(engine.set_pinned(1, Some(anchor)));
        assert!(engine.is_pinned(1));

        for _ in 0..100 {
            engine.tick();
            assert_eq!(engine.position(1), Some(anchor));
        }

        engine.set_pinned(1, None);
        engine.reheat(0.3);
        engine.tick();
        assert_ne!(engine.position(1), Some(anchor));
    }

    #[test]
    fn alpha_target_keeps_simulation_warm() {
        let graph = snapshot(&[("a", 1), ("b", 1)], &[("a", "b", 1.0)]);
        let mut engine = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());
        run_to_convergence(&mut engine);
        let settled_ticks = engine.ticks();

        engine.set_alpha_target(0.3);
        assert!(!engine.is_converged());
        for _ in 0..500 {
            engine.tick();
        }
        assert!(engine.alpha() > 0.25);

        engine.set_alpha_target(0.0);
        run_to_convergence(&mut engine);
        assert!(engine.ticks() > settled_ticks + 500);
    }

    #[test]
    fn converged_layout_has_no_overlaps() {
        let nodes = (0..30)
            .map(|index| (format!("n{index}"), 1 + (index * 7 % 40) as u32))
            .collect::<Vec<_>>();
        let node_refs = nodes
            .iter()
            .map(|(id, frequency)| (id.as_str(), *frequency))
            .collect::<Vec<_>>();
        let edges = (0..30)
            .map(|index| (format!("n{index}"), format!("n{}", (index * 11 + 3) % 30)))
            .collect::<Vec<_>>();
        let edge_refs = edges
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str(), 2.0))
            .collect::<Vec<_>>();

        let mut engine = LayoutEngine::new(&snapshot(&node_refs, &edge_refs), VIEWPORT, LayoutConfig::default());
        run_to_convergence(&mut engine);

        let positions = engine.positions();
        for a in 0..positions.len() {
            for b in (a + 1)..positions.len() {
                let distance = (positions[a] - positions[b]).length();
                let required = engine.collision_radius(a).unwrap() + engine.collision_radius(b).unwrap();
                assert!(distance >= required - 0.5, "{a} and {b}: {distance} < {required}");
            }
        }
    }

    #[test]
    fn heavier_edge_settles_tighter() {
        let graph = snapshot(&[("a", 10), ("b", 5), ("c", 1)], &[("a", "b", 5.0), ("b", "c", 1.0)]);
        for seed in [1, 2, 3, 42] {
            let config = LayoutConfig {
                seed,
                ..LayoutConfig::default()
            };
            let mut engine = LayoutEngine::new(&graph, VIEWPORT, config);
            run_to_convergence(&mut engine);

            let gap = |first: usize, second: usize| {
                let distance = (engine.positions()[first] - engine.positions()[second]).length();
                distance - engine.collision_radius(first).unwrap() - engine.collision_radius(second).unwrap()
            };
            assert!(gap(0, 1) < gap(1, 2), "seed {seed}");
        }
    }

    #[test]
    fn resize_moves_center_target() {
        let graph = snapshot(&[("a", 1), ("b", 1)], &[]);
        let mut engine = LayoutEngine::new(&graph, VIEWPORT, LayoutConfig::default());
        engine.resize(vec2(2_000.0, 2_000.0));
        run_to_convergence(&mut engine);

        let centroid = (engine.positions()[0] + engine.positions()[1]) * 0.5;
        assert!(centroid.x > 400.0 && centroid.y > 300.0);
    }
}
