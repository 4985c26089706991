use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;

const COINCIDENT_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug)]
pub(super) struct RepulsionParams {
    /// Already scaled by alpha.
    pub(super) strength: f32,
    pub(super) min_distance_sq: f32,
    pub(super) theta: f32,
}

/// Deterministic unit vector for a pair of coincident points.
pub(super) fn separation_direction(delta: Vec2, first: usize, second: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > COINCIDENT_EPSILON {
        return (delta / distance, distance);
    }

    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * std::f32::consts::TAU;
    (vec2(angle.cos(), angle.sin()), distance)
}

fn inverse_square(delta: Vec2, mass: f32, params: RepulsionParams, first: usize, second: usize) -> Vec2 {
    let (direction, distance) = separation_direction(delta, first, second);
    let distance_sq = (distance * distance).max(params.min_distance_sq);
    direction * (params.strength * mass / distance_sq)
}

/// Adds the repulsion every other point exerts on `index`.
pub(super) fn accumulate_repulsion(
    tree: &QuadTree,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if tree.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if tree.is_leaf() {
        for &other in &tree.points {
            if other != index {
                *force += inverse_square(point - positions[other], 1.0, params, index, other);
            }
        }
        return;
    }

    let delta = point - tree.center_of_mass;
    let distance = delta.length().max(COINCIDENT_EPSILON);
    let far_enough = !tree.square.contains(point) && (tree.square.side() / distance) < params.theta;
    if far_enough {
        *force += inverse_square(delta, tree.mass, params, index, usize::MAX);
        return;
    }

    for child in tree.children() {
        accumulate_repulsion(child, index, positions, params, force);
    }
}

/// Collects index pairs `(i, j)` with `i < j` whose cells lie within `reach_sq`
/// of each other. Only those pairs can possibly overlap.
pub(super) fn collision_candidates(
    first: &QuadTree,
    second: &QuadTree,
    same: bool,
    reach_sq: f32,
    pairs: &mut Vec<(usize, usize)>,
) {
    if first.square.gap_sq(second.square) > reach_sq {
        return;
    }

    if first.is_leaf() && second.is_leaf() {
        if same {
            for (offset, &a) in first.points.iter().enumerate() {
                for &b in &first.points[offset + 1..] {
                    pairs.push((a.min(b), a.max(b)));
                }
            }
        } else {
            for &a in &first.points {
                for &b in &second.points {
                    pairs.push((a.min(b), a.max(b)));
                }
            }
        }
        return;
    }

    if same {
        let children = first.children().collect::<Vec<_>>();
        for (offset, child) in children.iter().enumerate() {
            collision_candidates(child, child, true, reach_sq, pairs);
            for other in &children[offset + 1..] {
                collision_candidates(child, other, false, reach_sq, pairs);
            }
        }
        return;
    }

    let split_first = if first.is_leaf() {
        false
    } else if second.is_leaf() {
        true
    } else {
        first.square.half_extent >= second.square.half_extent
    };

    if split_first {
        for child in first.children() {
            collision_candidates(child, second, false, reach_sq, pairs);
        }
    } else {
        for child in second.children() {
            collision_candidates(first, child, false, reach_sq, pairs);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) rest_length: f32,
    pub(super) stiffness: f32,
}

impl Spring {
    /// Heavier edges are both shorter and stiffer. `degree_scale` keeps hubs
    /// from being yanked by the sum of many springs.
    pub(super) fn new(
        source: usize,
        target: usize,
        weight: f32,
        radii: (f32, f32),
        link_distance: f32,
        spring_strength: f32,
        degree_scale: f32,
    ) -> Self {
        let weight = weight.max(f32::MIN_POSITIVE);
        let rest_length = radii.0 + radii.1 + link_distance / (1.0 + weight.ln().max(0.0));
        let stiffness = spring_strength * (weight / (1.0 + weight)) * degree_scale;
        Self {
            source,
            target,
            rest_length,
            stiffness,
        }
    }

    /// Correction pulling `source` toward `target`, scaled by `alpha`.
    pub(super) fn correction(&self, positions: &[Vec2], alpha: f32, min_distance: f32) -> Vec2 {
        let delta = positions[self.target] - positions[self.source];
        let (direction, distance) = separation_direction(delta, self.source, self.target);
        let distance = distance.max(min_distance);
        direction * ((distance - self.rest_length) * self.stiffness * alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_get_a_finite_direction() {
        let (direction, distance) = separation_direction(Vec2::ZERO, 2, 5);
        assert_eq!(distance, 0.0);
        assert!(direction.is_finite());
        assert!((direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn repulsion_is_floored_at_min_distance() {
        let params = RepulsionParams {
            strength: 100.0,
            min_distance_sq: 1.0,
            theta: 0.72,
        };
        let positions = vec![vec2(0.0, 0.0), vec2(0.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let mut force = Vec2::ZERO;
        accumulate_repulsion(&tree, 0, &positions, params, &mut force);

        assert!(force.is_finite());
        assert!((force.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn spring_is_monotonic_in_weight() {
        let light = Spring::new(0, 1, 1.0, (5.0, 5.0), 90.0, 0.6, 1.0);
        let heavy = Spring::new(0, 1, 5.0, (5.0, 5.0), 90.0, 0.6, 1.0);
        assert!(heavy.rest_length < light.rest_length);
        assert!(heavy.stiffness > light.stiffness);
    }

    #[test]
    fn candidates_cover_all_close_pairs() {
        let positions = (0..40)
            .map(|index| vec2((index % 10) as f32 * 3.0, (index / 10) as f32 * 3.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&positions).unwrap();
        let mut pairs = Vec::new();
        collision_candidates(&tree, &tree, true, 16.0, &mut pairs);
        pairs.sort_unstable();
        pairs.dedup();

        for a in 0..positions.len() {
            for b in (a + 1)..positions.len() {
                if (positions[a] - positions[b]).length() < 4.0 {
                    assert!(pairs.binary_search(&(a, b)).is_ok(), "missing pair {a}-{b}");
                }
            }
        }
    }
}
