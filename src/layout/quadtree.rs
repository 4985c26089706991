use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span.max_elem() * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two cells, zero when they overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(sign(1), sign(2)),
            half_extent: quarter,
        }
    }
}

/// Barnes-Hut quadtree over node positions; `mass` is the point count.
pub(super) struct QuadTree {
    pub(super) square: Square,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    /// Point indices, only populated on leaves.
    pub(super) points: Vec<usize>,
    pub(super) children: [Option<Box<QuadTree>>; 4],
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        Some(Self::subdivide(square, (0..positions.len()).collect(), positions, 0))
    }

    fn subdivide(square: Square, points: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = points.len() as f32;
        let center_of_mass = if points.is_empty() {
            square.center
        } else {
            points.iter().fold(Vec2::ZERO, |sum, &index| sum + positions[index]) / mass
        };

        let mut tree = Self {
            square,
            center_of_mass,
            mass,
            points,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || tree.points.len() <= LEAF_CAPACITY {
            return tree;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &tree.points {
            buckets[square.quadrant_of(positions[index])].push(index);
        }
        // Coincident points never separate; keep them in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return tree;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                tree.children[quadrant] = Some(Box::new(Self::subdivide(
                    square.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        tree.points.clear();
        tree
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadTree> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sets_stay_in_one_leaf() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 5.0), vec2(-3.0, 8.0)];
        let tree = QuadTree::build(&positions).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.points, vec![0, 1, 2]);
        assert_eq!(tree.mass, 3.0);
    }

    #[test]
    fn large_sets_split_and_keep_every_point() {
        let positions = (0..64)
            .map(|index| vec2((index % 8) as f32 * 20.0, (index / 8) as f32 * 20.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&positions).unwrap();
        assert!(!tree.is_leaf());

        fn collect(tree: &QuadTree, out: &mut Vec<usize>) {
            out.extend(&tree.points);
            for child in tree.children() {
                collect(child, out);
            }
        }
        let mut seen = Vec::new();
        collect(&tree, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn coincident_points_do_not_recurse_forever() {
        let positions = vec![vec2(1.0, 1.0); 40];
        let tree = QuadTree::build(&positions).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.points.len(), 40);
    }

    #[test]
    fn rejects_non_finite_input() {
        assert!(QuadTree::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadTree::build(&[]).is_none());
    }
}
