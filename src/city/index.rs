//! Spatial index over projected gazetteer places.

use geo::Coord;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::info;

/// A projected place position with its gazetteer index
#[derive(Debug, Clone, Copy)]
pub struct IndexedPlace {
    pub idx: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexedPlace {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPlace {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree of projected places, built once per gazetteer
pub struct PlaceIndex {
    tree: RTree<IndexedPlace>,
}

impl PlaceIndex {
    /// Build from projected positions; `idx` is the position in the input order
    pub fn build(positions: &[Coord<f64>]) -> Self {
        let indexed: Vec<IndexedPlace> = positions
            .iter()
            .enumerate()
            .map(|(idx, c)| IndexedPlace {
                idx,
                position: [c.x, c.y],
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Place index built with {} entries", tree.size());

        Self { tree }
    }

    /// Nearest place to `query` as (index, distance in meters).
    ///
    /// When several places are equally near, the one that came first in the
    /// gazetteer wins, so the answer never depends on the tree layout.
    pub fn nearest(&self, query: Coord<f64>) -> Option<(usize, f64)> {
        let mut candidates = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[query.x, query.y]);

        let (first, best_d2) = candidates.next()?;
        let mut best_idx = first.idx;

        // Iterator yields in ascending distance; stop past the first ring
        for (candidate, d2) in candidates {
            if d2 > best_d2 {
                break;
            }
            best_idx = best_idx.min(candidate.idx);
        }

        Some((best_idx, best_d2.sqrt()))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_nearest(positions: &[Coord<f64>], query: Coord<f64>) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, p) in positions.iter().enumerate() {
            let (dx, dy) = (p.x - query.x, p.y - query.y);
            let d2 = dx * dx + dy * dy;
            match best {
                Some((_, best_d2)) if d2 >= best_d2 => {}
                _ => best = Some((idx, d2)),
            }
        }
        best.map(|(idx, d2)| (idx, d2.sqrt()))
    }

    #[test]
    fn test_empty_index() {
        let index = PlaceIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.nearest(Coord { x: 0.0, y: 0.0 }).is_none());
    }

    #[test]
    fn test_tie_broken_by_input_order() {
        // Both at distance 10 from the origin; several duplicates to stress tree layout
        let positions = vec![
            Coord { x: 50.0, y: 50.0 },
            Coord { x: -10.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 0.0, y: 10.0 },
            Coord { x: 0.0, y: -10.0 },
        ];
        let index = PlaceIndex::build(&positions);
        for _ in 0..5 {
            let (idx, d) = index.nearest(Coord { x: 0.0, y: 0.0 }).unwrap();
            assert_eq!(idx, 1);
            assert_eq!(d, 10.0);
        }
    }

    #[test]
    fn test_matches_linear_scan() {
        let positions: Vec<Coord<f64>> = (0..400)
            .map(|i| {
                let i = i as f64;
                Coord {
                    x: (i * 7919.0) % 1_000_000.0,
                    y: (i * 104_729.0) % 1_000_000.0,
                }
            })
            .collect();
        let index = PlaceIndex::build(&positions);

        for qx in (0..1_000_000).step_by(83_333) {
            for qy in (0..1_000_000).step_by(71_111) {
                let query = Coord {
                    x: qx as f64,
                    y: qy as f64,
                };
                let expected = linear_nearest(&positions, query).unwrap();
                let got = index.nearest(query).unwrap();
                assert_eq!(got.0, expected.0);
                assert!((got.1 - expected.1).abs() < 1e-6);
            }
        }
    }
}
