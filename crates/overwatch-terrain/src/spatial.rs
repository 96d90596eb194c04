//! Uniform bucket grid over static overlay items.
//!
//! Built once, never mutated. Queries return item indices in ascending
//! order so callers see table order regardless of bucket layout.

use std::collections::HashMap;

use glam::DVec2;

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialIndex {
    /// Index items by their axis-aligned bounds `(min, max)`.
    pub fn build<I>(cell_size: f64, bounds: I) -> Self
    where
        I: IntoIterator<Item = (DVec2, DVec2)>,
    {
        let mut index = Self {
            cell_size,
            buckets: HashMap::new(),
        };
        for (i, (lo, hi)) in bounds.into_iter().enumerate() {
            let (c0, r0) = index.cell_of(lo);
            let (c1, r1) = index.cell_of(hi);
            for c in c0..=c1 {
                for r in r0..=r1 {
                    index.buckets.entry((c, r)).or_default().push(i);
                }
            }
        }
        index
    }

    fn cell_of(&self, p: DVec2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Items whose bounds may contain `p`.
    pub fn query_point(&self, p: DVec2) -> &[usize] {
        self.buckets
            .get(&self.cell_of(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Items whose bounds may come within `radius` of `p`, ascending and deduplicated.
    pub fn query_radius(&self, p: DVec2, radius: f64) -> Vec<usize> {
        let r = DVec2::splat(radius.max(0.0));
        let (c0, r0) = self.cell_of(p - r);
        let (c1, r1) = self.cell_of(p + r);
        let mut out = Vec::new();
        if (c1 - c0 + 1).saturating_mul(r1 - r0 + 1) > self.buckets.len() as i64 {
            // Query window larger than the occupied set: walk buckets instead.
            for (&(c, row), items) in &self.buckets {
                if (c0..=c1).contains(&c) && (r0..=r1).contains(&row) {
                    out.extend_from_slice(items);
                }
            }
        } else {
            for c in c0..=c1 {
                for row in r0..=r1 {
                    if let Some(items) = self.buckets.get(&(c, row)) {
                        out.extend_from_slice(items);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}
