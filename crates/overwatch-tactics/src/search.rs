//! Candidate position searches.
//!
//! Every search samples its area, evaluates a method-specific metric for
//! each point in parallel, filters by a threshold, and returns a ranked
//! list. Ties keep sampling order. Nothing qualifying is an empty list.

use std::cmp::Ordering;

use glam::DVec2;
use rayon::prelude::*;
use tracing::debug;

use overwatch_core::config::SearchConfig;
use overwatch_core::constants::*;
use overwatch_core::enums::Metric;
use overwatch_core::error::{require_positive, Result, TerrainError};
use overwatch_core::state::PositionCandidate;
use overwatch_core::types::bearing_deg;
use overwatch_terrain::TerrainSession;

use crate::sampling::{ring_points, SearchArea};

/// Position searches over one terrain session.
#[derive(Debug, Clone, Copy)]
pub struct PositionSearch<'a> {
    session: &'a TerrainSession,
    config: &'a SearchConfig,
}

impl<'a> PositionSearch<'a> {
    pub fn new(session: &'a TerrainSession) -> Self {
        Self {
            session,
            config: &session.config().search,
        }
    }

    /// Evaluate every on-map point of the area, keeping input order.
    fn evaluate<F>(&self, area: &SearchArea, method: &str, f: F) -> Result<Vec<PositionCandidate>>
    where
        F: Fn(DVec2) -> Option<PositionCandidate> + Sync,
    {
        let field = self.session.field();
        let points: Vec<DVec2> = area
            .points()?
            .into_iter()
            .filter(|p| field.contains(p.x, p.y))
            .collect();
        let kept: Vec<PositionCandidate> = points.par_iter().filter_map(|p| f(*p)).collect();
        debug!(method, sampled = points.len(), kept = kept.len(), "position search");
        Ok(kept)
    }

    fn place(&self, p: DVec2, yaw: f64) -> PositionCandidate {
        PositionCandidate::from_placement(self.session.resolve_placement(p.x, p.y, yaw))
    }

    /// Mean on-map height over the configured annulus, None if fully off-map.
    fn annulus_mean(&self, p: DVec2) -> Option<f64> {
        let c = self.config;
        let rings = c.annulus_rings;
        let heights: Vec<f64> = (0..rings)
            .flat_map(|k| {
                let r = if rings == 1 {
                    (c.annulus_inner + c.annulus_outer) / 2.0
                } else {
                    c.annulus_inner + (c.annulus_outer - c.annulus_inner) * k as f64 / (rings - 1) as f64
                };
                ring_points(p, r, c.ring_samples)
            })
            .filter_map(|q| self.session.field().height_at(q.x, q.y))
            .collect();
        mean(&heights)
    }

    fn ring_heights(&self, p: DVec2, radius: f64) -> Vec<f64> {
        ring_points(p, radius, self.config.ring_samples)
            .into_iter()
            .filter_map(|q| self.session.field().height_at(q.x, q.y))
            .collect()
    }

    /// Fraction of a square patch whose slope is within `max_slope`.
    ///
    /// Metrics: `Flatness`, `Slope` (at the candidate).
    pub fn find_flat_area(
        &self,
        area: &SearchArea,
        area_size: f64,
        max_slope: f64,
        min_flatness: f64,
    ) -> Result<Vec<PositionCandidate>> {
        require_positive("area_size", area_size)?;
        if !(max_slope.is_finite() && max_slope >= 0.0) {
            return Err(TerrainError::invalid("max_slope", format!("must be >= 0, got {max_slope}")));
        }
        if !(0.0..=1.0).contains(&min_flatness) {
            return Err(TerrainError::invalid(
                "min_flatness",
                format!("must be within [0, 1], got {min_flatness}"),
            ));
        }

        let n = self.config.patch_points;
        let field = self.session.field();
        let mut found = self.evaluate(area, "flat_area", |p| {
            let mut total = 0usize;
            let mut flat = 0usize;
            for j in 0..n {
                for i in 0..n {
                    let q = p + DVec2::new(
                        area_size * (i as f64 / (n - 1) as f64 - 0.5),
                        area_size * (j as f64 / (n - 1) as f64 - 0.5),
                    );
                    if !field.contains(q.x, q.y) {
                        continue;
                    }
                    total += 1;
                    if self.session.slope_at(q.x, q.y) <= max_slope {
                        flat += 1;
                    }
                }
            }
            let flatness = flat as f64 / total.max(1) as f64;
            (flatness >= min_flatness).then(|| {
                self.place(p, 0.0)
                    .with_metric(Metric::Flatness, flatness)
                    .with_metric(Metric::Slope, self.session.slope_at(p.x, p.y))
            })
        })?;
        sort_desc(&mut found, Metric::Flatness);
        Ok(found)
    }

    /// Points standing above the mean of their surrounding annulus.
    ///
    /// Only strictly positive advantages of at least `min_height_advantage`
    /// qualify. Metrics: `HeightAdvantage`, `SurroundingMean`.
    pub fn find_elevated_positions(
        &self,
        area: &SearchArea,
        min_height_advantage: f64,
    ) -> Result<Vec<PositionCandidate>> {
        let mut found = self.evaluate(area, "elevated", |p| {
            let (advantage, surrounding) = self.height_advantage(p)?;
            (advantage > 0.0 && advantage >= min_height_advantage).then(|| {
                self.place(p, 0.0)
                    .with_metric(Metric::HeightAdvantage, advantage)
                    .with_metric(Metric::SurroundingMean, surrounding)
            })
        })?;
        sort_desc(&mut found, Metric::HeightAdvantage);
        Ok(found)
    }

    fn height_advantage(&self, p: DVec2) -> Option<(f64, f64)> {
        let h = self.session.field().height_at(p.x, p.y)?;
        let surrounding = self.annulus_mean(p)?;
        Some((h - surrounding, surrounding))
    }

    /// Weighted composite of depth below local mean, roughness, and road
    /// remoteness, each saturating at its normalizer.
    ///
    /// Metrics: `Concealment`, `Depth`, `Roughness`, `RoadDistance`.
    pub fn find_concealed_positions(
        &self,
        area: &SearchArea,
        min_concealment: f64,
    ) -> Result<Vec<PositionCandidate>> {
        let field = self.session.field();
        let mut found = self.evaluate(area, "concealed", |p| {
            let h = field.height_at(p.x, p.y)?;
            let ring = self.ring_heights(p, self.config.concealment_radius);
            let local_mean = mean(&ring)?;
            let depth = (local_mean - h).max(0.0);

            let mut neighborhood = ring;
            neighborhood.push(h);
            let roughness = std_dev(&neighborhood);

            let road_distance = self
                .session
                .surfaces()
                .nearest_road_within(p.x, p.y, CONCEALMENT_REMOTENESS_NORM)
                .map_or(CONCEALMENT_REMOTENESS_NORM, |hit| hit.distance);

            let score = CONCEALMENT_DEPTH_WEIGHT * (depth / CONCEALMENT_DEPTH_NORM).min(1.0)
                + CONCEALMENT_ROUGHNESS_WEIGHT * (roughness / CONCEALMENT_ROUGHNESS_NORM).min(1.0)
                + CONCEALMENT_REMOTENESS_WEIGHT * (road_distance / CONCEALMENT_REMOTENESS_NORM).min(1.0);

            (score >= min_concealment).then(|| {
                self.place(p, 0.0)
                    .with_metric(Metric::Concealment, score)
                    .with_metric(Metric::Depth, depth)
                    .with_metric(Metric::Roughness, roughness)
                    .with_metric(Metric::RoadDistance, road_distance)
            })
        })?;
        sort_desc(&mut found, Metric::Concealment);
        Ok(found)
    }

    /// Elevated points facing a target. As in
    /// [`find_elevated_positions`](Self::find_elevated_positions), the
    /// advantage must be strictly positive. With `require_los`, points
    /// without sight of the target are dropped.
    ///
    /// Ranked by sight first, then advantage. Metrics: `HeightAdvantage`,
    /// `LineOfSight` (1 or 0), `DistanceToTarget`.
    pub fn find_observation_posts(
        &self,
        area: &SearchArea,
        target: DVec2,
        min_height_advantage: f64,
        require_los: bool,
    ) -> Result<Vec<PositionCandidate>> {
        let vis = self.session.visibility();
        let c = self.config;
        let mut found = self.evaluate(area, "observation_post", |p| {
            let (advantage, _) = self.height_advantage(p)?;
            if advantage <= 0.0 || advantage < min_height_advantage {
                return None;
            }
            let los = vis.line_of_sight(p, target, c.observer_eye_height, c.target_eye_height, c.los_samples);
            if require_los && !los {
                return None;
            }
            Some(
                self.place(p, bearing_deg(p, target))
                    .with_metric(Metric::HeightAdvantage, advantage)
                    .with_metric(Metric::LineOfSight, if los { 1.0 } else { 0.0 })
                    .with_metric(Metric::DistanceToTarget, p.distance(target)),
            )
        })?;
        found.sort_by(|a, b| {
            desc(a, b, Metric::LineOfSight).then_with(|| desc(a, b, Metric::HeightAdvantage))
        });
        Ok(found)
    }

    /// Points within a distance band of a target, flagged for defilade
    /// (lower than the mean of a surrounding ring).
    ///
    /// With `prefer_defilade`, defiladed points come first; otherwise and
    /// within each group, nearest first. Metrics: `DistanceToTarget`,
    /// `Defilade` (1 or 0), `DefiladeDepth`.
    pub fn find_fire_positions(
        &self,
        area: &SearchArea,
        target: DVec2,
        min_distance: f64,
        max_distance: f64,
        prefer_defilade: bool,
    ) -> Result<Vec<PositionCandidate>> {
        if !(min_distance.is_finite() && min_distance >= 0.0) {
            return Err(TerrainError::invalid(
                "min_distance",
                format!("must be >= 0, got {min_distance}"),
            ));
        }
        if max_distance.is_nan() || max_distance < min_distance {
            return Err(TerrainError::InvalidDistanceRange {
                min: min_distance,
                max: max_distance,
            });
        }

        let field = self.session.field();
        let mut found = self.evaluate(area, "fire_position", |p| {
            let distance = p.distance(target);
            if distance < min_distance || distance > max_distance {
                return None;
            }
            let h = field.height_at(p.x, p.y)?;
            let ring_mean = mean(&self.ring_heights(p, self.config.defilade_radius))?;
            let depth = ring_mean - h;
            let defilade = depth > 0.0;
            Some(
                self.place(p, bearing_deg(p, target))
                    .with_metric(Metric::DistanceToTarget, distance)
                    .with_metric(Metric::Defilade, if defilade { 1.0 } else { 0.0 })
                    .with_metric(Metric::DefiladeDepth, depth),
            )
        })?;
        found.sort_by(|a, b| {
            let first = if prefer_defilade {
                desc(a, b, Metric::Defilade)
            } else {
                Ordering::Equal
            };
            first.then_with(|| {
                a.metric(Metric::DistanceToTarget)
                    .total_cmp(&b.metric(Metric::DistanceToTarget))
            })
        });
        Ok(found)
    }

    /// Walk from `start` to `end` in `steps` points and score each by the
    /// height variance of a perpendicular cross-section.
    ///
    /// Points below `narrowness_threshold` are returned tightest first.
    /// Metrics: `Narrowness` (variance, m²), `Relief` (max minus min, m).
    pub fn find_choke_points(
        &self,
        start: DVec2,
        end: DVec2,
        steps: usize,
        cross_section_width: f64,
        narrowness_threshold: f64,
    ) -> Result<Vec<PositionCandidate>> {
        if steps < 2 {
            return Err(TerrainError::invalid("steps", format!("must be at least 2, got {steps}")));
        }
        require_positive("cross_section_width", cross_section_width)?;
        if !narrowness_threshold.is_finite() {
            return Err(TerrainError::invalid("narrowness_threshold", "must be finite"));
        }
        let Some(dir) = (end - start).try_normalize() else {
            return Err(TerrainError::invalid("end", "must differ from start"));
        };

        let perp = DVec2::new(-dir.y, dir.x);
        let heading = bearing_deg(start, end);
        let n = self.config.cross_section_samples;
        let field = self.session.field();

        let mut found: Vec<PositionCandidate> = (0..steps)
            .into_par_iter()
            .filter_map(|i| {
                let p = start.lerp(end, i as f64 / (steps - 1) as f64);
                if !field.contains(p.x, p.y) {
                    return None;
                }
                let section: Vec<f64> = (0..n)
                    .map(|k| cross_section_width * (k as f64 / (n - 1) as f64 - 0.5))
                    .filter_map(|offset| {
                        let q = p + perp * offset;
                        field.height_at(q.x, q.y)
                    })
                    .collect();
                if section.len() < 2 {
                    return None;
                }
                let narrowness = variance(&section);
                let relief = section.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                    - section.iter().copied().fold(f64::INFINITY, f64::min);
                (narrowness < narrowness_threshold).then(|| {
                    self.place(p, heading)
                        .with_metric(Metric::Narrowness, narrowness)
                        .with_metric(Metric::Relief, relief)
                })
            })
            .collect();
        debug!(steps, kept = found.len(), "choke point walk");
        found.sort_by(|a, b| a.metric(Metric::Narrowness).total_cmp(&b.metric(Metric::Narrowness)));
        Ok(found)
    }
}

fn desc(a: &PositionCandidate, b: &PositionCandidate, m: Metric) -> Ordering {
    b.metric(m).total_cmp(&a.metric(m))
}

fn sort_desc(found: &mut [PositionCandidate], m: Metric) {
    found.sort_by(|a, b| desc(a, b, m));
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub(crate) fn variance(values: &[f64]) -> f64 {
    let Some(m) = mean(values) else {
        return 0.0;
    };
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}
