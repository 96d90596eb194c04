//! Weighted multi-criteria position scoring.

use std::collections::BTreeMap;

use glam::DVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overwatch_core::components::Threat;
use overwatch_core::constants::LOGISTICS_MAX_ROAD_DISTANCE;
use overwatch_core::enums::{Criterion, Metric, ScorerProfile};
use overwatch_core::error::{Result, TerrainError};
use overwatch_core::state::{PositionCandidate, PositionRequirements, ScoreResult, ScoredPosition};
use overwatch_terrain::TerrainSession;

use crate::sampling::SearchArea;

/// Per-criterion weights, in `Criterion::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub altitude: f64,
    pub slope: f64,
    pub road: f64,
    pub threat: f64,
}

impl CriterionWeights {
    pub const fn new(altitude: f64, slope: f64, road: f64, threat: f64) -> Self {
        Self {
            altitude,
            slope,
            road,
            threat,
        }
    }

    pub fn get(&self, c: Criterion) -> f64 {
        match c {
            Criterion::AltitudeFit => self.altitude,
            Criterion::SlopeFit => self.slope,
            Criterion::RoadAccess => self.road,
            Criterion::ThreatExposure => self.threat,
        }
    }

    fn sum(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if Criterion::ALL.iter().any(|c| {
            let w = self.get(*c);
            !w.is_finite() || w < 0.0
        }) {
            return Err(TerrainError::InvalidWeights {
                reason: "weights must be finite and non-negative".into(),
            });
        }
        if self.sum() <= 0.0 {
            return Err(TerrainError::InvalidWeights {
                reason: "at least one weight must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Default weights for a profile.
pub fn profile_weights(profile: ScorerProfile) -> CriterionWeights {
    match profile {
        ScorerProfile::Airbase => CriterionWeights::new(0.2, 0.5, 0.2, 0.1),
        ScorerProfile::Defensive => CriterionWeights::new(0.25, 0.25, 0.15, 0.35),
        ScorerProfile::TacticalOverwatch => CriterionWeights::new(0.3, 0.2, 0.1, 0.4),
        ScorerProfile::TacticalAmbush => CriterionWeights::new(0.2, 0.2, 0.1, 0.5),
        ScorerProfile::Logistics => CriterionWeights::new(0.15, 0.25, 0.5, 0.1),
    }
}

/// A profile plus its weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scorer {
    pub profile: ScorerProfile,
    weights: CriterionWeights,
}

impl Scorer {
    pub fn for_profile(profile: ScorerProfile) -> Self {
        Self {
            profile,
            weights: profile_weights(profile),
        }
    }

    pub fn with_weights(profile: ScorerProfile, weights: CriterionWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { profile, weights })
    }

    pub fn weights(&self) -> &CriterionWeights {
        &self.weights
    }

    /// Requirements adjusted for the profile. Logistics always needs a road
    /// within 2 km.
    pub fn requirements(&self, base: &PositionRequirements) -> PositionRequirements {
        let mut req = base.clone();
        if self.profile == ScorerProfile::Logistics {
            req.requires_road_access = true;
            req.max_road_distance = req.max_road_distance.min(LOGISTICS_MAX_ROAD_DISTANCE);
        }
        req
    }
}

/// Worst proximity to any threat: 1 at a threat center, 0 at or beyond its range.
pub fn threat_exposure(p: DVec2, threats: &[Threat]) -> f64 {
    threats
        .iter()
        .filter(|t| t.range > 0.0)
        .map(|t| (1.0 - p.distance(t.position) / t.range).clamp(0.0, 1.0))
        .fold(0.0, f64::max)
}

/// Score `p` against `requirements` (after profile adjustment).
///
/// The weighted total and `meets_requirements` are independent: a position
/// can score well and still fail a hard constraint. Off-map positions
/// score zero and fail.
pub fn score_position(
    session: &TerrainSession,
    scorer: &Scorer,
    p: DVec2,
    requirements: &PositionRequirements,
    threats: &[Threat],
) -> ScoreResult {
    let req = scorer.requirements(requirements);
    let Some(altitude) = session.field().height_at(p.x, p.y) else {
        return ScoreResult {
            total: 0.0,
            breakdown: Criterion::ALL.iter().map(|c| (*c, 0.0)).collect(),
            meets_requirements: false,
            issues: vec![format!("({:.1}, {:.1}) is outside the terrain", p.x, p.y)],
        };
    };
    let mut issues = Vec::new();

    let span = (req.max_altitude - req.min_altitude).max(1.0);
    let altitude_fit = if altitude < req.min_altitude {
        issues.push(format!("altitude {altitude:.1} m below minimum {:.1} m", req.min_altitude));
        (1.0 - (req.min_altitude - altitude) / span).clamp(0.0, 1.0)
    } else if altitude > req.max_altitude {
        issues.push(format!("altitude {altitude:.1} m above maximum {:.1} m", req.max_altitude));
        (1.0 - (altitude - req.max_altitude) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let slope = session.slope_at(p.x, p.y);
    let slope_fit = if req.max_slope > 0.0 {
        (1.0 - slope / (2.0 * req.max_slope)).clamp(0.0, 1.0)
    } else if slope <= 0.0 {
        1.0
    } else {
        0.0
    };
    if slope > req.max_slope {
        issues.push(format!("slope {slope:.1} deg exceeds {:.1} deg", req.max_slope));
    }

    let road = session
        .surfaces()
        .nearest_road_within(p.x, p.y, req.max_road_distance);
    let road_access = match road {
        Some(hit) if req.max_road_distance > 0.0 => (1.0 - hit.distance / req.max_road_distance).clamp(0.0, 1.0),
        Some(_) => 1.0,
        None => 0.0,
    };
    if req.requires_road_access && road.is_none() {
        issues.push(format!("no road within {:.0} m", req.max_road_distance));
    }

    let exposure = threat_exposure(p, threats);
    if exposure > req.threat_tolerance {
        issues.push(format!(
            "threat exposure {exposure:.2} exceeds tolerance {:.2}",
            req.threat_tolerance
        ));
    }

    if req.min_obstacle_clearance > 0.0 {
        if let Some(d) = session
            .surfaces()
            .nearest_obstacle_distance(p.x, p.y, req.min_obstacle_clearance)
        {
            if d < req.min_obstacle_clearance {
                issues.push(format!(
                    "obstacle {d:.1} m away, need {:.1} m",
                    req.min_obstacle_clearance
                ));
            }
        }
    }

    let breakdown: BTreeMap<Criterion, f64> = [
        (Criterion::AltitudeFit, altitude_fit),
        (Criterion::SlopeFit, slope_fit),
        (Criterion::RoadAccess, road_access),
        (Criterion::ThreatExposure, 1.0 - exposure),
    ]
    .into_iter()
    .collect();

    let weights = scorer.weights();
    let total = breakdown.iter().map(|(c, v)| weights.get(*c) * v).sum::<f64>() / weights.sum();

    ScoreResult {
        total,
        breakdown,
        meets_requirements: issues.is_empty(),
        issues,
    }
}

/// Best-position search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPositionQuery {
    pub center: DVec2,
    pub radius: f64,
    pub requirements: PositionRequirements,
    pub count: usize,
    /// Minimum horizontal distance between accepted positions (meters).
    pub min_separation: f64,
    /// Number of candidates sampled.
    pub max_attempts: usize,
    pub seed: u64,
}

/// Sample `max_attempts` seeded candidates, keep those meeting the
/// requirements, and greedily accept the best ones at least
/// `min_separation` apart.
///
/// Returns fewer than `count` results when the area runs out.
pub fn find_best_positions(
    session: &TerrainSession,
    scorer: &Scorer,
    query: &BestPositionQuery,
    threats: &[Threat],
) -> Result<Vec<ScoredPosition>> {
    if !(query.min_separation.is_finite() && query.min_separation >= 0.0) {
        return Err(TerrainError::invalid(
            "min_separation",
            format!("must be >= 0, got {}", query.min_separation),
        ));
    }
    if query.count == 0 {
        return Ok(Vec::new());
    }
    let area = SearchArea::new(query.center, query.radius, query.max_attempts).jittered(query.seed);
    let field = session.field();
    let points: Vec<DVec2> = area
        .points()?
        .into_iter()
        .filter(|p| field.contains(p.x, p.y))
        .collect();

    let mut scored: Vec<ScoredPosition> = points
        .par_iter()
        .filter_map(|p| {
            let score = score_position(session, scorer, *p, &query.requirements, threats);
            score.meets_requirements.then(|| ScoredPosition {
                candidate: PositionCandidate::from_placement(session.resolve_placement(p.x, p.y, 0.0))
                    .with_metric(Metric::Score, score.total),
                score,
            })
        })
        .collect();
    scored.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));

    let mut accepted: Vec<ScoredPosition> = Vec::with_capacity(query.count);
    for s in scored {
        if accepted.len() == query.count {
            break;
        }
        let p = s.candidate.position.horizontal();
        if accepted
            .iter()
            .all(|a| a.candidate.position.horizontal().distance(p) >= query.min_separation)
        {
            accepted.push(s);
        }
    }
    debug!(
        profile = ?scorer.profile,
        sampled = points.len(),
        accepted = accepted.len(),
        "best position search"
    );
    Ok(accepted)
}
