//! TerrainSession: the caller-owned bundle of one loaded map.
//!
//! Holds the height field, surface resolver, road graph, and config. Every
//! derived index is built here, so the session is immutable and `Sync` once
//! constructed and can be shared across worker threads by reference.

use glam::DVec2;
use tracing::info;

use overwatch_core::components::{RoadSegment, Structure};
use overwatch_core::config::AnalysisConfig;
use overwatch_core::error::Result;
use overwatch_core::state::Placement;

use crate::grid::HeightField;
use crate::los::VisibilityEngine;
use crate::roads::RoadGraph;
use crate::surface::SurfaceResolver;

#[derive(Debug, Clone)]
pub struct TerrainSession {
    field: HeightField,
    surfaces: SurfaceResolver,
    road_graph: RoadGraph,
    config: AnalysisConfig,
}

impl TerrainSession {
    pub fn new(
        field: HeightField,
        roads: Vec<RoadSegment>,
        structures: Vec<Structure>,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        let road_graph = RoadGraph::build(&roads);
        let surfaces = SurfaceResolver::new(
            roads,
            structures,
            config.road_snap_distance,
            config.normal_delta,
            config.spatial_cell_size,
        );

        info!(
            width = field.header.width,
            height = field.header.height,
            extent_x = field.extent().x,
            extent_z = field.extent().y,
            orientation = field.header.orientation.index(),
            bases = field.footprints().len(),
            roads = surfaces.roads().len(),
            road_nodes = road_graph.node_count(),
            structures = surfaces.structures().len(),
            "terrain session loaded"
        );

        Ok(Self {
            field,
            surfaces,
            road_graph,
            config,
        })
    }

    /// Session over bare terrain with default configuration.
    pub fn terrain_only(field: HeightField) -> Result<Self> {
        Self::new(field, Vec::new(), Vec::new(), AnalysisConfig::default())
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn surfaces(&self) -> &SurfaceResolver {
        &self.surfaces
    }

    pub fn road_graph(&self) -> &RoadGraph {
        &self.road_graph
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn visibility(&self) -> VisibilityEngine<'_> {
        VisibilityEngine::from_config(&self.field, &self.config)
    }

    /// Terrain height at (x, z), or `default` off the map.
    pub fn sample_height(&self, x: f64, z: f64, default: f64) -> f64 {
        self.field.sample_height(x, z, default)
    }

    /// Ground height with the raster minimum as the off-map fallback.
    pub fn ground(&self, p: DVec2) -> f64 {
        self.field.sample_height(p.x, p.y, self.field.min_height())
    }

    pub fn resolve_placement(&self, x: f64, z: f64, yaw: f64) -> Placement {
        self.surfaces.resolve_placement(&self.field, x, z, yaw)
    }

    /// Slope in degrees at (x, z) using the configured normal step.
    pub fn slope_at(&self, x: f64, z: f64) -> f64 {
        self.field.slope_deg_at(x, z, self.config.normal_delta)
    }
}
