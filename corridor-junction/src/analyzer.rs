//! The per-node analysis driver.

use corridor_common::Result;
use corridor_graph::{NodeId, RoadGraph};
use corridor_store::MemoryStore;
use tracing::{debug, info, warn};

use crate::conflict::{self, RuleTable};
use crate::corridor;
use crate::junction_type;
use crate::legs;
use crate::params::AnalysisParams;
use crate::record::{self, JunctionRecord};

/// Tally of a store-backed analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub analyzed: u64,
    pub reused: u64,
    pub skipped_not_junction: u64,
    pub skipped_invalid_geometry: u64,
}

pub struct JunctionAnalyzer<'g> {
    graph: &'g RoadGraph,
    params: AnalysisParams,
    rules: RuleTable,
}

impl<'g> JunctionAnalyzer<'g> {
    pub fn new(graph: &'g RoadGraph, params: AnalysisParams, rules: RuleTable) -> Self {
        Self {
            graph,
            params,
            rules,
        }
    }

    /// Analyze one node. `Ok(None)` when the node is not a junction.
    pub fn analyze_node(&self, node_id: NodeId) -> Result<Option<JunctionRecord>> {
        let node = self.graph.require_node(node_id)?;
        let Some(junction_type) =
            junction_type::classify(self.graph, node_id, self.params.junction_angle_threshold)
        else {
            return Ok(None);
        };

        let corridor = corridor::build_corridor(self.graph, node_id, &self.params)?;
        let legs = legs::legs(self.graph, node_id);
        let conflict_counts = conflict::count_conflicts(
            node.point(),
            &legs,
            &self.rules,
            self.params.neighbor_angle_threshold,
            self.params.right_hand_traffic,
        );
        debug!(node = node_id, junction_type = %junction_type, legs = legs.len(), "analyzed junction");

        Ok(Some(JunctionRecord {
            node_id,
            coordinates: (node.x, node.y),
            junction_type,
            conflict_counts,
            footprint: corridor.footprint,
        }))
    }

    /// Analyze a set of nodes into the store. Junctions already stored at a
    /// node's coordinates are reused unless `overwrite` is set; reused or
    /// not, the node's feature-tag document is kept up to date.
    pub fn run(&self, node_ids: &[NodeId], store: &mut MemoryStore) -> Result<RunReport> {
        let mut report = RunReport::default();

        for &node_id in node_ids {
            let node = self.graph.require_node(node_id)?;

            if !self.params.overwrite {
                if let Some(existing) = store.junction(node.x, node.y) {
                    let properties = existing.properties.clone().unwrap_or_default();
                    store.append_node_feature(
                        node_id,
                        record::node_feature_from_properties(properties),
                    );
                    report.reused += 1;
                    continue;
                }
            }

            let Some(junction) = self.analyze_node(node_id)? else {
                report.skipped_not_junction += 1;
                continue;
            };
            if junction.footprint.is_none() {
                warn!(node = node_id, "no corridor footprint, junction skipped");
                report.skipped_invalid_geometry += 1;
                continue;
            }

            store.upsert_junction(node.x, node.y, junction.to_feature()?);
            store.append_node_feature(node_id, junction.node_feature()?);
            report.analyzed += 1;
        }

        info!(
            analyzed = report.analyzed,
            reused = report.reused,
            skipped_not_junction = report.skipped_not_junction,
            skipped_invalid_geometry = report.skipped_invalid_geometry,
            "junction analysis finished"
        );
        Ok(report)
    }
}
