//! Junction analysis results and their GeoJSON document shape.

use std::collections::BTreeMap;

use corridor_common::{Error, Result};
use corridor_graph::NodeId;
use corridor_store::NodeFeature;
use geo_types::MultiPolygon;
use geojson::{Feature, Geometry};
use serde_json::{Map, Value};

use crate::conflict::ConflictType;
use crate::junction_type::JunctionType;

pub const JUNCTION_FEATURE_TYPE: &str = "junction";

/// One analyzed junction: classification, conflict tallies and footprint.
#[derive(Debug, Clone)]
pub struct JunctionRecord {
    pub node_id: NodeId,
    pub coordinates: (f64, f64),
    pub junction_type: JunctionType,
    pub conflict_counts: BTreeMap<ConflictType, u64>,
    pub footprint: Option<MultiPolygon<f64>>,
}

impl JunctionRecord {
    /// The stored document shape: a GeoJSON feature with flat properties.
    /// A single-part footprint is written as a plain polygon.
    pub fn to_feature(&self) -> Result<Feature> {
        let geometry = match &self.footprint {
            Some(mp) if mp.0.len() == 1 => Some(Geometry::new(geojson::Value::from(&mp.0[0]))),
            Some(mp) => Some(Geometry::new(geojson::Value::from(mp))),
            None => None,
        };

        let mut properties = Map::new();
        properties.insert(
            "feature_type".to_string(),
            Value::String(JUNCTION_FEATURE_TYPE.to_string()),
        );
        properties.insert(
            "node_coords".to_string(),
            serde_json::to_value([self.coordinates.0, self.coordinates.1])?,
        );
        properties.insert(
            "junc_type".to_string(),
            Value::String(self.junction_type.name().to_string()),
        );
        properties.insert(
            "conflict_counter".to_string(),
            serde_json::to_value(&self.conflict_counts)?,
        );

        Ok(Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }

    /// Rehydrate a record from its stored document.
    pub fn from_feature(node_id: NodeId, feature: &Feature) -> Result<Self> {
        let properties = feature
            .properties
            .as_ref()
            .ok_or_else(|| Error::MalformedDocument("junction without properties".to_string()))?;

        let coords: [f64; 2] = properties
            .get("node_coords")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| Error::MalformedDocument("junction without node_coords".to_string()))?;

        let junc_type = properties
            .get("junc_type")
            .and_then(Value::as_str)
            .and_then(JunctionType::from_tag)
            .ok_or_else(|| Error::MalformedDocument("junction without junc_type".to_string()))?;

        let conflict_counts: BTreeMap<ConflictType, u64> = properties
            .get("conflict_counter")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let footprint = match &feature.geometry {
            None => None,
            Some(g) => Some(multi_polygon_from(g)?),
        };

        Ok(Self {
            node_id,
            coordinates: (coords[0], coords[1]),
            junction_type: junc_type,
            conflict_counts,
            footprint,
        })
    }

    /// The entry appended to this node's feature-tag document.
    pub fn node_feature(&self) -> Result<NodeFeature> {
        let feature = self.to_feature()?;
        Ok(node_feature_from_properties(
            feature.properties.unwrap_or_default(),
        ))
    }
}

/// Split a flat junction property map into a node-feature entry.
pub fn node_feature_from_properties(mut properties: Map<String, Value>) -> NodeFeature {
    let feature_type = match properties.remove("feature_type") {
        Some(Value::String(s)) => s,
        _ => JUNCTION_FEATURE_TYPE.to_string(),
    };
    NodeFeature::new(&feature_type, properties)
}

fn multi_polygon_from(geometry: &Geometry) -> Result<MultiPolygon<f64>> {
    match &geometry.value {
        geojson::Value::Polygon(_) => {
            let poly = geo_types::Polygon::try_from(geometry.value.clone())
                .map_err(|e| Error::MalformedDocument(format!("junction geometry: {e}")))?;
            Ok(MultiPolygon::new(vec![poly]))
        }
        geojson::Value::MultiPolygon(_) => MultiPolygon::try_from(geometry.value.clone())
            .map_err(|e| Error::MalformedDocument(format!("junction geometry: {e}"))),
        other => Err(Error::MalformedDocument(format!(
            "junction geometry is {}, expected polygonal",
            other.type_name()
        ))),
    }
}
