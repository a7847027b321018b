use crate::types::{BoundaryFeature, BoundaryMap};
use anyhow::{anyhow, Result};
use geo::MultiLineString;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::convert::TryInto;

/// Serde model of a topology document: delta-encoded arcs shared between
/// adjacent polygons, plus named object collections referencing them.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

/// Quantization transform: decoded coordinates are
/// `translate + scale * running_sum(deltas)`.
#[derive(Debug, Clone, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<serde_json::Value>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<serde_json::Value>,
    },
    LineString {
        arcs: Vec<i64>,
    },
    MultiLineString {
        arcs: Vec<Vec<i64>>,
    },
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
}

/// Decode the named object collection into both views the renderer
/// needs: filled polygon features and the interior shared-border mesh.
pub fn decode_boundaries(topology: &Topology, object_name: &str) -> Result<BoundaryMap> {
    let features = topology.object_features(object_name)?;
    let mesh = topology.mesh(object_name)?;
    Ok(BoundaryMap { features, mesh })
}

impl Topology {
    fn object(&self, name: &str) -> Result<&TopoGeometry> {
        self.objects
            .get(name)
            .ok_or_else(|| anyhow!("Topology object '{}' not found", name))
    }

    /// Decode one arc into absolute (longitude, latitude) positions.
    fn decoded_arc(&self, index: usize) -> Result<Vec<Vec<f64>>> {
        let arc = self
            .arcs
            .get(index)
            .ok_or_else(|| anyhow!("Arc index {} out of bounds", index))?;
        let mut out = Vec::with_capacity(arc.len());
        match &self.transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                for point in arc {
                    if point.len() < 2 {
                        return Err(anyhow!("Malformed point in arc {}", index));
                    }
                    x += point[0];
                    y += point[1];
                    out.push(vec![
                        t.translate[0] + t.scale[0] * x,
                        t.translate[1] + t.scale[1] * y,
                    ]);
                }
            }
            None => {
                for point in arc {
                    if point.len() < 2 {
                        return Err(anyhow!("Malformed point in arc {}", index));
                    }
                    out.push(vec![point[0], point[1]]);
                }
            }
        }
        Ok(out)
    }

    /// Stitch a list of (possibly reversed) arc references into one ring
    /// or line, dropping the duplicated junction point between
    /// consecutive arcs.
    fn stitched(&self, arcs: &[i64]) -> Result<Vec<Vec<f64>>> {
        let mut line: Vec<Vec<f64>> = Vec::new();
        for &reference in arcs {
            let mut points = self.decoded_arc(arc_index(reference))?;
            if reference < 0 {
                points.reverse();
            }
            if line.is_empty() {
                line = points;
            } else {
                line.extend(points.into_iter().skip(1));
            }
        }
        Ok(line)
    }

    /// Decode every polygon in the named object collection, in document
    /// order, converting through GeoJSON geometry into `geo` types.
    pub fn object_features(&self, name: &str) -> Result<Vec<BoundaryFeature>> {
        let mut features = Vec::new();
        self.collect_features(self.object(name)?, &mut features)?;
        Ok(features)
    }

    fn collect_features(
        &self,
        geometry: &TopoGeometry,
        out: &mut Vec<BoundaryFeature>,
    ) -> Result<()> {
        match geometry {
            TopoGeometry::GeometryCollection { geometries } => {
                for member in geometries {
                    self.collect_features(member, out)?;
                }
            }
            TopoGeometry::Polygon { arcs, id } => {
                out.push(self.polygon_feature(std::slice::from_ref(arcs), id)?);
            }
            TopoGeometry::MultiPolygon { arcs, id } => {
                out.push(self.polygon_feature(arcs, id)?);
            }
            // Point and line geometries have no fillable area.
            _ => {}
        }
        Ok(())
    }

    fn polygon_feature(
        &self,
        polygons: &[Vec<Vec<i64>>],
        id: &Option<serde_json::Value>,
    ) -> Result<BoundaryFeature> {
        let mut decoded = Vec::with_capacity(polygons.len());
        for rings in polygons {
            let mut polygon = Vec::with_capacity(rings.len());
            for ring in rings {
                polygon.push(self.stitched(ring)?);
            }
            decoded.push(polygon);
        }
        let geometry: geo::Geometry<f64> = geojson::Value::MultiPolygon(decoded)
            .try_into()
            .map_err(|e| anyhow!("Failed to convert polygon geometry: {:?}", e))?;
        let geometry = match geometry {
            geo::Geometry::MultiPolygon(mp) => mp,
            _ => return Err(anyhow!("Decoded geometry is not a polygon")),
        };
        Ok(BoundaryFeature {
            id: id.as_ref().map(id_string),
            geometry,
        })
    }

    /// The shared-border mesh of the named object collection: every arc
    /// used by two distinct features. Arcs on the outer boundary belong
    /// to a single feature and are excluded, so only interior borders
    /// are stroked.
    pub fn mesh(&self, name: &str) -> Result<MultiLineString<f64>> {
        let mut users: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        let mut feature_counter = 0usize;
        collect_arc_users(self.object(name)?, &mut feature_counter, &mut users);

        let mut lines = Vec::new();
        for (index, features) in &users {
            if features.len() >= 2 {
                lines.push(self.decoded_arc(*index)?);
            }
        }
        let geometry: geo::Geometry<f64> = geojson::Value::MultiLineString(lines)
            .try_into()
            .map_err(|e| anyhow!("Failed to convert mesh geometry: {:?}", e))?;
        match geometry {
            geo::Geometry::MultiLineString(mls) => Ok(mls),
            _ => Err(anyhow!("Decoded mesh is not a line collection")),
        }
    }
}

fn arc_index(reference: i64) -> usize {
    if reference < 0 {
        !reference as usize
    } else {
        reference as usize
    }
}

fn id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Each direct member of the collection counts as one feature; an arc
// referenced from two different members is a shared border.
fn collect_arc_users(
    geometry: &TopoGeometry,
    feature_counter: &mut usize,
    users: &mut BTreeMap<usize, BTreeSet<usize>>,
) {
    match geometry {
        TopoGeometry::GeometryCollection { geometries } => {
            for member in geometries {
                collect_arc_users(member, feature_counter, users);
            }
        }
        TopoGeometry::Polygon { arcs, .. } => {
            record_ring_arcs(arcs, *feature_counter, users);
            *feature_counter += 1;
        }
        TopoGeometry::MultiPolygon { arcs, .. } => {
            for rings in arcs {
                record_ring_arcs(rings, *feature_counter, users);
            }
            *feature_counter += 1;
        }
        TopoGeometry::LineString { arcs } => {
            record_arcs(arcs, *feature_counter, users);
            *feature_counter += 1;
        }
        TopoGeometry::MultiLineString { arcs } => {
            for line in arcs {
                record_arcs(line, *feature_counter, users);
            }
            *feature_counter += 1;
        }
        _ => {}
    }
}

fn record_ring_arcs(
    rings: &[Vec<i64>],
    feature: usize,
    users: &mut BTreeMap<usize, BTreeSet<usize>>,
) {
    for ring in rings {
        record_arcs(ring, feature, users);
    }
}

fn record_arcs(arcs: &[i64], feature: usize, users: &mut BTreeMap<usize, BTreeSet<usize>>) {
    for &reference in arcs {
        users.entry(arc_index(reference)).or_default().insert(feature);
    }
}
