use crate::config::ChartConfig;
use crate::projection::AlbersUsa;
use crate::scale::{quantile, sorted_values, OrdinalScale, SqrtScale};
use crate::types::{PlacedPlant, PlantRecord};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::warn;

/// Fill used for circles whose category is not in the configured set,
/// and as the group-level default fill of the circle layer.
pub const FALLBACK_FILL: &str = "#aaa";

/// The derived visual parameters of one render: color scale, radius
/// scale and map projection. Recomputed fresh for every render.
#[derive(Debug, Clone)]
pub struct VisualMapping {
    pub colors: OrdinalScale,
    pub radius: SqrtScale,
    pub projection: AlbersUsa,
}

/// Build the scales and projection from the chart configuration and the
/// full record set.
///
/// The radius domain ends at a high quantile of the value column rather
/// than its maximum so a few outlier plants do not flatten the rest of
/// the size encoding. Every record participates, including those that
/// will later be dropped for missing coordinates.
pub fn build_mapping(chart: &ChartConfig, records: &[PlantRecord]) -> VisualMapping {
    let colors = OrdinalScale::new(&chart.categories, FALLBACK_FILL);

    let values = sorted_values(records.iter().map(|r| r.value));
    let domain_max = quantile(&values, chart.radius_quantile).unwrap_or(0.0);
    let radius = SqrtScale::new(
        (0.0, domain_max),
        (chart.radius_range[0], chart.radius_range[1]),
    );

    let projection = AlbersUsa::new(chart.projection_scale, chart.translate());

    VisualMapping {
        colors,
        radius,
        projection,
    }
}

/// Project every record, dropping those without a screen position, and
/// order the rest by value descending so larger circles are drawn first
/// and smaller circles stay on top.
pub fn place_records(records: &[PlantRecord], projection: &AlbersUsa) -> Vec<PlacedPlant> {
    let mut placed: Vec<PlacedPlant> = records
        .par_iter()
        .filter_map(|record| {
            let longitude = record.longitude?;
            let latitude = record.latitude?;
            let point = projection.apply(longitude, latitude)?;
            Some(PlacedPlant {
                record: record.clone(),
                point,
            })
        })
        .collect();
    placed.sort_by(|a, b| {
        b.record
            .value
            .partial_cmp(&a.record.value)
            .unwrap_or(Ordering::Equal)
    });
    placed
}

/// Warn once per distinct category key that is absent from the color
/// scale; such records render with the fallback fill.
pub fn warn_unknown_groups(records: &[PlantRecord], colors: &OrdinalScale) {
    let unknown: BTreeSet<&str> = records
        .iter()
        .map(|r| r.group.as_str())
        .filter(|group| colors.apply(group).is_none())
        .collect();
    for group in unknown {
        warn!("Unknown energy source '{}', using fallback color", group);
    }
}
