use crate::config::{AppConfig, ChartConfig};
use crate::pipeline::{VisualMapping, FALLBACK_FILL};
use crate::projection::AlbersUsa;
use crate::scale::SqrtScale;
use crate::tooltip;
use crate::types::{BoundaryMap, PlacedPlant};
use anyhow::{Context, Result};
use geo::{MultiLineString, MultiPolygon};
use std::fmt::Write as _;
use std::fs;

const LAND_FILL: &str = "#ddd";
const MESH_STROKE: &str = "white";
const LEGEND_TEXT_FILL: &str = "#333";
const LEGEND_CIRCLE_STROKE: &str = "#999";
const COLOR_LEGEND_RADIUS: f64 = 10.0;
const SIZE_LEGEND_SPACING: f64 = 25.0;

/// Render the whole document and write it to the configured path.
pub fn render_to_file(
    config: &AppConfig,
    boundary: &BoundaryMap,
    placed: &[PlacedPlant],
    mapping: &VisualMapping,
) -> Result<()> {
    let document = render_document(&config.chart, boundary, placed, mapping);
    if let Some(parent) = config.output.svg_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(&config.output.svg_path, &document)
        .with_context(|| format!("Failed to write SVG: {:?}", config.output.svg_path))?;
    println!(
        "Wrote {:?} ({} circles)",
        config.output.svg_path,
        placed.len()
    );
    Ok(())
}

/// Assemble the SVG document. Element order is significant: later
/// layers occlude earlier ones, so the map and circles come after the
/// legends and the mesh sits between them.
pub fn render_document(
    chart: &ChartConfig,
    boundary: &BoundaryMap,
    placed: &[PlacedPlant],
    mapping: &VisualMapping,
) -> String {
    let mut out = String::with_capacity(1 << 20);

    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" class="{class}">"#,
        w = chart.width,
        h = chart.height,
        class = xml_escape(&chart.css_class),
    );

    write_size_legend(&mut out, chart, &mapping.radius);
    write_color_legend(&mut out, chart);
    write_legend_title(&mut out, chart);
    write_map_layer(&mut out, boundary, &mapping.projection);
    write_mesh_layer(&mut out, &boundary.mesh, &mapping.projection);
    write_circle_layer(&mut out, placed, mapping);

    let _ = writeln!(out, "</svg>");
    out
}

/// Outlined reference circles with their capacities; the largest value
/// carries the unit.
fn write_size_legend(out: &mut String, chart: &ChartConfig, radius: &SqrtScale) {
    let _ = writeln!(
        out,
        r#"  <g fill="{fill}" transform="translate({x}, {y})" text-anchor="middle">"#,
        fill = LEGEND_TEXT_FILL,
        x = 11.0 * chart.width / 16.0,
        y = chart.height / 32.0,
    );
    let baseline = chart.height / 16.0;
    for (i, &value) in chart.legend_values.iter().enumerate() {
        let r = radius.apply(value);
        let cx = (r + SIZE_LEGEND_SPACING) * i as f64;
        let _ = writeln!(
            out,
            r#"    <circle fill="none" stroke="{stroke}" stroke-width="1.5" cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}"/>"#,
            stroke = LEGEND_CIRCLE_STROKE,
            cy = r + baseline,
        );
        let label = if i == chart.legend_values.len() - 1 {
            format!("{}MW", value)
        } else {
            format!("{}", value)
        };
        let _ = writeln!(
            out,
            r#"    <text x="{cx:.2}" y="{y:.2}" dy="-0.5em" font-size="14">{label}</text>"#,
            y = baseline,
            label = xml_escape(&label),
        );
    }
    let _ = writeln!(out, "  </g>");
}

/// Category labels zipped with their colors, stacked at a fixed pitch.
fn write_color_legend(out: &mut String, chart: &ChartConfig) {
    let _ = writeln!(
        out,
        r#"  <g fill="{fill}" transform="translate({x}, {y})" text-anchor="middle">"#,
        fill = LEGEND_TEXT_FILL,
        x = 59.0 * chart.width / 64.0,
        y = chart.height / 2.0,
    );
    let pitch = COLOR_LEGEND_RADIUS * 3.0;
    for (i, category) in chart.categories.iter().enumerate() {
        let y = pitch * i as f64;
        let _ = writeln!(
            out,
            r#"    <text x="{x}" y="{y:.2}" text-anchor="start" dominant-baseline="central" font-size="13">{label}</text>"#,
            x = COLOR_LEGEND_RADIUS + 5.0,
            label = xml_escape(&category.label),
        );
        let _ = writeln!(
            out,
            r#"    <circle fill="{color}" cy="{y:.2}" r="{r}"/>"#,
            color = xml_escape(&category.color),
            r = COLOR_LEGEND_RADIUS,
        );
    }
    let _ = writeln!(out, "  </g>");
}

fn write_legend_title(out: &mut String, chart: &ChartConfig) {
    let _ = writeln!(
        out,
        r#"  <g fill="{fill}" transform="translate({x}, {y})" text-anchor="middle">"#,
        fill = LEGEND_TEXT_FILL,
        x = 24.0 * chart.width / 32.0,
        y = 2.0 * chart.height / 64.0,
    );
    let _ = writeln!(
        out,
        r#"    <text dominant-baseline="hanging" font-size="21" font-weight="900">{}</text>"#,
        xml_escape(&chart.title),
    );
    let _ = writeln!(out, "  </g>");
}

fn write_map_layer(out: &mut String, boundary: &BoundaryMap, projection: &AlbersUsa) {
    let _ = writeln!(out, r#"  <g fill="{}" id="map">"#, LAND_FILL);
    for feature in &boundary.features {
        if let Some(d) = multi_polygon_path(&feature.geometry, projection) {
            let _ = writeln!(out, r#"    <path d="{}"/>"#, d);
        }
    }
    let _ = writeln!(out, "  </g>");
}

fn write_mesh_layer(out: &mut String, mesh: &MultiLineString<f64>, projection: &AlbersUsa) {
    match multi_line_path(mesh, projection) {
        Some(d) => {
            let _ = writeln!(
                out,
                r#"  <path fill="none" stroke="{}" stroke-width="1.5" stroke-linejoin="round" d="{}"/>"#,
                MESH_STROKE, d,
            );
        }
        None => {
            let _ = writeln!(
                out,
                r#"  <path fill="none" stroke="{}" stroke-width="1.5" stroke-linejoin="round"/>"#,
                MESH_STROKE,
            );
        }
    }
}

/// The data layer: one circle per placed plant, already in draw order,
/// each carrying its tooltip as an SVG title.
fn write_circle_layer(out: &mut String, placed: &[PlacedPlant], mapping: &VisualMapping) {
    let _ = writeln!(
        out,
        r##"  <g id="circles" fill="{}" fill-opacity="0.55" stroke="#fff" stroke-width="0">"##,
        FALLBACK_FILL,
    );
    for plant in placed {
        let content = tooltip::on_enter(plant, &mapping.colors);
        let _ = writeln!(
            out,
            r#"    <circle r="{r}" fill="{fill}" transform="translate({x:.2},{y:.2})"><title>{tip}</title></circle>"#,
            r = mapping.radius.apply(plant.record.value),
            fill = xml_escape(mapping.colors.color_or_fallback(&plant.record.group)),
            x = plant.point.0,
            y = plant.point.1,
            tip = xml_escape(&content.to_text()),
        );
    }
    let _ = writeln!(out, "  </g>");
}

/// Path data for a polygon collection: every ring becomes a closed
/// M/L/Z subpath. Points that do not project are skipped; rings with
/// fewer than two projectable points are dropped.
fn multi_polygon_path(geometry: &MultiPolygon<f64>, projection: &AlbersUsa) -> Option<String> {
    let mut d = String::new();
    for polygon in &geometry.0 {
        append_ring(&mut d, polygon.exterior(), projection, true);
        for interior in polygon.interiors() {
            append_ring(&mut d, interior, projection, true);
        }
    }
    (!d.is_empty()).then_some(d)
}

fn multi_line_path(lines: &MultiLineString<f64>, projection: &AlbersUsa) -> Option<String> {
    let mut d = String::new();
    for line in &lines.0 {
        append_ring(&mut d, line, projection, false);
    }
    (!d.is_empty()).then_some(d)
}

fn append_ring(
    d: &mut String,
    line: &geo::LineString<f64>,
    projection: &AlbersUsa,
    close: bool,
) {
    let projected: Vec<(f64, f64)> = line
        .0
        .iter()
        .filter_map(|coord| projection.apply(coord.x, coord.y))
        .collect();
    if projected.len() < 2 {
        return;
    }
    for (i, (x, y)) in projected.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{command}{x:.2},{y:.2}");
    }
    if close {
        d.push('Z');
    }
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::pipeline::{build_mapping, place_records};
    use crate::types::{BoundaryFeature, PlantRecord};
    use geo::{LineString, Polygon};

    fn square(west: f64, east: f64) -> MultiPolygon<f64> {
        let ring: LineString<f64> = vec![
            (west, 35.0),
            (east, 35.0),
            (east, 45.0),
            (west, 45.0),
            (west, 35.0),
        ]
        .into();
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    fn boundary() -> BoundaryMap {
        // Two adjacent squares over the central US with one shared edge.
        let shared: LineString<f64> = vec![(-95.0, 35.0), (-95.0, 45.0)].into();
        BoundaryMap {
            features: vec![
                BoundaryFeature {
                    id: Some("W".to_string()),
                    geometry: square(-105.0, -95.0),
                },
                BoundaryFeature {
                    id: Some("E".to_string()),
                    geometry: square(-95.0, -85.0),
                },
            ],
            mesh: MultiLineString(vec![shared]),
        }
    }

    fn record(name: &str, group: &str, value: f64, lon: f64, lat: f64) -> PlantRecord {
        PlantRecord {
            name: name.to_string(),
            city: "Springfield".to_string(),
            group: group.to_string(),
            value,
            longitude: Some(lon),
            latitude: Some(lat),
        }
    }

    fn circles_section(document: &str) -> &str {
        let start = document.find(r#"<g id="circles""#).unwrap();
        let end = document[start..].find("</g>").unwrap();
        &document[start..start + end]
    }

    #[test]
    fn empty_record_set_still_draws_map_mesh_and_legends() {
        let chart = ChartConfig::default();
        let mapping = build_mapping(&chart, &[]);
        let document = render_document(&chart, &boundary(), &[], &mapping);

        assert!(document.contains(r##"<g fill="#ddd" id="map">"##));
        assert_eq!(document.matches("<path d=").count(), 2);
        assert!(document.contains(r#"stroke="white""#));
        assert!(document.contains("Plant capacity by power source"));
        assert!(document.contains("Hydroelectric"));
        assert!(document.contains("5000MW"));
        assert!(!circles_section(&document).contains("<circle"));
    }

    #[test]
    fn one_record_renders_one_circle_with_its_color_and_radius() {
        let chart = ChartConfig::default();
        let records = vec![record("Springfield Coal", "Coal", 500.0, -90.0, 40.0)];
        let mapping = build_mapping(&chart, &records);
        let placed = place_records(&records, &mapping.projection);
        let document = render_document(&chart, &boundary(), &placed, &mapping);

        let circles = circles_section(&document);
        assert_eq!(circles.matches("<circle").count(), 1);
        assert!(circles.contains(r##"fill="#99979a""##));
        // Sole record: the quantile equals its own value, radius maxes out.
        assert!(circles.contains(r#"r="10""#));
        assert!(circles.contains("<title>Springfield Coal 500 MW Springfield</title>"));
    }

    #[test]
    fn circle_count_matches_placed_records() {
        let chart = ChartConfig::default();
        let records = vec![
            record("a", "Coal", 100.0, -90.0, 40.0),
            record("b", "Wind", 200.0, -100.0, 40.0),
            record("c", "Solar", 300.0, -110.0, 40.0),
        ];
        let mapping = build_mapping(&chart, &records);
        let placed = place_records(&records, &mapping.projection);
        let document = render_document(&chart, &boundary(), &placed, &mapping);
        assert_eq!(circles_section(&document).matches("<circle").count(), 3);
    }

    #[test]
    fn larger_values_are_drawn_first() {
        let chart = ChartConfig::default();
        let records = vec![
            record("small", "Coal", 100.0, -90.0, 40.0),
            record("big", "Hydro", 5000.0, -100.0, 40.0),
        ];
        let mapping = build_mapping(&chart, &records);
        let placed = place_records(&records, &mapping.projection);
        let document = render_document(&chart, &boundary(), &placed, &mapping);

        let circles = circles_section(&document);
        let big = circles.find("big 5000 MW").unwrap();
        let small = circles.find("small 100 MW").unwrap();
        assert!(big < small, "larger circle must be drawn before smaller");
    }

    #[test]
    fn legend_layout_uses_the_configured_frame() {
        let chart = ChartConfig::default();
        let mapping = build_mapping(&chart, &[]);
        let document = render_document(&chart, &boundary(), &[], &mapping);
        // 11w/16, h/32 for the size legend; 59w/64, h/2 for the colors;
        // 24w/32, 2h/64 for the title.
        assert!(document.contains(r#"translate(893.75, 25)"#));
        assert!(document.contains(r#"translate(1198.4375, 400)"#));
        assert!(document.contains(r#"translate(975, 25)"#));
    }

    #[test]
    fn unknown_group_renders_with_fallback_fill() {
        let chart = ChartConfig::default();
        let records = vec![record("mystery", "Geothermal", 50.0, -90.0, 40.0)];
        let mapping = build_mapping(&chart, &records);
        let placed = place_records(&records, &mapping.projection);
        let document = render_document(&chart, &boundary(), &placed, &mapping);
        let circles = circles_section(&document);
        // Group default and explicit fallback are the same color; the
        // circle itself must carry it.
        assert!(circles.contains(r##"<circle r="10" fill="#aaa""##));
    }

    #[test]
    fn labels_are_xml_escaped() {
        let mut chart = ChartConfig::default();
        chart.title = "Capacity <MW> & sources".to_string();
        let mapping = build_mapping(&chart, &[]);
        let document = render_document(&chart, &boundary(), &[], &mapping);
        assert!(document.contains("Capacity &lt;MW&gt; &amp; sources"));
    }

    #[test]
    fn map_paths_are_closed_and_projected() {
        let chart = ChartConfig::default();
        let mapping = build_mapping(&chart, &[]);
        let d = multi_polygon_path(&square(-105.0, -95.0), &mapping.projection).unwrap();
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert_eq!(d.matches('M').count(), 1);
    }

    #[test]
    fn unprojectable_rings_are_dropped() {
        let chart = ChartConfig::default();
        let mapping = build_mapping(&chart, &[]);
        // A square in the mid-Atlantic never projects.
        let ring: LineString<f64> =
            vec![(-40.0, 30.0), (-39.0, 30.0), (-39.0, 31.0), (-40.0, 31.0), (-40.0, 30.0)].into();
        let mp = MultiPolygon(vec![Polygon::new(ring, vec![])]);
        assert!(multi_polygon_path(&mp, &mapping.projection).is_none());
    }
}
