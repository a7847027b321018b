use geo::{MultiLineString, MultiPolygon};
use serde::{Deserialize, Deserializer};

/// One power plant row from the input CSV.
///
/// Coordinate columns may be empty or unparseable for some rows; those
/// deserialize to `None` and the record is kept (it still contributes to
/// the radius scale) but never drawn.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Longitude", default, deserialize_with = "lenient_coord")]
    pub longitude: Option<f64>,
    #[serde(rename = "Latitude", default, deserialize_with = "lenient_coord")]
    pub latitude: Option<f64>,
}

/// A plant record together with its projected screen position.
///
/// Built as a new value rather than mutating the input record; records
/// whose coordinates do not project are never placed.
#[derive(Debug, Clone)]
pub struct PlacedPlant {
    pub record: PlantRecord,
    pub point: (f64, f64),
}

/// One decoded state polygon from the boundary topology.
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Decoded views of the boundary topology: filled polygons plus the
/// interior shared-border mesh used for stroking.
#[derive(Debug, Clone)]
pub struct BoundaryMap {
    pub features: Vec<BoundaryFeature>,
    pub mesh: MultiLineString<f64>,
}

// Coordinates arrive as free text; anything that does not parse as a
// number is treated as absent.
fn lenient_coord<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<f64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_csv(input: &str) -> Vec<PlantRecord> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(input.as_bytes());
        rdr.deserialize()
            .collect::<Result<Vec<PlantRecord>, _>>()
            .unwrap()
    }

    #[test]
    fn typed_row_parses() {
        let rows = parse_csv(
            "Name,City,Group,Value,Longitude,Latitude\n\
             Big River,Sacketts Harbor,Hydro,512.5,-76.06,43.95\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Big River");
        assert_eq!(rows[0].group, "Hydro");
        assert_eq!(rows[0].value, 512.5);
        assert_eq!(rows[0].longitude, Some(-76.06));
        assert_eq!(rows[0].latitude, Some(43.95));
    }

    #[test]
    fn missing_coordinates_become_none() {
        let rows = parse_csv(
            "Name,City,Group,Value,Longitude,Latitude\n\
             Ghost Plant,Nowhere,Coal,100,,\n",
        );
        assert_eq!(rows[0].longitude, None);
        assert_eq!(rows[0].latitude, None);
    }

    #[test]
    fn unparseable_coordinates_become_none() {
        let rows = parse_csv(
            "Name,City,Group,Value,Longitude,Latitude\n\
             Odd Plant,Somewhere,Wind,42,n/a,43.95\n",
        );
        assert_eq!(rows[0].longitude, None);
        assert_eq!(rows[0].latitude, Some(43.95));
    }
}
