use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub chart: ChartConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub plants_csv: PathBuf,
    pub boundaries_json: PathBuf,
    /// Name of the polygon collection inside the topology document.
    pub boundary_object: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub margin: MarginConfig,
    /// Class attribute on the SVG root, matching the host page hook.
    pub css_class: String,
    pub title: String,
    /// Reference capacities (MW) shown in the size legend.
    pub legend_values: Vec<f64>,
    pub projection_scale: f64,
    /// Output radius range in screen units, min to max.
    pub radius_range: [f64; 2],
    /// Quantile of the value column that maps to the maximum radius.
    pub radius_quantile: f64,
    /// Ordered category table; position i of the keys maps to position i
    /// of the colors.
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MarginConfig {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub key: String,
    pub label: String,
    pub color: String, // Hex code
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub svg_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            input: InputConfig::default(),
            chart: ChartConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            plants_csv: PathBuf::from("data/energy.csv"),
            boundaries_json: PathBuf::from("data/us.json"),
            boundary_object: "states".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let categories = [
            ("Natural_gas", "Natural Gas", "#f78b29"),
            ("Coal", "Coal", "#99979a"),
            ("Nuclear", "Nuclear", "#cf4a9b"),
            ("Hydro", "Hydroelectric", "#0081c5"),
            ("Oil", "Oil", "#ee1c25"),
            ("Wind", "Wind", "#0fb14c"),
            ("Solar", "Solar", "#d7c944"),
            ("Other", "Other", "#ffefd6"),
        ]
        .iter()
        .map(|(key, label, color)| CategoryConfig {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        })
        .collect();

        ChartConfig {
            width: 1300.0,
            height: 800.0,
            margin: MarginConfig::default(),
            css_class: "energy-map".to_string(),
            title: "Plant capacity by power source".to_string(),
            legend_values: vec![50.0, 500.0, 2000.0, 5000.0],
            projection_scale: 1600.0,
            radius_range: [1.5, 10.0],
            radius_quantile: 0.985,
            categories,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            svg_path: PathBuf::from("out/energy-map.svg"),
        }
    }
}

impl ChartConfig {
    /// Projection translation: the canvas center offset by the margin.
    pub fn translate(&self) -> (f64, f64) {
        (
            self.margin.left + self.width / 2.0,
            self.margin.top + self.height / 2.0,
        )
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to the
    /// built-in chart constants.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(AppConfig::default())
        }
    }
}
