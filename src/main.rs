pub mod config;
pub mod data;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod scale;
pub mod tooltip;
pub mod topology;
pub mod types;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the bubble map to an SVG file
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "chart.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Render { config } => run_render(config).await,
    };

    // One failure sink for the whole pipeline: either fetch failing, a
    // malformed input, or an unwritable output ends up here, once.
    if let Err(err) = result {
        tracing::error!("[data] {err:#}");
        std::process::exit(1);
    }
}

async fn run_render(config_path: &Path) -> anyhow::Result<()> {
    let app_config = config::AppConfig::load_or_default(config_path)?;
    println!("Rendering map with config: {:?}", config_path);

    // 1. Load both inputs in parallel, all-or-nothing
    let loaded = data::load_all(&app_config).await?;

    // 2. Transform (placeholder pass-through)
    let (records, topology) = data::transform(loaded);

    // 3. Decode boundary polygons and the shared-border mesh
    let boundary = topology::decode_boundaries(&topology, &app_config.input.boundary_object)?;
    println!("Decoded {} boundary features", boundary.features.len());

    // 4. Build the visual mapping and place the records
    let mapping = pipeline::build_mapping(&app_config.chart, &records);
    pipeline::warn_unknown_groups(&records, &mapping.colors);
    let placed = pipeline::place_records(&records, &mapping.projection);

    // 5. Render
    render::render_to_file(&app_config, &boundary, &placed, &mapping)?;

    println!("Render complete!");
    Ok(())
}
