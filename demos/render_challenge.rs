//! Challenge Renderer
//!
//! Draws random locations of one country from a location data set, fetches their
//! panoramas and saves the composed challenge image along with the answer links.
//! With `--impostor` one of the four views comes from another country.
//!
//! Usage:
//! ```bash
//! cargo run --release --example render_challenge -- \
//!   --catalog data/sorted.json \
//!   --impostor \
//!   --output output/challenge.png
//! ```

use clap::Parser;
use log::info;
use panoview::util::save_image;
use panoview::{ChallengeCompositor, LocationCatalog, PanoramaPipeline, PipelineConfig};
use std::path::PathBuf;
use std::time::Instant;

/// Render a four-view challenge image from random panoramas
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the location data set (JSON, country code -> locations)
    #[arg(short = 'c', long)]
    catalog: PathBuf,

    /// Country code to draw from; a random country when omitted
    #[arg(short = 'k', long)]
    country: Option<String>,

    /// Number of locations in the challenge
    #[arg(short = 'n', long, default_value = "4")]
    count: usize,

    /// Hide one location from another country among the others
    #[arg(short = 'i', long, conflicts_with_all = ["country", "count"])]
    impostor: bool,

    /// Optional YAML file overriding acquisition and fetch settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the composed image
    #[arg(short = 'o', long, default_value = "output/challenge.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from_yaml(&path.to_string_lossy())?,
        None => PipelineConfig::default(),
    };

    let catalog =
        LocationCatalog::load(&cli.catalog.to_string_lossy())?.with_params(config.acquisition.clone());
    let mut rng = rand::rng();
    let (locations, impostor) = if cli.impostor {
        let challenge = catalog.impostor_challenge(&mut rng)?;
        println!("🎯 Impostor challenge");
        (challenge.locations.clone(), Some(challenge))
    } else {
        let locations = match &cli.country {
            Some(code) => catalog.locations_in(code, &mut rng, cli.count)?,
            None => catalog.random_locations(&mut rng, cli.count)?,
        };
        if let Some(first) = locations.first() {
            println!("🎯 Challenge from {}", first.country_name);
        }
        (locations, None)
    };
    let compositor = ChallengeCompositor::new(PanoramaPipeline::http(config.fetch)?);

    let start = Instant::now();
    let challenge = compositor.compose(&locations).await;
    info!("Challenge rendered in {:.2?}", start.elapsed());

    save_image(&challenge.image, &cli.output.to_string_lossy())?;
    println!("✓ Saved: {}", cli.output.display());

    for (index, (location, outcome)) in locations.iter().zip(&challenge.outcomes).enumerate() {
        match outcome {
            Ok(acquisition) if acquisition.is_degraded() => {
                println!("  {}. {} (no imagery)", index + 1, location.maps_link())
            }
            Ok(_) => println!("  {}. {}", index + 1, location.maps_link()),
            Err(e) => println!("  {}. failed: {}", index + 1, e),
        }
    }

    if let Some(challenge) = impostor {
        println!(
            "🔎 Answer: main country {}, impostor {} at position {}",
            challenge.main_country,
            challenge.impostor_country,
            challenge.impostor_index + 1
        );
    }

    Ok(())
}
