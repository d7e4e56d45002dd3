//! Writes the SQL script that creates and fills the lat/lon grid table.
//!
//! Usage: `seed_grid [OUTPUT]`. Without an output path the script goes to stdout.
use std::fs::File;
use std::io::{self, BufWriter, Write};

use fire_markers::config::GridSettings;
use fire_markers::error::AppError;
use fire_markers::grid::GridSeeder;
use tracing::Level;

fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .init();

    let settings = GridSettings::load()?;
    let seeder = GridSeeder::new(settings.table.clone())
        .with_axis_order(settings.axis_order)
        .with_batch_size(settings.batch_size);

    tracing::info!(
        "Seeding {} points ({:?} order) into {}",
        settings.spec.len(),
        settings.axis_order,
        settings.table
    );

    let count = match std::env::args().nth(1) {
        Some(path) => {
            let mut out = BufWriter::new(File::create(&path)?);
            let count = seeder.write_script(&settings.spec, &mut out)?;
            out.flush()?;
            count
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let count = seeder.write_script(&settings.spec, &mut out)?;
            out.flush()?;
            count
        }
    };

    tracing::info!("Done, {} grid points written", count);
    Ok(())
}
