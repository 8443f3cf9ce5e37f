//! Entry point for the event display.

use anyhow::Result;
use clap::Parser;
use event_display::{
    config::{Args, OutputMode},
    plot, viewer,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match &args.scene {
        Some(path) => log::info!("Scene file {}", path.display()),
        None => log::info!("Preset {}", args.preset),
    }

    let settings = args.resolve()?;
    let scene = settings.build_scene()?;

    match settings.output {
        OutputMode::Save(path) => {
            plot::render_to_file(&scene, &settings.camera, settings.figure, &path)?;
            log::info!(
                "Wrote {} ({}x{})",
                path.display(),
                settings.figure.width,
                settings.figure.height
            );
        }
        OutputMode::Display => {
            viewer::run(scene, settings.camera, settings.figure, settings.save_path)?;
        }
    }

    Ok(())
}
