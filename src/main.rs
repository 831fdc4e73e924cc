mod app;
mod input;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Particle emblems in the terminal")]
pub(crate) struct Args {
    /// frame cap (overrides the settings file)
    #[arg(long)]
    fps: Option<u32>,

    /// seed for reproducible particle layouts
    #[arg(long)]
    seed: Option<u64>,

    /// monochrome output
    #[arg(long)]
    no_color: bool,

    /// settings file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// write the effective settings to the settings file and exit
    #[arg(long)]
    write_config: bool,

    /// scene shown at start
    #[arg(long, value_enum, default_value_t = app::SceneKind::Emblems)]
    scene: app::SceneKind,

    /// log file (the terminal belongs to the renderer)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = path {
        let file = File::create(&path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        // nowhere safe to write while the screen is taken over
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = emblem::settings::project_paths();
    let log_file = args
        .log_file
        .clone()
        .or_else(|| paths.as_ref().map(|p| p.log_path.clone()));
    init_logging(log_file)?;
    app::run(args, paths)
}
