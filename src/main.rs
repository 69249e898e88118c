use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};
use pom_set_version::{
    arguments::Arguments, config::Settings, pom::discover_projects, propagator::Propagator,
    report::LogReporter,
};

fn main() -> Result<()> {
    let args = Arguments::parse();
    pretty_env_logger::env_logger::builder()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .format_timestamp(None)
        .init();

    let settings = Settings::from(&args);
    let projects = discover_projects(&args.path)?;
    info!("Found {} project(s) under {}", projects.len(), args.path);

    Propagator::new(&projects, &settings).run(&LogReporter)?;

    Ok(())
}
