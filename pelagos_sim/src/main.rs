// pelagos_sim/src/main.rs

//! The Pelagos survey node.
//!
//! Startup is strictly phased: configuration, loading, and filter
//! validation all complete (or abort the process with a non-zero status)
//! before the Bevy app — and with it any periodic work — exists.

use std::process::ExitCode;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use clap::Parser;

use pelagos_core::filter::UniformSampler;
use pelagos_core::survey::archive;
use pelagos_core::survey::load::SubmapLoader;
use pelagos_sim::cli::Cli;
use pelagos_sim::prelude::*;
use pelagos_sim::simulation::plugins::survey::{CloudFilter, SurveyData};
use pelagos_sim::PelagosNodePlugin;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --- Startup phase. Errors here exit non-zero; no timer ever starts. ---
    let config = match RunConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sampler = match UniformSampler::new(config.survey.downsample_radius) {
        Ok(sampler) => sampler,
        Err(e) => {
            eprintln!("filter error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Input data: {}", config.source().describe());
    let collection = match config.source().loader().load() {
        Ok(collection) => collection,
        Err(e) => {
            eprintln!("load error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // A freshly extracted survey is re-serialized so later runs can use the
    // serialized source directly.
    if let SourceConfig::Original { output_path, .. } = config.source() {
        let target = archive::cereal_path(output_path);
        match archive::write_collection(&target, &collection) {
            Ok(()) => println!("Wrote extracted survey to {}", target.display()),
            Err(e) => eprintln!("warning: {e}"),
        }
    }

    // --- Steady state: hand everything to the app. ---
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(20))),
        )
        .add_plugins(LogPlugin {
            level: bevy::log::Level::INFO,
            filter: "info,pelagos_sim=debug,pelagos_core=debug".to_string(),
            ..default()
        })
        .add_plugins(StatesPlugin)
        .insert_resource(config)
        .insert_resource(SurveyData { collection })
        .insert_resource(CloudFilter(sampler))
        .init_state::<AppState>()
        .add_plugins(PelagosNodePlugin)
        .run();

    ExitCode::SUCCESS
}
