mod common;
use std::env::{set_var, var};
use std::error::Error;
use std::path::Path;

use chrono::prelude::*;
use clap::Parser;

use common::config::builder::ConfigContainer;
use common::helpers::{get_input, AppError};
use common::io::readers::json::JsonInputHandler;
use common::io::readers::prelude::InputHandler;
use common::io::writers::json::JsonWriter;
use common::io::writers::prelude::OutputSink;
use fwi_grid::modules::fwi::models::FWIGrid;
use fwi_grid::version::LONG_VERSION;
use log::{info, trace, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    long_version=LONG_VERSION,
    about="Gridded Canadian Forest Fire Weather Index System",
    long_about="Computes the moisture codes (FFMC, DMC, DC) and the fire behaviour indices (ISI, BUI, FWI)
of the Canadian Forest Fire Weather Index System for every cell of a gridded daily weather series."
)]
struct Args {
    #[arg(required = true, help = "Path to the configuration file", index = 1)]
    config_path: String,

    #[arg(required = true, help = "Path to the input data file", index = 2)]
    input_path: String,

    #[arg(required = true, help = "Path of the output file", index = 3)]
    output_path: String,
}

fn run_fwi(
    configs: &ConfigContainer,
    handler: &dyn InputHandler,
    output_writer: &mut dyn OutputSink,
) -> Result<(), AppError> {
    let model = FWIGrid::new(&configs.model)
        .map_err(|err| format!("Could not configure model: {err}"))?;

    let c = Utc::now();
    let grid = get_input(handler)?;
    trace!("Loading input took {} seconds", Utc::now() - c);

    let c = Utc::now();
    let output = model.run(&grid);
    trace!("Computing codes took {} seconds", Utc::now() - c);

    let c = Utc::now();
    output_writer.write(&output, &configs.variables)?;
    trace!("Writing output took {} seconds", Utc::now() - c);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path_str = args.config_path;
    let input_path_str = args.input_path;
    let output_path_str = args.output_path;

    if var("RUST_LOG").is_err() {
        set_var("RUST_LOG", "info")
    }
    pretty_env_logger::init();

    if !Path::new(&config_path_str).is_file() {
        return Err(format!("Config file {} is not a file", config_path_str).into());
    }

    let configs = ConfigContainer::from_file(&config_path_str)
        .map_err(|err| format!("Failed to load config: {}", err))?;

    let input_handler = JsonInputHandler::new(&input_path_str)
        .map_err(|err| format!("Could not load input data: {}", err))?;
    info!("Input files:\n{}", input_handler.info_input());

    let mut output_writer = JsonWriter::new(&output_path_str);

    let start_time = Utc::now();
    if let Err(err) = run_fwi(&configs, &input_handler, &mut output_writer) {
        warn!("Error running model: {}", err);
        return Err(err.into());
    }

    let elapsed_time = Utc::now() - start_time;
    info!("Elapsed time: {} seconds", elapsed_time.num_seconds());

    Ok(())
}
