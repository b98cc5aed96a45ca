//! Computes and exports normalised disparity images for one stereo pair.
//!
//! Usage: `cv-disparity-export [LEFT RIGHT [CONFIG.json]]`, defaulting to `L0.png R0.png`.

use std::env;
use std::path::PathBuf;

use cv_disparity_export::config::{load_config, PipelineConfig};
use cv_disparity_export::mcmanamon::McManamon;
use cv_disparity_export::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let (left, right, config_path) = match args.as_slice() {
        [] => (PathBuf::from("L0.png"), PathBuf::from("R0.png"), None),
        [l, r] => (PathBuf::from(l), PathBuf::from(r), None),
        [l, r, c] => (PathBuf::from(l), PathBuf::from(r), Some(PathBuf::from(c))),
        _ => {
            eprintln!("Usage: cv-disparity-export [LEFT RIGHT [CONFIG.json]]");
            std::process::exit(2);
        }
    };

    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => PipelineConfig::default()
    };

    let mut matcher = McManamon::new(config.matcher);
    let report = Pipeline::new(config.output).run(&mut matcher, &left, &right)?;

    if report.degenerate {
        println!("Warning: no positive disparity found, outputs are all-zero");
    }
    println!(
        "Wrote {} and {} ({}x{}, max disparity {})",
        report.left_output.display(),
        report.right_output.display(),
        report.width,
        report.height,
        report.max_disp
    );
    println!("time is {:.3} s", report.elapsed.as_secs_f64());

    Ok(())
}
