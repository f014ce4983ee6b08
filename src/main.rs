//! MLFM entry point: CLI wiring and config-driven pipeline run.

use std::path::Path;
use std::process;

use mlfm::cli::{parse_args, print_usage};
use mlfm::config::RunConfig;
use mlfm::logging::init_logging;
use mlfm::runner::run;

fn main() {
    let cli = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    // Load config: --config takes priority, then --preset, then demo default
    let mut cfg = if let Some(ref path) = cli.config {
        match RunConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match RunConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        RunConfig::demo()
    };

    cli.apply(&mut cfg);

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    init_logging(&cfg.logging.level);

    let output = match run(&cfg) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!(
        "Loaded {} rows, kept {} after sanity checks, {} after condition filter",
        output.load.read,
        output.load.kept,
        output.load.kept - output.filtered_out
    );
    if !output.normalization.skipped.is_empty() {
        println!("Skipped rows: {}", output.normalization.skipped.len());
    }
    println!("\n{}", output.summary);
}
