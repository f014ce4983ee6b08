use std::env;
use std::path::PathBuf;

use crate::config::RunConfig;

/// Parsed command-line options. Every field overrides the matching config
/// value when set.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub reference: Option<PathBuf>,
    pub measurements: Option<PathBuf>,
    pub module_id: Option<String>,
    pub row: Option<usize>,
    pub norm_out: Option<PathBuf>,
    pub series_out: Option<PathBuf>,
    pub x_axis: Option<String>,
    pub detail: Option<u8>,
    pub permissive: bool,
    pub log_level: Option<String>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                set_once(&mut opts.config, PathBuf::from(path), "--config")?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--reference" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --reference (expected a CSV path)")?;
                set_once(&mut opts.reference, PathBuf::from(path), "--reference")?;
            }
            "--measurements" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --measurements (expected a CSV path)")?;
                set_once(&mut opts.measurements, PathBuf::from(path), "--measurements")?;
            }
            "--module-id" => {
                i += 1;
                let id = args.next_or_err(i, "missing value for --module-id (expected an id)")?;
                set_once(&mut opts.module_id, id.to_string(), "--module-id")?;
            }
            "--row" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --row (expected a row number)")?;
                let row = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--row value \"{raw}\" is not a valid row number"))?;
                set_once(&mut opts.row, row, "--row")?;
            }
            "--norm-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --norm-out (expected a file path)")?;
                set_once(&mut opts.norm_out, PathBuf::from(path), "--norm-out")?;
            }
            "--series-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --series-out (expected a file path)")?;
                set_once(&mut opts.series_out, PathBuf::from(path), "--series-out")?;
            }
            "--x-axis" => {
                i += 1;
                let axis = args.next_or_err(i, "missing value for --x-axis (expected a column name)")?;
                set_once(&mut opts.x_axis, axis.to_string(), "--x-axis")?;
            }
            "--detail" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --detail (expected 1-4)")?;
                let level = raw
                    .parse::<u8>()
                    .map_err(|_| format!("--detail value \"{raw}\" is not a valid level"))?;
                set_once(&mut opts.detail, level, "--detail")?;
            }
            "--permissive" => {
                opts.permissive = true;
            }
            "--log-level" => {
                i += 1;
                let level = args.next_or_err(i, "missing value for --log-level (expected a filter)")?;
                set_once(&mut opts.log_level, level.to_string(), "--log-level")?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if opts.module_id.is_some() && opts.row.is_some() {
        return Err("arguments `--module-id` and `--row` are mutually exclusive".to_string());
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

impl CliOptions {
    /// Overlays the command-line values on `cfg`.
    ///
    /// An explicit `--module-id` or `--row` replaces any selection from the
    /// config file.
    pub fn apply(&self, cfg: &mut RunConfig) {
        if let Some(p) = &self.reference {
            cfg.input.reference = Some(p.clone());
        }
        if let Some(p) = &self.measurements {
            cfg.input.measurements = Some(p.clone());
        }
        if self.module_id.is_some() || self.row.is_some() {
            cfg.selection.id = self.module_id.clone();
            cfg.selection.filename = None;
            cfg.selection.row = self.row;
        }
        if let Some(p) = &self.norm_out {
            cfg.output.norm = Some(p.clone());
        }
        if let Some(p) = &self.series_out {
            cfg.output.series = Some(p.clone());
        }
        if let Some(axis) = &self.x_axis {
            cfg.output.x_axis = axis.clone();
        }
        if let Some(level) = self.detail {
            cfg.output.detail = level;
        }
        if self.permissive {
            cfg.normalize.policy = "permissive".to_string();
        }
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }
    }
}

pub fn print_usage() {
    eprintln!("mlfm: normalize measured IV-curve data to MLFM loss factors");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  mlfm [--config <path> | --preset <name>] [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load run configuration from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (demo)");
    eprintln!("  --reference <path>       Reference (datasheet) CSV");
    eprintln!("  --measurements <path>    Measured IV-curve CSV");
    eprintln!("  --module-id <id>         Select the reference record by id");
    eprintln!("  --row <n>                Select the reference record by row");
    eprintln!("  --norm-out <path>        Write the normalized table to CSV");
    eprintln!("  --series-out <path>      Write plot-ready series to CSV");
    eprintln!("  --x-axis <name>          Series x axis: gti_kw_m2, temperature_module, date_time");
    eprintln!("  --detail <1-4>           Series detail level");
    eprintln!("  --permissive             Skip rows that cannot be normalized");
    eprintln!("  --log-level <filter>     Log filter, e.g. info or mlfm=debug");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If neither --config nor --preset is given, the demo preset is used.");
}
