use std::fs::OpenOptions;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_FILENAME: &str = "pdfflow.log";

pub enum LogDestination {
    File(PathBuf),
    Terminal,
}

pub fn initialize(destination: LogDestination) {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = build_config();

    let logger: Box<dyn SharedLogger> = match destination {
        LogDestination::File(path) => {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => WriteLogger::new(level, config, file),
                Err(err) => {
                    eprintln!("Warning: could not open log file {}: {err}", path.display());
                    return;
                }
            }
        }
        LogDestination::Terminal => {
            TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        }
    };

    let _ = CombinedLogger::init(vec![logger]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}
