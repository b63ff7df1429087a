mod cli;
mod core;
mod form;
mod headless;
mod logging;
mod tui;

use clap::Parser;

use crate::cli::{SystemCli, SystemCommand};
use crate::core::config::ConfigStore;
use crate::core::controller::JobController;
use crate::core::error::FlowError;
use crate::core::notify::DesktopNotifier;
use crate::core::runner::resolve_encoding;
use crate::form::JobForm;
use crate::logging::{LogDestination, LOG_FILENAME};

fn main() {
    let cli = SystemCli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(cli: SystemCli) -> Result<i32, FlowError> {
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::beside_executable(),
    };

    match (&cli.log_file, &cli.command) {
        (Some(path), _) => logging::initialize(LogDestination::File(path.clone())),
        (None, Some(SystemCommand::Run(_))) => logging::initialize(LogDestination::Terminal),
        (None, None) => {
            let path = store
                .path()
                .parent()
                .map(|dir| dir.join(LOG_FILENAME))
                .unwrap_or_else(|| LOG_FILENAME.into());
            logging::initialize(LogDestination::File(path));
        }
    }

    let encoding = resolve_encoding(&cli.encoding)?;
    let form = JobForm::from_preferences(&store.load());
    let controller = JobController::new(cli.tool, encoding, store, Box::new(DesktopNotifier));

    match cli.command {
        Some(SystemCommand::Run(args)) => headless::run(controller, form, args),
        None => tui::run(controller, form).map(|_| 0),
    }
}
