use clap::Parser;
use log::error;

use canvasnotes::{App, CanvasStorage, Cli, Config, Result};

fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.backup_dir {
        config.backup_dir = dir;
    }

    let storage = CanvasStorage::new(config.clone())?;
    App::new(storage, config, config_path, cli.verbose).run(cli.command)
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
