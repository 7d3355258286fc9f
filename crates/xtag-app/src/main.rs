use std::{backtrace::Backtrace, num::NonZeroUsize, panic, path::PathBuf, sync::Arc};

use clap::Parser;
use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, LogSpecBuilder, Logger, LoggerHandle, Naming,
};
use iced::Font;
use log::{debug, error, info};
use masterror::{AppError, AppResult};
use tokio::runtime::Handle;
use xtag_core::{config::get_config, config::manager::ConfigManager, event_bus::EventBus};
use xtag_gui::{App, get_log_spec};
use xtag_proto::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Page file to load instead of ~/.config/xtag/page.toml
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    config_path: Option<PathBuf>,
}

fn start_logger() -> AppResult<LoggerHandle> {
    Logger::with(LogSpecBuilder::new().default(log::LevelFilter::Info).build())
        .log_to_file(FileSpec::default().directory("/tmp/xtag"))
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(7),
        )
        .start()
        .map_err(|err| AppError::internal(format!("Failed to start logger: {err}")))
}

fn load_config(path: Option<PathBuf>) -> AppResult<(Config, PathBuf)> {
    let (config, path) = get_config(path)
        .map_err(|err| AppError::internal(format!("Failed to read config: {err}")))?;

    config
        .validate()
        .map_err(|err| AppError::internal(format!("Invalid page {}: {err}", path.display())))?;

    Ok((config, path))
}

#[tokio::main]
async fn main() -> iced::Result {
    let args = Args::parse();

    let logger = match start_logger() {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    debug!("args: {args:?}");

    panic::set_hook(Box::new(|info| {
        let b = Backtrace::capture();
        error!("Panic: {info} \n {b}");
    }));

    let (config, config_path) = load_config(args.config_path).unwrap_or_else(|err| {
        error!("{err}");
        std::process::exit(1);
    });
    info!("Using page file {}", config_path.display());

    logger.set_new_spec(get_log_spec(&config.log_level));

    let font = match config.appearance.font_name {
        Some(ref font_name) => Font::with_name(Box::leak(font_name.clone().into_boxed_str())),
        None => Font::DEFAULT,
    };

    let bus = EventBus::new(NonZeroUsize::new(EVENT_BUS_CAPACITY).unwrap_or(NonZeroUsize::MIN));
    let config_manager = Arc::new(ConfigManager::new(config.clone()));

    iced::daemon(App::title, App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .style(App::style)
        .scale_factor(App::scale_factor)
        .default_font(font)
        .run_with(App::new((
            logger,
            config,
            config_manager,
            config_path,
            bus.sender(),
            Handle::current(),
            bus.receiver(),
        )))
}
