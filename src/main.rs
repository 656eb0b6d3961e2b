mod app;
mod config;
mod constants;
mod handlers;
mod rendering;
mod state;
mod subscriptions;
mod window;

use stackd_config::NotificationsConfig;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const HELP: &str = "\
stackd: a notification daemon for X11

USAGE:
  stackd [--config <path>]

OPTIONS:
  -c, --config <path>  Read settings from <path>
  -v, --version        Print the version and exit
  -h, --help           Print this help and exit
";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stackd=info,stackd_config=info,stackd_util=info"));
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(feature = "systemd")]
    if let Ok(journald) = tracing_journald::layer() {
        registry.with(journald).init();
        return;
    }

    registry.with(fmt::layer().with_writer(std::io::stderr)).init();
}

fn main() -> anyhow::Result<()> {
    color_backtrace::install();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    if args.contains(["-v", "--version"]) {
        println!("{} {}", config::NAME, config::VERSION);
        return Ok(());
    }
    let config_path: Option<PathBuf> = args.opt_value_from_str(["-c", "--config"])?;
    let rest = args.finish();
    if !rest.is_empty() {
        anyhow::bail!("Unexpected arguments: {rest:?}");
    }

    init_logging();
    info!("Starting {} {}", config::NAME, config::VERSION);

    let config = match NotificationsConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            warn!("{}, using defaults", err);
            NotificationsConfig::default()
        }
    };

    // The renderer and the X connection stay on this thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(config))
}
