use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "ISOVIEW_CONFIG";
const OUTPUT_DIR_ENV_VAR: &str = "ISOVIEW_SANDBOX_OUT";
const DEFAULT_OUTPUT_DIR: &str = "target/sandbox";
const DEFAULT_TICKS: u32 = 48;

pub(crate) struct AppWiring {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) output_dir: PathBuf,
    pub(crate) ticks: u32,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== isoview sandbox startup ===");

    AppWiring {
        config_path: env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        output_dir: env::var_os(OUTPUT_DIR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        ticks: DEFAULT_TICKS,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
