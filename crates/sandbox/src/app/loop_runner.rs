use std::process::ExitCode;

use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::demo_world::run_demo;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_demo(&app) {
        Ok(report) => {
            info!(
                frame = %report.frame_path.display(),
                dirty_rects = report.dirty_rects,
                pixel_copies = report.pixel_copies,
                "sandbox_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
