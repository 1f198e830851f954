use std::path::Path;

use tracing_subscriber::EnvFilter;

use carom_core::config::EngineConfig;
use carom_core::search::adaptive_search;
use carom_core::table::BallLayout;

mod report;

use report::ShotReport;

/// Exit codes: 0 = shot found, 1 = precondition/config failure,
/// 2 = no legal shot (a well-defined outcome, not an error).
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(run());
}

fn run() -> i32 {
    let Some(label_path) = std::env::args().nth(1) else {
        eprintln!("usage: carom <ball-labels.txt>");
        return 1;
    };

    let config = EngineConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "configuration rejected");
        return 1;
    }

    let table = config.table();
    let layout = match BallLayout::from_label_file(Path::new(&label_path), config.cue, &table) {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!(error = %e, "cannot start simulation");
            return 1;
        },
    };

    tracing::info!(cue = %config.cue, labels = %label_path, "searching for best shot");

    let Some(best) = adaptive_search(
        &table,
        &layout,
        &config.search,
        &config.physics,
        &config.scoring,
    ) else {
        tracing::warn!("no legal shot found in either search phase");
        return 2;
    };

    let report = ShotReport::new(&best, config.output.trajectory_stride);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            0
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize report");
            1
        },
    }
}
