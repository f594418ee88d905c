use std::io;

use anyhow::{Context, Result};
use dbf_shared::{PipelineConfig, run_pipeline};

fn main() -> Result<()> {
    env_logger::init();

    let config = PipelineConfig::default();
    log::info!(
        "Converting {} to {} and {}",
        config.input_path.display(),
        config.csv_path.display(),
        config.xlsx_path.display()
    );

    let summary = run_pipeline(&config, io::stdout().lock())
        .with_context(|| format!("failed to convert {}", config.input_path.display()))?;

    log::info!(
        "Done: {} rows × {} columns exported",
        summary.shape.0,
        summary.shape.1
    );
    Ok(())
}
