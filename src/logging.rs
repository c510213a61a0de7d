use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;

/// Installs the fmt subscriber. `verbose` lowers the level to DEBUG.
pub fn init(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}
