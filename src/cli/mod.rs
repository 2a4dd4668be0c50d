//! Command line interface for the edge deployment packager.

mod args;

pub use args::Args;

use crate::error::{CliError, Result};
use crate::packager::Pipeline;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();

    if let Err(reason) = args.validate() {
        return Err(CliError::InvalidArguments { reason }.into());
    }

    let settings = args.to_settings()?;
    let mut pipeline = Pipeline::new(settings);
    pipeline.run().await?;

    Ok(0)
}
