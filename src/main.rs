//! edgepack - Edge deployment packager for built web applications.
//!
//! This binary turns a compiled application's output tree into a deployable
//! package: static assets, a generated entry module, a pruned dependency
//! set, and a platform manifest.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match edgepack::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
