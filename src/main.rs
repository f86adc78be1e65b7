// Hide console window on Windows release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use anyhow::Result;
use drawbridge::app::App;
use drawbridge::cli;
use drawbridge::logging;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            // Non-zero exit: use process::exit so the shell sees the
            // correct exit code. No app state exists yet, so no destructors
            // are skipped.
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };

    // Route all log output to the session log file; RUST_LOG mirrors to
    // stderr. The config file's level is applied once it is loaded.
    logging::init(runtime_options.log_level);

    log::info!("Starting drawbridge {}", drawbridge::VERSION);

    // Create Tokio runtime for the chat request worker
    let runtime = Arc::new(Runtime::new()?);

    // Create and run the application
    let app = App::new(Arc::clone(&runtime), runtime_options)?;
    let result = app.run();

    // Event loop has exited; drop the runtime explicitly so Tokio can shut
    // down its worker threads before main returns, bounded in case a
    // request is still hanging.
    log::info!("Event loop exited, shutting down runtime");
    if let Ok(rt) = Arc::try_unwrap(runtime) {
        rt.shutdown_timeout(std::time::Duration::from_secs(2));
    }

    match result {
        Ok(_) => Ok(()),
        Err(ref e) => {
            eprintln!("drawbridge: error: {e:#}");
            // On Linux, provide a hint when the error looks like a missing display server
            #[cfg(target_os = "linux")]
            {
                let msg = format!("{e:?}").to_lowercase();
                if msg.contains("display")
                    || msg.contains("wayland")
                    || msg.contains("xcb")
                    || msg.contains("x server")
                    || msg.contains("compositor")
                {
                    eprintln!(
                        "drawbridge: hint: no display server found — ensure DISPLAY (X11) or \
                         WAYLAND_DISPLAY (Wayland) is set and a compositor is running"
                    );
                }
            }
            // Return the original error so main exits with code 1
            result
        }
    }
}
