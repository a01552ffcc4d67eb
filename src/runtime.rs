//! Startup entry point: builds the worker runtime and hands control to the
//! caller's main routine.

use std::fs::File;
use std::path::Path;

use log::info;
use simplelog::{ConfigBuilder, WriteLogger};
use tokio::runtime::{Builder, Handle};

use crate::core::config::{self, LogSettings, ResolvedConfig};
use crate::error::EngineError;

/// Runs `main` on a fresh multi-threaded runtime with `threads` workers and
/// returns its exit status.
///
/// `main` runs on the calling thread with the runtime entered, so it can
/// build an [`Engine`](crate::Engine) directly or drive futures through the
/// handle it receives. The runtime is torn down once `main` returns.
pub fn start<F>(threads: usize, main: F) -> Result<i32, EngineError>
where
    F: FnOnce(Handle) -> i32,
{
    if threads == 0 {
        return Err(EngineError::InvalidThreadCount(threads));
    }
    let runtime = Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name("tunet-worker")
        .enable_all()
        .build()?;
    info!("Runtime started with {} worker threads", threads);

    let status = {
        let _entered = runtime.enter();
        main(runtime.handle().clone())
    };
    info!("Main routine exited with status {}", status);
    Ok(status)
}

/// Installs the file logger and then calls [`start`] with the configured
/// worker count.
pub fn start_with_config<F>(config: &ResolvedConfig, main: F) -> Result<i32, EngineError>
where
    F: FnOnce(Handle) -> i32,
{
    init_logging(&config.log).map_err(EngineError::Logging)?;
    start(config.workers, main)
}

/// Loads the config file at its default location, resolves env overrides,
/// then starts as [`start_with_config`] does. `main` also receives the
/// resolved config so it can build the engine from it.
pub fn start_configured<F>(main: F) -> Result<i32, EngineError>
where
    F: FnOnce(Handle, &ResolvedConfig) -> i32,
{
    let resolved = config::resolve(&config::load_config()?)?;
    start_with_config(&resolved, |handle| main(handle, &resolved))
}

/// Same as [`start_configured`], reading the config from `path`.
pub fn start_from_file<F>(path: &Path, main: F) -> Result<i32, EngineError>
where
    F: FnOnce(Handle, &ResolvedConfig) -> i32,
{
    let resolved = config::resolve(&config::load_config_from(path)?)?;
    start_with_config(&resolved, |handle| main(handle, &resolved))
}

/// Writes log records to the configured file. Without a file this does
/// nothing. A logger installed earlier stays in place.
pub fn init_logging(settings: &LogSettings) -> std::io::Result<()> {
    let Some(path) = &settings.file else {
        return Ok(());
    };
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_file = File::create(path)?;
    let _ = WriteLogger::init(settings.level, log_config, log_file);
    info!("Logging to {}", path.display());
    Ok(())
}
