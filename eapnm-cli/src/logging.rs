use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Env, Target};

const LOG_FILE: &str = "eapnm-cli.log";

/// Installs the global logger.
///
/// Logs go to `eapnm-cli.log` in `dir` when it can be opened, otherwise to
/// stderr. `RUST_LOG` overrides the level picked by `debug`.
pub fn init(debug: bool, dir: Option<&Path>) {
    let level = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));

    let file = dir.and_then(|d| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(d.join(LOG_FILE))
            .ok()
    });
    match file {
        Some(file) => builder.target(Target::Pipe(Box::new(file))),
        None => builder.target(Target::Stderr),
    };

    if builder.try_init().is_err() {
        eprintln!("logger already initialized");
    }
}
