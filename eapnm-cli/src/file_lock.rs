use anyhow::{Context, anyhow};
use fs2::FileExt;
use std::fs::File;
use std::path::Path;

const LOCK_FILE: &str = "eapnm.lock";

/// Takes the single-writer lock in `dir`.
///
/// Held for the whole run; a second instance fails while it is held.
pub fn acquire_app_lock(dir: &Path) -> anyhow::Result<File> {
    let lock_path = dir.join(LOCK_FILE);

    let file = File::create(&lock_path)
        .with_context(|| format!("failed to create lock file {}", lock_path.display()))?;

    // Exclusive lock; fails if another instance holds it
    file.try_lock_exclusive()
        .map_err(|_| anyhow!("another eapnm instance is already running"))?;

    Ok(file)
}
