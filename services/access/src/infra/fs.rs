use std::fs::File;
use std::future::Future;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use fd_lock::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Pause between attempts to take a lock held by another process.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Give up on a lock that stays held this long.
const LOCK_WAIT_LIMIT: Duration = Duration::from_secs(30);

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Replace `path` with `content` so readers see either the old or the new
/// file, never a partial one: write a uniquely named sibling temp file,
/// fsync it, rename it over the target.
pub async fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let dir = match parent_dir(path) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create directory {}", parent.display()))?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };
    let target = path.to_path_buf();
    let content = content.to_vec();

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let prefix = format!(
            ".{}.",
            target.file_name().and_then(|n| n.to_str()).unwrap_or("ledger")
        );
        // Dropping an unpersisted temp file deletes it.
        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&content)
            .with_context(|| format!("write temp file for {}", target.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("sync temp file for {}", target.display()))?;
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("rename temp file over {}", target.display()))?;
        Ok(())
    })
    .await
    .context("atomic write task")?
}

/// Append `rows` to an existing file and fsync it. `terminate` first adds the
/// newline a hand-edited file may be missing.
pub async fn append_synced(path: &Path, terminate: bool, rows: &[u8]) -> anyhow::Result<()> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open {} for append", path.display()))?;
    if terminate {
        file.write_all(b"\n")
            .await
            .with_context(|| format!("terminate last row of {}", path.display()))?;
    }
    file.write_all(rows)
        .await
        .with_context(|| format!("append to {}", path.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}

/// Read a whole file, mapping "does not exist" to `None`.
pub async fn read_if_exists(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

async fn open_lock_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = parent_dir(path) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .await
        .with_context(|| format!("open lock file {}", path.display()))?;
    Ok(file.into_std().await)
}

/// Run `work` while holding an exclusive advisory lock on `lock_path`.
///
/// The lock excludes other processes (and other handles in this process)
/// locking the same file. Waiting never blocks the runtime.
pub async fn with_file_lock<T, E, F>(lock_path: &Path, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<anyhow::Error>,
{
    let mut lock = RwLock::new(open_lock_file(lock_path).await?);
    let started = tokio::time::Instant::now();
    let _held = loop {
        match lock.try_write() {
            Ok(guard) => break guard,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                return Err(anyhow!(e)
                    .context(format!("lock {}", lock_path.display()))
                    .into());
            }
        }
        if started.elapsed() >= LOCK_WAIT_LIMIT {
            return Err(anyhow!(
                "timed out after {}s waiting for {}",
                LOCK_WAIT_LIMIT.as_secs(),
                lock_path.display()
            )
            .into());
        }
        debug!(path = %lock_path.display(), "ledger lock busy, waiting");
        tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
    };
    work.await
}
