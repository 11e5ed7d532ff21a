//! Two-phase output sinks.
//!
//! A download writes into a pending output that is invisible to consumers.
//! Exactly one of two things happens next: the output is committed and
//! published, or it is abandoned and its bytes are discarded. A committed
//! output is never abandoned afterwards and an abandoned one is never
//! published.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::filename::{candidate_paths, fit_filename};

/// A published output, visible to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedOutput {
    /// Where the output can be found.
    pub location: PathBuf,
    /// Final size in bytes.
    pub size_bytes: u64,
    /// MIME type recorded for the output.
    pub mime_type: String,
}

/// Creates pending outputs.
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Opens a new pending output named `display_name`.
    async fn create(
        &self,
        display_name: &str,
        mime_type: &str,
    ) -> io::Result<Box<dyn PendingOutput>>;
}

/// An output being written; not yet visible.
#[async_trait]
pub trait PendingOutput: Send {
    /// Appends bytes.
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Makes the output visible with its final size.
    async fn finalize(&mut self, final_size: u64) -> io::Result<PublishedOutput>;

    /// Discards the written bytes. Must tolerate being called after a failed write.
    async fn discard(&mut self) -> io::Result<()>;
}

/// Lifecycle of an [`OutputHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Accepting writes.
    Pending,
    /// Published; terminal.
    Committed,
    /// Discarded; terminal.
    Abandoned,
}

/// Enforces the pending → committed | abandoned state machine over a
/// [`PendingOutput`].
pub struct OutputHandle {
    display_name: String,
    inner: Box<dyn PendingOutput>,
    state: OutputState,
}

impl OutputHandle {
    /// Opens a pending output through `store`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when the store cannot create the output.
    pub async fn open(
        store: &dyn OutputStore,
        display_name: &str,
        mime_type: &str,
    ) -> Result<Self, DownloadError> {
        let inner = store
            .create(display_name, mime_type)
            .await
            .map_err(|e| DownloadError::io(display_name, e))?;
        debug!(display_name, mime_type, "opened pending output");
        Ok(Self {
            display_name: display_name.to_string(),
            inner,
            state: OutputState::Pending,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> OutputState {
        self.state
    }

    /// Appends bytes to a pending output.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] on write failure or when the handle is
    /// no longer pending.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), DownloadError> {
        self.ensure_pending()?;
        self.inner
            .write(bytes)
            .await
            .map_err(|e| DownloadError::io(&self.display_name, e))
    }

    /// Publishes the output.
    ///
    /// On failure the output is abandoned before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when finalizing fails or the handle is
    /// no longer pending.
    pub async fn commit(&mut self, final_size: u64) -> Result<PublishedOutput, DownloadError> {
        self.ensure_pending()?;
        match self.inner.finalize(final_size).await {
            Ok(published) => {
                self.state = OutputState::Committed;
                info!(
                    location = %published.location.display(),
                    size_bytes = published.size_bytes,
                    "output committed"
                );
                Ok(published)
            }
            Err(error) => {
                self.abandon().await;
                Err(DownloadError::io(&self.display_name, error))
            }
        }
    }

    /// Discards the output. Idempotent, and a no-op once committed.
    pub async fn abandon(&mut self) {
        if self.state != OutputState::Pending {
            return;
        }
        self.state = OutputState::Abandoned;
        if let Err(error) = self.inner.discard().await {
            warn!(display_name = %self.display_name, error = %error, "failed to discard output");
        } else {
            debug!(display_name = %self.display_name, "output abandoned");
        }
    }

    fn ensure_pending(&self) -> Result<(), DownloadError> {
        if self.state == OutputState::Pending {
            Ok(())
        } else {
            Err(DownloadError::io(
                &self.display_name,
                io::Error::other(format!("output is {:?}", self.state)),
            ))
        }
    }
}

impl std::fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandle")
            .field("display_name", &self.display_name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Stores outputs as files in a directory.
///
/// Each pending output gets its own hidden `.<name>.<tag>.part` file, created
/// exclusively. Commit publishes it under the first free name (`name.ext`,
/// `name_1.ext`, ...) without replacing an existing file.
#[derive(Debug, Clone)]
pub struct FileOutputStore {
    dir: PathBuf,
}

impl FileOutputStore {
    /// Creates a store rooted at `dir`. The directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory outputs are published into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl OutputStore for FileOutputStore {
    async fn create(
        &self,
        display_name: &str,
        mime_type: &str,
    ) -> io::Result<Box<dyn PendingOutput>> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = fit_filename(display_name);
        let (part_path, file) = create_part_file(&self.dir, &file_name).await?;
        debug!(part = %part_path.display(), "created pending file");
        Ok(Box::new(PendingFile {
            dir: self.dir.clone(),
            file_name,
            mime_type: mime_type.to_string(),
            part_path,
            writer: Some(BufWriter::new(file)),
        }))
    }
}

const PART_FILE_ATTEMPTS: usize = 16;

async fn create_part_file(dir: &Path, file_name: &str) -> io::Result<(PathBuf, File)> {
    for _ in 0..PART_FILE_ATTEMPTS {
        let tag: u32 = rand::random();
        let path = dir.join(format!(".{file_name}.{tag:08x}.part"));
        match open_new(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free pending file name",
    ))
}

async fn open_new(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Gives `part` its final name without replacing anything already there.
///
/// Hard-links to each candidate in turn; filesystems without hard links
/// fall back to reserving the name with an exclusive create and renaming
/// over the reservation.
async fn publish_no_clobber(part: &Path, dir: &Path, file_name: &str) -> io::Result<PathBuf> {
    for candidate in candidate_paths(dir, file_name) {
        match tokio::fs::hard_link(part, &candidate).await {
            Ok(()) => {
                if let Err(error) = tokio::fs::remove_file(part).await {
                    warn!(part = %part.display(), error = %error, "failed to remove pending file");
                }
                return Ok(candidate);
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => {
                debug!(error = %error, "hard link failed; reserving the name instead");
                return publish_by_reservation(part, dir, file_name).await;
            }
        }
    }
    Err(no_free_name(file_name))
}

async fn publish_by_reservation(
    part: &Path,
    dir: &Path,
    file_name: &str,
) -> io::Result<PathBuf> {
    for candidate in candidate_paths(dir, file_name) {
        match open_new(&candidate).await {
            Ok(placeholder) => {
                drop(placeholder);
                if let Err(error) = tokio::fs::rename(part, &candidate).await {
                    let _ = tokio::fs::remove_file(&candidate).await;
                    return Err(error);
                }
                return Ok(candidate);
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }
    Err(no_free_name(file_name))
}

fn no_free_name(file_name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("every candidate name for '{file_name}' is taken"),
    )
}

struct PendingFile {
    dir: PathBuf,
    file_name: String,
    mime_type: String,
    part_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PendingFile {
    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("pending file already closed"))
    }
}

#[async_trait]
impl PendingOutput for PendingFile {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer()?.write_all(bytes).await
    }

    async fn finalize(&mut self, final_size: u64) -> io::Result<PublishedOutput> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("pending file already closed"))?;
        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        let location = publish_no_clobber(&self.part_path, &self.dir, &self.file_name).await?;
        Ok(PublishedOutput {
            location,
            size_bytes: final_size,
            mime_type: self.mime_type.clone(),
        })
    }

    async fn discard(&mut self) -> io::Result<()> {
        drop(self.writer.take());
        match tokio::fs::remove_file(&self.part_path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}
