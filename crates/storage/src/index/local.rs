//! Device index backed by a walk of local directories.

use super::{DeviceIndex, EntryStream, IndexEntry};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::Metadata;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs::{self, DirEntry};
use tome_extract::{OCTET_STREAM, canonical_mime_type};
use tracing::warn;

enum WalkEntry {
    File(IndexEntry),
    Descend(PathBuf),
    Skip,
}

/// Index of every file below a set of root directories.
///
/// There is no system media database to ask, so MIME types are guessed from
/// the file extension, and files with an unknown extension are declared as
/// [`OCTET_STREAM`] (which is what devices tend to do).
///
/// # Examples
///
/// ```no_run
/// use tome_storage::index::LocalIndex;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let index = LocalIndex::new(["/home/me/Books", "/home/me/Downloads"])?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalIndex {
    roots: Vec<PathBuf>,
}
impl LocalIndex {
    /// Create an index over the given root directories.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if any root is not
    /// absolute. Roots that don't exist are fine; they're simply empty.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Result<Self> {
        let roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        if let Some(relative) = roots.iter().find(|root| !root.is_absolute()) {
            exn::bail!(ErrorKind::InvalidPath(relative.clone()));
        }
        Ok(Self { roots })
    }

    fn guess_mime_type(path: &Path) -> &'static str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(canonical_mime_type)
            .unwrap_or(OCTET_STREAM)
    }

    fn added(metadata: &Metadata) -> Result<UtcDateTime> {
        // Creation time isn't available on every platform/filesystem.
        let time = metadata.created().or_else(|_| metadata.modified()).map_err(ErrorKind::Io)?;
        Ok(time.into())
    }

    async fn process_entry(entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| ErrorKind::io(e, &path))?;
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            let mime_type = Self::guess_mime_type(&path);
            return Ok(WalkEntry::File(IndexEntry::new(path, mime_type, Self::added(&metadata)?)));
        }
        // Most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl DeviceIndex for LocalIndex {
    fn name(&self) -> &str {
        "local"
    }

    /// Walks every root depth-first.
    ///
    /// A root that can't be read is an error. Anything unreadable below a
    /// root is logged and left out, the same way a media index would never
    /// have seen it.
    fn entries(&self) -> EntryStream<'_> {
        Box::pin(stream! {
            for root in &self.roots {
                let mut stack = vec![root.clone()];
                'dirs: while let Some(current) = stack.pop() {
                    let mut entries = match fs::read_dir(&current).await {
                        Ok(entries) => entries,
                        Err(err) if err.kind() == IoErrorKind::NotFound => continue 'dirs,
                        Err(err) if current == *root => {
                            yield Err(exn::Exn::from(ErrorKind::io(err, &current)));
                            continue 'dirs;
                        },
                        Err(err) => {
                            warn!(path = %current.display(), error = %err, "skipping unreadable directory");
                            continue 'dirs;
                        },
                    };
                    'entries: loop {
                        let entry = match entries.next_entry().await {
                            Ok(Some(entry)) => entry,
                            Ok(None) => break 'entries,
                            Err(err) => {
                                warn!(path = %current.display(), error = %err, "directory listing interrupted");
                                break 'entries;
                            },
                        };
                        match Self::process_entry(entry).await {
                            Ok(WalkEntry::File(file)) => yield Ok(file),
                            Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                            Ok(WalkEntry::Skip) => {},
                            Err(err) => warn!(error = %err, "skipping unreadable entry"),
                        }
                    }
                }
            }
        })
    }
}
