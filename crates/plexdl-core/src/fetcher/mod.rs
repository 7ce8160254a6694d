//! Range-resumable fetcher: one episode into `<dest>/<name>` via `<name>.tmp`.
//!
//! The final file is the proof of completion. The partial file is the resume
//! checkpoint: it survives errors and cancellation, and its size becomes the
//! `Range` offset of the next call.

mod headers;
mod transfer;

pub use headers::{ContentRange, ResponseHead};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::TransferConfig;
use crate::control::{CancelToken, Cancelled};
use crate::media::{Credential, EpisodeMeta, MediaPart, ResolvedEpisode};
use crate::naming;
use crate::progress::{FetchEvent, Observer};
use transfer::{Attempt, AttemptEnd};

/// Result of one `fetch` call. Cancellation is not an outcome; it is the
/// `Err(Cancelled)` side of `fetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Final file written; carries its size in bytes.
    Success(u64),
    /// Final file was already on disk; no request was made.
    AlreadyComplete,
    /// The item has no downloadable stream.
    NoMedia,
    /// Request could not be issued or the server answered with an error.
    RequestFailed(String),
    /// The stream ended with zero bytes; nothing was kept.
    EmptyResult,
    /// Local disk failure (destination folder, partial file, final rename).
    WriteFailed(String),
}

impl Outcome {
    /// True for outcomes that mark a task completed.
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Success(_) | Outcome::AlreadyComplete)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(bytes) => write!(f, "downloaded ({} bytes)", bytes),
            Outcome::AlreadyComplete => write!(f, "already exists"),
            Outcome::NoMedia => write!(f, "no media stream available"),
            Outcome::RequestFailed(detail) => write!(f, "request failed: {}", detail),
            Outcome::EmptyResult => write!(f, "download was 0 bytes"),
            Outcome::WriteFailed(detail) => write!(f, "write failed: {}", detail),
        }
    }
}

/// Everything the fetcher needs for one task.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub meta: &'a EpisodeMeta,
    /// First media part, or `None` when the item has no stream.
    pub part: Option<&'a MediaPart>,
    pub credential: &'a Credential,
    pub destination: &'a Path,
}

impl<'a> FetchRequest<'a> {
    pub fn for_episode(resolved: &'a ResolvedEpisode, destination: &'a Path) -> Self {
        Self {
            meta: &resolved.episode.meta,
            part: resolved.episode.primary_part(),
            credential: &resolved.credential,
            destination,
        }
    }

    /// Output filename: container from the media part, `mp4` otherwise.
    pub fn file_name(&self) -> String {
        let ext = self
            .part
            .and_then(|p| p.container.as_deref())
            .unwrap_or(naming::DEFAULT_EXTENSION);
        naming::episode_file_name(self.meta, ext)
    }

    pub fn final_path(&self) -> PathBuf {
        self.destination.join(self.file_name())
    }
}

/// Sequential single-stream downloader.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    transfer: TransferConfig,
}

impl Fetcher {
    pub fn new(transfer: TransferConfig) -> Self {
        Self { transfer }
    }

    pub fn fetch(
        &self,
        request: &FetchRequest<'_>,
        cancel: &CancelToken,
        observer: &mut dyn Observer,
    ) -> Result<Outcome, Cancelled> {
        let file_name = request.file_name();
        let final_path = request.destination.join(&file_name);

        if final_path.exists() {
            tracing::debug!("skip {}: final file exists", final_path.display());
            observer.on_fetch(FetchEvent::AlreadyPresent {
                file_name: &file_name,
            });
            return Ok(Outcome::AlreadyComplete);
        }

        let Some(part) = request.part else {
            tracing::warn!("no media parts for '{}'", file_name);
            observer.on_fetch(FetchEvent::NoMedia {
                file_name: &file_name,
            });
            return Ok(Outcome::NoMedia);
        };

        if let Err(e) = fs::create_dir_all(request.destination) {
            return Ok(write_failed(request.destination, e));
        }

        let partial = naming::partial_path(&final_path);
        let mut offset = match resume_offset(&partial) {
            Ok(n) => n,
            Err(e) => return Ok(write_failed(&partial, e)),
        };
        let mut restarted = false;

        loop {
            cancel.check()?;
            if offset > 0 {
                tracing::info!("resuming {} at {} bytes", file_name, offset);
                observer.on_fetch(FetchEvent::Resuming {
                    file_name: &file_name,
                    offset,
                });
            }

            let attempt = Attempt {
                url: &part.locator,
                credential: request.credential,
                partial: &partial,
                offset,
                file_name: &file_name,
                expected_size: part.size,
                transfer: &self.transfer,
            };
            match transfer::run(&attempt, cancel, observer) {
                AttemptEnd::Completed { bytes_written } => {
                    tracing::debug!(
                        "{}: stream finished, {} bytes this request",
                        file_name,
                        bytes_written
                    );
                    break;
                }
                AttemptEnd::RangeIgnored { status } if !restarted => {
                    tracing::warn!(
                        "server did not honor Range for {} (status={}); restarting from 0",
                        file_name,
                        status
                    );
                    observer.on_fetch(FetchEvent::RangeIgnored {
                        file_name: &file_name,
                        status,
                    });
                    if let Err(e) = remove_if_present(&partial) {
                        return Ok(write_failed(&partial, e));
                    }
                    offset = 0;
                    restarted = true;
                }
                AttemptEnd::RangeIgnored { status } | AttemptEnd::Http(status) => {
                    tracing::error!("request for {} failed: HTTP {}", file_name, status);
                    return Ok(Outcome::RequestFailed(format!("HTTP {}", status)));
                }
                AttemptEnd::Network(e) => {
                    tracing::error!("request for {} failed: {}", file_name, e);
                    return Ok(Outcome::RequestFailed(e.to_string()));
                }
                AttemptEnd::Storage(e) => return Ok(write_failed(&partial, e)),
                AttemptEnd::Cancelled { bytes_on_disk } => {
                    tracing::info!("{} paused at {} bytes", file_name, bytes_on_disk);
                    observer.on_fetch(FetchEvent::Paused {
                        file_name: &file_name,
                        bytes_on_disk,
                    });
                    return Err(Cancelled);
                }
            }
        }

        Ok(self.finish(&partial, &final_path, &file_name, observer))
    }

    /// Zero-byte guard, then atomic rename of the partial to the final name.
    fn finish(
        &self,
        partial: &Path,
        final_path: &Path,
        file_name: &str,
        observer: &mut dyn Observer,
    ) -> Outcome {
        let size = match fs::metadata(partial) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return write_failed(partial, e),
        };
        if size == 0 {
            tracing::warn!("download of '{}' ended up 0 bytes; removing partial", file_name);
            if let Err(e) = remove_if_present(partial) {
                tracing::warn!("could not remove {}: {}", partial.display(), e);
            }
            return Outcome::EmptyResult;
        }
        if let Err(e) = fs::rename(partial, final_path) {
            return write_failed(final_path, e);
        }
        tracing::info!("finished {} ({} bytes)", final_path.display(), size);
        observer.on_fetch(FetchEvent::Finished {
            file_name,
            bytes: size,
        });
        Outcome::Success(size)
    }
}

/// Size of a non-empty partial file; an empty one is deleted and counts as 0.
fn resume_offset(partial: &Path) -> io::Result<u64> {
    match fs::metadata(partial) {
        Ok(m) if m.len() > 0 => Ok(m.len()),
        Ok(_) => {
            fs::remove_file(partial)?;
            Ok(0)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn write_failed(path: &Path, e: io::Error) -> Outcome {
    tracing::error!("disk error at {}: {}", path.display(), e);
    Outcome::WriteFailed(format!("{}: {}", path.display(), e))
}
