//! One streamed GET into the partial file (libcurl easy handle).
//!
//! The response is only written once its headers say it is usable: a ranged
//! request must come back as 206 starting at the requested offset, a fresh
//! request must be 2xx. Anything else aborts before the partial is touched.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str;
use std::time::Instant;

use super::headers::ResponseHead;
use crate::config::TransferConfig;
use crate::control::CancelToken;
use crate::media::Credential;
use crate::progress::{FetchEvent, Observer, ProgressStats};

/// Inputs of a single request.
pub(super) struct Attempt<'a> {
    pub url: &'a str,
    pub credential: &'a Credential,
    pub partial: &'a Path,
    /// Bytes already in `partial`; a nonzero offset sends `Range: bytes=<offset>-`.
    pub offset: u64,
    pub file_name: &'a str,
    /// Size the server advertised in metadata; used when the response has no total.
    pub expected_size: Option<u64>,
    pub transfer: &'a TransferConfig,
}

/// How a single request ended.
#[derive(Debug)]
pub(super) enum AttemptEnd {
    /// Body streamed to the end (possibly empty).
    Completed { bytes_written: u64 },
    /// Ranged request answered without usable partial content; nothing written.
    RangeIgnored { status: u32 },
    /// Non-2xx status on a fresh request; nothing written.
    Http(u32),
    Network(curl::Error),
    Storage(io::Error),
    Cancelled { bytes_on_disk: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Accept,
    RangeIgnored,
    HttpError,
}

fn disposition(offset: u64, head: &ResponseHead) -> Disposition {
    let status = head.status.unwrap_or(0);
    if offset > 0 {
        let starts_at_offset = head.content_range.map_or(true, |r| r.start == offset);
        if status == 206 && starts_at_offset {
            Disposition::Accept
        } else {
            Disposition::RangeIgnored
        }
    } else if (200..300).contains(&status) {
        Disposition::Accept
    } else {
        Disposition::HttpError
    }
}

/// Total for progress reporting: the response's own figure, else the metadata size.
fn progress_total(head: &ResponseHead, expected_size: Option<u64>) -> Option<u64> {
    head.total_size().or(expected_size)
}

enum Stop {
    Cancelled,
    RangeIgnored(u32),
    Http(u32),
    Storage(io::Error),
}

/// State shared by the header and write callbacks.
struct Body<'o> {
    head: ResponseHead,
    file: Option<BufWriter<File>>,
    written: u64,
    stop: Option<Stop>,
    started: Instant,
    observer: &'o mut dyn Observer,
}

impl Body<'_> {
    /// Returns the number of bytes consumed; anything short of `data.len()` aborts the transfer.
    fn write_chunk(&mut self, data: &[u8], attempt: &Attempt<'_>, cancel: &CancelToken) -> usize {
        if cancel.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
            return 0;
        }
        if self.file.is_none() {
            let status = self.head.status.unwrap_or(0);
            match disposition(attempt.offset, &self.head) {
                Disposition::Accept => {}
                Disposition::RangeIgnored => {
                    self.stop = Some(Stop::RangeIgnored(status));
                    return 0;
                }
                Disposition::HttpError => {
                    self.stop = Some(Stop::Http(status));
                    return 0;
                }
            }
            match open_partial(attempt.partial, attempt.offset > 0, attempt.transfer.chunk_size) {
                Ok(f) => self.file = Some(f),
                Err(e) => {
                    self.stop = Some(Stop::Storage(e));
                    return 0;
                }
            }
            self.observer.on_fetch(FetchEvent::Started {
                file_name: attempt.file_name,
            });
        }
        let Some(file) = self.file.as_mut() else {
            return 0;
        };
        if let Err(e) = file.write_all(data) {
            self.stop = Some(Stop::Storage(e));
            return 0;
        }
        self.written += data.len() as u64;

        let stats = ProgressStats {
            bytes_done: attempt.offset + self.written,
            total_bytes: progress_total(&self.head, attempt.expected_size),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            resumed_from: attempt.offset,
        };
        self.observer.on_fetch(FetchEvent::Progress {
            file_name: attempt.file_name,
            stats: &stats,
        });
        data.len()
    }
}

/// Open the partial file: append when resuming, truncate otherwise.
fn open_partial(path: &Path, resume: bool, chunk_size: usize) -> io::Result<BufWriter<File>> {
    let mut opts = OpenOptions::new();
    opts.create(true);
    if resume {
        opts.append(true);
    } else {
        opts.write(true).truncate(true);
    }
    let file = opts.open(path)?;
    Ok(BufWriter::with_capacity(chunk_size.max(1), file))
}

/// Flush buffered bytes and fsync so the partial is a valid checkpoint.
fn close_partial(file: Option<BufWriter<File>>) -> io::Result<()> {
    if let Some(mut f) = file {
        f.flush()?;
        f.get_ref().sync_all()?;
    }
    Ok(())
}

/// Runs one request. Never returns an error: every failure is an `AttemptEnd`.
pub(super) fn run(
    attempt: &Attempt<'_>,
    cancel: &CancelToken,
    observer: &mut dyn Observer,
) -> AttemptEnd {
    match perform(attempt, cancel, observer) {
        Ok(end) => end,
        Err(e) => AttemptEnd::Network(e),
    }
}

fn perform(
    attempt: &Attempt<'_>,
    cancel: &CancelToken,
    observer: &mut dyn Observer,
) -> Result<AttemptEnd, curl::Error> {
    let cfg = attempt.transfer;

    let mut easy = curl::easy::Easy::new();
    easy.url(attempt.url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(cfg.connect_timeout())?;
    easy.low_speed_limit(cfg.low_speed_limit)?;
    easy.low_speed_time(cfg.low_speed_time())?;
    easy.buffer_size(cfg.chunk_size)?;
    easy.progress(true)?;
    if attempt.offset > 0 {
        // curl takes "start-end" without the "bytes=" prefix; open-ended here.
        easy.range(&format!("{}-", attempt.offset))?;
    }

    let mut list = curl::easy::List::new();
    list.append(&attempt.credential.header_line())?;
    easy.http_headers(list)?;

    let body = RefCell::new(Body {
        head: ResponseHead::default(),
        file: None,
        written: 0,
        stop: None,
        started: Instant::now(),
        observer,
    });

    let result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                body.borrow_mut().head.push_line(line);
            }
            true
        })?;
        transfer.write_function(|data| Ok(body.borrow_mut().write_chunk(data, attempt, cancel)))?;
        // Lets Ctrl+C abort while the socket is idle, not just between writes.
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        transfer.perform()
    };

    let Body {
        head,
        file,
        written,
        stop,
        ..
    } = body.into_inner();
    let closed = close_partial(file);
    let bytes_on_disk = attempt.offset + written;

    match stop {
        Some(Stop::Cancelled) => {
            if let Err(e) = &closed {
                tracing::warn!("could not flush partial {}: {}", attempt.partial.display(), e);
            }
            return Ok(AttemptEnd::Cancelled { bytes_on_disk });
        }
        Some(Stop::RangeIgnored(status)) => return Ok(AttemptEnd::RangeIgnored { status }),
        Some(Stop::Http(code)) => return Ok(AttemptEnd::Http(code)),
        Some(Stop::Storage(e)) => return Ok(AttemptEnd::Storage(e)),
        None => {}
    }

    if let Err(e) = result {
        if cancel.is_cancelled() {
            if let Err(e) = &closed {
                tracing::warn!("could not flush partial {}: {}", attempt.partial.display(), e);
            }
            return Ok(AttemptEnd::Cancelled { bytes_on_disk });
        }
        return Ok(AttemptEnd::Network(e));
    }
    if let Err(e) = closed {
        return Ok(AttemptEnd::Storage(e));
    }

    // No body arrived, so the write callback never judged the status.
    if written == 0 {
        let mut head = head;
        if head.status.is_none() {
            head.status = easy.response_code().ok();
        }
        let status = head.status.unwrap_or(0);
        match disposition(attempt.offset, &head) {
            Disposition::Accept => {}
            Disposition::RangeIgnored => return Ok(AttemptEnd::RangeIgnored { status }),
            Disposition::HttpError => return Ok(AttemptEnd::Http(status)),
        }
    }

    Ok(AttemptEnd::Completed {
        bytes_written: written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::headers::ContentRange;

    fn head(status: u32, range_start: Option<u64>) -> ResponseHead {
        ResponseHead {
            status: Some(status),
            content_length: None,
            content_range: range_start.map(|start| ContentRange {
                start,
                end: start + 9,
                total: Some(start + 10),
            }),
        }
    }

    #[test]
    fn fresh_request_accepts_any_2xx() {
        assert_eq!(disposition(0, &head(200, None)), Disposition::Accept);
        assert_eq!(disposition(0, &head(206, Some(0))), Disposition::Accept);
        assert_eq!(disposition(0, &head(404, None)), Disposition::HttpError);
        assert_eq!(disposition(0, &head(500, None)), Disposition::HttpError);
    }

    #[test]
    fn ranged_request_requires_206_at_offset() {
        assert_eq!(disposition(100, &head(206, Some(100))), Disposition::Accept);
        assert_eq!(disposition(100, &head(206, None)), Disposition::Accept);
        assert_eq!(disposition(100, &head(200, None)), Disposition::RangeIgnored);
        assert_eq!(disposition(100, &head(206, Some(0))), Disposition::RangeIgnored);
        assert_eq!(disposition(100, &head(416, None)), Disposition::RangeIgnored);
    }

    #[test]
    fn progress_total_falls_back_to_metadata_size() {
        assert_eq!(progress_total(&head(206, Some(100)), Some(5)), Some(110));
        assert_eq!(progress_total(&head(206, None), Some(500_000)), Some(500_000));
        assert_eq!(progress_total(&head(206, None), None), None);
    }

    #[test]
    fn open_partial_appends_or_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x.mp4.tmp");
        std::fs::write(&p, b"abc").unwrap();

        let mut f = open_partial(&p, true, 4).unwrap();
        f.write_all(b"def").unwrap();
        close_partial(Some(f)).unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"abcdef");

        let mut f = open_partial(&p, false, 4).unwrap();
        f.write_all(b"z").unwrap();
        close_partial(Some(f)).unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"z");
    }
}
