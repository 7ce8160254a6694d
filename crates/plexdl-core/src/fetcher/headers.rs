//! Parse HTTP response header lines of the final response (after redirects).

/// Parsed `Content-Range: bytes <start>-<end>/<total>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` for `*` (total unknown).
    pub total: Option<u64>,
}

/// Status and size headers of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
    pub content_range: Option<ContentRange>,
}

impl ResponseHead {
    /// Feed one raw header line. A new status line starts a new response,
    /// so headers of redirect hops are discarded.
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: parse_status_line(line),
                ..ResponseHead::default()
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                self.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("content-range") {
                self.content_range = parse_content_range(value);
            }
        }
    }

    /// Full remote size: Content-Range total, else Content-Length of a 200.
    pub fn total_size(&self) -> Option<u64> {
        if let Some(total) = self.content_range.and_then(|r| r.total) {
            return Some(total);
        }
        match (self.status, self.content_length) {
            (Some(200), Some(len)) if len > 0 => Some(len),
            _ => None,
        }
    }
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

pub(crate) fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (span, total) = rest.split_once('/')?;
    let (start, end) = span.split_once('-')?;
    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse().ok()?),
    };
    Some(ContentRange {
        start: start.trim().parse().ok()?,
        end: end.trim().parse().ok()?,
        total,
    })
}
