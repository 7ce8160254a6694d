//! Media-service interface: turning a stored task id into something fetchable.
//!
//! The driver only depends on `MediaService` and does not know about Plex.
//! Implementations must hand back an absolute, server-bound locator so the
//! fetcher never has to guess a scheme or host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend server a job is bound to (Plex `clientIdentifier`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerIdentity(pub String);

impl ServerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Auth header applied to media requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub header: String,
    pub value: String,
}

impl Credential {
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: value.into(),
        }
    }

    /// `"Name: value"` line for a curl header list.
    pub fn header_line(&self) -> String {
        format!("{}: {}", self.header.trim(), self.value.trim())
    }
}

// Tokens end up in logs otherwise.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Metadata used to build the output filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeMeta {
    pub show_title: String,
    pub season: u32,
    pub episode: u32,
    pub title: String,
}

/// One downloadable stream of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    /// Absolute URL of the byte stream.
    pub locator: String,
    /// Container/extension reported by the server (e.g. "mkv").
    pub container: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    pub meta: EpisodeMeta,
    /// First part of every media version, in server order.
    pub parts: Vec<MediaPart>,
}

impl Episode {
    /// Only the first stream is downloaded.
    pub fn primary_part(&self) -> Option<&MediaPart> {
        self.parts.first()
    }
}

/// Typed result of looking an id up on a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItem {
    Episode(Episode),
    Other { kind: String, title: String },
}

impl MediaItem {
    pub fn into_episode(self) -> Result<Episode, ResolveError> {
        match self {
            MediaItem::Episode(ep) => Ok(ep),
            MediaItem::Other { kind, title } => Err(ResolveError::NotAnEpisode { kind, title }),
        }
    }
}

/// What the fetcher needs for one task.
#[derive(Debug, Clone)]
pub struct ResolvedEpisode {
    pub episode: Episode,
    pub credential: Credential,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("item {id} not found on server {server}")]
    NotFound { id: String, server: ServerIdentity },
    #[error("item '{title}' is a {kind}, not an episode")]
    NotAnEpisode { kind: String, title: String },
    #[error("server {0} is not reachable from this account")]
    ServerUnavailable(ServerIdentity),
    #[error("media service error: {0}")]
    Api(String),
}

/// Media-service client as seen by the driver.
pub trait MediaService {
    fn resolve(&self, server: &ServerIdentity, id: &str) -> Result<ResolvedEpisode, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_items_are_rejected_before_fetch() {
        let item = MediaItem::Other {
            kind: "movie".to_string(),
            title: "Heat".to_string(),
        };
        let err = item.into_episode().unwrap_err();
        assert!(matches!(err, ResolveError::NotAnEpisode { .. }));
        assert_eq!(err.to_string(), "item 'Heat' is a movie, not an episode");
    }

    #[test]
    fn primary_part_is_first_stream() {
        let ep = Episode {
            id: "1".to_string(),
            meta: EpisodeMeta::default(),
            parts: vec![
                MediaPart {
                    locator: "http://a/1".to_string(),
                    container: Some("mkv".to_string()),
                    size: None,
                },
                MediaPart {
                    locator: "http://a/2".to_string(),
                    container: None,
                    size: None,
                },
            ],
        };
        assert_eq!(ep.primary_part().unwrap().locator, "http://a/1");
    }

    #[test]
    fn credential_debug_hides_value() {
        let c = Credential::new("X-Plex-Token", "secret");
        assert_eq!(c.header_line(), "X-Plex-Token: secret");
        assert!(!format!("{:?}", c).contains("secret"));
    }
}
