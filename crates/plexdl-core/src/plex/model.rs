//! Serde shapes of the Plex JSON API (only the fields we read).

use serde::Deserialize;
use url::Url;

use super::PlexError;
use crate::media::{Episode, EpisodeMeta, MediaItem, MediaPart};

/// Entry of `GET /api/v2/resources`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub client_identifier: String,
    /// Comma-separated roles, e.g. "server" or "client,player".
    #[serde(default)]
    pub provides: String,
    #[serde(default)]
    pub owned: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Resource {
    pub fn is_server(&self) -> bool {
        self.provides.split(',').any(|p| p.trim() == "server")
    }

    /// Connections in the order we try them: direct remote, then local, then relay.
    pub fn ordered_connections(&self) -> Vec<&Connection> {
        let mut conns: Vec<&Connection> = self.connections.iter().collect();
        conns.sort_by_key(|c| (c.relay, c.local));
        conns
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    pub uri: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub relay: bool,
}

/// `{"MediaContainer": {...}}` wrapper of every library response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectoryList {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<Directory>,
}

/// Library section.
#[derive(Debug, Clone, Deserialize)]
pub struct Directory {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetadataList {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Metadata>,
}

/// Show, season, episode or anything else in a library.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub parent_index: Option<u32>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(rename = "Media", default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub container: Option<String>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Part {
    /// Server-relative path, e.g. `/library/parts/1699/1513/file.mkv`.
    pub key: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Metadata {
    /// Typed view; part keys are joined onto `base` so locators are absolute.
    pub fn into_item(self, base: &Url) -> Result<MediaItem, PlexError> {
        if self.kind != "episode" {
            return Ok(MediaItem::Other {
                kind: self.kind,
                title: self.title,
            });
        }
        let mut parts = Vec::new();
        for media in &self.media {
            let Some(part) = media.parts.first() else {
                continue;
            };
            parts.push(MediaPart {
                locator: base.join(&part.key)?.to_string(),
                container: part.container.clone().or_else(|| media.container.clone()),
                size: part.size,
            });
        }
        Ok(MediaItem::Episode(Episode {
            id: self.rating_key,
            meta: EpisodeMeta {
                show_title: self.grandparent_title.unwrap_or_default(),
                season: self.parent_index.unwrap_or(0),
                episode: self.index.unwrap_or(0),
                title: self.title,
            },
            parts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPISODE_JSON: &str = r#"{
        "MediaContainer": {
            "size": 1,
            "Metadata": [{
                "ratingKey": "4242",
                "type": "episode",
                "title": "Part 1: A/B?",
                "grandparentTitle": "My Show!",
                "parentIndex": 1,
                "index": 3,
                "Media": [
                    {"container": "mkv", "Part": [
                        {"key": "/library/parts/9/1/file.mkv", "size": 500000}
                    ]},
                    {"container": "mp4", "Part": [{"key": "/library/parts/10/1/file.mp4"}]}
                ]
            }]
        }
    }"#;

    #[test]
    fn episode_metadata_becomes_typed_episode() {
        let env: Envelope<MetadataList> = serde_json::from_str(EPISODE_JSON).unwrap();
        let meta = env.media_container.metadata.into_iter().next().unwrap();
        let base = Url::parse("https://10-0-0-2.abc.plex.direct:32400").unwrap();
        let ep = meta.into_item(&base).unwrap().into_episode().unwrap();
        assert_eq!(ep.id, "4242");
        assert_eq!(ep.meta.show_title, "My Show!");
        assert_eq!((ep.meta.season, ep.meta.episode), (1, 3));
        assert_eq!(ep.parts.len(), 2);
        let first = ep.primary_part().unwrap();
        assert_eq!(
            first.locator,
            "https://10-0-0-2.abc.plex.direct:32400/library/parts/9/1/file.mkv"
        );
        assert_eq!(first.container.as_deref(), Some("mkv"));
        assert_eq!(first.size, Some(500000));
    }

    #[test]
    fn non_episode_is_other() {
        let json = r#"{"ratingKey": "1", "type": "movie", "title": "Heat"}"#;
        let meta: Metadata = serde_json::from_str(json).unwrap();
        let base = Url::parse("http://127.0.0.1:32400").unwrap();
        assert_eq!(
            meta.into_item(&base).unwrap(),
            MediaItem::Other {
                kind: "movie".into(),
                title: "Heat".into()
            }
        );
    }

    #[test]
    fn resource_roles_and_connection_order() {
        let json = r#"[{
            "name": "Friend",
            "clientIdentifier": "abc",
            "provides": "server",
            "owned": false,
            "accessToken": "shared-token",
            "connections": [
                {"uri": "https://relay.plex.direct:8443", "local": false, "relay": true},
                {"uri": "https://192-168-1-5.abc.plex.direct:32400", "local": true, "relay": false},
                {"uri": "https://81-2-3-4.abc.plex.direct:32400", "local": false, "relay": false}
            ]
        }, {
            "name": "Phone",
            "clientIdentifier": "def",
            "provides": "client,player"
        }]"#;
        let resources: Vec<Resource> = serde_json::from_str(json).unwrap();
        assert!(resources[0].is_server());
        assert!(!resources[1].is_server());
        let uris: Vec<_> = resources[0]
            .ordered_connections()
            .into_iter()
            .map(|c| c.uri.as_str())
            .collect();
        assert_eq!(
            uris,
            [
                "https://81-2-3-4.abc.plex.direct:32400",
                "https://192-168-1-5.abc.plex.direct:32400",
                "https://relay.plex.direct:8443"
            ]
        );
    }

    #[test]
    fn empty_container_has_no_metadata() {
        let env: Envelope<MetadataList> =
            serde_json::from_str(r#"{"MediaContainer": {"size": 0}}"#).unwrap();
        assert!(env.media_container.metadata.is_empty());
    }
}
