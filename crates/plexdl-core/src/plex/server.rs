//! One connected Plex Media Server: library browsing and item lookup.

use std::time::Duration;
use url::Url;

use super::http::{self, ApiHeaders};
use super::model::{Directory, DirectoryList, Envelope, Metadata, MetadataList};
use super::{PlexError, TOKEN_HEADER};
use crate::media::{
    Credential, MediaItem, MediaService, ResolveError, ResolvedEpisode, ServerIdentity,
};

#[derive(Debug, Clone)]
pub struct PlexServer {
    base: Url,
    identity: ServerIdentity,
    name: String,
    headers: ApiHeaders,
    timeout: Duration,
}

impl PlexServer {
    pub(crate) fn new(
        base: &str,
        identity: ServerIdentity,
        name: &str,
        headers: ApiHeaders,
        timeout: Duration,
    ) -> Result<Self, PlexError> {
        Ok(Self {
            base: Url::parse(base)?,
            identity,
            name: name.to_string(),
            headers,
            timeout,
        })
    }

    /// Server reached directly by URL and token (no plex.tv lookup).
    pub fn direct(
        base: &str,
        identity: ServerIdentity,
        token: &str,
        client_identifier: &str,
        timeout: Duration,
    ) -> Result<Self, PlexError> {
        let headers = ApiHeaders {
            token: token.to_string(),
            client_identifier: client_identifier.to_string(),
        };
        let name = identity.as_str().to_string();
        Self::new(base, identity, &name, headers, timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Header applied to media part downloads.
    pub fn credential(&self) -> Credential {
        Credential::new(TOKEN_HEADER, self.headers.token.clone())
    }

    fn url(&self, path: &str) -> Result<String, PlexError> {
        Ok(self.base.join(path)?.to_string())
    }

    fn metadata(&self, path: &str) -> Result<Vec<Metadata>, PlexError> {
        let env: Envelope<MetadataList> =
            http::get_json(&self.url(path)?, &self.headers, self.timeout)?;
        Ok(env.media_container.metadata)
    }

    /// Cheap reachability probe.
    pub fn check_identity(&self) -> Result<(), PlexError> {
        let resp = http::get(&self.url("/identity")?, &self.headers, self.timeout)?;
        if resp.is_success() {
            Ok(())
        } else {
            Err(PlexError::Http {
                status: resp.status,
                url: http::redact(&self.url("/identity")?),
            })
        }
    }

    /// Library sections of type `show`.
    pub fn show_sections(&self) -> Result<Vec<Directory>, PlexError> {
        let env: Envelope<DirectoryList> =
            http::get_json(&self.url("/library/sections")?, &self.headers, self.timeout)?;
        Ok(env
            .media_container
            .directories
            .into_iter()
            .filter(|d| d.kind == "show")
            .collect())
    }

    /// Every item in a section (shows, for a TV section).
    pub fn section_items(&self, section_key: &str) -> Result<Vec<Metadata>, PlexError> {
        self.metadata(&format!("/library/sections/{}/all", section_key))
    }

    /// Seasons of a show, or episodes of a season.
    pub fn children(&self, rating_key: &str) -> Result<Vec<Metadata>, PlexError> {
        self.metadata(&format!("/library/metadata/{}/children", rating_key))
    }

    /// Every episode of a show, in season/episode order.
    pub fn all_episodes(&self, show_key: &str) -> Result<Vec<Metadata>, PlexError> {
        self.metadata(&format!("/library/metadata/{}/allLeaves", show_key))
    }

    /// Look an item up by ratingKey and type it.
    pub fn fetch_item(&self, rating_key: &str) -> Result<MediaItem, PlexError> {
        let item = self
            .metadata(&format!("/library/metadata/{}", rating_key))?
            .into_iter()
            .next()
            .ok_or_else(|| PlexError::NotFound(format!("ratingKey {}", rating_key)))?;
        item.into_item(&self.base)
    }
}

impl MediaService for PlexServer {
    fn resolve(&self, server: &ServerIdentity, id: &str) -> Result<ResolvedEpisode, ResolveError> {
        if server != &self.identity {
            return Err(ResolveError::ServerUnavailable(server.clone()));
        }
        let item = self.fetch_item(id).map_err(|e| match e {
            PlexError::NotFound(_) => ResolveError::NotFound {
                id: id.to_string(),
                server: server.clone(),
            },
            other => ResolveError::Api(other.to_string()),
        })?;
        Ok(ResolvedEpisode {
            episode: item.into_episode()?,
            credential: self.credential(),
        })
    }
}
