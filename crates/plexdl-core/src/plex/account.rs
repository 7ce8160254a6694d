//! plex.tv account: which servers the token can see, and connecting to one.

use std::time::Duration;

use super::http::{self, ApiHeaders};
use super::model::Resource;
use super::{PlexError, PlexServer, RESOURCES_URL};
use crate::media::ServerIdentity;

/// Account handle built from a token. No login handshake happens here.
#[derive(Debug, Clone)]
pub struct PlexAccount {
    headers: ApiHeaders,
    timeout: Duration,
}

impl PlexAccount {
    pub fn new(token: &str, client_identifier: &str, timeout: Duration) -> Self {
        Self {
            headers: ApiHeaders {
                token: token.to_string(),
                client_identifier: client_identifier.to_string(),
            },
            timeout,
        }
    }

    /// Every resource (servers, players) visible to this account.
    pub fn resources(&self) -> Result<Vec<Resource>, PlexError> {
        http::get_json(RESOURCES_URL, &self.headers, self.timeout)
    }

    /// Servers shared with this account (not owned by it).
    pub fn shared_servers(&self) -> Result<Vec<Resource>, PlexError> {
        Ok(self
            .resources()?
            .into_iter()
            .filter(|r| r.is_server() && !r.owned)
            .collect())
    }

    /// Try the resource's connections in order; the first one answering
    /// `/identity` becomes the server's base URL.
    pub fn connect(&self, resource: &Resource) -> Result<PlexServer, PlexError> {
        let token = resource
            .access_token
            .clone()
            .unwrap_or_else(|| self.headers.token.clone());
        for conn in resource.ordered_connections() {
            let server = PlexServer::new(
                &conn.uri,
                ServerIdentity::new(&resource.client_identifier),
                &resource.name,
                ApiHeaders {
                    token: token.clone(),
                    client_identifier: self.headers.client_identifier.clone(),
                },
                self.timeout,
            )?;
            match server.check_identity() {
                Ok(()) => {
                    tracing::info!("connected to '{}' via {}", resource.name, server.base_url());
                    return Ok(server);
                }
                Err(e) => {
                    tracing::debug!(
                        "connection {} for '{}' failed: {}",
                        conn.uri,
                        resource.name,
                        e
                    );
                }
            }
        }
        Err(PlexError::NoConnection(resource.name.clone()))
    }

    /// Re-bind to the server a job was created against.
    pub fn find_server(&self, id: &ServerIdentity) -> Result<Option<PlexServer>, PlexError> {
        let resource = self
            .resources()?
            .into_iter()
            .find(|r| r.is_server() && r.client_identifier == id.as_str());
        match resource {
            Some(r) => self.connect(&r).map(Some),
            None => Ok(None),
        }
    }
}
