//! Plex account and server client: shared-server discovery, library browsing,
//! and `MediaService` resolution of episode ids to absolute part URLs.
//!
//! Authentication is token-only; the token comes from the config file.

mod account;
mod http;
pub mod model;
mod server;

pub use account::PlexAccount;
pub use server::PlexServer;

/// Header carrying the account or server access token.
pub const TOKEN_HEADER: &str = "X-Plex-Token";

/// Value sent as `X-Plex-Product`.
pub const PRODUCT: &str = "plexdl";

/// Account resource listing (servers, players) for the token's owner.
pub const RESOURCES_URL: &str =
    "https://clients.plex.tv/api/v2/resources?includeHttps=1&includeRelay=1";

#[derive(Debug, thiserror::Error)]
pub enum PlexError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("{url} returned HTTP {status}")]
    Http { status: u32, url: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad server URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("no reachable connection for server '{0}'")]
    NoConnection(String),
}
