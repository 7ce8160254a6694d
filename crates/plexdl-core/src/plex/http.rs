//! Small JSON GET helper over a curl easy handle.

use serde::de::DeserializeOwned;
use std::time::Duration;

use super::PlexError;

/// Status and raw body of a completed GET.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client-side settings shared by every API call.
#[derive(Clone)]
pub(crate) struct ApiHeaders {
    pub token: String,
    pub client_identifier: String,
}

impl std::fmt::Debug for ApiHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHeaders")
            .field("token", &"<redacted>")
            .field("client_identifier", &self.client_identifier)
            .finish()
    }
}

impl ApiHeaders {
    fn lines(&self) -> Vec<String> {
        vec![
            "Accept: application/json".to_string(),
            format!("{}: {}", super::TOKEN_HEADER, self.token.trim()),
            format!("X-Plex-Client-Identifier: {}", self.client_identifier.trim()),
            format!("X-Plex-Product: {}", super::PRODUCT),
            format!("X-Plex-Version: {}", env!("CARGO_PKG_VERSION")),
        ]
    }
}

/// Performs a GET and buffers the whole body. Runs in the current thread.
pub(crate) fn get(
    url: &str,
    headers: &ApiHeaders,
    timeout: Duration,
) -> Result<HttpResponse, PlexError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout * 4)?;

    let mut list = curl::easy::List::new();
    for line in headers.lines() {
        list.append(&line)?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(HttpResponse { status, body })
}

/// GET `url` and decode a 2xx JSON body; other statuses become `PlexError::Http`.
pub(crate) fn get_json<T: DeserializeOwned>(
    url: &str,
    headers: &ApiHeaders,
    timeout: Duration,
) -> Result<T, PlexError> {
    let resp = get(url, headers, timeout)?;
    if resp.status == 404 {
        return Err(PlexError::NotFound(redact(url)));
    }
    if !resp.is_success() {
        return Err(PlexError::Http {
            status: resp.status,
            url: redact(url),
        });
    }
    Ok(serde_json::from_slice(&resp.body)?)
}

/// Strip the query string so tokens passed as parameters never reach logs.
pub(crate) fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?…", base),
        None => url.to_string(),
    }
}
