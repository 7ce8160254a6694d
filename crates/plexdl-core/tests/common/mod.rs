#![allow(dead_code)]

pub mod json_server;
pub mod range_server;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use plexdl_core::ledger::{Job, JsonLedger, LedgerError, LedgerStore};
use plexdl_core::media::{
    Credential, Episode, EpisodeMeta, MediaPart, MediaService, ResolveError, ResolvedEpisode,
    ServerIdentity,
};
use plexdl_core::progress::{FetchEvent, Observer};
use plexdl_core::control::CancelToken;

/// Deterministic body of `len` bytes.
pub fn body(len: usize) -> Vec<u8> {
    (0u8..=250).cycle().take(len).collect()
}

pub fn credential() -> Credential {
    Credential::new("X-Plex-Token", "test-token")
}

pub fn episode(id: &str, number: u32, url: &str) -> ResolvedEpisode {
    ResolvedEpisode {
        episode: Episode {
            id: id.to_string(),
            meta: EpisodeMeta {
                show_title: "Show".to_string(),
                season: 1,
                episode: number,
                title: format!("Ep {}", number),
            },
            parts: vec![MediaPart {
                locator: url.to_string(),
                container: Some("mkv".to_string()),
                size: None,
            }],
        },
        credential: credential(),
    }
}

/// Filename the fetcher picks for `episode(_, number, _)`.
pub fn episode_file(number: u32) -> String {
    format!("Show - S01E{:02} - Ep {}.mkv", number, number)
}

/// Media service backed by a fixed id → episode table.
pub struct MapService {
    pub server: ServerIdentity,
    pub items: HashMap<String, ResolvedEpisode>,
    pub calls: RefCell<Vec<String>>,
}

impl MapService {
    pub fn new(server: &str) -> Self {
        Self {
            server: ServerIdentity::new(server),
            items: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with(mut self, item: ResolvedEpisode) -> Self {
        self.items.insert(item.episode.id.clone(), item);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl MediaService for MapService {
    fn resolve(&self, server: &ServerIdentity, id: &str) -> Result<ResolvedEpisode, ResolveError> {
        self.calls.borrow_mut().push(id.to_string());
        if server != &self.server {
            return Err(ResolveError::ServerUnavailable(server.clone()));
        }
        self.items.get(id).cloned().ok_or_else(|| ResolveError::NotFound {
            id: id.to_string(),
            server: server.clone(),
        })
    }
}

/// JSON ledger that counts saves.
pub struct CountingLedger {
    pub inner: JsonLedger,
    pub saves: Cell<usize>,
}

impl CountingLedger {
    pub fn new(inner: JsonLedger) -> Self {
        Self {
            inner,
            saves: Cell::new(0),
        }
    }
}

impl LedgerStore for CountingLedger {
    fn load(&self) -> Result<Option<Job>, LedgerError> {
        self.inner.load()
    }

    fn save(&self, job: &Job) -> Result<(), LedgerError> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save(job)
    }

    fn discard(&self) -> Result<(), LedgerError> {
        self.inner.discard()
    }
}

/// Simulates Ctrl+C as soon as `file_name` has received its first bytes.
pub struct CancelOnProgress {
    pub token: CancelToken,
    pub file_name: String,
}

impl Observer for CancelOnProgress {
    fn on_fetch(&mut self, event: FetchEvent<'_>) {
        if let FetchEvent::Progress { file_name, .. } = event {
            if file_name == self.file_name {
                self.token.cancel();
            }
        }
    }
}
