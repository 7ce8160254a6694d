pub mod config;
pub mod logging;

pub mod control;
pub mod driver;
pub mod fetcher;
pub mod ledger;
pub mod media;
pub mod naming;
pub mod plex;
pub mod progress;
