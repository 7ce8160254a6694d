//! Interactive job creation: server, library, show, then which episodes.

use anyhow::Result;
use plexdl_core::ledger::{Job, SequenceHints, Task};
use plexdl_core::plex::model::Metadata;
use plexdl_core::plex::{PlexAccount, PlexServer};
use std::io::{BufRead, Write};
use std::path::Path;

use super::prompt::{parse_season_ranges, Prompter};

/// What to take from the chosen show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    AllEpisodes,
    OneSeason,
    SomeSeasons,
    OneEpisode,
}

impl Scope {
    fn from_choice(n: usize) -> Self {
        match n {
            1 => Scope::AllEpisodes,
            2 => Scope::OneSeason,
            3 => Scope::SomeSeasons,
            _ => Scope::OneEpisode,
        }
    }
}

/// Walks the menus and returns the new job plus the connected server, or
/// `None` when there is nothing to pick at some step.
pub fn create_job<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    account: &PlexAccount,
    default_dir: &Path,
) -> Result<Option<(Job, PlexServer)>> {
    let resources = account.shared_servers()?;
    if resources.is_empty() {
        p.say("No shared servers found in your Plex account.")?;
        return Ok(None);
    }
    let i = p.pick("Select a shared server:", &resources, |r| r.name.clone())?;
    let server = account.connect(&resources[i])?;

    let sections = server.show_sections()?;
    if sections.is_empty() {
        p.say("No TV Show libraries found on this server.")?;
        return Ok(None);
    }
    let section = &sections[p.pick("Select a TV library:", &sections, |s| s.title.clone())?];

    let shows = server.section_items(&section.key)?;
    if shows.is_empty() {
        p.say("No shows found in this library.")?;
        return Ok(None);
    }
    let show = &shows[p.pick("Select a show to download episodes from:", &shows, |s| {
        s.title.clone()
    })?];

    p.say("\nDownload options:")?;
    p.say("  1. All episodes")?;
    p.say("  2. A single season")?;
    p.say("  3. Multiple seasons (comma/range, e.g. '1,2,4-6')")?;
    p.say("  4. A single episode")?;
    let scope = Scope::from_choice(p.int_in_range("Enter choice [1-4]: ", 1, 4)?);

    let episodes = pick_episodes(p, &server, show, scope)?;
    if episodes.is_empty() {
        p.say("No episodes selected.")?;
        return Ok(None);
    }

    let default = default_dir.to_string_lossy();
    let folder = p.ask_or(
        &format!("\nEnter the folder to save downloads (default '{}'): ", default),
        &default,
    )?;

    let job = Job::create(tasks_from_episodes(&episodes), folder, server.identity().clone())
        .with_labels(server.name(), &section.title, &show.title);
    p.say(&format!("Created new job with {} episode(s).", job.tasks.len()))?;
    Ok(Some((job, server)))
}

/// Episodes of `show` covered by `scope`; empty when nothing was chosen.
fn pick_episodes<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    server: &PlexServer,
    show: &Metadata,
    scope: Scope,
) -> Result<Vec<Metadata>> {
    let title = |s: &Metadata| s.title.clone();
    match scope {
        Scope::AllEpisodes => Ok(server.all_episodes(&show.rating_key)?),
        Scope::OneSeason => {
            let Some(seasons) = seasons_of(p, server, show)? else {
                return Ok(Vec::new());
            };
            let season = &seasons[p.pick("Select a season:", &seasons, title)?];
            Ok(server.children(&season.rating_key)?)
        }
        Scope::SomeSeasons => {
            let Some(seasons) = seasons_of(p, server, show)? else {
                return Ok(Vec::new());
            };
            p.say("\nSeasons:")?;
            for (i, s) in seasons.iter().enumerate() {
                p.say(&format!("  {}. {}", i + 1, s.title))?;
            }
            let raw = p.ask("Enter season numbers or ranges (e.g. '1,2,4-6'): ")?;
            let chosen = parse_season_ranges(&raw, seasons.len());
            if chosen.is_empty() {
                p.say("No valid seasons selected.")?;
            }
            let mut episodes = Vec::new();
            for n in chosen {
                episodes.extend(server.children(&seasons[n - 1].rating_key)?);
            }
            Ok(episodes)
        }
        Scope::OneEpisode => {
            let Some(seasons) = seasons_of(p, server, show)? else {
                return Ok(Vec::new());
            };
            let season = &seasons[p.pick("Select a season:", &seasons, title)?];
            let episodes = server.children(&season.rating_key)?;
            if episodes.is_empty() {
                p.say("No episodes found in that season.")?;
                return Ok(episodes);
            }
            let i = p.pick("Select an episode:", &episodes, |e| {
                format!("E{:02} - {}", e.index.unwrap_or(0), e.title)
            })?;
            Ok(vec![episodes[i].clone()])
        }
    }
}

fn seasons_of<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    server: &PlexServer,
    show: &Metadata,
) -> Result<Option<Vec<Metadata>>> {
    let seasons = server.children(&show.rating_key)?;
    if seasons.is_empty() {
        p.say("No seasons found.")?;
        return Ok(None);
    }
    Ok(Some(seasons))
}

/// One pending task per episode, in server order.
fn tasks_from_episodes(episodes: &[Metadata]) -> Vec<Task> {
    episodes
        .iter()
        .map(|e| {
            Task::new(
                e.rating_key.clone(),
                e.title.clone(),
                SequenceHints {
                    season: e.parent_index.unwrap_or(0),
                    episode: e.index.unwrap_or(0),
                },
            )
        })
        .collect()
}
