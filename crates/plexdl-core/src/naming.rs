//! Output filenames for episodes and the partial/final file pair.

use std::path::{Path, PathBuf};

use crate::media::EpisodeMeta;

/// Suffix of the in-progress file; its absence plus a final file means "done".
pub const PARTIAL_SUFFIX: &str = ".tmp";

/// Extension used when the server does not report a container.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Replaces every character outside `[alnum, space, . _ - ' ( )]` with `_`,
/// one for one (no collapsing, no trimming).
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-' | '\'' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `"<show> - S<ss>E<ee>[ - <title>].<ext>"` with show and title sanitized.
pub fn episode_file_name(meta: &EpisodeMeta, extension: &str) -> String {
    let show = safe_filename(&meta.show_title);
    let title = safe_filename(&meta.title);
    let ext = sanitize_extension(extension);
    if title.is_empty() {
        format!("{} - S{:02}E{:02}.{}", show, meta.season, meta.episode, ext)
    } else {
        format!(
            "{} - S{:02}E{:02} - {}.{}",
            show, meta.season, meta.episode, title, ext
        )
    }
}

fn sanitize_extension(extension: &str) -> String {
    let ext: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Path of the partial file: appends `.tmp` to the final path (`a.mp4` -> `a.mp4.tmp`).
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PARTIAL_SUFFIX);
    PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(show: &str, season: u32, episode: u32, title: &str) -> EpisodeMeta {
        EpisodeMeta {
            show_title: show.to_string(),
            season,
            episode,
            title: title.to_string(),
        }
    }

    #[test]
    fn replaces_each_disallowed_char() {
        assert_eq!(safe_filename("Part 1: A/B?"), "Part 1_ A_B_");
        assert_eq!(safe_filename("a//b"), "a__b");
        assert_eq!(safe_filename("It's (Not) 1.5_x-y"), "It's (Not) 1.5_x-y");
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(safe_filename("Café Señor"), "Café Señor");
    }

    #[test]
    fn full_episode_name() {
        let m = meta("My Show!", 1, 3, "Part 1: A/B?");
        assert_eq!(
            episode_file_name(&m, "mp4"),
            "My Show_ - S01E03 - Part 1_ A_B_.mp4"
        );
    }

    #[test]
    fn untitled_episode_drops_title_segment() {
        let m = meta("Show", 12, 104, "");
        assert_eq!(episode_file_name(&m, "mkv"), "Show - S12E104.mkv");
    }

    #[test]
    fn extension_is_cleaned_or_defaulted() {
        let m = meta("Show", 1, 1, "Pilot");
        assert_eq!(episode_file_name(&m, ".MKV"), "Show - S01E01 - Pilot.mkv");
        assert_eq!(episode_file_name(&m, ""), "Show - S01E01 - Pilot.mp4");
        assert_eq!(episode_file_name(&m, "../"), "Show - S01E01 - Pilot.mp4");
    }

    #[test]
    fn partial_path_appends_tmp() {
        let p = partial_path(Path::new("/tmp/Show - S01E01.mp4"));
        assert_eq!(p.to_string_lossy(), "/tmp/Show - S01E01.mp4.tmp");
    }
}
