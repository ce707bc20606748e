use serde::{Deserialize, Serialize};

use crate::namespace::collision::CollisionResolver;
use crate::namespace::index::Entry;
use crate::namespace::path::{basename, trim_real, ROOT};

/// How real paths are placed into the virtual namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
pub enum ProjectionStrategy {
    /// Every file appears at its own real path.
    #[default]
    #[value(name = "copy")]
    #[serde(rename = "copy")]
    Identity,
    /// Every file appears in the root under its basename; repeats are renamed.
    #[value(name = "flat")]
    #[serde(rename = "flat")]
    Flatten,
    /// The longest directory prefix shared by all files is removed.
    #[value(name = "common")]
    #[serde(rename = "common")]
    CommonPrefixTrim,
}

impl std::fmt::Display for ProjectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionStrategy::Identity => write!(f, "copy"),
            ProjectionStrategy::Flatten => write!(f, "flat"),
            ProjectionStrategy::CommonPrefixTrim => write!(f, "common"),
        }
    }
}

impl ProjectionStrategy {
    /// Map real paths to entries. The output preserves input order and is
    /// deterministic for a given input sequence.
    pub fn project<S: AsRef<str>>(&self, real_paths: &[S]) -> Vec<Entry> {
        let reals: Vec<String> = real_paths.iter().map(|p| trim_real(p.as_ref())).collect();

        let virtuals: Vec<String> = match self {
            ProjectionStrategy::Identity => reals.clone(),
            ProjectionStrategy::Flatten => {
                let flat: Vec<String> = reals
                    .iter()
                    .map(|r| format!("{}{}", ROOT, basename(r)))
                    .collect();
                CollisionResolver::resolve(&flat)
            }
            ProjectionStrategy::CommonPrefixTrim => {
                let prefix = longest_common_dir(&reals);
                tracing::debug!("longest common prefix: {:?}", prefix);
                let prefix_len = prefix.len();
                reals.iter().map(|r| r[prefix_len..].to_string()).collect()
            }
        };

        reals
            .into_iter()
            .zip(virtuals)
            .map(|(real, virt)| Entry::new(virt, real))
            .collect()
    }
}

/// The longest prefix shared by every path that ends just before a `/`.
/// Unlike a plain string prefix this never cuts a name in half.
fn longest_common_dir(paths: &[String]) -> &str {
    let Some(first) = paths.first() else {
        return "";
    };

    let mut common = first.len();
    for other in &paths[1..] {
        common = first
            .char_indices()
            .zip(other.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(common);
    }

    let prefix = &first[..common];
    match prefix.rfind('/') {
        Some(i) => &prefix[..i],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn virtuals(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.virtual_path()).collect()
    }

    #[test]
    fn test_identity_keeps_real_paths() {
        let entries = ProjectionStrategy::Identity.project(&["/bin/bash", "/usr/bin/tcsh/"]);
        assert_eq!(virtuals(&entries), vec!["/bin/bash", "/usr/bin/tcsh"]);
        assert_eq!(entries[1].real_path(), "/usr/bin/tcsh");
    }

    #[test]
    fn test_flatten_renames_repeats_in_order() {
        let entries = ProjectionStrategy::Flatten.project(&[
            "/music/a/song.mp3",
            "/music/b/other.mp3",
            "/music/c/song.mp3",
        ]);
        assert_eq!(
            virtuals(&entries),
            vec!["/song.mp3", "/other.mp3", "/song-1.mp3"]
        );
        assert_eq!(entries[2].real_path(), "/music/c/song.mp3");
    }

    #[test]
    fn test_flatten_directory_uses_its_name() {
        let entries = ProjectionStrategy::Flatten.project(&["/home/x/music/"]);
        assert_eq!(virtuals(&entries), vec!["/music"]);
    }

    #[test]
    fn test_common_prefix_ends_at_separator() {
        let entries = ProjectionStrategy::CommonPrefixTrim.project(&["/a/b/c.txt", "/a/b/d.txt"]);
        assert_eq!(virtuals(&entries), vec!["/c.txt", "/d.txt"]);
    }

    #[test]
    fn test_common_prefix_partial_name() {
        let entries = ProjectionStrategy::CommonPrefixTrim.project(&["/a/bc/x", "/a/bd/y"]);
        assert_eq!(virtuals(&entries), vec!["/bc/x", "/bd/y"]);
    }

    #[test]
    fn test_common_prefix_single_path_yields_basename() {
        let entries = ProjectionStrategy::CommonPrefixTrim.project(&["/a/b/c.txt"]);
        assert_eq!(virtuals(&entries), vec!["/c.txt"]);
    }

    #[test]
    fn test_common_prefix_none_shared() {
        let entries = ProjectionStrategy::CommonPrefixTrim.project(&["/x/a", "/y/b"]);
        assert_eq!(virtuals(&entries), vec!["/x/a", "/y/b"]);

        let entries = ProjectionStrategy::CommonPrefixTrim.project(&["a.txt", "b.txt"]);
        assert_eq!(virtuals(&entries), vec!["/a.txt", "/b.txt"]);
    }

    #[test]
    fn test_strategy_display_matches_config_names() {
        assert_eq!(ProjectionStrategy::Identity.to_string(), "copy");
        assert_eq!(ProjectionStrategy::Flatten.to_string(), "flat");
        assert_eq!(ProjectionStrategy::CommonPrefixTrim.to_string(), "common");
    }
}
