use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{MapperError, Result};
use crate::source::PathSource;

const STDIN_MARKER: &str = "-";

/// Extract paths from listing text: one path per line, surrounding spaces,
/// tabs and double quotes removed, lines starting with `#` or `;` ignored.
pub fn parse_listing(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_matches(|c| matches!(c, ' ' | '"' | '\t' | '\r' | '\n')))
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
        .map(str::to_string)
        .collect()
}

/// Paths read from one or more listing files, in argument order.
///
/// `-` stands for standard input. Standard input can only be read once, so
/// its lines are captured at construction and replayed on every reload.
#[derive(Debug, Clone)]
pub struct ListingSource {
    inputs: Vec<PathBuf>,
    stdin_lines: Vec<String>,
}

impl ListingSource {
    pub fn new(inputs: Vec<PathBuf>) -> Result<Self> {
        Self::with_stdin(inputs, std::io::stdin())
    }

    /// Like [`new`](Self::new) but reads `-` inputs from `reader`.
    pub fn with_stdin<R: Read>(inputs: Vec<PathBuf>, mut reader: R) -> Result<Self> {
        let stdin_lines = if inputs.iter().any(|p| is_stdin(p)) {
            let mut content = String::new();
            reader
                .read_to_string(&mut content)
                .map_err(|source| MapperError::Input {
                    path: PathBuf::from(STDIN_MARKER),
                    source,
                })?;
            parse_listing(&content)
        } else {
            Vec::new()
        };

        Ok(ListingSource {
            inputs,
            stdin_lines,
        })
    }
}

impl PathSource for ListingSource {
    fn real_paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for input in &self.inputs {
            if is_stdin(input) {
                paths.extend(self.stdin_lines.iter().cloned());
                continue;
            }
            let content = std::fs::read_to_string(input).map_err(|source| MapperError::Input {
                path: input.clone(),
                source,
            })?;
            paths.extend(parse_listing(&content));
        }
        tracing::debug!("read {} paths from {} inputs", paths.len(), self.inputs.len());
        Ok(paths)
    }

    fn watch_paths(&self) -> Vec<PathBuf> {
        self.inputs.iter().filter(|p| !is_stdin(p)).cloned().collect()
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_MARKER
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_listing_strips_quotes_and_comments() {
        let content = "\
# header comment
; another comment
\"/music/with space.mp3\"
\t/plain/path.txt
\"/trailing/dir/\"

/last";
        assert_eq!(
            parse_listing(content),
            vec![
                "/music/with space.mp3",
                "/plain/path.txt",
                "/trailing/dir/",
                "/last"
            ]
        );
    }

    #[test]
    fn test_parse_listing_comment_after_quote() {
        assert_eq!(parse_listing("\"#not-a-comment\""), Vec::<String>::new());
        assert_eq!(parse_listing("  ;x"), Vec::<String>::new());
    }

    #[test]
    fn test_listing_source_reads_files_in_order() {
        let temp_dir = tempdir().unwrap();
        let first = temp_dir.path().join("first.m3u");
        let second = temp_dir.path().join("second.m3u");
        fs::write(&first, "/a\n/b\n").unwrap();
        fs::write(&second, "/c\n").unwrap();

        let source = ListingSource::new(vec![first.clone(), second.clone()]).unwrap();
        assert_eq!(source.real_paths().unwrap(), vec!["/a", "/b", "/c"]);
        assert_eq!(source.watch_paths(), vec![first, second]);
    }

    #[test]
    fn test_listing_source_rereads_changed_file() {
        let temp_dir = tempdir().unwrap();
        let listing = temp_dir.path().join("list.txt");
        fs::write(&listing, "/a\n").unwrap();

        let source = ListingSource::new(vec![listing.clone()]).unwrap();
        assert_eq!(source.real_paths().unwrap(), vec!["/a"]);

        fs::write(&listing, "/a\n/b\n").unwrap();
        assert_eq!(source.real_paths().unwrap(), vec!["/a", "/b"]);
    }

    #[test]
    fn test_stdin_is_captured_once() {
        let temp_dir = tempdir().unwrap();
        let listing = temp_dir.path().join("list.txt");
        fs::write(&listing, "/from/file\n").unwrap();

        let source = ListingSource::with_stdin(
            vec![PathBuf::from("-"), listing.clone()],
            "/from/stdin\n# skipped\n".as_bytes(),
        )
        .unwrap();

        let expected = vec!["/from/stdin", "/from/file"];
        assert_eq!(source.real_paths().unwrap(), expected);
        assert_eq!(source.real_paths().unwrap(), expected);
        assert_eq!(source.watch_paths(), vec![listing]);
    }

    #[test]
    fn test_missing_listing_file_is_an_input_error() {
        let source = ListingSource::new(vec![PathBuf::from("/definitely/not/here.txt")]).unwrap();
        let err = source.real_paths().unwrap_err();
        assert!(matches!(err, MapperError::Input { .. }));
    }
}
