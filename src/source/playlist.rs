use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::PathBuf;
use url::Url;

use crate::error::{MapperError, Result};
use crate::source::PathSource;

/// One named playlist inside a Rhythmbox `playlists.xml` file.
#[derive(Debug, Clone)]
pub struct PlaylistSource {
    file: PathBuf,
    name: String,
}

impl PlaylistSource {
    pub fn new(file: PathBuf, name: String) -> Self {
        PlaylistSource { file, name }
    }
}

impl PathSource for PlaylistSource {
    fn real_paths(&self) -> Result<Vec<String>> {
        let xml = std::fs::read_to_string(&self.file).map_err(|source| MapperError::Input {
            path: self.file.clone(),
            source,
        })?;
        playlist_files(&xml, &self.name)
    }

    fn watch_paths(&self) -> Vec<PathBuf> {
        vec![self.file.clone()]
    }
}

/// Local file paths of the top-level `<playlist name="...">` element whose
/// name matches, taken from its `<location>` URLs in document order.
pub fn playlist_files(xml: &str, playlist_name: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut found = false;
    let mut in_playlist = false;
    let mut location: Option<String> = None;
    let mut files = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match e.name().as_ref() {
                    b"playlist" if depth == 2 => {
                        in_playlist = playlist_name_matches(&e, playlist_name)?;
                        found |= in_playlist;
                    }
                    // Only direct children of the playlist element
                    b"location" if in_playlist && depth == 3 => location = Some(String::new()),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 1
                    && e.name().as_ref() == b"playlist"
                    && playlist_name_matches(&e, playlist_name)?
                {
                    found = true;
                }
            }
            Event::Text(text) => {
                if let Some(buf) = location.as_mut() {
                    buf.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(buf) = location.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"location" => {
                        if let Some(url) = location.take() {
                            if let Some(path) = location_to_path(&url) {
                                files.push(path);
                            }
                        }
                    }
                    b"playlist" if depth == 2 => in_playlist = false,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found {
        return Err(MapperError::Playlist(format!(
            "Playlist not found: {}",
            playlist_name
        )));
    }
    Ok(files)
}

fn playlist_name_matches(e: &quick_xml::events::BytesStart<'_>, wanted: &str) -> Result<bool> {
    let Some(attr) = e.try_get_attribute("name").map_err(xml_error)? else {
        return Ok(false);
    };
    let name = attr.unescape_value().map_err(xml_error)?;
    Ok(name == wanted)
}

/// Decode a `file://` URL into a local path. Other schemes cannot be served
/// from the local filesystem and are skipped.
fn location_to_path(location: &str) -> Option<String> {
    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => Some(path.to_string_lossy().into_owned()),
            Err(()) => {
                tracing::warn!("skipping playlist location with a remote host: {}", location);
                None
            }
        },
        Ok(url) => {
            tracing::debug!("skipping non-file playlist location: {}", url);
            None
        }
        Err(_) if location.starts_with('/') => Some(location.to_string()),
        Err(e) => {
            tracing::warn!("skipping unparseable playlist location {}: {}", location, e);
            None
        }
    }
}

fn xml_error<E: std::fmt::Display>(e: E) -> MapperError {
    MapperError::Playlist(e.to_string())
}
