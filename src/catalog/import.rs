//! Catalog import from JSON
//!
//! Expects a JSON array of track objects:
//!
//! ```json
//! [{"id": "1", "title": "Song", "artist": "Band", "genre": "rock",
//!   "acousticness": 0.1, "danceability": 0.7, "energy": 0.8,
//!   "instrumentalness": 0.0, "liveness": 0.2, "speechiness": 0.05,
//!   "tempo": 128.0, "valence": 0.6}]
//! ```

use crate::model::Track;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read every track from a JSON catalog file
pub fn read_tracks(path: &Path) -> Result<Vec<Track>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open catalog file: {:?}", path))?;
    let tracks = parse_tracks(BufReader::new(file))
        .with_context(|| format!("Failed to parse catalog file: {:?}", path))?;

    log::info!("Read {} tracks from {:?}", tracks.len(), path);
    Ok(tracks)
}

pub fn parse_tracks<R: Read>(reader: R) -> Result<Vec<Track>> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature, Genre};
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": "1", "title": "First", "artist": "Band", "genre": "rock",
         "acousticness": 0.1, "danceability": 0.7, "energy": 0.8,
         "instrumentalness": 0.0, "liveness": 0.2, "speechiness": 0.05,
         "tempo": 128.0, "valence": 0.6},
        {"id": "2", "title": "Second", "genre": "jazz",
         "acousticness": 0.9, "danceability": 0.3, "energy": 0.2,
         "instrumentalness": 0.8, "liveness": 0.1, "speechiness": 0.03,
         "tempo": 95.5, "valence": 0.3}
    ]"#;

    #[test]
    fn test_parse_tracks() {
        let tracks = parse_tracks(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].genre, Genre::Rock);
        assert_eq!(tracks[0].feature(Feature::Tempo), 128.0);
        assert_eq!(tracks[1].artist, "");
        assert_eq!(tracks[1].feature(Feature::Instrumentalness), 0.8);
    }

    #[test]
    fn test_unknown_genre_is_rejected() {
        let bad = SAMPLE.replace("\"jazz\"", "\"polka\"");
        assert!(parse_tracks(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_read_tracks_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let tracks = read_tracks(file.path()).unwrap();
        assert_eq!(tracks.len(), 2);
    }
}
