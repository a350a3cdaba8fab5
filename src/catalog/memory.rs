use super::{Catalog, PlaylistStore};
use crate::model::{Membership, Playlist, PlaylistId, Track, TrackId};
use crate::query::Predicate;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Stored form of a playlist: track references, not track copies
#[derive(Debug, Clone)]
struct StoredPlaylist {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<(TrackId, u32)>,
}

/// In-memory catalog and playlist store
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    /// All tracks in insertion order
    tracks: Vec<Track>,

    /// Index into `tracks` by id
    index: HashMap<TrackId, usize>,

    playlists: BTreeMap<PlaylistId, StoredPlaylist>,
    next_playlist_id: PlaylistId,
}

impl MemoryLibrary {
    /// Create a new empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from a set of tracks
    pub fn with_tracks<I: IntoIterator<Item = Track>>(tracks: I) -> Self {
        let mut library = Self::new();
        for track in tracks {
            library.add_track(track);
        }
        library
    }

    /// Add a track, replacing any track with the same id
    pub fn add_track(&mut self, track: Track) {
        match self.index.get(&track.id) {
            Some(&i) => self.tracks[i] = track,
            None => {
                self.index.insert(track.id.clone(), self.tracks.len());
                self.tracks.push(track);
            }
        }
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Total number of playlists
    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    fn rebuild(&self, id: PlaylistId, stored: &StoredPlaylist) -> Result<Playlist> {
        let entries = stored
            .entries
            .iter()
            .map(|(track_id, position)| {
                let track = self
                    .index
                    .get(track_id)
                    .map(|&i| self.tracks[i].clone())
                    .with_context(|| format!("Playlist references missing track {}", track_id))?;
                Ok(Membership {
                    track,
                    position: *position,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Playlist::from_entries(
            id,
            stored.name.clone(),
            stored.created_at,
            entries,
        ))
    }
}

impl Catalog for MemoryLibrary {
    fn query(&self, predicate: &Predicate) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| predicate.matches(t))
            .cloned()
            .collect())
    }

    fn track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(self.index.get(id).map(|&i| self.tracks[i].clone()))
    }

    fn track_count(&self) -> Result<usize> {
        Ok(self.tracks.len())
    }
}

impl PlaylistStore for MemoryLibrary {
    fn save_playlist(&mut self, playlist: &mut Playlist) -> Result<PlaylistId> {
        playlist
            .check_positions()
            .with_context(|| format!("Refusing to save playlist {:?}", playlist.name))?;

        let id = match playlist.id {
            Some(id) => id,
            None => {
                self.next_playlist_id += 1;
                self.next_playlist_id
            }
        };

        let entries = playlist
            .memberships()
            .iter()
            .map(|m| (m.track.id.clone(), m.position))
            .collect();

        self.playlists.insert(
            id,
            StoredPlaylist {
                name: playlist.name.clone(),
                created_at: playlist.created_at,
                entries,
            },
        );
        playlist.id = Some(id);
        Ok(id)
    }

    fn load_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        self.playlists
            .get(&id)
            .map(|stored| self.rebuild(id, stored))
            .transpose()
    }

    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        self.playlists
            .iter()
            .rev()
            .find(|(_, stored)| stored.name == name)
            .map(|(&id, stored)| self.rebuild(id, stored))
            .transpose()
    }

    fn list_playlists(&self) -> Result<Vec<(PlaylistId, String)>> {
        Ok(self
            .playlists
            .iter()
            .map(|(&id, stored)| (id, stored.name.clone()))
            .collect())
    }

    fn delete_playlist(&mut self, id: PlaylistId) -> Result<bool> {
        Ok(self.playlists.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature, Features, Genre};
    use crate::query::Comparator;

    fn track(id: &str, genre: Genre, energy: f64) -> Track {
        Track {
            id: TrackId::new(id),
            title: format!("Song {}", id),
            artist: "Test Artist".to_string(),
            genre,
            features: Features {
                energy,
                ..Features::default()
            },
        }
    }

    #[test]
    fn test_library_creation() {
        let lib = MemoryLibrary::new();
        assert_eq!(lib.track_count().unwrap(), 0);
        assert_eq!(lib.playlist_count(), 0);
    }

    #[test]
    fn test_add_track_replaces_same_id() {
        let mut lib = MemoryLibrary::new();
        lib.add_track(track("a", Genre::Rock, 0.1));
        lib.add_track(track("a", Genre::Jazz, 0.9));

        assert_eq!(lib.track_count().unwrap(), 1);
        let stored = lib.track(&TrackId::new("a")).unwrap().unwrap();
        assert_eq!(stored.genre, Genre::Jazz);
    }

    #[test]
    fn test_query_keeps_storage_order() {
        let lib = MemoryLibrary::with_tracks([
            track("a", Genre::Rock, 0.9),
            track("b", Genre::Rock, 0.1),
            track("c", Genre::Pop, 0.8),
        ]);
        let found = lib
            .query(&Predicate::compare(
                Feature::Energy,
                Comparator::GreaterOrEqual,
                0.6,
            ))
            .unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_save_and_load_playlist() {
        let mut lib = MemoryLibrary::with_tracks([
            track("a", Genre::Rock, 0.9),
            track("b", Genre::Rock, 0.1),
        ]);

        let mut playlist = Playlist::new("Mine");
        playlist.add(track("a", Genre::Rock, 0.9));
        playlist.add(track("b", Genre::Rock, 0.1));
        playlist.move_to(2, 1);

        let id = lib.save_playlist(&mut playlist).unwrap();
        assert_eq!(playlist.id, Some(id));

        let loaded = lib.load_playlist(id).unwrap().unwrap();
        let order: Vec<_> = loaded.ordered_tracks().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(lib.find_playlist("Mine").unwrap().unwrap().id, Some(id));
        assert_eq!(lib.list_playlists().unwrap(), vec![(id, "Mine".to_string())]);

        assert!(lib.delete_playlist(id).unwrap());
        assert!(lib.load_playlist(id).unwrap().is_none());
    }
}
