//! Catalog and playlist storage
//!
//! The curation algorithms only talk to storage through the two traits
//! below. `MemoryLibrary` keeps everything in process (tests, small
//! catalogs); `SqliteLibrary` is the on-disk implementation used by the CLI.

pub mod import;
mod memory;
mod sqlite;

pub use memory::MemoryLibrary;
pub use sqlite::SqliteLibrary;

use crate::model::{Playlist, PlaylistId, Track, TrackId};
use crate::query::Predicate;
use anyhow::Result;

/// Read access to the track catalog
pub trait Catalog {
    /// Tracks matching `predicate`, distinct by id, in storage order
    fn query(&self, predicate: &Predicate) -> Result<Vec<Track>>;

    /// Look up a single track
    fn track(&self, id: &TrackId) -> Result<Option<Track>>;

    /// Total number of tracks in the catalog
    fn track_count(&self) -> Result<usize>;
}

/// Durable storage for playlists and their memberships
pub trait PlaylistStore {
    /// Persist the playlist and all of its memberships in one commit
    ///
    /// Assigns `playlist.id` on first save. Implementations must refuse to
    /// persist positions that are not a permutation of 1..=N.
    fn save_playlist(&mut self, playlist: &mut Playlist) -> Result<PlaylistId>;

    fn load_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>>;

    /// Most recently saved playlist with this name
    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>>;

    /// Ids and names of all stored playlists
    fn list_playlists(&self) -> Result<Vec<(PlaylistId, String)>>;

    /// Returns whether a playlist was removed
    fn delete_playlist(&mut self, id: PlaylistId) -> Result<bool>;
}
