//! Data model for tracks and playlists
//!
//! Tracks come from the catalog and are never mutated here. Playlists own
//! their ordered memberships and every positional operation on them.

mod playlist;
mod track;

pub use playlist::{Distribution, Membership, Playlist, PlaylistId, PlaylistSummary};
pub use track::{Direction, Feature, Features, Genre, Track, TrackId};
