//! Error types for playlist curation

use crate::model::TrackId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    /// Nothing in the catalog matched, even after full relaxation
    #[error("couldn't satisfy query for tags {tags:?}")]
    Unsatisfiable { tags: Vec<String> },

    #[error("track {0} is not in the playlist")]
    TrackNotInPlaylist(TrackId),

    /// Averages are undefined for a playlist with no members
    #[error("playlist has no members")]
    EmptyPlaylist,

    #[error("playlist positions are not a permutation of 1..={len}")]
    BrokenPositions { len: usize },

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("unknown genre: {0}")]
    UnknownGenre(String),

    /// Catalog or storage failure, propagated unchanged
    #[error(transparent)]
    Catalog(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CurateError>;
