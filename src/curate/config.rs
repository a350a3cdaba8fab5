//! Curation configuration

use crate::model::Genre;

/// Configuration for playlist generation
#[derive(Debug, Clone)]
pub struct CurateConfig {
    /// Genres that tags may name
    pub vocabulary: Vec<Genre>,

    /// Playlist length used when the caller does not ask for one
    pub default_length: usize,
}

/// Configuration for the feature optimizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeConfig {
    /// Largest share of the playlist that may be replaced (0.25 = a quarter)
    pub percent: f64,
}

impl CurateConfig {
    pub fn new() -> Self {
        Self {
            vocabulary: Genre::ALL.to_vec(),
            default_length: 20,
        }
    }

    /// Restrict the genre vocabulary
    pub fn with_vocabulary(mut self, vocabulary: Vec<Genre>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_default_length(mut self, length: usize) -> Self {
        self.default_length = length;
        self
    }
}

impl Default for CurateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizeConfig {
    pub fn new() -> Self {
        Self { percent: 0.25 }
    }

    /// Set the replacement budget as a fraction of the playlist
    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = percent;
        self
    }

    /// Number of replacements allowed for a playlist of `len` tracks
    pub fn budget(&self, len: usize) -> usize {
        (self.percent.max(0.0) * len as f64).ceil() as usize
    }
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self::new()
    }
}
