use super::track::{Direction, Feature, Genre, Track, TrackId};
use crate::error::{CurateError, Result};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Storage identifier of a saved playlist
pub type PlaylistId = i64;

/// Represents a playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// Assigned by the playlist store on first save
    pub id: Option<PlaylistId>,

    /// Playlist name
    pub name: String,

    pub created_at: DateTime<Utc>,

    /// Memberships in storage order (not position order)
    entries: Vec<Membership>,

    /// Genres requested at creation; not persisted
    #[serde(skip)]
    active_genres: Option<BTreeSet<Genre>>,
}

/// Entry in a playlist, binding a track to a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub track: Track,

    /// Position in playlist (1-based)
    pub position: u32,
}

/// How a playlist's members split around a feature's thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Name, length and feature averages of a playlist
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSummary {
    pub name: String,
    pub length: usize,
    pub averages: BTreeMap<Feature, f64>,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
            active_genres: None,
        }
    }

    /// Rebuild a playlist from stored memberships
    ///
    /// Entries are kept in the given order, which becomes the storage order.
    pub fn from_entries(
        id: PlaylistId,
        name: String,
        created_at: DateTime<Utc>,
        entries: Vec<Membership>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            created_at,
            entries,
            active_genres: None,
        }
    }

    /// Restrict the genres the optimizer may draw from
    ///
    /// An empty set means "no restriction" and falls back to every genre.
    pub fn establish_genres<I: IntoIterator<Item = Genre>>(&mut self, genres: I) {
        let genres: BTreeSet<Genre> = genres.into_iter().collect();
        self.active_genres = if genres.is_empty() { None } else { Some(genres) };
    }

    /// Active genres, defaulting to the full vocabulary
    pub fn genres(&self) -> BTreeSet<Genre> {
        match &self.active_genres {
            Some(genres) => genres.clone(),
            None => Genre::ALL.into_iter().collect(),
        }
    }

    /// Append a track at position N+1
    pub fn add(&mut self, track: Track) {
        let position = self.entries.len() as u32 + 1;
        self.entries.push(Membership { track, position });
    }

    /// Remove a track and close the gap it leaves
    pub fn delete(&mut self, track_id: &TrackId) -> Result<Membership> {
        let index = self
            .entries
            .iter()
            .position(|m| &m.track.id == track_id)
            .ok_or_else(|| CurateError::TrackNotInPlaylist(track_id.clone()))?;

        let removed = self.entries.remove(index);
        for entry in &mut self.entries {
            if entry.position > removed.position {
                entry.position -= 1;
            }
        }
        Ok(removed)
    }

    /// Move the entry at `old` to `new`, shifting the block in between by one
    ///
    /// Returns `false` (and leaves the playlist untouched) unless both
    /// positions are valid and different.
    pub fn move_to(&mut self, old: u32, new: u32) -> bool {
        if !self.valid_index(old) || !self.valid_index(new) || old == new {
            return false;
        }

        let Some(moved) = self.entries.iter().position(|m| m.position == old) else {
            return false;
        };

        for entry in &mut self.entries {
            if old > new && (new..old).contains(&entry.position) {
                entry.position += 1;
            } else if old < new && (old + 1..=new).contains(&entry.position) {
                entry.position -= 1;
            }
        }
        self.entries[moved].position = new;
        true
    }

    /// Assign a uniformly random permutation of positions
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        let mut positions: Vec<u32> = (1..=self.entries.len() as u32).collect();
        positions.shuffle(rng);
        for (entry, position) in self.entries.iter_mut().zip(positions) {
            entry.position = position;
        }
        self
    }

    pub fn valid_index(&self, position: u32) -> bool {
        position >= 1 && position as usize <= self.entries.len()
    }

    /// Memberships in ascending position order
    pub fn ordered_memberships(&self) -> impl Iterator<Item = &Membership> + Clone + '_ {
        let mut order: Vec<&Membership> = self.entries.iter().collect();
        order.sort_by_key(|m| m.position);
        order.into_iter()
    }

    /// Tracks in ascending position order
    pub fn ordered_tracks(&self) -> impl Iterator<Item = &Track> + Clone + '_ {
        self.ordered_memberships().map(|m| &m.track)
    }

    /// Memberships in storage order
    pub fn memberships(&self) -> &[Membership] {
        &self.entries
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.entries.iter().any(|m| &m.track.id == track_id)
    }

    pub fn position_of(&self, track_id: &TrackId) -> Option<u32> {
        self.entries
            .iter()
            .find(|m| &m.track.id == track_id)
            .map(|m| m.position)
    }

    /// Verify that positions form a permutation of 1..=N
    pub fn check_positions(&self) -> Result<()> {
        let len = self.entries.len();
        let mut seen = vec![false; len];
        for entry in &self.entries {
            let index = entry.position as usize;
            if index == 0 || index > len || seen[index - 1] {
                return Err(CurateError::BrokenPositions { len });
            }
            seen[index - 1] = true;
        }
        Ok(())
    }

    /// Number of tracks in this playlist
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if playlist is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean value of `feature` across all members
    pub fn average(&self, feature: Feature) -> Result<f64> {
        if self.entries.is_empty() {
            return Err(CurateError::EmptyPlaylist);
        }
        let sum: f64 = self.entries.iter().map(|m| m.track.feature(feature)).sum();
        Ok(sum / self.entries.len() as f64)
    }

    /// Averages of every feature
    pub fn averages(&self) -> Result<BTreeMap<Feature, f64>> {
        Feature::ALL
            .into_iter()
            .map(|f| self.average(f).map(|avg| (f, avg)))
            .collect()
    }

    pub fn summary(&self) -> Result<PlaylistSummary> {
        Ok(PlaylistSummary {
            name: self.name.clone(),
            length: self.len(),
            averages: self.averages()?,
        })
    }

    /// Count members above, below and between the feature's thresholds
    pub fn distribution(&self, feature: Feature) -> Distribution {
        let mut distribution = Distribution::default();
        for entry in &self.entries {
            let value = entry.track.feature(feature);
            if feature.meets(value, Direction::Increase) {
                distribution.positive += 1;
            } else if feature.meets(value, Direction::Decrease) {
                distribution.negative += 1;
            } else {
                distribution.neutral += 1;
            }
        }
        distribution
    }

    /// Whether the average of `feature` already meets its threshold
    pub fn is_sufficient(&self, feature: Feature, direction: Direction) -> Result<bool> {
        Ok(feature.meets(self.average(feature)?, direction))
    }
}
