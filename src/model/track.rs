use crate::error::CurateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque catalog identifier of a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a single catalog track with its mood features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier for this track
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    #[serde(default)]
    pub artist: String,

    /// Genre, one of the known vocabulary
    pub genre: Genre,

    /// Numeric mood/style features
    #[serde(flatten)]
    pub features: Features,
}

impl Track {
    /// Value of a single feature for this track
    pub fn feature(&self, feature: Feature) -> f64 {
        self.features.get(feature)
    }
}

/// Mood/style feature values of a track
///
/// Everything except `tempo` is conventionally in [0, 1]. Tempo is in BPM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
}

impl Features {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Acousticness => self.acousticness,
            Feature::Danceability => self.danceability,
            Feature::Energy => self.energy,
            Feature::Instrumentalness => self.instrumentalness,
            Feature::Liveness => self.liveness,
            Feature::Speechiness => self.speechiness,
            Feature::Tempo => self.tempo,
            Feature::Valence => self.valence,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        let slot = match feature {
            Feature::Acousticness => &mut self.acousticness,
            Feature::Danceability => &mut self.danceability,
            Feature::Energy => &mut self.energy,
            Feature::Instrumentalness => &mut self.instrumentalness,
            Feature::Liveness => &mut self.liveness,
            Feature::Speechiness => &mut self.speechiness,
            Feature::Tempo => &mut self.tempo,
            Feature::Valence => &mut self.valence,
        };
        *slot = value;
    }
}

/// Direction in which a feature average should move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
}

/// Numeric feature a track is scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Acousticness,
    Danceability,
    Energy,
    Instrumentalness,
    Liveness,
    Speechiness,
    Tempo,
    Valence,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Acousticness,
        Feature::Danceability,
        Feature::Energy,
        Feature::Instrumentalness,
        Feature::Liveness,
        Feature::Speechiness,
        Feature::Tempo,
        Feature::Valence,
    ];

    /// Column name of this feature in the catalog
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Acousticness => "acousticness",
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Speechiness => "speechiness",
            Feature::Tempo => "tempo",
            Feature::Valence => "valence",
        }
    }

    /// Threshold an average must reach to count as "high" or "low"
    ///
    /// Unit features use 0.6 / 0.4, tempo uses 125 / 115 BPM.
    pub fn threshold(&self, direction: Direction) -> f64 {
        match (self, direction) {
            (Feature::Tempo, Direction::Increase) => 125.0,
            (Feature::Tempo, Direction::Decrease) => 115.0,
            (_, Direction::Increase) => 0.6,
            (_, Direction::Decrease) => 0.4,
        }
    }

    /// Whether `value` meets the threshold in `direction`
    pub fn meets(&self, value: f64, direction: Direction) -> bool {
        let threshold = self.threshold(direction);
        match direction {
            Direction::Increase => value >= threshold,
            Direction::Decrease => value <= threshold,
        }
    }

    /// Size of one loosening step on the relaxation table
    pub fn relaxation_step(&self) -> f64 {
        match self {
            Feature::Tempo => 5.0,
            _ => 0.1,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = CurateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == lowered)
            .ok_or_else(|| CurateError::UnknownFeature(s.to_string()))
    }
}

/// Genre vocabulary of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Rock,
    Jazz,
    Pop,
    Rap,
    Country,
    Classical,
    Blues,
    Metal,
    Gospel,
    Punk,
    Indie,
}

impl Genre {
    pub const ALL: [Genre; 11] = [
        Genre::Rock,
        Genre::Jazz,
        Genre::Pop,
        Genre::Rap,
        Genre::Country,
        Genre::Classical,
        Genre::Blues,
        Genre::Metal,
        Genre::Gospel,
        Genre::Punk,
        Genre::Indie,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Genre::Rock => "rock",
            Genre::Jazz => "jazz",
            Genre::Pop => "pop",
            Genre::Rap => "rap",
            Genre::Country => "country",
            Genre::Classical => "classical",
            Genre::Blues => "blues",
            Genre::Metal => "metal",
            Genre::Gospel => "gospel",
            Genre::Punk => "punk",
            Genre::Indie => "indie",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = CurateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.name() == lowered)
            .ok_or_else(|| CurateError::UnknownGenre(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_round_trips_through_name() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
        assert!("loudness".parse::<Feature>().is_err());
    }

    #[test]
    fn test_genre_parse_is_case_insensitive() {
        assert_eq!(" Rock ".parse::<Genre>().unwrap(), Genre::Rock);
        assert!(matches!(
            "polka".parse::<Genre>(),
            Err(CurateError::UnknownGenre(_))
        ));
    }

    #[test]
    fn test_thresholds() {
        assert!(Feature::Energy.meets(0.6, Direction::Increase));
        assert!(!Feature::Energy.meets(0.59, Direction::Increase));
        assert!(Feature::Energy.meets(0.4, Direction::Decrease));
        assert!(Feature::Tempo.meets(125.0, Direction::Increase));
        assert!(Feature::Tempo.meets(115.0, Direction::Decrease));
        assert!(!Feature::Tempo.meets(120.0, Direction::Decrease));
    }

    #[test]
    fn test_features_get_set() {
        let mut features = Features::default();
        features.set(Feature::Valence, 0.75);
        features.set(Feature::Tempo, 130.0);
        assert_eq!(features.get(Feature::Valence), 0.75);
        assert_eq!(features.get(Feature::Tempo), 130.0);
        assert_eq!(features.get(Feature::Energy), 0.0);
    }
}
