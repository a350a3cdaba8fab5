//! Translation of symbolic tags into predicates
//!
//! A tag is either a mood tag ("energetic", "chill", ...) mapped to a fixed
//! threshold, or a genre name from the vocabulary the translator was given.

use super::predicate::{Comparator, Predicate};
use crate::model::{Feature, Genre};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Symbolic mood descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodTag {
    Acoustic,
    Dancing,
    Energetic,
    Chill,
    Live,
    Lyrical,
    Fast,
    Slow,
    Happy,
    Melancholy,
}

impl MoodTag {
    pub const ALL: [MoodTag; 10] = [
        MoodTag::Acoustic,
        MoodTag::Dancing,
        MoodTag::Energetic,
        MoodTag::Chill,
        MoodTag::Live,
        MoodTag::Lyrical,
        MoodTag::Fast,
        MoodTag::Slow,
        MoodTag::Happy,
        MoodTag::Melancholy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MoodTag::Acoustic => "acoustic",
            MoodTag::Dancing => "dancing",
            MoodTag::Energetic => "energetic",
            MoodTag::Chill => "chill",
            MoodTag::Live => "live",
            MoodTag::Lyrical => "lyrical",
            MoodTag::Fast => "fast",
            MoodTag::Slow => "slow",
            MoodTag::Happy => "happy",
            MoodTag::Melancholy => "melancholy",
        }
    }

    /// Threshold predicate this tag stands for
    pub fn predicate(&self) -> Predicate {
        use Comparator::{GreaterOrEqual as Ge, LessOrEqual as Le};

        let (feature, op, value) = match self {
            MoodTag::Acoustic => (Feature::Acousticness, Ge, 0.6),
            MoodTag::Dancing => (Feature::Danceability, Ge, 0.6),
            MoodTag::Energetic => (Feature::Energy, Ge, 0.6),
            MoodTag::Chill => (Feature::Energy, Le, 0.4),
            MoodTag::Live => (Feature::Liveness, Ge, 0.6),
            MoodTag::Lyrical => (Feature::Instrumentalness, Le, 0.4),
            MoodTag::Fast => (Feature::Tempo, Ge, 125.0),
            MoodTag::Slow => (Feature::Tempo, Le, 115.0),
            MoodTag::Happy => (Feature::Valence, Ge, 0.6),
            MoodTag::Melancholy => (Feature::Valence, Le, 0.4),
        };
        Predicate::compare(feature, op, value)
    }
}

impl FromStr for MoodTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or(())
    }
}

/// Output of tag translation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatedTags {
    /// Unique feature predicates, in first-seen order
    pub features: Vec<Predicate>,

    /// Unique genre-equality predicates, in first-seen order
    pub genres: Vec<Predicate>,

    /// Distinct genres explicitly named
    pub named_genres: Vec<Genre>,

    /// Tags that matched neither table
    pub unrecognized: Vec<String>,
}

impl TranslatedTags {
    /// Whether no predicate came out of translation
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.genres.is_empty()
    }

    /// Combined filter for all translated predicates
    pub fn predicate(&self) -> Predicate {
        Predicate::combine(&self.features, &self.genres)
    }
}

/// Maps tag strings onto predicates for a given genre vocabulary
#[derive(Debug, Clone)]
pub struct TagTranslator {
    vocabulary: BTreeSet<Genre>,
}

impl TagTranslator {
    pub fn new<I: IntoIterator<Item = Genre>>(vocabulary: I) -> Self {
        Self {
            vocabulary: vocabulary.into_iter().collect(),
        }
    }

    pub fn vocabulary(&self) -> &BTreeSet<Genre> {
        &self.vocabulary
    }

    pub fn translate<S: AsRef<str>>(&self, tags: &[S]) -> TranslatedTags {
        let mut out = TranslatedTags::default();

        for raw in tags {
            let tag = raw.as_ref().trim().to_ascii_lowercase();

            if let Ok(mood) = tag.parse::<MoodTag>() {
                let predicate = mood.predicate();
                if !out.features.contains(&predicate) {
                    out.features.push(predicate);
                }
            } else if let Some(genre) = tag
                .parse::<Genre>()
                .ok()
                .filter(|g| self.vocabulary.contains(g))
            {
                if !out.named_genres.contains(&genre) {
                    out.named_genres.push(genre);
                    out.genres.push(Predicate::genre(genre));
                }
            } else {
                log::warn!("Ignoring unrecognized tag: {:?}", raw.as_ref());
                out.unrecognized.push(raw.as_ref().to_string());
            }
        }

        out
    }
}

impl Default for TagTranslator {
    fn default() -> Self {
        Self::new(Genre::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_mixed_tags() {
        let translator = TagTranslator::default();
        let out = translator.translate(&["fast", "happy", "chill", "rock", "pop"]);

        assert_eq!(out.features.len(), 3);
        assert_eq!(out.genres.len(), 2);
        assert_eq!(out.named_genres, vec![Genre::Rock, Genre::Pop]);
        assert!(out.unrecognized.is_empty());
        assert_eq!(
            out.predicate().to_string(),
            "tempo >= 125.0 AND valence >= 0.6 AND energy <= 0.4 AND (genre = 'rock' OR genre = 'pop')"
        );
    }

    #[test]
    fn test_translate_deduplicates() {
        let translator = TagTranslator::default();
        let out = translator.translate(&["happy", "Happy", "jazz", "jazz "]);

        assert_eq!(out.features.len(), 1);
        assert_eq!(out.genres.len(), 1);
        assert_eq!(out.named_genres, vec![Genre::Jazz]);
    }

    #[test]
    fn test_unrecognized_tags_are_reported() {
        let translator = TagTranslator::default();
        let out = translator.translate(&["happy", "polka", "loud"]);

        assert_eq!(out.features.len(), 1);
        assert_eq!(out.unrecognized, vec!["polka", "loud"]);
    }

    #[test]
    fn test_genre_outside_vocabulary() {
        let translator = TagTranslator::new([Genre::Rock, Genre::Pop]);
        let out = translator.translate(&["rock", "jazz"]);

        assert_eq!(out.named_genres, vec![Genre::Rock]);
        assert_eq!(out.unrecognized, vec!["jazz"]);
    }

    #[test]
    fn test_lyrical_maps_to_instrumentalness() {
        assert_eq!(
            MoodTag::Lyrical.predicate().to_string(),
            "instrumentalness <= 0.4"
        );
        assert_eq!(MoodTag::Slow.predicate().to_string(), "tempo <= 115.0");
    }

    #[test]
    fn test_empty_translation_matches_everything() {
        let out = TagTranslator::default().translate::<&str>(&[]);
        assert!(out.is_empty());
        assert_eq!(out.predicate(), Predicate::Always);
    }
}
