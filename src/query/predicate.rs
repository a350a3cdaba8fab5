//! Structured catalog filter
//!
//! Predicates are built and relaxed as data, and only turned into text at
//! the catalog boundary: `Display` gives the canonical form used in logs and
//! tests, the SQLite catalog renders its own parameterized clause.

use crate::model::{Feature, Genre, Track};
use std::fmt;

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Less => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::Greater => ">",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Equal => "=",
        }
    }

    /// Evaluate `lhs <op> rhs`
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Less => lhs < rhs,
            Comparator::LessOrEqual => lhs <= rhs,
            Comparator::Greater => lhs > rhs,
            Comparator::GreaterOrEqual => lhs >= rhs,
            Comparator::Equal => lhs == rhs,
        }
    }
}

/// Filter criterion over catalog tracks
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every track
    Always,
    Compare {
        feature: Feature,
        op: Comparator,
        value: f64,
    },
    GenreIs(Genre),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(feature: Feature, op: Comparator, value: f64) -> Self {
        Predicate::Compare { feature, op, value }
    }

    pub fn genre(genre: Genre) -> Self {
        Predicate::GenreIs(genre)
    }

    /// Join feature predicates with AND and genre predicates with OR
    ///
    /// With both present the result is `(AND of features) AND (OR of genres)`;
    /// with only one side present that side is used alone; with neither the
    /// result matches everything.
    pub fn combine(features: &[Predicate], genres: &[Predicate]) -> Self {
        match (features.is_empty(), genres.is_empty()) {
            (true, true) => Predicate::Always,
            (false, true) => Predicate::all(features.to_vec()),
            (true, false) => Predicate::any(genres.to_vec()),
            (false, false) => {
                let mut terms = features.to_vec();
                terms.push(Predicate::Or(genres.to_vec()));
                Predicate::And(terms)
            }
        }
    }

    /// AND of `terms`, collapsing the single-term case
    pub fn all(mut terms: Vec<Predicate>) -> Self {
        match terms.len() {
            0 => Predicate::Always,
            1 => terms.remove(0),
            _ => Predicate::And(terms),
        }
    }

    /// OR of `terms`, collapsing the single-term case
    pub fn any(mut terms: Vec<Predicate>) -> Self {
        match terms.len() {
            1 => terms.remove(0),
            _ => Predicate::Or(terms),
        }
    }

    /// Evaluate against a track
    pub fn matches(&self, track: &Track) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Compare { feature, op, value } => op.holds(track.feature(*feature), *value),
            Predicate::GenreIs(genre) => track.genre == *genre,
            Predicate::And(terms) => terms.iter().all(|t| t.matches(track)),
            Predicate::Or(terms) => terms.iter().any(|t| t.matches(track)),
            Predicate::Not(inner) => !inner.matches(track),
        }
    }

    /// Loosen every threshold by one step of the relaxation table
    ///
    /// Lower bounds move down and upper bounds move up by the feature's step
    /// (0.1 for unit features, 5 BPM for tempo). Equality and genre terms
    /// are unchanged.
    pub fn relaxed(&self) -> Self {
        match self {
            Predicate::Compare { feature, op, value } => {
                let step = feature.relaxation_step();
                let value = match op {
                    Comparator::Greater | Comparator::GreaterOrEqual => value - step,
                    Comparator::Less | Comparator::LessOrEqual => value + step,
                    Comparator::Equal => *value,
                };
                // keep 0.6 - 0.1 printing as 0.5
                let value = (value * 1e6).round() / 1e6;
                Predicate::compare(*feature, *op, value)
            }
            Predicate::And(terms) => Predicate::And(terms.iter().map(Predicate::relaxed).collect()),
            Predicate::Or(terms) => Predicate::Or(terms.iter().map(Predicate::relaxed).collect()),
            Predicate::Not(inner) => Predicate::Not(Box::new(inner.relaxed())),
            other => other.clone(),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Predicate::And(t) | Predicate::Or(t) if t.len() > 1)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("TRUE"),
            Predicate::Compare { feature, op, value } => {
                write!(f, "{} {} {:?}", feature, op.symbol(), value)
            }
            Predicate::GenreIs(genre) => write!(f, "genre = '{}'", genre),
            Predicate::And(terms) if terms.is_empty() => f.write_str("TRUE"),
            Predicate::Or(terms) if terms.is_empty() => f.write_str("FALSE"),
            Predicate::And(terms) | Predicate::Or(terms) => {
                let joiner = if matches!(self, Predicate::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    // nested groups (and a lone OR under AND) get parentheses
                    if term.is_compound() || matches!(term, Predicate::Or(_)) {
                        write!(f, "({})", term)?;
                    } else {
                        write!(f, "{}", term)?;
                    }
                }
                Ok(())
            }
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}
