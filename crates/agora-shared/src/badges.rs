//! Gamification badges shown next to an author's name.
//!
//! The backend sends two shapes for the same thing: a flat badge object, or a
//! user-badge record wrapping it under `badge`. Both are resolved once, here,
//! into [`AuthorBadge`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AuthorBadge {
    /// A user-badge record: `{ "badge": {...}, "awarded_at": ... }`.
    Awarded {
        badge: Badge,
        #[serde(default)]
        awarded_at: Option<DateTime<Utc>>,
    },
    /// A bare badge object.
    Plain(Badge),
}

impl AuthorBadge {
    pub fn badge(&self) -> &Badge {
        match self {
            Self::Awarded { badge, .. } | Self::Plain(badge) => badge,
        }
    }

    pub fn name(&self) -> &str {
        &self.badge().name
    }

    pub fn awarded_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Awarded { awarded_at, .. } => *awarded_at,
            Self::Plain(_) => None,
        }
    }
}
