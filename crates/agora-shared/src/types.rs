use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Backend id of a course.
    CourseId
);
id_type!(
    /// Backend id of a course forum (one per course).
    ForumId
);
id_type!(
    /// Backend id of a forum topic.
    TopicId
);
id_type!(
    /// Backend id of a reply.
    ReplyId
);
id_type!(
    /// Backend id of a user, as issued by the identity provider.
    UserId
);

/// A reaction a user applies to a reply.
///
/// The backend treats "apply reaction of kind K" as a toggle, so the client
/// always sends the requested kind, never the resulting state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Upvote,
    Downvote,
}

impl ReactionKind {
    pub fn opposite(self) -> Self {
        match self {
            Self::Upvote => Self::Downvote,
            Self::Downvote => Self::Upvote,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering of a topic listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TopicSort {
    #[default]
    Recent,
    Popular,
    Pinned,
}

impl TopicSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Popular => "popular",
            Self::Pinned => "pinned",
        }
    }
}

impl fmt::Display for TopicSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation actions on a topic, each mapping to `POST /topics/:id/<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicModeration {
    Pin,
    Unpin,
    Lock,
    Unlock,
}

impl TopicModeration {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Unpin => "unpin",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }
}
