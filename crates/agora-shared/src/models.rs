//! Client-visible forum entities.
//!
//! The backend is authoritative for all of these. The client only holds
//! transient copies in view state, discarded on navigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::AuthorBadge;
use crate::types::{CourseId, ForumId, ReactionKind, ReplyId, TopicId, UserId};

// ---------------------------------------------------------------------------
// Forum
// ---------------------------------------------------------------------------

/// The discussion forum of a course. Created by the backend, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseForum {
    pub id: ForumId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub topic_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// A top-level post within a forum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForumTopic {
    pub id: TopicId,
    pub forum_id: ForumId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub last_reply_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_reply_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Author display fields, joined in by the backend.
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub author_badges: Vec<AuthorBadge>,
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A response to a topic, or to another reply when `parent_reply_id` is set.
///
/// `has_upvoted` / `has_downvoted` describe the requesting user's own
/// reaction and are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForumReply {
    pub id: ReplyId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    #[serde(default)]
    pub parent_reply_id: Option<ReplyId>,
    pub content: String,
    #[serde(default)]
    pub is_solution: bool,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub has_upvoted: bool,
    #[serde(default)]
    pub has_downvoted: bool,
    #[serde(default)]
    pub replies: Vec<ForumReply>,

    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
}

impl ForumReply {
    /// Depth-first search through this reply and its nested replies.
    pub fn find(&self, id: ReplyId) -> Option<&ForumReply> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter().find_map(|r| r.find(id))
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

/// One page of a topic listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicPage {
    #[serde(default)]
    pub topics: Vec<ForumTopic>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /forums/:id/topics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTopic {
    pub title: String,
    pub content: String,
}

/// Body of `POST /topics/:id/replies`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReply {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_reply_id: Option<ReplyId>,
}

/// Body of `POST /replies/:id/reactions`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionRequest {
    pub reaction_type: ReactionKind,
}
