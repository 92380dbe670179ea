//! One topic with its reply tree.
//!
//! The topic and its replies are fetched concurrently. A missing topic is
//! tolerated so replies can still render; a failed reply fetch is an error.
//! Every mutation (reply, solution, moderation) ends with a full reload,
//! which also resynchronizes the per-reply controllers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use agora_shared::models::{ForumReply, ForumTopic};
use agora_shared::types::{ReactionKind, ReplyId, TopicId, TopicModeration};
use agora_shared::ValidationError;

use crate::api::ForumApi;
use crate::error::{ClientError, Result};
use crate::forms::ReplyForm;
use crate::notify::NotificationLevel;
use crate::reply::{ReplyController, VoteOutcome};
use crate::session::Session;

/// A reply positioned for rendering; `depth` 0 is a direct answer to the
/// topic.
#[derive(Debug, Clone, Copy)]
pub struct ReplyRow<'a> {
    pub depth: usize,
    pub reply: &'a ForumReply,
}

fn flatten<'a>(replies: &'a [ForumReply], depth: usize, rows: &mut Vec<ReplyRow<'a>>) {
    for reply in replies {
        rows.push(ReplyRow { depth, reply });
        flatten(&reply.replies, depth + 1, rows);
    }
}

pub struct TopicDetailView<A> {
    api: Arc<A>,
    session: Session,
    topic_id: TopicId,
    topic: Option<ForumTopic>,
    replies: Vec<ForumReply>,
    controllers: HashMap<ReplyId, ReplyController<A>>,
    compose: ReplyForm,
}

impl<A: ForumApi> TopicDetailView<A> {
    pub fn new(api: Arc<A>, session: Session, topic_id: TopicId) -> Self {
        Self {
            api,
            session,
            topic_id,
            topic: None,
            replies: Vec::new(),
            controllers: HashMap::new(),
            compose: ReplyForm::default(),
        }
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// `None` when the topic could not be loaded.
    pub fn topic(&self) -> Option<&ForumTopic> {
        self.topic.as_ref()
    }

    pub fn replies(&self) -> &[ForumReply] {
        &self.replies
    }

    /// The reply tree in display order.
    pub fn rows(&self) -> Vec<ReplyRow<'_>> {
        let mut rows = Vec::new();
        flatten(&self.replies, 0, &mut rows);
        rows
    }

    pub fn controller(&self, reply_id: ReplyId) -> Option<&ReplyController<A>> {
        self.controllers.get(&reply_id)
    }

    pub fn compose(&self) -> &ReplyForm {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ReplyForm {
        &mut self.compose
    }

    pub fn is_locked(&self) -> bool {
        self.topic.as_ref().is_some_and(|t| t.is_locked)
    }

    pub async fn load(&mut self) -> Result<()> {
        let (topic, replies) = tokio::join!(
            self.api.topic(self.topic_id),
            self.api.replies(self.topic_id)
        );

        let replies = match replies {
            Ok(replies) => replies,
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Failed to load replies");
                self.session.notify_error(&e);
                return Err(e);
            }
        };

        self.topic = match topic {
            Ok(topic) => Some(topic),
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Topic unavailable, showing replies only");
                self.session
                    .notify(NotificationLevel::Warning, "This topic is unavailable.");
                None
            }
        };
        self.replies = replies;
        self.sync_controllers();

        debug!(
            topic_id = %self.topic_id,
            replies = self.controllers.len(),
            "Loaded topic"
        );
        Ok(())
    }

    fn sync_controllers(&mut self) {
        let topic_author = self.topic.as_ref().map(|t| t.user_id);
        let mut stale = std::mem::take(&mut self.controllers);

        let mut rows = Vec::new();
        flatten(&self.replies, 0, &mut rows);
        for row in rows {
            let reply = row.reply;
            // Existing controllers are reused so a pending vote keeps its guard.
            let controller = match stale.remove(&reply.id) {
                Some(mut existing) => {
                    existing.set_topic_author(topic_author);
                    existing.sync(reply);
                    existing
                }
                None => ReplyController::new(
                    self.api.clone(),
                    self.session.clone(),
                    reply,
                    topic_author,
                ),
            };
            self.controllers.insert(reply.id, controller);
        }
    }

    /// Vote on a reply of this topic.
    pub async fn vote(&self, reply_id: ReplyId, kind: ReactionKind) -> Result<VoteOutcome> {
        let controller = self
            .controllers
            .get(&reply_id)
            .ok_or_else(|| ClientError::NotFound(format!("reply {reply_id}")))?;
        controller.vote(kind).await
    }

    /// Whether the solution action is shown for `reply_id`.
    pub fn can_mark_solution(&self, reply_id: ReplyId) -> bool {
        self.controllers
            .get(&reply_id)
            .is_some_and(|c| c.can_mark_solution())
    }

    pub async fn mark_solution(&mut self, reply_id: ReplyId) -> Result<()> {
        {
            let controller = self
                .controllers
                .get(&reply_id)
                .ok_or_else(|| ClientError::NotFound(format!("reply {reply_id}")))?;
            controller.mark_solution().await?;
        }
        // The mark stands; a failed reload was already notified.
        let _ = self.load().await;
        Ok(())
    }

    /// Post the compose form.
    ///
    /// On success the form is cleared and the topic reloaded; on failure the
    /// typed text is kept.
    pub async fn post_reply(&mut self) -> Result<ForumReply> {
        if self.is_locked() {
            return Err(ValidationError::TopicLocked.into());
        }
        let new_reply = self.compose.validate()?;

        let reply = match self.api.create_reply(self.topic_id, &new_reply).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Failed to post reply");
                self.session.notify_error(&e);
                return Err(e);
            }
        };

        info!(
            topic_id = %self.topic_id,
            reply_id = %reply.id,
            parent = ?reply.parent_reply_id,
            "Reply posted"
        );
        self.compose.clear();

        // A failed reload was already notified; the reply itself succeeded.
        let _ = self.load().await;
        Ok(reply)
    }

    /// Pin, unpin, lock or unlock the topic, then reload it.
    pub async fn moderate(&mut self, action: TopicModeration) -> Result<()> {
        if let Err(e) = self.api.moderate_topic(self.topic_id, action).await {
            warn!(topic_id = %self.topic_id, ?action, error = %e, "Moderation failed");
            self.session.notify_error(&e);
            return Err(e);
        }
        info!(topic_id = %self.topic_id, ?action, "Topic moderated");
        let _ = self.load().await;
        Ok(())
    }
}
