//! Per-reply interaction state: optimistic votes and solution marking.
//!
//! A vote is applied locally before the request is sent. The controller keeps
//! two copies of the vote state: `local`, which is what the user sees, and
//! `confirmed`, the last state known to match the backend. A failed request
//! restores `local` from `confirmed`; a successful one promotes `local`.
//! [`ReplyController::sync`] replaces both with fresh server data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use agora_shared::models::ForumReply;
use agora_shared::types::{ReactionKind, ReplyId, UserId};

use crate::api::ForumApi;
use crate::error::{ClientError, Result};
use crate::notify::NotificationLevel;
use crate::session::Session;

/// Vote counters and the current user's own reaction on one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteState {
    pub upvotes: u32,
    pub downvotes: u32,
    pub has_upvoted: bool,
    pub has_downvoted: bool,
}

impl VoteState {
    pub fn from_reply(reply: &ForumReply) -> Self {
        Self {
            upvotes: reply.upvotes,
            downvotes: reply.downvotes,
            has_upvoted: reply.has_upvoted,
            // The two flags are exclusive; an upvote wins if the backend
            // ever reports both.
            has_downvoted: reply.has_downvoted && !reply.has_upvoted,
        }
    }

    fn flag_mut(&mut self, kind: ReactionKind) -> (&mut bool, &mut u32) {
        match kind {
            ReactionKind::Upvote => (&mut self.has_upvoted, &mut self.upvotes),
            ReactionKind::Downvote => (&mut self.has_downvoted, &mut self.downvotes),
        }
    }

    /// Apply the user's reaction of `kind`.
    ///
    /// An opposite reaction is cleared first; then the requested one is
    /// toggled. Counters saturate at zero.
    pub fn apply(&mut self, kind: ReactionKind) {
        let (opposite, opposite_count) = self.flag_mut(kind.opposite());
        if *opposite {
            *opposite = false;
            *opposite_count = opposite_count.saturating_sub(1);
        }

        let (flag, count) = self.flag_mut(kind);
        if *flag {
            *flag = false;
            *count = count.saturating_sub(1);
        } else {
            *flag = true;
            *count = count.saturating_add(1);
        }
    }
}

/// Result of a [`ReplyController::vote`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The reaction was accepted; carries the resulting state.
    Applied(VoteState),
    /// Another vote on this reply was still pending; nothing happened.
    Dropped,
}

#[derive(Debug)]
struct ReplyState {
    local: VoteState,
    confirmed: VoteState,
    is_solution: bool,
}

/// Clears the in-flight flag when the vote settles or its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReplyController<A> {
    api: Arc<A>,
    session: Session,
    reply_id: ReplyId,
    topic_author: Option<UserId>,
    state: Mutex<ReplyState>,
    voting: AtomicBool,
}

impl<A: ForumApi> ReplyController<A> {
    /// `topic_author` is `None` when the topic itself could not be loaded;
    /// solution marking is then unavailable.
    pub fn new(
        api: Arc<A>,
        session: Session,
        reply: &ForumReply,
        topic_author: Option<UserId>,
    ) -> Self {
        let votes = VoteState::from_reply(reply);
        Self {
            api,
            session,
            reply_id: reply.id,
            topic_author,
            state: Mutex::new(ReplyState {
                local: votes,
                confirmed: votes,
                is_solution: reply.is_solution,
            }),
            voting: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReplyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reply_id(&self) -> ReplyId {
        self.reply_id
    }

    /// What the user currently sees.
    pub fn votes(&self) -> VoteState {
        self.state().local
    }

    pub fn is_solution(&self) -> bool {
        self.state().is_solution
    }

    /// Whether a vote request is pending.
    pub fn is_voting(&self) -> bool {
        self.voting.load(Ordering::Acquire)
    }

    /// React to the reply, optimistically.
    ///
    /// Returns [`VoteOutcome::Dropped`] without touching anything when
    /// another vote on this reply is still pending.
    pub async fn vote(&self, kind: ReactionKind) -> Result<VoteOutcome> {
        let Some(_guard) = InFlight::acquire(&self.voting) else {
            debug!(reply_id = %self.reply_id, %kind, "Vote dropped, previous vote pending");
            return Ok(VoteOutcome::Dropped);
        };

        let optimistic = {
            let mut state = self.state();
            state.local.apply(kind);
            state.local
        };

        match self.api.react(self.reply_id, kind).await {
            Ok(()) => {
                let mut state = self.state();
                state.confirmed = state.local;
                debug!(reply_id = %self.reply_id, %kind, ?optimistic, "Vote confirmed");
                Ok(VoteOutcome::Applied(optimistic))
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    state.local = state.confirmed;
                }
                warn!(reply_id = %self.reply_id, %kind, error = %e, "Vote failed, reverted");
                self.session.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Only the topic's author may pick a solution, and only once.
    pub fn can_mark_solution(&self) -> bool {
        match self.topic_author {
            Some(author) => self.session.is_current_user(author) && !self.is_solution(),
            None => false,
        }
    }

    /// Mark this reply as the topic's accepted answer.
    ///
    /// On success the caller must reload the topic: marking a solution can
    /// change other replies too.
    pub async fn mark_solution(&self) -> Result<()> {
        if !self.can_mark_solution() {
            return Err(ClientError::NotPermitted("mark this reply as the solution"));
        }

        match self.api.mark_solution(self.reply_id).await {
            Ok(()) => {
                self.state().is_solution = true;
                info!(reply_id = %self.reply_id, "Reply marked as solution");
                self.session
                    .notify(NotificationLevel::Success, "Reply marked as solution");
                Ok(())
            }
            Err(e) => {
                warn!(reply_id = %self.reply_id, error = %e, "Failed to mark solution");
                self.session.notify_error(&e);
                Err(e)
            }
        }
    }

    pub fn set_topic_author(&mut self, topic_author: Option<UserId>) {
        self.topic_author = topic_author;
    }

    /// Replace local and confirmed state with fresh server data.
    pub fn sync(&self, reply: &ForumReply) {
        let votes = VoteState::from_reply(reply);
        let mut state = self.state();
        state.local = votes;
        state.confirmed = votes;
        state.is_solution = reply.is_solution;
    }
}
