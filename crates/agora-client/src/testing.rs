//! In-memory [`ForumApi`] used by the view and controller tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use agora_shared::models::{
    CourseForum, ForumReply, ForumTopic, NewReply, NewTopic, Pagination, TopicPage,
};
use agora_shared::types::{
    CourseId, ForumId, ReactionKind, ReplyId, TopicId, TopicModeration, UserId,
};

use crate::api::{ForumApi, TopicQuery};
use crate::error::{ClientError, Result};
use crate::notify::NotificationQueue;
use crate::session::Session;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CourseForum(CourseId),
    ListTopics(ForumId, TopicQuery),
    CreateTopic(ForumId, NewTopic),
    Topic(TopicId),
    Replies(TopicId),
    CreateReply(TopicId, NewReply),
    React(ReplyId, ReactionKind),
    MarkSolution(ReplyId),
    Moderate(TopicId, TopicModeration),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    forums: HashMap<CourseId, CourseForum>,
    topics: Vec<ForumTopic>,
    replies: HashMap<TopicId, Vec<ForumReply>>,
    failing: HashSet<&'static str>,
    react_gate: Option<Arc<Notify>>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct FakeForumApi {
    inner: Arc<Mutex<Inner>>,
}

pub fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn topic(id: i64, forum: i64, author: i64, title: &str) -> ForumTopic {
    ForumTopic {
        id: TopicId(id),
        forum_id: ForumId(forum),
        user_id: UserId(author),
        title: title.to_string(),
        content: format!("{title} body"),
        is_pinned: false,
        is_locked: false,
        view_count: 0,
        reply_count: 0,
        last_reply_at: None,
        last_reply_by: None,
        created_at: ts(),
        updated_at: ts(),
        author_name: None,
        author_avatar: None,
        author_badges: Vec::new(),
    }
}

pub fn reply(id: i64, topic: i64, author: i64) -> ForumReply {
    ForumReply {
        id: ReplyId(id),
        topic_id: TopicId(topic),
        user_id: UserId(author),
        parent_reply_id: None,
        content: format!("reply {id}"),
        is_solution: false,
        upvotes: 0,
        downvotes: 0,
        created_at: ts(),
        updated_at: ts(),
        has_upvoted: false,
        has_downvoted: false,
        replies: Vec::new(),
        author_name: None,
        author_avatar: None,
    }
}

pub fn session_for(user: i64) -> (Session, Arc<NotificationQueue>) {
    let queue = Arc::new(NotificationQueue::default());
    (Session::new(UserId(user), queue.clone()), queue)
}

impl FakeForumApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.inner.lock().unwrap().next_id = 1000;
        api
    }

    pub fn with_topics(self, topics: Vec<ForumTopic>) -> Self {
        self.inner.lock().unwrap().topics = topics;
        self
    }

    pub fn with_replies(self, topic: TopicId, replies: Vec<ForumReply>) -> Self {
        self.inner.lock().unwrap().replies.insert(topic, replies);
        self
    }

    pub fn with_forum(self, forum: CourseForum) -> Self {
        self.inner.lock().unwrap().forums.insert(forum.course_id, forum);
        self
    }

    /// Make every call to `endpoint` fail with a 500 until [`Self::recover`].
    pub fn fail(&self, endpoint: &'static str) {
        self.inner.lock().unwrap().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.inner.lock().unwrap().failing.remove(endpoint);
    }

    /// Hold every `react` call until the returned gate is notified once
    /// per call.
    pub fn gate_reactions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().unwrap().react_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn set_replies(&self, topic: TopicId, replies: Vec<ForumReply>) {
        self.inner.lock().unwrap().replies.insert(topic, replies);
    }

    fn record(&self, endpoint: &'static str, call: Call) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        if inner.failing.contains(endpoint) {
            return Err(ClientError::Api {
                status: 500,
                message: format!("{endpoint} failed"),
            });
        }
        Ok(())
    }
}

impl ForumApi for FakeForumApi {
    async fn course_forum(&self, course_id: CourseId) -> Result<CourseForum> {
        self.record("course_forum", Call::CourseForum(course_id))?;
        let inner = self.inner.lock().unwrap();
        inner
            .forums
            .get(&course_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Forum not found".into()))
    }

    async fn list_topics(&self, forum_id: ForumId, query: &TopicQuery) -> Result<TopicPage> {
        self.record("list_topics", Call::ListTopics(forum_id, query.clone()))?;
        let inner = self.inner.lock().unwrap();
        let matching: Vec<ForumTopic> = inner
            .topics
            .iter()
            .filter(|t| t.forum_id == forum_id)
            .filter(|t| match query.search {
                Some(ref s) => t.title.contains(s.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let limit = query.limit.max(1);
        let pages = (matching.len() as u32).div_ceil(limit);
        // Out-of-range pages are clamped, as the backend does.
        let page = query.page.clamp(1, pages.max(1));
        let start = (page as usize - 1) * limit as usize;
        let topics = matching.into_iter().skip(start).take(limit as usize).collect();

        Ok(TopicPage {
            topics,
            pagination: Pagination {
                page,
                limit,
                total,
                pages,
            },
        })
    }

    async fn create_topic(&self, forum_id: ForumId, new: &NewTopic) -> Result<ForumTopic> {
        self.record("create_topic", Call::CreateTopic(forum_id, new.clone()))?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let mut created = topic(inner.next_id, forum_id.0, 1, &new.title);
        created.content = new.content.clone();
        inner.topics.insert(0, created.clone());
        Ok(created)
    }

    async fn topic(&self, topic_id: TopicId) -> Result<ForumTopic> {
        self.record("topic", Call::Topic(topic_id))?;
        let inner = self.inner.lock().unwrap();
        inner
            .topics
            .iter()
            .find(|t| t.id == topic_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Topic not found".into()))
    }

    async fn replies(&self, topic_id: TopicId) -> Result<Vec<ForumReply>> {
        self.record("replies", Call::Replies(topic_id))?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.replies.get(&topic_id).cloned().unwrap_or_default())
    }

    async fn create_reply(&self, topic_id: TopicId, new: &NewReply) -> Result<ForumReply> {
        self.record("create_reply", Call::CreateReply(topic_id, new.clone()))?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let mut created = reply(inner.next_id, topic_id.0, 1);
        created.content = new.content.clone();
        created.parent_reply_id = new.parent_reply_id;

        let replies = inner.replies.entry(topic_id).or_default();
        match new.parent_reply_id {
            Some(parent) => {
                if let Some(p) = replies.iter_mut().find(|r| r.id == parent) {
                    p.replies.push(created.clone());
                }
            }
            None => replies.push(created.clone()),
        }
        Ok(created)
    }

    async fn react(&self, reply_id: ReplyId, kind: ReactionKind) -> Result<()> {
        let gate = self.inner.lock().unwrap().react_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.record("react", Call::React(reply_id, kind))
    }

    async fn mark_solution(&self, reply_id: ReplyId) -> Result<()> {
        self.record("mark_solution", Call::MarkSolution(reply_id))?;
        let mut inner = self.inner.lock().unwrap();
        for replies in inner.replies.values_mut() {
            for r in replies.iter_mut() {
                r.is_solution = r.id == reply_id;
            }
        }
        Ok(())
    }

    async fn moderate_topic(&self, topic_id: TopicId, action: TopicModeration) -> Result<()> {
        self.record("moderate_topic", Call::Moderate(topic_id, action))?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.topics.iter_mut().find(|t| t.id == topic_id) {
            match action {
                TopicModeration::Pin => t.is_pinned = true,
                TopicModeration::Unpin => t.is_pinned = false,
                TopicModeration::Lock => t.is_locked = true,
                TopicModeration::Unlock => t.is_locked = false,
            }
        }
        Ok(())
    }
}
