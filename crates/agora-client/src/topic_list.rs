//! Paginated topic listing of one forum.
//!
//! Every parameter change re-fetches. When a fetch fails the previous page
//! and query stay in place so the view never shows a half-applied state.

use std::sync::Arc;

use tracing::{debug, info, warn};

use agora_shared::models::{CourseForum, ForumTopic, Pagination, TopicPage};
use agora_shared::types::{CourseId, ForumId, TopicSort};
use agora_shared::ValidationError;

use crate::api::{ForumApi, TopicQuery};
use crate::error::Result;
use crate::forms::TopicForm;
use crate::notify::NotificationLevel;
use crate::session::Session;

/// Why a loaded page has no topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The forum has no topics yet.
    NoTopics,
    /// Topics exist but none match the search.
    NoSearchMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoTopics => "No topics yet. Start the first discussion!",
            Self::NoSearchMatches => "No topics match your search.",
        }
    }
}

/// Enabled state of the Previous / Next buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControls {
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl PageControls {
    pub fn for_pagination(pagination: &Pagination) -> Self {
        Self {
            prev_enabled: pagination.page > 1,
            next_enabled: pagination.page < pagination.pages,
        }
    }
}

pub struct TopicListView<A> {
    api: Arc<A>,
    session: Session,
    forum_id: ForumId,
    forum: Option<CourseForum>,
    query: TopicQuery,
    page: Option<TopicPage>,
}

impl<A: ForumApi> TopicListView<A> {
    pub fn new(api: Arc<A>, session: Session, forum_id: ForumId, limit: u32) -> Self {
        Self {
            api,
            session,
            forum_id,
            forum: None,
            query: TopicQuery::new(limit.max(1)),
            page: None,
        }
    }

    /// Resolve the forum of `course_id`, then load its first page.
    pub async fn for_course(
        api: Arc<A>,
        session: Session,
        course_id: CourseId,
        limit: u32,
    ) -> Result<Self> {
        let forum = match api.course_forum(course_id).await {
            Ok(forum) => forum,
            Err(e) => {
                warn!(course_id = %course_id, error = %e, "Failed to load course forum");
                session.notify_error(&e);
                return Err(e);
            }
        };

        let mut view = Self::new(api, session, forum.id, limit);
        view.forum = Some(forum);
        view.load().await?;
        Ok(view)
    }

    pub fn forum_id(&self) -> ForumId {
        self.forum_id
    }

    pub fn forum(&self) -> Option<&CourseForum> {
        self.forum.as_ref()
    }

    pub fn query(&self) -> &TopicQuery {
        &self.query
    }

    pub fn topics(&self) -> &[ForumTopic] {
        self.page.as_ref().map(|p| p.topics.as_slice()).unwrap_or(&[])
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.page.as_ref().map(|p| &p.pagination)
    }

    /// Both buttons are disabled until a page has loaded.
    pub fn controls(&self) -> PageControls {
        match self.pagination() {
            Some(p) => PageControls::for_pagination(p),
            None => PageControls {
                prev_enabled: false,
                next_enabled: false,
            },
        }
    }

    /// `None` while nothing is loaded or the page has topics.
    pub fn empty_state(&self) -> Option<EmptyState> {
        let page = self.page.as_ref()?;
        if !page.topics.is_empty() {
            return None;
        }
        Some(if self.query.search.is_some() {
            EmptyState::NoSearchMatches
        } else {
            EmptyState::NoTopics
        })
    }

    /// Fetch the page described by the current query.
    pub async fn load(&mut self) -> Result<()> {
        match self.api.list_topics(self.forum_id, &self.query).await {
            Ok(page) => {
                debug!(
                    forum_id = %self.forum_id,
                    page = page.pagination.page,
                    pages = page.pagination.pages,
                    count = page.topics.len(),
                    "Loaded topics"
                );
                self.page = Some(page);
                Ok(())
            }
            Err(e) => {
                warn!(forum_id = %self.forum_id, error = %e, "Failed to load topics");
                self.session.notify_error(&e);
                Err(e)
            }
        }
    }

    async fn requery(&mut self, query: TopicQuery) -> Result<()> {
        let previous = std::mem::replace(&mut self.query, query);
        if let Err(e) = self.load().await {
            self.query = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn set_page(&mut self, page: u32) -> Result<()> {
        let query = TopicQuery {
            page: page.max(1),
            ..self.query.clone()
        };
        self.requery(query).await
    }

    /// No-op at the last page. Steps from the page the backend returned,
    /// which may differ from the requested one.
    pub async fn next_page(&mut self) -> Result<()> {
        let next = match self.pagination() {
            Some(p) if p.page < p.pages => p.page + 1,
            _ => return Ok(()),
        };
        self.set_page(next).await
    }

    /// No-op at the first page.
    pub async fn prev_page(&mut self) -> Result<()> {
        let prev = match self.pagination() {
            Some(p) if p.page > 1 => p.page - 1,
            _ => return Ok(()),
        };
        self.set_page(prev).await
    }

    pub async fn set_sort(&mut self, sort: TopicSort) -> Result<()> {
        let query = TopicQuery {
            page: 1,
            sort,
            ..self.query.clone()
        };
        self.requery(query).await
    }

    /// A blank search clears the filter.
    pub async fn set_search(&mut self, search: &str) -> Result<()> {
        let search = search.trim();
        let query = TopicQuery {
            page: 1,
            search: (!search.is_empty()).then(|| search.to_string()),
            ..self.query.clone()
        };
        self.requery(query).await
    }

    pub async fn set_limit(&mut self, limit: u32) -> Result<()> {
        let query = TopicQuery {
            page: 1,
            limit: limit.max(1),
            ..self.query.clone()
        };
        self.requery(query).await
    }

    /// Post a new topic from `form`.
    ///
    /// On success the form is cleared and the listing reloads from the first
    /// page so the new topic shows up.
    pub async fn create_topic(&mut self, form: &mut TopicForm) -> Result<ForumTopic> {
        if self.forum.as_ref().is_some_and(|f| f.is_locked) {
            return Err(ValidationError::ForumLocked.into());
        }
        let new_topic = form.validate()?;

        let topic = match self.api.create_topic(self.forum_id, &new_topic).await {
            Ok(topic) => topic,
            Err(e) => {
                warn!(forum_id = %self.forum_id, error = %e, "Failed to create topic");
                self.session.notify_error(&e);
                return Err(e);
            }
        };

        info!(forum_id = %self.forum_id, topic_id = %topic.id, "Topic created");
        form.clear();
        self.session
            .notify(NotificationLevel::Success, "Topic created");

        // The topic exists either way; a failed refresh was already notified.
        let _ = self.set_page(1).await;
        Ok(topic)
    }
}
