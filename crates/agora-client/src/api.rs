//! Typed access to the forum REST API.
//!
//! [`ForumApi`] is the seam between view logic and transport. Views are
//! generic over it; [`HttpForumApi`] is the production implementation.

use std::future::Future;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use agora_shared::models::{
    CourseForum, ForumReply, ForumTopic, NewReply, NewTopic, ReactionRequest, TopicPage,
};
use agora_shared::types::{
    CourseId, ForumId, ReactionKind, ReplyId, TopicId, TopicModeration, TopicSort,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Parameters of a topic listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: TopicSort,
    /// Free-text filter. `None` (never an empty string) means no filter.
    pub search: Option<String>,
}

impl TopicQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            sort: TopicSort::default(),
            search: None,
        }
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.as_str().to_string()),
        ];
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// Every call the forum views make against the backend.
pub trait ForumApi: Send + Sync {
    /// `GET /courses/:id/forum`
    fn course_forum(&self, course_id: CourseId)
        -> impl Future<Output = Result<CourseForum>> + Send;

    /// `GET /forums/:id/topics`
    fn list_topics(
        &self,
        forum_id: ForumId,
        query: &TopicQuery,
    ) -> impl Future<Output = Result<TopicPage>> + Send;

    /// `POST /forums/:id/topics`
    fn create_topic(
        &self,
        forum_id: ForumId,
        topic: &NewTopic,
    ) -> impl Future<Output = Result<ForumTopic>> + Send;

    /// `GET /topics/:id`
    fn topic(&self, topic_id: TopicId) -> impl Future<Output = Result<ForumTopic>> + Send;

    /// `GET /topics/:id/replies`
    fn replies(&self, topic_id: TopicId)
        -> impl Future<Output = Result<Vec<ForumReply>>> + Send;

    /// `POST /topics/:id/replies`
    fn create_reply(
        &self,
        topic_id: TopicId,
        reply: &NewReply,
    ) -> impl Future<Output = Result<ForumReply>> + Send;

    /// `POST /replies/:id/reactions`
    fn react(&self, reply_id: ReplyId, kind: ReactionKind)
        -> impl Future<Output = Result<()>> + Send;

    /// `POST /replies/:id/mark-solution`
    fn mark_solution(&self, reply_id: ReplyId) -> impl Future<Output = Result<()>> + Send;

    /// `POST /topics/:id/{pin,unpin,lock,unlock}`
    fn moderate_topic(
        &self,
        topic_id: TopicId,
        action: TopicModeration,
    ) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Endpoints answer either with the entity itself or with `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a successful response body, unwrapping a `data` envelope.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    Ok(envelope.into_inner())
}

/// Build the error for a non-2xx response from its status and body.
pub(crate) fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status == StatusCode::NOT_FOUND {
        ClientError::NotFound(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// [`ForumApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpForumApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpForumApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Forum API request failed");
            return Err(error_from_response(status, &body));
        }

        debug!(%url, status = status.as_u16(), size = body.len(), "Forum API request succeeded");
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let body = self.send_raw(builder).await?;
        decode_body(&body)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send_raw(builder).await.map(|_| ())
    }
}

impl ForumApi for HttpForumApi {
    async fn course_forum(&self, course_id: CourseId) -> Result<CourseForum> {
        self.send_json(self.request(Method::GET, &format!("courses/{course_id}/forum")))
            .await
    }

    async fn list_topics(&self, forum_id: ForumId, query: &TopicQuery) -> Result<TopicPage> {
        let builder = self
            .request(Method::GET, &format!("forums/{forum_id}/topics"))
            .query(&query.to_pairs());
        self.send_json(builder).await
    }

    async fn create_topic(&self, forum_id: ForumId, topic: &NewTopic) -> Result<ForumTopic> {
        let builder = self
            .request(Method::POST, &format!("forums/{forum_id}/topics"))
            .json(topic);
        self.send_json(builder).await
    }

    async fn topic(&self, topic_id: TopicId) -> Result<ForumTopic> {
        self.send_json(self.request(Method::GET, &format!("topics/{topic_id}")))
            .await
    }

    async fn replies(&self, topic_id: TopicId) -> Result<Vec<ForumReply>> {
        self.send_json(self.request(Method::GET, &format!("topics/{topic_id}/replies")))
            .await
    }

    async fn create_reply(&self, topic_id: TopicId, reply: &NewReply) -> Result<ForumReply> {
        let builder = self
            .request(Method::POST, &format!("topics/{topic_id}/replies"))
            .json(reply);
        self.send_json(builder).await
    }

    async fn react(&self, reply_id: ReplyId, kind: ReactionKind) -> Result<()> {
        let builder = self
            .request(Method::POST, &format!("replies/{reply_id}/reactions"))
            .json(&ReactionRequest {
                reaction_type: kind,
            });
        self.send_empty(builder).await
    }

    async fn mark_solution(&self, reply_id: ReplyId) -> Result<()> {
        self.send_empty(self.request(Method::POST, &format!("replies/{reply_id}/mark-solution")))
            .await
    }

    async fn moderate_topic(&self, topic_id: TopicId, action: TopicModeration) -> Result<()> {
        let path = format!("topics/{topic_id}/{}", action.path_segment());
        self.send_empty(self.request(Method::POST, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ClientConfig {
            api_base_url: "https://lms.example.com/api/".into(),
            ..ClientConfig::default()
        };
        let api = HttpForumApi::new(&config).unwrap();
        assert_eq!(
            api.url("/forums/5/topics"),
            "https://lms.example.com/api/forums/5/topics"
        );
    }

    #[test]
    fn test_query_pairs_skip_missing_search() {
        let mut query = TopicQuery::new(20);
        query.sort = TopicSort::Popular;
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
                ("sort", "popular".to_string()),
            ]
        );

        query.search = Some("borrow checker".into());
        assert_eq!(query.to_pairs().last(), Some(&("search", "borrow checker".to_string())));
    }

    #[test]
    fn test_decode_body_accepts_data_envelope() {
        let wrapped = br#"{"data": {"topics": [], "pagination": {"page": 1, "limit": 10, "total": 0, "pages": 0}}}"#;
        let bare = br#"{"topics": [], "pagination": {"page": 1, "limit": 10, "total": 0, "pages": 0}}"#;

        let a: TopicPage = decode_body(wrapped).unwrap();
        let b: TopicPage = decode_body(bare).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_body_empty_reply_list() {
        let replies: Vec<ForumReply> = decode_body(b"[]").unwrap();
        assert!(replies.is_empty());
    }

    #[test]
    fn test_error_from_response_prefers_message() {
        let err = error_from_response(
            StatusCode::FORBIDDEN,
            br#"{"message": "Only the topic author can mark a solution", "error": "forbidden"}"#,
        );
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Only the topic author can mark a solution");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_response_not_found() {
        let err = error_from_response(StatusCode::NOT_FOUND, br#"{"error": "Topic not found"}"#);
        assert!(matches!(err, ClientError::NotFound(ref m) if m == "Topic not found"));
    }

    #[test]
    fn test_error_from_response_without_body() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, b"<html>upstream down</html>");
        assert!(matches!(err, ClientError::Api { status: 502, ref message } if message == "Bad Gateway"));
    }
}
