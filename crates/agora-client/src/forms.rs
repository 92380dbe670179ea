//! Compose forms for new topics and replies.
//!
//! Validation happens here, before any request is built. A form is cleared
//! by its owner once the backend accepts the submission.

use agora_shared::constants::{MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use agora_shared::models::{NewReply, NewTopic};
use agora_shared::types::ReplyId;
use agora_shared::ValidationError;

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicForm {
    pub title: String,
    pub content: String,
}

impl TopicForm {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<NewTopic, ValidationError> {
        Ok(NewTopic {
            title: required("title", &self.title, MAX_TITLE_CHARS)?,
            content: required("content", &self.content, MAX_CONTENT_CHARS)?,
        })
    }

    pub fn clear(&mut self) {
        self.title.clear();
        self.content.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// A reply to the topic, or to another reply when `parent_reply_id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyForm {
    pub content: String,
    pub parent_reply_id: Option<ReplyId>,
}

impl ReplyForm {
    pub fn validate(&self) -> Result<NewReply, ValidationError> {
        Ok(NewReply {
            content: required("content", &self.content, MAX_CONTENT_CHARS)?,
            parent_reply_id: self.parent_reply_id,
        })
    }

    /// Point the form at `parent`, keeping any text already typed.
    pub fn reply_to(&mut self, parent: ReplyId) {
        self.parent_reply_id = Some(parent);
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.parent_reply_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_form_requires_title_and_content() {
        let form = TopicForm::new("   ", "body");
        assert_eq!(
            form.validate(),
            Err(ValidationError::Required { field: "title" })
        );

        let form = TopicForm::new("Title", "\n");
        assert_eq!(
            form.validate(),
            Err(ValidationError::Required { field: "content" })
        );
    }

    #[test]
    fn test_topic_form_trims() {
        let form = TopicForm::new("  Q1 ", "Why?\n");
        assert_eq!(
            form.validate().unwrap(),
            NewTopic {
                title: "Q1".into(),
                content: "Why?".into(),
            }
        );
    }

    #[test]
    fn test_title_length_cap() {
        let form = TopicForm::new("x".repeat(MAX_TITLE_CHARS + 1), "body");
        assert!(matches!(
            form.validate(),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
    }

    #[test]
    fn test_reply_form_carries_parent() {
        let mut form = ReplyForm {
            content: "Same here".into(),
            ..ReplyForm::default()
        };
        form.reply_to(ReplyId(4));
        assert_eq!(form.validate().unwrap().parent_reply_id, Some(ReplyId(4)));

        form.clear();
        assert_eq!(form, ReplyForm::default());
    }
}
