use thiserror::Error;

/// Input rejected on the client before any request is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is too long: {len} characters (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Topic is locked")]
    TopicLocked,

    #[error("Forum is locked")]
    ForumLocked,
}
