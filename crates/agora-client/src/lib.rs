//! # agora-client
//!
//! Client-side logic for course forums: a typed REST client and the view
//! models built on top of it.
//!
//! - [`api`]: the [`ForumApi`](api::ForumApi) seam and its `reqwest`
//!   implementation
//! - [`reply`]: optimistic vote toggling and solution marking per reply
//! - [`topic_list`]: paginated, sortable, searchable topic listing
//! - [`topic_detail`]: a topic with its reply tree, compose form and
//!   moderation actions
//! - [`forms`]: validated topic / reply input
//! - [`session`] and [`notify`]: the explicit context every view receives
//!
//! The backend is the sole arbiter of state. Views hold transient copies and
//! reconcile by reloading after mutations.

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod notify;
pub mod reply;
pub mod session;
pub mod topic_detail;
pub mod topic_list;

#[cfg(test)]
mod testing;

pub use error::{ClientError, Result};
