//! Forum DTOs

use crate::entities::{ForumReply, ForumThread};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query::PageQuery;

/// Thread page: the thread and its replies, oldest first
#[derive(Serialize, Deserialize, Debug)]
pub struct ThreadDetailsDTO {
    #[serde(flatten)]
    pub thread: ForumThread,
    pub replies: Vec<ForumReply>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateCategoryDTO {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateThreadDTO {
    pub category_id: i64,
    #[validate(length(min = 1, max = 200, message = "Thread title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

/// `is_sticky` and `is_locked` are moderator-only
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateThreadDTO {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
    pub is_sticky: Option<bool>,
    pub is_locked: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateReplyDTO {
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateReplyDTO {
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
    pub is_accepted: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub enum ThreadSort {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "mostViewed")]
    MostViewed,
    #[serde(rename = "mostReplies")]
    MostReplies,
    #[serde(rename = "lastReplied")]
    LastReplied,
}

impl ThreadSort {
    /// ORDER BY clause; sticky threads always come first
    pub fn order_by(&self) -> &'static str {
        match self {
            ThreadSort::Newest => "is_sticky DESC, created_at DESC, thread_id DESC",
            ThreadSort::MostViewed => "is_sticky DESC, views DESC, thread_id DESC",
            ThreadSort::MostReplies => "is_sticky DESC, reply_count DESC, thread_id DESC",
            ThreadSort::LastReplied => "is_sticky DESC, last_reply_at DESC, thread_id DESC",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ThreadListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub sort: ThreadSort,
}

impl ThreadListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
