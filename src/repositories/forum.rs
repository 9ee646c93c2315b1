//! ForumRepository - categories, threads and replies

use super::{Create, Read};
use crate::dtos::{
    CreateCategoryDTO, CreateReplyDTO, CreateThreadDTO, PageWindow, ThreadSort, UpdateReplyDTO,
    UpdateThreadDTO,
};
use crate::entities::{ForumCategory, ForumReply, ForumThread};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::instrument;

pub struct ForumRepository {
    connection_pool: SqlitePool,
}

fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

impl ForumRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    // ---- categories ----

    pub async fn find_categories(&self) -> Result<Vec<ForumCategory>, Error> {
        sqlx::query_as::<_, ForumCategory>(
            "SELECT * FROM forum_categories ORDER BY display_order, name",
        )
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn read_category(&self, id: i64) -> Result<Option<ForumCategory>, Error> {
        sqlx::query_as::<_, ForumCategory>("SELECT * FROM forum_categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    // ---- threads ----

    pub async fn count_threads(&self, category_id: i64) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM forum_threads WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_threads(
        &self,
        category_id: i64,
        sort: ThreadSort,
        window: PageWindow,
    ) -> Result<Vec<ForumThread>, Error> {
        // ORDER BY comes from a closed set of literals, never from user input.
        let sql = format!(
            "SELECT * FROM forum_threads WHERE category_id = ? ORDER BY {} LIMIT ? OFFSET ?",
            sort.order_by()
        );
        sqlx::query_as::<_, ForumThread>(&sql)
            .bind(category_id)
            .bind(window.limit)
            .bind(window.offset())
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn create_thread(
        &self,
        author_id: i64,
        data: &CreateThreadDTO,
    ) -> Result<ForumThread, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, ForumThread>(
            r#"
            INSERT INTO forum_threads (category_id, title, content, author_id, views, reply_count,
                                       is_sticky, is_locked, last_reply_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, 0, 0, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(data.category_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn read_thread(&self, id: i64) -> Result<Option<ForumThread>, Error> {
        sqlx::query_as::<_, ForumThread>("SELECT * FROM forum_threads WHERE thread_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Counts a view and returns the thread, `None` if it does not exist
    pub async fn view_thread(&self, id: i64) -> Result<Option<ForumThread>, Error> {
        sqlx::query_as::<_, ForumThread>(
            "UPDATE forum_threads SET views = views + 1 WHERE thread_id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    pub async fn update_thread(&self, id: i64, data: &UpdateThreadDTO) -> Result<ForumThread, Error> {
        sqlx::query_as::<_, ForumThread>(
            r#"
            UPDATE forum_threads
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                is_sticky = COALESCE(?, is_sticky),
                is_locked = COALESCE(?, is_locked),
                updated_at = ?
            WHERE thread_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.is_sticky)
        .bind(data.is_locked)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    /// Replies go with it (ON DELETE CASCADE)
    pub async fn delete_thread(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM forum_threads WHERE thread_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_search(&self, term: &str) -> Result<i64, Error> {
        let pattern = like_pattern(term);
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM forum_threads
            WHERE title LIKE ? ESCAPE '\' OR content LIKE ? ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.connection_pool)
        .await
    }

    /// Case-insensitive substring match on title or content, newest first
    #[instrument(skip(self))]
    pub async fn search_threads(
        &self,
        term: &str,
        window: PageWindow,
    ) -> Result<Vec<ForumThread>, Error> {
        let pattern = like_pattern(term);
        sqlx::query_as::<_, ForumThread>(
            r#"
            SELECT * FROM forum_threads
            WHERE title LIKE ? ESCAPE '\' OR content LIKE ? ESCAPE '\'
            ORDER BY created_at DESC, thread_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.connection_pool)
        .await
    }

    // ---- replies ----

    /// Inserts the reply, then bumps the thread counters in a second write
    pub async fn create_reply(
        &self,
        thread_id: i64,
        author_id: i64,
        data: &CreateReplyDTO,
    ) -> Result<ForumReply, Error> {
        let now = Utc::now();
        let reply = sqlx::query_as::<_, ForumReply>(
            r#"
            INSERT INTO forum_replies (thread_id, content, author_id, is_accepted, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(thread_id)
        .bind(&data.content)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await?;

        sqlx::query(
            "UPDATE forum_threads SET reply_count = reply_count + 1, last_reply_at = ? WHERE thread_id = ?",
        )
        .bind(now)
        .bind(thread_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(reply)
    }

    pub async fn find_replies(&self, thread_id: i64) -> Result<Vec<ForumReply>, Error> {
        sqlx::query_as::<_, ForumReply>(
            "SELECT * FROM forum_replies WHERE thread_id = ? ORDER BY created_at, reply_id",
        )
        .bind(thread_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn read_reply(&self, id: i64) -> Result<Option<ForumReply>, Error> {
        sqlx::query_as::<_, ForumReply>("SELECT * FROM forum_replies WHERE reply_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn update_reply(&self, id: i64, data: &UpdateReplyDTO) -> Result<ForumReply, Error> {
        sqlx::query_as::<_, ForumReply>(
            r#"
            UPDATE forum_replies
            SET content = COALESCE(?, content),
                is_accepted = COALESCE(?, is_accepted),
                updated_at = ?
            WHERE reply_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.content)
        .bind(data.is_accepted)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    /// Deletes the reply, then decrements the thread's counter in a second write
    pub async fn delete_reply(&self, reply: &ForumReply) -> Result<(), Error> {
        sqlx::query("DELETE FROM forum_replies WHERE reply_id = ?")
            .bind(reply.reply_id)
            .execute(&self.connection_pool)
            .await?;

        sqlx::query(
            "UPDATE forum_threads SET reply_count = MAX(reply_count - 1, 0) WHERE thread_id = ?",
        )
        .bind(reply.thread_id)
        .execute(&self.connection_pool)
        .await?;
        Ok(())
    }
}

impl Create<ForumCategory, CreateCategoryDTO> for ForumRepository {
    async fn create(&self, data: &CreateCategoryDTO) -> Result<ForumCategory, Error> {
        sqlx::query_as::<_, ForumCategory>(
            r#"
            INSERT INTO forum_categories (name, description, display_order, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.display_order)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<ForumThread, i64> for ForumRepository {
    async fn read(&self, id: &i64) -> Result<Option<ForumThread>, Error> {
        self.read_thread(*id).await
    }
}
