//! Student-lesson projection queries for the admin console.

use sqlx::PgPool;
use uuid::Uuid;

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_core::types::pagination::{PageRequest, PageResponse};
use lessonhub_entity::progress::{ProgressStatus, StudentLessonView};

/// Columns selected for the [`StudentLessonView`] projection.
const VIEW_COLUMNS: &str = "p.id, p.student_id, s.name AS student_name, p.lesson_id, \
     l.title AS lesson_title, p.status, p.video_view_count, p.exam_score, p.completed, \
     g.expires_at, COALESCE(g.revoked, FALSE) AS revoked, p.last_updated";

/// Join clause shared by the list and count queries.
const VIEW_JOINS: &str = "FROM lesson_progress p \
     JOIN students s ON s.id = p.student_id \
     JOIN lessons l ON l.id = p.lesson_id \
     LEFT JOIN access_grants g ON g.student_id = p.student_id AND g.lesson_id = p.lesson_id";

/// Repository for the joined student-lesson table view.
#[derive(Debug, Clone)]
pub struct StudentLessonRepository {
    pool: PgPool,
}

impl StudentLessonRepository {
    /// Create a new student-lesson projection repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List student-lesson rows with optional filters, newest first.
    pub async fn list(
        &self,
        student_id: Option<Uuid>,
        lesson_id: Option<Uuid>,
        status: Option<ProgressStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<StudentLessonView>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if student_id.is_some() {
            conditions.push(format!("p.student_id = ${param_idx}"));
            param_idx += 1;
        }
        if lesson_id.is_some() {
            conditions.push(format!("p.lesson_id = ${param_idx}"));
            param_idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("p.status = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) {VIEW_JOINS} {where_clause}");
        let select_sql = format!(
            "SELECT {VIEW_COLUMNS} {VIEW_JOINS} {where_clause} \
             ORDER BY p.last_updated DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, StudentLessonView>(&select_sql);

        if let Some(sid) = student_id {
            count_query = count_query.bind(sid);
            select_query = select_query.bind(sid);
        }
        if let Some(lid) = lesson_id {
            count_query = count_query.bind(lid);
            select_query = select_query.bind(lid);
        }
        if let Some(st) = status {
            count_query = count_query.bind(st);
            select_query = select_query.bind(st);
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count student lessons", e)
        })?;

        let rows = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list student lessons", e)
            })?;

        Ok(PageResponse::new(rows, page.page, page.page_size, total as u64))
    }

    /// Fetch a single student-lesson row by its progress record ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudentLessonView>> {
        let sql = format!("SELECT {VIEW_COLUMNS} {VIEW_JOINS} WHERE p.id = $1");
        sqlx::query_as::<_, StudentLessonView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find student lesson", e)
            })
    }
}
