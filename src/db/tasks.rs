use super::db::{Db, StoreError};
use crate::libs::filters::{calculate_metadata, Filters, Metadata};
use crate::libs::task::Task;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const INSERT_TASK: &str = "INSERT INTO task_list (title, description, completed)
    VALUES (?1, ?2, ?3)
    RETURNING id, created_at, completed, version";
const SELECT_TASK: &str = "SELECT id, created_at, title, description, completed, version
    FROM task_list
    WHERE id = ?1";
const UPDATE_TASK: &str = "UPDATE task_list
    SET title = ?1, description = ?2, completed = ?3, version = version + 1
    WHERE id = ?4 AND version = ?5
    RETURNING version";
const DELETE_TASK: &str = "DELETE FROM task_list WHERE id = ?1";
const SELECT_TASKS_PAGE: &str = "SELECT COUNT(*) OVER(), id, created_at, title, description, completed, version
    FROM task_list";
const WHERE_FTS_MATCH: &str = "id IN (SELECT rowid FROM task_list_fts WHERE task_list_fts MATCH ?)";
const WHERE_COMPLETED: &str = "completed = ?";

/// Data access for the `task_list` table.
#[derive(Clone)]
pub struct Tasks {
    db: Db,
}

impl Tasks {
    pub fn new(db: Db) -> Self {
        Tasks { db }
    }

    /// Stores a new task and fills in `id`, `created_at` and `version`.
    pub async fn insert(&self, task: &mut Task) -> Result<(), StoreError> {
        let (title, description, completed) = (task.title.clone(), task.description.clone(), task.completed);

        let (id, created_at, completed, version) = self
            .db
            .run(move |conn| {
                Ok(conn.query_row(INSERT_TASK, params![title, description, completed], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, DateTime<Utc>>(1)?, row.get::<_, bool>(2)?, row.get::<_, i32>(3)?))
                })?)
            })
            .await?;

        task.id = id;
        task.created_at = created_at;
        task.completed = completed;
        task.version = version;
        tracing::debug!(id, "task inserted");

        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Task, StoreError> {
        if id < 1 {
            return Err(StoreError::RecordNotFound);
        }

        self.db
            .run(move |conn| {
                conn.query_row(SELECT_TASK, params![id], |row| task_from_row(row, 0))
                    .optional()?
                    .ok_or(StoreError::RecordNotFound)
            })
            .await
    }

    /// Writes `task` if its `version` still matches the stored one, then
    /// updates `task.version` to the new value.
    ///
    /// Zero matched rows is reported as [`StoreError::EditConflict`] whether
    /// the row was deleted or changed: the caller has already read it once.
    pub async fn update(&self, task: &mut Task) -> Result<(), StoreError> {
        let (title, description, completed) = (task.title.clone(), task.description.clone(), task.completed);
        let (id, version) = (task.id, task.version);

        let new_version = self
            .db
            .run(move |conn| {
                conn.query_row(UPDATE_TASK, params![title, description, completed, id, version], |row| row.get::<_, i32>(0))
                    .optional()?
                    .ok_or(StoreError::EditConflict)
            })
            .await?;

        task.version = new_version;
        tracing::debug!(id, version = new_version, "task updated");

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::RecordNotFound);
        }

        let rows_affected = self.db.run(move |conn| Ok(conn.execute(DELETE_TASK, params![id])?)).await?;
        if rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }
        tracing::debug!(id, "task deleted");

        Ok(())
    }

    /// One page of tasks plus pagination metadata.
    ///
    /// Empty `title`/`description` and `None` for `completed` leave that
    /// filter off. Text filters match when every word of the query appears
    /// in the column; a query with no words matches nothing.
    pub async fn get_all(&self, title: &str, description: &str, completed: Option<bool>, filters: &Filters) -> Result<(Vec<Task>, Metadata), StoreError> {
        let column = filters.sort_column().ok_or_else(|| StoreError::UnsafeSort(filters.sort.clone()))?;

        let mut conditions = Vec::new();
        let mut values = Vec::new();

        for (field, text) in [("title", title), ("description", description)] {
            if text.is_empty() {
                continue;
            }
            match fts_query(field, text) {
                Some(query) => {
                    conditions.push(WHERE_FTS_MATCH);
                    values.push(Value::Text(query));
                }
                None => return Ok((Vec::new(), Metadata::default())),
            }
        }
        if let Some(completed) = completed {
            conditions.push(WHERE_COMPLETED);
            values.push(Value::Integer(i64::from(completed)));
        }

        let where_clause = if conditions.is_empty() { String::new() } else { format!("WHERE {}", conditions.join(" AND ")) };
        let sql = format!("{} {} ORDER BY {} {}, id ASC LIMIT ? OFFSET ?", SELECT_TASKS_PAGE, where_clause, column, filters.sort_direction());
        values.push(Value::Integer(filters.limit()));
        values.push(Value::Integer(filters.offset()));

        let (page, page_size) = (filters.page, filters.page_size);

        self.db
            .run(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(params_from_iter(values.iter()))?;

                let mut total_records: i64 = 0;
                let mut tasks = Vec::new();
                while let Some(row) = rows.next()? {
                    total_records = row.get(0)?;
                    tasks.push(task_from_row(row, 1)?);
                }

                Ok((tasks, calculate_metadata(total_records, page, page_size)))
            })
            .await
    }
}

/// Reads the six task columns starting at `offset`.
fn task_from_row(row: &Row, offset: usize) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(offset)?,
        created_at: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        completed: row.get(offset + 4)?,
        version: row.get(offset + 5)?,
    })
}

/// Builds an FTS5 expression requiring every word of `text` in `column`.
///
/// Words are runs of alphanumeric characters; each is quoted so user input
/// can never be read as FTS5 syntax. Returns `None` when `text` has no words.
pub fn fts_query(column: &str, text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| format!("{} : \"{}\"", column, word))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}
