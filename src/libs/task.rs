use super::validator::Validator;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum length, in bytes, of a task title or description.
pub const MAX_TEXT_BYTES: usize = 250;

/// A single to-do record.
///
/// `id`, `created_at` and `version` are owned by the store: they are filled
/// in on insert and `version` is bumped on every successful update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub version: i32,
}

impl Task {
    pub fn new(title: impl Into<String>, description: impl Into<String>, completed: bool) -> Self {
        Task {
            id: 0,
            created_at: DateTime::<Utc>::default(),
            title: title.into(),
            description: description.into(),
            completed,
            version: 0,
        }
    }
}

pub fn validate_task(v: &mut Validator, task: &Task) {
    v.check(!task.title.is_empty(), "title", "must be provided");
    v.check(task.title.len() <= MAX_TEXT_BYTES, "title", "must not be more than 250 bytes long");

    v.check(!task.description.is_empty(), "description", "must be provided");
    v.check(task.description.len() <= MAX_TEXT_BYTES, "description", "must not be more than 250 bytes long");
}
