//! Task creation and listing

use std::sync::Arc;

use crate::models::{NewTask, Task};
use crate::pagination::{encode_cursor, Cursor, Direction, Page, Sort};
use crate::pipeline::ApiError;
use crate::repository::{RepositoryOperation, TaskRepository};

use super::Deadline;

/// One page of tasks plus the token for the next one
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page_info: Cursor,
}

/// Tasks scoped to their owner
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    deadline: Deadline,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, deadline: Deadline) -> Self {
        Self { tasks, deadline }
    }

    pub async fn create(&self, new_task: NewTask) -> Result<Task, ApiError> {
        self.deadline
            .start()
            .run(RepositoryOperation::Create, self.tasks.create(new_task))
            .await
    }

    /// List `owner_id`'s tasks
    ///
    /// `id` is always part of the ordering (newest first when nothing else is
    /// requested) so that rows with equal sort values still get a stable
    /// position in the cursor.
    pub async fn list(&self, owner_id: i64, page: &Page) -> Result<TaskPage, ApiError> {
        let page = with_id_tiebreak(page);

        let tasks = self
            .deadline
            .start()
            .run(
                RepositoryOperation::ListByOwner,
                self.tasks.list_by_owner(owner_id, &page),
            )
            .await?;

        let page_info = next_cursor(&page, &tasks)?;
        Ok(TaskPage { tasks, page_info })
    }
}

fn with_id_tiebreak(page: &Page) -> Page {
    let mut page = page.clone();
    let sorts = if page.is_keyset() {
        &mut page.cursor
    } else {
        &mut page.sort
    };

    if !sorts.iter().any(|sort| sort.field == "id") {
        sorts.push(Sort::new("id", Direction::Desc));
    }
    page
}

/// Value of `field` on `task` as written into a cursor
fn last_val(task: &Task, field: &str) -> Option<String> {
    match field {
        "id" => Some(task.id.to_string()),
        "title" => Some(task.title.clone()),
        "created_at" => Some(task.created_at.timestamp().to_string()),
        "is_complete" => Some(task.is_complete.to_string()),
        _ => None,
    }
}

fn next_cursor(page: &Page, tasks: &[Task]) -> Result<Cursor, ApiError> {
    let last = match tasks.last() {
        Some(last) if tasks.len() >= page.limit as usize => last,
        _ => return Ok(Cursor::end()),
    };

    let sorts: Vec<Sort> = page
        .sorts()
        .iter()
        .map(|sort| match last_val(last, &sort.field) {
            Some(value) => sort.clone().with_last_val(value),
            None => sort.clone(),
        })
        .collect();

    let next = encode_cursor(&sorts).map_err(ApiError::internal)?;
    Ok(Cursor::continue_from(next))
}
