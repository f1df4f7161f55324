//! `POST /tasks` and `GET /tasks`

use async_trait::async_trait;
use axum::extract::Request;
use serde::{Deserialize, Serialize};

use super::body::read_json;
use crate::models::{NewTask, TaskData};
use crate::pagination::{Cursor, FieldType, SortableFields};
use crate::pipeline::{ApiError, Handler, Outcome, Reply, RequestContext};
use crate::service::TaskService;

/// Fields `GET /tasks` may be sorted by
pub fn sortable_fields() -> SortableFields {
    SortableFields::new()
        .field("title", FieldType::String)
        .field("created_at", FieldType::UnixTime)
        .field("id", FieldType::Int64)
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
}

impl CreateTaskRequest {
    fn into_new_task(self, owner_id: i64) -> Result<NewTask, ApiError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::invalid(
                "validation error",
                "Non-empty value is required",
                "title",
            ));
        }

        Ok(NewTask {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            owner_id,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreatedTask {
    task: TaskData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskList {
    tasks: Vec<TaskData>,
    page_info: Cursor,
}

/// Creates a task owned by the caller
pub struct CreateTask {
    tasks: TaskService,
}

impl CreateTask {
    pub fn new(tasks: TaskService) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl Handler for CreateTask {
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
        let owner_id = ctx.user_id().ok_or(ApiError::Unauthorized)?;
        let body: CreateTaskRequest = read_json(request, ctx).await?;

        let new_task = body
            .into_new_task(owner_id)
            .inspect_err(|_| ctx.add_log_message("validation error"))?;

        let task = self.tasks.create(new_task).await?;
        ctx.add_log_field("task_id", task.id);

        Reply::created(&CreatedTask {
            task: TaskData::from(&task),
        })
    }
}

/// Lists the caller's tasks one page at a time
pub struct ListTasks {
    tasks: TaskService,
}

impl ListTasks {
    pub fn new(tasks: TaskService) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl Handler for ListTasks {
    async fn call(&self, _request: Request, ctx: &mut RequestContext) -> Outcome {
        let owner_id = ctx.user_id().ok_or(ApiError::Unauthorized)?;

        let page = self.tasks.list(owner_id, ctx.page()).await?;
        ctx.add_log_field("task_count", page.tasks.len());

        Reply::ok(&TaskList {
            tasks: page.tasks.iter().map(TaskData::from).collect(),
            page_info: page.page_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ErrorBody;

    #[test]
    fn test_title_is_trimmed() {
        let new_task = CreateTaskRequest {
            title: "  buy milk ".into(),
            description: " two litres ".into(),
        }
        .into_new_task(3)
        .unwrap();

        assert_eq!(new_task.title, "buy milk");
        assert_eq!(new_task.description, "two litres");
        assert_eq!(new_task.owner_id, 3);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = CreateTaskRequest {
            title: "   ".into(),
            description: String::new(),
        }
        .into_new_task(3)
        .unwrap_err();

        assert_eq!(err.bodies(), vec![ErrorBody::new("Non-empty value is required", "title")]);
    }

    #[test]
    fn test_sortable_fields() {
        let fields = sortable_fields();
        assert_eq!(fields.get("title"), Some(FieldType::String));
        assert_eq!(fields.get("created_at"), Some(FieldType::UnixTime));
        assert_eq!(fields.get("id"), Some(FieldType::Int64));
        assert_eq!(fields.get("owner_id"), None);
    }
}
