//! In-memory repositories backed by `DashMap`

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};

use super::error::RepositoryError;
use super::traits::{RepositoryResult, TaskRepository, UserRepository};
use crate::models::{NewTask, NewUser, Task, User};
use crate::pagination::{Direction, Page, Sort};

/// Users keyed by id, with a unique index on lower-cased email
#[derive(Debug)]
pub struct MemoryUserRepository {
    users: DashMap<i64, User>,
    emails: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        // The email entry stays locked until the user row exists
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(RepositoryError::already_exists("user", "email")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
                let user = User {
                    id,
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };

                self.users.insert(id, user.clone());
                slot.insert(id);
                Ok(user)
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let id = match self.emails.get(&email.to_lowercase()) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_by_id(id).await
    }
}

/// Tasks keyed by id
#[derive(Debug)]
pub struct MemoryTaskRepository {
    tasks: DashMap<i64, Task>,
    next_id: AtomicI64,
}

impl Default for MemoryTaskRepository {
    fn default() -> Self {
        Self {
            tasks: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: NewTask) -> RepositoryResult<Task> {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let task = Task {
            id,
            title: task.title,
            description: task.description,
            owner_id: task.owner_id,
            is_complete: false,
            created_at: now,
            updated_at: now,
        };

        self.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|task| task.clone()))
    }

    async fn list_by_owner(&self, owner_id: i64, page: &Page) -> RepositoryResult<Vec<Task>> {
        let sorts = page.sorts();

        let mut rows: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by(|a, b| order_rows(a, b, sorts));

        let skip = if page.is_keyset() {
            0
        } else {
            usize::try_from(page.offset).unwrap_or(usize::MAX)
        };

        Ok(rows
            .into_iter()
            .filter(|task| !page.is_keyset() || is_after_cursor(task, &page.cursor))
            .skip(skip)
            .take(page.limit as usize)
            .collect())
    }
}

/// Order two rows by `field`
///
/// `created_at` compares whole seconds, the precision cursors carry, so rows
/// within one second fall through to the next sort and keyset filtering
/// agrees with the row order.
fn compare_rows(a: &Task, b: &Task, field: &str) -> Ordering {
    match field {
        "id" => a.id.cmp(&b.id),
        "title" => a.title.cmp(&b.title),
        "created_at" => a.created_at.timestamp().cmp(&b.created_at.timestamp()),
        "is_complete" => a.is_complete.cmp(&b.is_complete),
        _ => Ordering::Equal,
    }
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

fn order_rows(a: &Task, b: &Task, sorts: &[Sort]) -> Ordering {
    sorts
        .iter()
        .map(|sort| directed(compare_rows(a, b, &sort.field), sort.direction))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Compare a row's value with a cursor's `last_val`; `None` when the value
/// cannot be compared
fn compare_to_last_val(task: &Task, sort: &Sort) -> Option<Ordering> {
    if sort.last_val.is_empty() {
        return None;
    }

    match sort.field.as_str() {
        "id" => sort.last_val.parse::<i64>().ok().map(|v| task.id.cmp(&v)),
        "title" => Some(task.title.as_str().cmp(sort.last_val.as_str())),
        "created_at" => sort
            .last_val
            .parse::<i64>()
            .ok()
            .map(|v| task.created_at.timestamp().cmp(&v)),
        "is_complete" => sort
            .last_val
            .to_lowercase()
            .parse::<bool>()
            .ok()
            .map(|v| task.is_complete.cmp(&v)),
        _ => None,
    }
}

fn is_after_cursor(task: &Task, cursor: &[Sort]) -> bool {
    cursor
        .iter()
        .filter_map(|sort| compare_to_last_val(task, sort).map(|o| directed(o, sort.direction)))
        .find(|ordering| ordering.is_ne())
        .is_some_and(|ordering| ordering == Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    async fn seeded_tasks(owner_id: i64, titles: &[&str]) -> MemoryTaskRepository {
        let repo = MemoryTaskRepository::new();
        for title in titles {
            repo.create(NewTask {
                title: title.to_string(),
                description: String::new(),
                owner_id,
            })
            .await
            .unwrap();
        }
        repo
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_user_email_is_unique_case_insensitively() {
        let repo = MemoryUserRepository::new();
        let first = repo.create(new_user("ada@example.com")).await.unwrap();
        assert_eq!(first.id, 1);
        assert!(first.is_active);

        let err = repo.create(new_user("ADA@example.com")).await.unwrap_err();
        assert_eq!(err, RepositoryError::already_exists("user", "email"));
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("ada@example.com")).await.unwrap();

        assert_eq!(repo.get_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(repo.get_by_email("ada@example.com").await.unwrap(), Some(user));
        assert_eq!(repo.get_by_email("bob@example.com").await.unwrap(), None);
        assert_eq!(repo.get_by_id(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let repo = seeded_tasks(1, &["a", "b"]).await;
        repo.create(NewTask {
            title: "other".into(),
            description: String::new(),
            owner_id: 2,
        })
        .await
        .unwrap();

        let page = Page {
            sort: vec![Sort::new("id", Direction::Asc)],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_sorts_and_slices() {
        let repo = seeded_tasks(1, &["c", "a", "d", "b"]).await;

        let page = Page {
            limit: 2,
            offset: 2,
            sort: vec![Sort::new("title", Direction::Asc)],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["c", "d"]);

        let page = Page {
            limit: 3,
            sort: vec![Sort::new("title", Direction::Desc)],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["d", "c", "b"]);
    }

    #[tokio::test]
    async fn test_list_continues_after_cursor() {
        let repo = seeded_tasks(1, &["a", "b", "b", "c"]).await;

        // last row seen: the first "b" (id 2)
        let page = Page {
            limit: 10,
            offset: 40,
            cursor: vec![
                Sort::new("title", Direction::Asc).with_last_val("b"),
                Sort::new("id", Direction::Asc).with_last_val("2"),
            ],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();

        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_descending_cursor() {
        let repo = seeded_tasks(1, &["a", "b", "c"]).await;

        let page = Page {
            cursor: vec![Sort::new("id", Direction::Desc).with_last_val("3")],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_same_second_rows_follow_the_tiebreak() {
        let repo = seeded_tasks(1, &["a", "b", "c"]).await;
        let second = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        for (id, millis) in [(1, 100), (2, 500), (3, 900)] {
            if let Some(mut task) = repo.tasks.get_mut(&id) {
                task.created_at = second + chrono::Duration::milliseconds(millis);
            }
        }

        let page = Page {
            cursor: vec![
                Sort::new("created_at", Direction::Asc).with_last_val("1700000000"),
                Sort::new("id", Direction::Desc).with_last_val("3"),
            ],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["b", "a"]);

        let page = Page {
            sort: vec![
                Sort::new("created_at", Direction::Asc),
                Sort::new("id", Direction::Desc),
            ],
            ..Page::default()
        };
        let tasks = repo.list_by_owner(1, &page).await.unwrap();
        assert_eq!(titles(&tasks), vec!["c", "b", "a"]);
    }
}
