use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::CreateTaskRequest;
use crate::error::{CoreError, CoreResult};
use crate::models::{Task, TaskStatus, User, Viewer};
use crate::policy;
use crate::store::{self, Collection, OrderBy, Store};

/// What a sender fills in; everything else is stamped by the engine.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assigned_to_user_id: Option<Uuid>,
    pub assigned_to_unit: Option<String>,
}

impl From<CreateTaskRequest> for TaskDraft {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            assigned_to_user_id: req.assigned_to_user_id,
            assigned_to_unit: req.assigned_to_unit,
        }
    }
}

#[derive(Clone)]
pub struct TaskEngine {
    store: Arc<dyn Store>,
}

impl TaskEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_task(&self, viewer: &Viewer, draft: TaskDraft) -> CoreResult<Task> {
        let title = draft.title.trim();
        let description = draft.description.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title is required"));
        }
        if description.is_empty() {
            return Err(CoreError::validation("description is required"));
        }
        let unit = draft
            .assigned_to_unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let is_personal = draft.assigned_to_user_id == Some(viewer.uid);
        if !is_personal {
            if draft.assigned_to_user_id.is_none() && unit.is_none() {
                return Err(CoreError::validation("a task needs a user or a unit to address"));
            }
            if let Some(target_id) = draft.assigned_to_user_id {
                self.check_user_target(viewer, target_id).await?;
            }
            if unit.is_some() && !policy::can_address_unit(viewer.role) {
                return Err(CoreError::Forbidden(format!(
                    "{} cannot address a whole unit",
                    viewer.role.as_str()
                )));
            }
        }

        let mut task = Task {
            id: Uuid::nil(),
            title: title.to_string(),
            description: description.to_string(),
            assigned_to_user_id: draft.assigned_to_user_id,
            // Personal notes never reach a unit.
            assigned_to_unit: if is_personal { None } else { unit },
            assigned_by: viewer.uid,
            sender_name: viewer.display_name.clone(),
            sender_role: viewer.role,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            read_at: None,
            completion_note: None,
            completed_at: None,
        };
        task.id = store::insert(self.store.as_ref(), Collection::Tasks, &task).await?;

        tracing::info!(
            task_id = %task.id,
            sender = %viewer.uid,
            personal = is_personal,
            "task created"
        );
        Ok(task)
    }

    async fn check_user_target(&self, viewer: &Viewer, target_id: Uuid) -> CoreResult<()> {
        let target: User = store::fetch(self.store.as_ref(), Collection::Users, target_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {target_id}")))?;

        if !policy::can_address(viewer.role, target.role) {
            tracing::debug!(
                sender_role = viewer.role.as_str(),
                target_role = target.role.as_str(),
                "task addressing rejected"
            );
            return Err(CoreError::Forbidden(format!(
                "{} cannot address a task to {}",
                viewer.role.as_str(),
                target.role.as_str()
            )));
        }
        Ok(())
    }

    pub async fn get(&self, task_id: Uuid) -> CoreResult<Task> {
        store::fetch(self.store.as_ref(), Collection::Tasks, task_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("task {task_id}")))
    }

    /// Load a task for display, marking it read for its addressee.
    pub async fn open(&self, task_id: Uuid, viewer: &Viewer) -> CoreResult<Task> {
        let mut task = self.get(task_id).await?;
        if let Some(read_at) = self.mark_read_loaded(&task, viewer).await? {
            task.read_at = Some(read_at);
        }
        Ok(task)
    }

    /// Returns whether a write happened. Repeated calls are no-ops.
    pub async fn mark_read(&self, task_id: Uuid, viewer: &Viewer) -> CoreResult<bool> {
        let task = self.get(task_id).await?;
        Ok(self.mark_read_loaded(&task, viewer).await?.is_some())
    }

    async fn mark_read_loaded(
        &self,
        task: &Task,
        viewer: &Viewer,
    ) -> CoreResult<Option<chrono::DateTime<Utc>>> {
        if !task.is_assigned_to(viewer) || !task.is_unread() {
            return Ok(None);
        }
        let now = Utc::now();
        self.store
            .update(Collection::Tasks, task.id, json!({ "read_at": now }))
            .await?;
        tracing::debug!(task_id = %task.id, "task marked read");
        Ok(Some(now))
    }

    /// Completion is terminal; the first note is kept.
    pub async fn complete(&self, task_id: Uuid, note: &str) -> CoreResult<Task> {
        let note = note.trim();
        if note.is_empty() {
            return Err(CoreError::validation("a completion note is required"));
        }

        let mut task = self.get(task_id).await?;
        if task.status == TaskStatus::Completed {
            return Err(CoreError::validation("task is already completed"));
        }

        let now = Utc::now();
        self.store
            .update(
                Collection::Tasks,
                task_id,
                json!({
                    "status": TaskStatus::Completed,
                    "completion_note": note,
                    "completed_at": now,
                }),
            )
            .await?;

        task.status = TaskStatus::Completed;
        task.completion_note = Some(note.to_string());
        task.completed_at = Some(now);
        tracing::info!(task_id = %task_id, "task completed");
        Ok(task)
    }

    pub async fn delete(&self, task_id: Uuid) -> CoreResult<()> {
        self.store.delete(Collection::Tasks, task_id).await?;
        tracing::info!(task_id = %task_id, "task deleted");
        Ok(())
    }

    /// Every task, newest first.
    pub async fn list_all(&self) -> CoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = store::fetch_all(
            self.store.as_ref(),
            Collection::Tasks,
            Some(OrderBy::desc("created_at")),
        )
        .await?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::MemoryStore;
    use crate::tasks::TaskViews;
    use assert_matches::assert_matches;

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: TaskEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let engine = TaskEngine::new(store.clone());
        Fixture { store, engine }
    }

    async fn add_user(store: &MemoryStore, name: &str, role: Role, unit: Option<&str>) -> Viewer {
        let mut user = User {
            uid: Uuid::nil(),
            display_name: name.to_string(),
            username: name.to_lowercase(),
            role,
            unit: unit.map(str::to_string),
        };
        user.uid = store::insert(store, Collection::Users, &user).await.unwrap();
        Viewer::from(&user)
    }

    fn draft(to: Option<Uuid>, unit: Option<&str>) -> TaskDraft {
        TaskDraft {
            title: "Ziyaret raporu".into(),
            description: "Perşembe ziyaretinin raporunu yükleyin".into(),
            assigned_to_user_id: to,
            assigned_to_unit: unit.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn title_and_description_are_required() {
        let f = fixture();
        let me = add_user(&f.store, "Ayşe", Role::Sorumlu, None).await;

        let mut no_title = draft(Some(me.uid), None);
        no_title.title = "   ".into();
        assert_matches!(f.engine.create_task(&me, no_title).await, Err(CoreError::Validation(_)));

        let mut no_description = draft(Some(me.uid), None);
        no_description.description.clear();
        assert_matches!(
            f.engine.create_task(&me, no_description).await,
            Err(CoreError::Validation(_))
        );
        assert!(f.engine.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn peer_sorumlu_addressing_is_rejected_before_persistence() {
        let f = fixture();
        let sender = add_user(&f.store, "Ayşe", Role::Sorumlu, Some("Ankara")).await;
        let peer = add_user(&f.store, "Mehmet", Role::Sorumlu, Some("İzmir")).await;

        let err = f.engine.create_task(&sender, draft(Some(peer.uid), None)).await;
        assert_matches!(err, Err(CoreError::Forbidden(_)));
        assert!(f.engine.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_addressee_is_not_found() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        assert_matches!(
            f.engine.create_task(&admin, draft(Some(Uuid::new_v4()), None)).await,
            Err(CoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn unit_addressing_follows_role() {
        let f = fixture();
        let sorumlu = add_user(&f.store, "Ayşe", Role::Sorumlu, Some("Ankara")).await;
        let koordinator = add_user(&f.store, "Can", Role::Koordinator, Some("Ankara")).await;

        let task = f
            .engine
            .create_task(&sorumlu, draft(None, Some("Ankara")))
            .await
            .unwrap();
        assert_eq!(task.assigned_to_unit.as_deref(), Some("Ankara"));

        assert_matches!(
            f.engine.create_task(&koordinator, draft(None, Some("Ankara"))).await,
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            f.engine.create_task(&koordinator, draft(None, None)).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn anyone_can_write_a_personal_note() {
        let f = fixture();
        let viewer = add_user(&f.store, "İzzet", Role::Izleyici, Some("Ankara")).await;
        let note = f
            .engine
            .create_task(&viewer, draft(Some(viewer.uid), Some("Ankara")))
            .await
            .unwrap();
        assert!(note.is_personal_note());
        assert_eq!(note.assigned_to_unit, None);
        assert_eq!(note.sender_role, Role::Izleyici);
    }

    #[tokio::test]
    async fn mark_read_is_idempotent_and_addressee_only() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let koord = add_user(&f.store, "Can", Role::Koordinator, None).await;
        let task = f
            .engine
            .create_task(&admin, draft(Some(koord.uid), None))
            .await
            .unwrap();

        assert!(!f.engine.mark_read(task.id, &admin).await.unwrap());
        assert!(f.engine.mark_read(task.id, &koord).await.unwrap());
        let first_read = f.engine.get(task.id).await.unwrap().read_at;
        assert!(first_read.is_some());

        assert!(!f.engine.mark_read(task.id, &koord).await.unwrap());
        let opened = f.engine.open(task.id, &koord).await.unwrap();
        assert_eq!(opened.read_at, first_read);
    }

    #[tokio::test]
    async fn open_marks_unread_task_read() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let koord = add_user(&f.store, "Can", Role::Koordinator, None).await;
        let task = f
            .engine
            .create_task(&admin, draft(Some(koord.uid), None))
            .await
            .unwrap();

        let opened = f.engine.open(task.id, &koord).await.unwrap();
        assert!(opened.read_at.is_some());
        assert_eq!(f.engine.get(task.id).await.unwrap().read_at, opened.read_at);
    }

    #[tokio::test]
    async fn completed_task_is_never_marked_read() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let koord = add_user(&f.store, "Can", Role::Koordinator, None).await;
        let task = f
            .engine
            .create_task(&admin, draft(Some(koord.uid), None))
            .await
            .unwrap();
        f.engine.complete(task.id, "Tamamlandı").await.unwrap();

        assert!(!f.engine.mark_read(task.id, &koord).await.unwrap());
        let opened = f.engine.open(task.id, &koord).await.unwrap();
        assert_eq!(opened.read_at, None);
        assert_eq!(f.engine.get(task.id).await.unwrap().read_at, None);
    }

    #[tokio::test]
    async fn unit_member_does_not_mark_read() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let member = add_user(&f.store, "Can", Role::Koordinator, Some("Ankara")).await;
        let task = f
            .engine
            .create_task(&admin, draft(None, Some("Ankara")))
            .await
            .unwrap();

        assert!(task.is_for_unit_of(&member));
        assert!(!f.engine.mark_read(task.id, &member).await.unwrap());
        let opened = f.engine.open(task.id, &member).await.unwrap();
        assert_eq!(opened.read_at, None);
        assert!(f.engine.get(task.id).await.unwrap().is_unread());
    }

    #[tokio::test]
    async fn completion_needs_a_note_and_happens_once() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let koord = add_user(&f.store, "Can", Role::Koordinator, None).await;
        let task = f
            .engine
            .create_task(&admin, draft(Some(koord.uid), None))
            .await
            .unwrap();

        assert_matches!(f.engine.complete(task.id, "  ").await, Err(CoreError::Validation(_)));
        assert_eq!(f.engine.get(task.id).await.unwrap().status, TaskStatus::Pending);

        let done = f.engine.complete(task.id, "Rapor yüklendi").await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());

        assert_matches!(
            f.engine.complete(task.id, "ikinci not").await,
            Err(CoreError::Validation(_))
        );
        let stored = f.engine.get(task.id).await.unwrap();
        assert_eq!(stored.completion_note.as_deref(), Some("Rapor yüklendi"));
        assert_eq!(stored.completed_at, done.completed_at);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let f = fixture();
        let me = add_user(&f.store, "Ayşe", Role::Sorumlu, None).await;
        let task = f.engine.create_task(&me, draft(Some(me.uid), None)).await.unwrap();

        f.engine.delete(task.id).await.unwrap();
        f.engine.delete(task.id).await.unwrap();
        assert_matches!(f.engine.get(task.id).await, Err(CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn sorumlu_task_lands_in_received_and_sent_only() {
        let f = fixture();
        let u1 = add_user(&f.store, "Can", Role::Koordinator, Some("Ankara")).await;
        let u2 = add_user(&f.store, "Ayşe", Role::Sorumlu, Some("Ankara")).await;

        let task = f.engine.create_task(&u2, draft(Some(u1.uid), None)).await.unwrap();
        let all = f.engine.list_all().await.unwrap();

        let v1 = TaskViews::for_viewer(&all, &u1);
        assert_eq!(v1.received.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task.id]);
        assert!(v1.sent.is_empty() && v1.personal.is_empty());
        assert_eq!(v1.unread_count(), 1);

        let v2 = TaskViews::for_viewer(&all, &u2);
        assert_eq!(v2.sent.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task.id]);
        assert!(v2.received.is_empty() && v2.personal.is_empty());
        assert_eq!(v2.unread_count(), 0);

        f.engine.open(task.id, &u1).await.unwrap();
        let all = f.engine.list_all().await.unwrap();
        assert_eq!(TaskViews::for_viewer(&all, &u1).unread_count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_task_pending() {
        let f = fixture();
        let admin = add_user(&f.store, "Admin", Role::Admin, None).await;
        let koord = add_user(&f.store, "Can", Role::Koordinator, None).await;
        let task = f
            .engine
            .create_task(&admin, draft(Some(koord.uid), None))
            .await
            .unwrap();

        f.store.set_fail_writes(true);
        assert_matches!(
            f.engine.complete(task.id, "tamam").await,
            Err(CoreError::Persistence(_))
        );
        f.store.set_fail_writes(false);
        assert_eq!(f.engine.get(task.id).await.unwrap().status, TaskStatus::Pending);
    }
}
