//! Service-level tests for the task lifecycle: validation, defaults,
//! toggle involution, filtering, and deletion.

use std::sync::Arc;

use taskboard::storage::Storage;
use taskboard::tasks::{NewTask, TaskError, TaskPatch, TaskService};
use tempfile::TempDir;

async fn make_service(dir: &TempDir) -> TaskService {
    let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
    TaskService::new(storage)
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_applies_defaults() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let mutation = svc.create(new_task("Buy milk")).await.unwrap();
    let task = mutation.task;

    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.priority, "medium");
    assert!(!task.is_completed);
    assert_eq!(task.description, None);
    assert_eq!(task.created_at, task.updated_at);
    assert_eq!(mutation.notice, "Task created.");
}

#[tokio::test]
async fn create_uses_supplied_priority_and_trims_title() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let mutation = svc
        .create(NewTask {
            title: "  Walk the dog  ".to_string(),
            description: Some("around the block".to_string()),
            priority: Some("high".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(mutation.task.title, "Walk the dog");
    assert_eq!(mutation.task.priority, "high");
    assert_eq!(mutation.task.description.as_deref(), Some("around the block"));
}

#[tokio::test]
async fn create_rejects_empty_title_without_persisting() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let err = svc.create(new_task("   ")).await.unwrap_err();
    match err {
        TaskError::Validation { ref errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "title");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let page = svc.list(None).await.unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn create_rejects_unknown_priority_without_persisting() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let err = svc
        .create(NewTask {
            title: "X".to_string(),
            priority: Some("urgent".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.field_message("priority"),
        Some("Priority must be one of: low, medium, high.")
    );
    assert_eq!(svc.list(None).await.unwrap().total_count, 0);
}

#[tokio::test]
async fn create_reports_all_invalid_fields_at_once() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let err = svc
        .create(NewTask {
            title: String::new(),
            priority: Some("urgent".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(err.field_message("title").is_some());
    assert!(err.field_message("priority").is_some());
}

#[tokio::test]
async fn toggle_is_an_involution() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;
    let id = svc.create(new_task("flip me")).await.unwrap().task.id;

    let once = svc.toggle(&id).await.unwrap();
    assert!(once.is_completed);

    let twice = svc.toggle(&id).await.unwrap();
    assert!(!twice.is_completed);
}

#[tokio::test]
async fn toggle_touches_updated_at_only() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;
    let created = svc.create(new_task("timestamps")).await.unwrap().task;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let toggled = svc.toggle(&created.id).await.unwrap();

    assert_eq!(toggled.created_at, created.created_at);
    assert_ne!(toggled.updated_at, created.updated_at);
}

#[tokio::test]
async fn update_applies_only_supplied_fields() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;
    let id = svc
        .create(NewTask {
            title: "Original".to_string(),
            description: Some("keep me".to_string()),
            priority: Some("low".to_string()),
        })
        .await
        .unwrap()
        .task
        .id;

    let mutation = svc
        .update(
            &id,
            TaskPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(mutation.task.title, "Renamed");
    assert_eq!(mutation.task.description.as_deref(), Some("keep me"));
    assert_eq!(mutation.task.priority, "low");
    assert!(!mutation.task.is_completed);
    assert_eq!(mutation.notice, "Task updated.");
}

#[tokio::test]
async fn update_validation_failure_leaves_row_unchanged() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;
    let task = svc.create(new_task("untouched")).await.unwrap().task;

    let err = svc
        .update(
            &task.id,
            TaskPatch {
                title: Some("   ".to_string()),
                priority: Some("urgent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation { .. }));

    let after = svc.get(&task.id).await.unwrap();
    assert_eq!(after.title, "untouched");
    assert_eq!(after.priority, "medium");
    assert_eq!(after.updated_at, task.updated_at);
}

#[tokio::test]
async fn unknown_ids_fail_with_not_found() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let missing = "no-such-id";
    assert!(matches!(
        svc.get(missing).await.unwrap_err(),
        TaskError::NotFound(_)
    ));
    assert!(matches!(
        svc.update(missing, TaskPatch::default()).await.unwrap_err(),
        TaskError::NotFound(_)
    ));
    assert!(matches!(
        svc.toggle(missing).await.unwrap_err(),
        TaskError::NotFound(_)
    ));
    assert!(matches!(
        svc.delete(missing).await.unwrap_err(),
        TaskError::NotFound(_)
    ));
}

#[tokio::test]
async fn delete_removes_the_task() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;
    let id = svc.create(new_task("short-lived")).await.unwrap().task.id;

    let notice = svc.delete(&id).await.unwrap();
    assert_eq!(notice, "Task deleted.");

    let page = svc.list(None).await.unwrap();
    assert!(page.tasks.iter().all(|t| t.id != id));
    assert!(matches!(
        svc.get(&id).await.unwrap_err(),
        TaskError::NotFound(_)
    ));
}

#[tokio::test]
async fn list_filters_by_exact_priority() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    for (title, priority) in [("a", "low"), ("b", "medium"), ("c", "high"), ("d", "high")] {
        svc.create(NewTask {
            title: title.to_string(),
            priority: Some(priority.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    for (priority, expected) in [("low", 1), ("medium", 1), ("high", 2)] {
        let page = svc.list(Some(priority)).await.unwrap();
        assert_eq!(page.total_count, expected, "filter {priority}");
        assert!(page.tasks.iter().all(|t| t.priority == priority));
    }

    assert_eq!(svc.list(None).await.unwrap().total_count, 4);
    // An unrecognised filter value matches nothing.
    assert_eq!(svc.list(Some("urgent")).await.unwrap().total_count, 0);
}

#[tokio::test]
async fn list_orders_newest_first_and_counts_completed() {
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let first = svc.create(new_task("first")).await.unwrap().task.id;
    let second = svc.create(new_task("second")).await.unwrap().task.id;
    let third = svc.create(new_task("third")).await.unwrap().task.id;
    svc.toggle(&first).await.unwrap();

    let page = svc.list(None).await.unwrap();
    let ids: Vec<&str> = page.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);
    assert_eq!(page.completed_count, 1);
    assert_eq!(page.total_count, 3);
}

#[tokio::test]
async fn lifecycle_scenario() {
    // create (priority omitted) → toggle → update priority → delete
    let dir = TempDir::new().unwrap();
    let svc = make_service(&dir).await;

    let task = svc.create(new_task("Buy milk")).await.unwrap().task;
    assert_eq!(task.priority, "medium");
    assert!(!task.is_completed);

    let toggled = svc.toggle(&task.id).await.unwrap();
    assert!(toggled.is_completed);

    let updated = svc
        .update(
            &task.id,
            TaskPatch {
                priority: Some("high".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .task;
    assert_eq!(updated.priority, "high");
    assert!(updated.is_completed, "toggle state must survive the update");

    svc.delete(&task.id).await.unwrap();
    assert!(svc
        .list(None)
        .await
        .unwrap()
        .tasks
        .iter()
        .all(|t| t.id != task.id));
}
