use tracing::info;

use crate::domain::{Subtask, SubtaskPatch, Task, TaskPatch};
use crate::store::{StoreError, TaskStore};

/// One status write the caller still has to send to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Task { task_id: String, status: bool },
    Subtask { subtask_id: String, status: bool },
}

impl StatusUpdate {
    pub fn status(&self) -> bool {
        match self {
            StatusUpdate::Task { status, .. } | StatusUpdate::Subtask { status, .. } => *status,
        }
    }
}

/// Decides the writes for setting `task` to `new_status`.
///
/// Completing a task forces every one of its subtasks to completed as well.
/// Un-completing only touches the task itself.
pub fn apply_completion(task: &Task, subtasks: &[Subtask], new_status: bool) -> Vec<StatusUpdate> {
    let mut updates = vec![StatusUpdate::Task {
        task_id: task.id.clone(),
        status: new_status,
    }];

    if new_status {
        updates.extend(
            subtasks
                .iter()
                .filter(|subtask| subtask.task_id == task.id)
                .map(|subtask| StatusUpdate::Subtask {
                    subtask_id: subtask.id.clone(),
                    status: true,
                }),
        );
    }

    updates
}

pub fn toggle_task(task: &Task, subtasks: &[Subtask]) -> Vec<StatusUpdate> {
    apply_completion(task, subtasks, !task.status)
}

/// Subtasks never propagate upward.
pub fn toggle_subtask(subtask: &Subtask) -> StatusUpdate {
    StatusUpdate::Subtask {
        subtask_id: subtask.id.clone(),
        status: !subtask.status,
    }
}

/// Sends `updates` to the store in order, stopping at the first failure.
///
/// Writes made before the failure stay applied; refetch before retrying.
pub fn dispatch<S: TaskStore + ?Sized>(
    store: &mut S,
    updates: &[StatusUpdate],
) -> Result<(), StoreError> {
    for update in updates {
        match update {
            StatusUpdate::Task { task_id, status } => {
                store.update_task(task_id, &TaskPatch::status(*status))?;
            }
            StatusUpdate::Subtask { subtask_id, status } => {
                store.update_subtask(subtask_id, &SubtaskPatch::status(*status))?;
            }
        }
    }

    if let Some(first) = updates.first() {
        info!(
            updates = updates.len(),
            status = first.status(),
            "status change dispatched"
        );
    }
    Ok(())
}

/// Fetches the task's subtasks, decides the cascade and dispatches it.
pub fn set_task_status<S: TaskStore + ?Sized>(
    store: &mut S,
    task: &Task,
    new_status: bool,
) -> Result<Vec<StatusUpdate>, StoreError> {
    let subtasks = if new_status {
        store.subtasks_by_task(&task.id)?
    } else {
        Vec::new()
    };
    let updates = apply_completion(task, &subtasks, new_status);
    dispatch(store, &updates)?;
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone, Utc};

    use crate::domain::{GroupKind, NewSubtask, NewTask, Priority, SubtaskPatch, Workspace};

    use super::*;

    fn workspace_with_two_subtasks() -> (Workspace, String, Vec<String>) {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let start = Local.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap();

        let mut workspace = Workspace::new();
        let group = workspace
            .add_group("owner", "Chores", GroupKind::Categories, None, now)
            .expect("group should be created");
        let task = workspace
            .add_task(
                "owner",
                NewTask {
                    name: "Clean garage".to_string(),
                    start_date: start,
                    end_date: end,
                    notes: None,
                    group_id: group,
                    priority: Priority::Low,
                },
                now,
            )
            .expect("task should be created");
        let subtasks = ["Sweep", "Sort boxes"]
            .into_iter()
            .map(|name| {
                workspace
                    .add_subtask(
                        "owner",
                        NewSubtask {
                            task_id: task.clone(),
                            name: name.to_string(),
                            start_date: start,
                            end_date: end,
                            notes: None,
                            priority: Priority::Low,
                        },
                        now,
                    )
                    .expect("subtask should be created")
            })
            .collect::<Vec<_>>();
        (workspace, task, subtasks)
    }

    #[test]
    fn completing_yields_one_update_per_subtask_plus_the_task() {
        let (workspace, task_id, _) = workspace_with_two_subtasks();
        let task = workspace.task(&task_id).expect("task exists").clone();
        let subtasks = workspace
            .subtasks_of(&task_id)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        let updates = apply_completion(&task, &subtasks, true);
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(StatusUpdate::status));
        assert_eq!(
            updates[0],
            StatusUpdate::Task {
                task_id: task_id.clone(),
                status: true
            }
        );

        let updates = apply_completion(&task, &subtasks, false);
        assert_eq!(
            updates,
            vec![StatusUpdate::Task {
                task_id,
                status: false
            }]
        );
    }

    #[test]
    fn ignores_subtasks_of_other_tasks() {
        let (workspace, task_id, _) = workspace_with_two_subtasks();
        let task = workspace.task(&task_id).expect("task exists").clone();
        let mut stranger = workspace.subtasks_of(&task_id)[0].clone();
        stranger.id = "other".to_string();
        stranger.task_id = "someone-elses".to_string();

        let updates = apply_completion(&task, &[stranger], true);
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn cascade_is_one_directional() {
        let (mut workspace, task_id, subtasks) = workspace_with_two_subtasks();
        workspace
            .update_subtask(&subtasks[0], &SubtaskPatch::status(true), Utc::now())
            .expect("update should work");

        let task = workspace.task(&task_id).expect("task exists").clone();
        set_task_status(&mut workspace, &task, true).expect("complete should work");
        assert_eq!(workspace.task(&task_id).map(|task| task.status), Some(true));
        assert!(workspace.subtasks_of(&task_id).iter().all(|subtask| subtask.status));

        let task = workspace.task(&task_id).expect("task exists").clone();
        let updates = set_task_status(&mut workspace, &task, false).expect("uncomplete should work");
        assert_eq!(updates.len(), 1);
        assert_eq!(workspace.task(&task_id).map(|task| task.status), Some(false));
        assert!(workspace.subtasks_of(&task_id).iter().all(|subtask| subtask.status));
    }

    #[test]
    fn toggles_flip_the_current_value() {
        let (workspace, task_id, subtasks) = workspace_with_two_subtasks();
        let task = workspace.task(&task_id).expect("task exists").clone();
        let updates = toggle_task(&task, &[]);
        assert_eq!(updates.len(), 1);
        assert!(updates[0].status());

        let subtask = workspace.subtask(&subtasks[1]).expect("subtask exists");
        assert_eq!(
            toggle_subtask(subtask),
            StatusUpdate::Subtask {
                subtask_id: subtasks[1].clone(),
                status: true
            }
        );
    }

    #[test]
    fn dispatch_stops_at_the_first_failure() {
        let (mut workspace, task_id, subtasks) = workspace_with_two_subtasks();
        let updates = vec![
            StatusUpdate::Subtask {
                subtask_id: subtasks[0].clone(),
                status: true,
            },
            StatusUpdate::Subtask {
                subtask_id: "missing".to_string(),
                status: true,
            },
            StatusUpdate::Task {
                task_id: task_id.clone(),
                status: true,
            },
        ];

        assert!(dispatch(&mut workspace, &updates).is_err());
        assert_eq!(workspace.subtask(&subtasks[0]).map(|s| s.status), Some(true));
        assert_eq!(workspace.task(&task_id).map(|task| task.status), Some(false));
    }
}
