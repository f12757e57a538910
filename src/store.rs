use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    DomainError, Subtask, SubtaskPatch, Task, TaskPatch, TimeOwner, Workspace, WorkspaceHeader,
};

const TIME_RECORDS_MARKER: &str = "\n=== TIME RECORDS ===\n";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML header: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("failed to encode TOML header: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("failed to parse time record on line {line}: {source}")]
    JsonDecode {
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to encode time record: {0}")]
    JsonEncode(serde_json::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The narrow persistence surface the calendar, cascade and timer code talk to.
pub trait TaskStore {
    fn tasks_by_owner(&self, owner: &str) -> Result<Vec<Task>, StoreError>;
    fn subtasks_by_task(&self, task_id: &str) -> Result<Vec<Subtask>, StoreError>;
    fn subtasks_by_owner(&self, owner: &str) -> Result<Vec<Subtask>, StoreError>;
    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StoreError>;
    fn update_subtask(&mut self, id: &str, patch: &SubtaskPatch) -> Result<(), StoreError>;
    fn create_time_record(
        &mut self,
        owner: TimeOwner,
        duration_ms: u64,
    ) -> Result<String, StoreError>;
}

impl TaskStore for Workspace {
    fn tasks_by_owner(&self, owner: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks_for_owner(owner).into_iter().cloned().collect())
    }

    fn subtasks_by_task(&self, task_id: &str) -> Result<Vec<Subtask>, StoreError> {
        Ok(self.subtasks_of(task_id).into_iter().cloned().collect())
    }

    fn subtasks_by_owner(&self, owner: &str) -> Result<Vec<Subtask>, StoreError> {
        Ok(self.subtasks_for_owner(owner).into_iter().cloned().collect())
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        Workspace::update_task(self, id, patch, Utc::now())?;
        Ok(())
    }

    fn update_subtask(&mut self, id: &str, patch: &SubtaskPatch) -> Result<(), StoreError> {
        Workspace::update_subtask(self, id, patch, Utc::now())?;
        Ok(())
    }

    fn create_time_record(
        &mut self,
        owner: TimeOwner,
        duration_ms: u64,
    ) -> Result<String, StoreError> {
        Ok(self.add_time_record(owner, duration_ms, Utc::now())?)
    }
}

/// A workspace bound to the file it was loaded from. Every mutation is
/// written through; a failed mutation or write leaves the loaded state as it was.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    workspace: Workspace,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let workspace = load_workspace(&path)?;
        Ok(Self { path, workspace })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn save(&self) -> Result<(), StoreError> {
        save_workspace(&self.path, &self.workspace)
    }

    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.workspace = load_workspace(&self.path)?;
        Ok(())
    }

    /// Applies `change` to a copy of the workspace and commits it once written.
    pub fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Workspace) -> Result<T, DomainError>,
    ) -> Result<T, StoreError> {
        let mut staged = self.workspace.clone();
        let output = change(&mut staged)?;
        save_workspace(&self.path, &staged)?;
        self.workspace = staged;
        Ok(output)
    }
}

impl TaskStore for FileStore {
    fn tasks_by_owner(&self, owner: &str) -> Result<Vec<Task>, StoreError> {
        self.workspace.tasks_by_owner(owner)
    }

    fn subtasks_by_task(&self, task_id: &str) -> Result<Vec<Subtask>, StoreError> {
        self.workspace.subtasks_by_task(task_id)
    }

    fn subtasks_by_owner(&self, owner: &str) -> Result<Vec<Subtask>, StoreError> {
        self.workspace.subtasks_by_owner(owner)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        self.mutate(|workspace| workspace.update_task(id, patch, Utc::now()))
    }

    fn update_subtask(&mut self, id: &str, patch: &SubtaskPatch) -> Result<(), StoreError> {
        self.mutate(|workspace| workspace.update_subtask(id, patch, Utc::now()))
    }

    fn create_time_record(
        &mut self,
        owner: TimeOwner,
        duration_ms: u64,
    ) -> Result<String, StoreError> {
        let record_id =
            self.mutate(|workspace| workspace.add_time_record(owner, duration_ms, Utc::now()))?;
        info!(record_id = %record_id, duration_ms, "time record created");
        Ok(record_id)
    }
}

pub fn load_workspace(path: &Path) -> Result<Workspace, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file missing, starting empty");
            return Ok(Workspace::new());
        }
        Err(err) => return Err(StoreError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(Workspace::new());
    }

    let (header_blob, records_blob) = raw
        .split_once(TIME_RECORDS_MARKER)
        .unwrap_or((raw.as_str(), ""));

    let header: WorkspaceHeader = toml::from_str(header_blob)?;
    let mut time_records = Vec::new();
    for (index, line) in records_blob.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| StoreError::JsonDecode {
            line: index + 1,
            source,
        })?;
        time_records.push(record);
    }

    debug!(
        path = %path.display(),
        groups = header.groups.len(),
        tasks = header.tasks.len(),
        subtasks = header.subtasks.len(),
        time_records = time_records.len(),
        "store loaded"
    );
    Ok(Workspace {
        header,
        time_records,
    })
}

pub fn save_workspace(path: &Path, workspace: &Workspace) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let header = toml::to_string_pretty(&workspace.header)?;
    let mut file = fs::File::create(path)?;
    file.write_all(header.as_bytes())?;
    file.write_all(TIME_RECORDS_MARKER.as_bytes())?;

    for record in &workspace.time_records {
        let line = serde_json::to_string(record).map_err(StoreError::JsonEncode)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }

    debug!(path = %path.display(), "store saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone, Utc};
    use std::fs;
    use std::path::PathBuf;

    use crate::cascade::set_task_status;
    use crate::domain::{GroupKind, NewSubtask, NewTask, Priority, TaskPatch, TimeOwner, Workspace};

    use super::*;

    fn seeded() -> (Workspace, String, String) {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let mut workspace = Workspace::new();
        let group = workspace
            .add_group("owner", "History", GroupKind::Subjects, Some("B".to_string()), now)
            .expect("group should be created");
        let task = workspace
            .add_task(
                "owner",
                NewTask {
                    name: "Essay".to_string(),
                    start_date: Local.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
                    end_date: Local.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap(),
                    notes: Some("two pages".to_string()),
                    group_id: group.clone(),
                    priority: Priority::High,
                },
                now,
            )
            .expect("task should be created");
        workspace
            .add_subtask(
                "owner",
                NewSubtask {
                    task_id: task.clone(),
                    name: "Outline".to_string(),
                    start_date: Local.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
                    end_date: Local.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
                    notes: None,
                    priority: Priority::NotApplicable,
                },
                now,
            )
            .expect("subtask should be created");
        (workspace, group, task)
    }

    #[test]
    fn round_trips_toml_and_jsonl() {
        let (mut workspace, _, task) = seeded();
        workspace
            .add_time_record(TimeOwner::Task(task.clone()), 1_500, Utc::now())
            .expect("record should be created");

        let path = temp_file("taskcation_store_roundtrip.store");
        save_workspace(&path, &workspace).expect("save should succeed");
        let loaded = load_workspace(&path).expect("load should succeed");

        assert_eq!(loaded.header.groups.len(), 1);
        assert_eq!(loaded.header.tasks.len(), 1);
        assert_eq!(loaded.header.subtasks.len(), 1);
        assert_eq!(loaded.time_records.len(), 1);
        let loaded_task = loaded.task(&task).expect("task should load");
        assert_eq!(loaded_task.end_date, workspace.task(&task).and_then(|t| t.end_date));
        assert_eq!(loaded_task.priority, Priority::High);
        assert_eq!(loaded.time_spent(&TimeOwner::Task(task)), 1_500);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_or_blank_file_is_an_empty_workspace() {
        let path = temp_file("taskcation_store_missing.store");
        let _ = fs::remove_file(&path);
        let loaded = load_workspace(&path).expect("missing file should load");
        assert!(loaded.header.tasks.is_empty());

        fs::write(&path, "  \n").expect("write should work");
        let loaded = load_workspace(&path).expect("blank file should load");
        assert!(loaded.time_records.is_empty());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unusable_due_date_in_the_file_loads_as_absent() {
        let raw = r#"schema_version = 1
created_at = "2025-01-01T00:00:00Z"

[[tasks]]
id = "t1"
name = "Essay"
created_by = "owner"
end_date = "sometime soon"
group_id = "g1"
created_at = "2025-01-01T00:00:00Z"
updated_at = "2025-01-01T00:00:00Z"

[[tasks]]
id = "t2"
name = "Quiz"
created_by = "owner"
end_date = "2025-01-03 15:00"
group_id = "g1"
priority = "N/A"
created_at = "2025-01-01T00:00:00Z"
updated_at = "2025-01-01T00:00:00Z"
"#;
        let path = temp_file("taskcation_store_bad_date.store");
        fs::write(&path, raw).expect("write should work");
        let loaded = load_workspace(&path).expect("load should succeed");
        assert_eq!(loaded.task("t1").and_then(|task| task.end_date), None);
        assert_eq!(
            loaded.task("t2").and_then(|task| task.end_date),
            Some(Local.with_ymd_and_hms(2025, 1, 3, 15, 0, 0).unwrap())
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn inverted_stored_dates_do_not_block_completion() {
        let raw = r#"schema_version = 1
created_at = "2025-01-01T00:00:00Z"

[[tasks]]
id = "t1"
name = "Essay"
created_by = "owner"
start_date = "2025-01-05 09:00"
end_date = "2025-01-02 18:00"
duration_ms = 42
group_id = "g1"
created_at = "2025-01-01T00:00:00Z"
updated_at = "2025-01-01T00:00:00Z"

[[subtasks]]
id = "s1"
name = "Outline"
task_id = "t1"
created_by = "owner"
start_date = "2025-01-04 09:00"
end_date = "2025-01-01 12:00"
created_at = "2025-01-01T00:00:00Z"
updated_at = "2025-01-01T00:00:00Z"
"#;
        let path = temp_file("taskcation_store_inverted_dates.store");
        fs::write(&path, raw).expect("write should work");
        let mut store = FileStore::open(&path).expect("open should work");
        let task = store.workspace().task("t1").cloned().expect("task should load");

        let updates = set_task_status(&mut store, &task, true).expect("completion should work");
        assert_eq!(updates.len(), 2);
        let reopened = load_workspace(&path).expect("reload should work");
        assert_eq!(reopened.task("t1").map(|task| (task.status, task.duration_ms)), Some((true, 42)));
        assert_eq!(reopened.subtask("s1").map(|subtask| subtask.status), Some(true));

        set_task_status(&mut store, &task, false).expect("reopening should work");
        assert_eq!(store.workspace().task("t1").map(|task| task.status), Some(false));

        let moved = TaskPatch {
            end_date: Some(Local.with_ymd_and_hms(2025, 1, 3, 18, 0, 0).unwrap()),
            ..TaskPatch::default()
        };
        let err = store.update_task("t1", &moved).expect_err("still inverted");
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidDateRange)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn reports_the_line_of_a_corrupt_time_record() {
        let (workspace, _, _) = seeded();
        let path = temp_file("taskcation_store_corrupt.store");
        save_workspace(&path, &workspace).expect("save should succeed");
        let mut raw = fs::read_to_string(&path).expect("read should work");
        raw.push_str("{not json}\n");
        fs::write(&path, raw).expect("write should work");

        match load_workspace(&path) {
            Err(StoreError::JsonDecode { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected a decode error, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn workspace_serves_the_narrow_store_surface() {
        let (mut workspace, _, task) = seeded();
        assert_eq!(workspace.tasks_by_owner("owner").expect("fetch").len(), 1);
        assert!(workspace.tasks_by_owner("someone else").expect("fetch").is_empty());
        assert_eq!(workspace.subtasks_by_task(&task).expect("fetch").len(), 1);
        assert_eq!(workspace.subtasks_by_owner("owner").expect("fetch").len(), 1);

        TaskStore::update_task(&mut workspace, &task, &TaskPatch::status(true))
            .expect("update should work");
        assert_eq!(workspace.task(&task).map(|task| task.status), Some(true));

        let err = workspace
            .create_time_record(TimeOwner::Subtask("missing".to_string()), 10)
            .expect_err("unknown owner should be rejected");
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound { .. })));
    }

    #[test]
    fn file_store_writes_through_and_keeps_state_on_failure() {
        let path = temp_file("taskcation_store_write_through.store");
        let _ = fs::remove_file(&path);
        let (workspace, _, task) = seeded();
        save_workspace(&path, &workspace).expect("seed should save");

        let mut store = FileStore::open(&path).expect("open should work");
        let record = store
            .create_time_record(TimeOwner::Task(task.clone()), 2_000)
            .expect("record should be created");
        let reopened = load_workspace(&path).expect("reload should work");
        assert!(reopened.time_records.iter().any(|r| r.id == record));

        let err = store
            .create_time_record(TimeOwner::Task(task.clone()), 0)
            .expect_err("zero duration should be rejected");
        assert!(matches!(err, StoreError::Domain(DomainError::ZeroDuration)));
        assert_eq!(store.workspace().time_records.len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn failed_write_does_not_commit_the_mutation() {
        let dir = temp_file("taskcation_store_dir_target");
        fs::create_dir_all(&dir).expect("dir should be created");
        let (workspace, _, task) = seeded();
        let mut store = FileStore {
            path: dir.clone(),
            workspace,
        };

        let result = store.update_task(&task, &TaskPatch::status(true));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.workspace().task(&task).map(|task| task.status), Some(false));
        let _ = fs::remove_dir_all(dir);
    }

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }
}
