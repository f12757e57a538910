use std::str::FromStr;

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const ID_LEN: usize = 8;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Grade carried by every category and by subjects without a grade.
pub const NO_GRADE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} is required")]
    EmptyField(&'static str),
    #[error("end date must be on or after the start date")]
    InvalidDateRange,
    #[error("time record must reference a task or a subtask")]
    MissingTimeOwner,
    #[error("time record cannot reference both a task and a subtask")]
    AmbiguousTimeOwner,
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("unknown group kind: {0} (expected subjects or categories)")]
    UnknownGroupKind(String),
    #[error("unknown priority: {0} (expected low, medium, high, urgent or n/a)")]
    UnknownPriority(String),
}

impl DomainError {
    fn not_found(kind: &'static str, id: &str) -> Self {
        DomainError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Subjects,
    Categories,
}

impl GroupKind {
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Subjects => "Subjects",
            GroupKind::Categories => "Categories",
        }
    }
}

impl FromStr for GroupKind {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "subject" | "subjects" => Ok(GroupKind::Subjects),
            "category" | "categories" => Ok(GroupKind::Categories),
            _ => Err(DomainError::UnknownGroupKind(input.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    #[default]
    #[serde(rename = "N/A", alias = "NA")]
    NotApplicable,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
            Priority::NotApplicable => "N/A",
        }
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            "n/a" | "na" | "none" => Ok(Priority::NotApplicable),
            _ => Err(DomainError::UnknownPriority(input.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub kind: GroupKind,
    #[serde(default = "default_grade")]
    pub grade_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn grade(&self) -> Option<&str> {
        if self.kind == GroupKind::Subjects && self.grade_id != NO_GRADE {
            Some(self.grade_id.as_str())
        } else {
            None
        }
    }
}

fn default_grade() -> String {
    NO_GRADE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub created_by: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Local>>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Local>>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub notes: String,
    pub group_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub name: String,
    pub task_id: String,
    #[serde(default)]
    pub task_name: String,
    pub created_by: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Local>>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Local>>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The single document a time record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOwner {
    Task(String),
    Subtask(String),
}

impl TimeOwner {
    /// Builds an owner from loosely specified references, rejecting neither/both.
    pub fn from_refs(task_id: Option<&str>, subtask_id: Option<&str>) -> Result<Self, DomainError> {
        let task_id = task_id.map(str::trim).filter(|id| !id.is_empty());
        let subtask_id = subtask_id.map(str::trim).filter(|id| !id.is_empty());

        match (task_id, subtask_id) {
            (Some(task_id), None) => Ok(TimeOwner::Task(task_id.to_string())),
            (None, Some(subtask_id)) => Ok(TimeOwner::Subtask(subtask_id.to_string())),
            (Some(_), Some(_)) => Err(DomainError::AmbiguousTimeOwner),
            (None, None) => Err(DomainError::MissingTimeOwner),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TimeOwner::Task(id) | TimeOwner::Subtask(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TimeOwner::Task(_) => "task",
            TimeOwner::Subtask(_) => "subtask",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRecord {
    pub id: String,
    pub owner: TimeOwner,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Timestamp shapes that may arrive from a document store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    Document {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    Other(IgnoredAny),
}

/// Normalizes any stored timestamp into a local date-time, `None` when unusable.
pub fn to_date(raw: &RawTimestamp) -> Option<DateTime<Local>> {
    match raw {
        RawTimestamp::Millis(millis) => Local.timestamp_millis_opt(*millis).single(),
        RawTimestamp::FractionalMillis(millis) => {
            if millis.is_finite() {
                Local.timestamp_millis_opt(millis.trunc() as i64).single()
            } else {
                None
            }
        }
        RawTimestamp::Text(text) => parse_timestamp(text),
        RawTimestamp::Document {
            seconds,
            nanoseconds,
        } => Local.timestamp_opt(*seconds, *nanoseconds).single(),
        RawTimestamp::Other(_) => None,
    }
}

pub fn parse_timestamp(input: &str) -> Option<DateTime<Local>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Local));
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local_from_naive(naive);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(local_from_naive)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(to_date))
}

fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(local_datetime) => Some(local_datetime),
        LocalResult::Ambiguous(first, second) => Some(first.min(second)),
        LocalResult::None => None,
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub start_date: DateTime<Local>,
    pub end_date: DateTime<Local>,
    pub notes: Option<String>,
    pub group_id: String,
    pub priority: Priority,
}

#[derive(Debug, Clone)]
pub struct NewSubtask {
    pub task_id: String,
    pub name: String,
    pub start_date: DateTime<Local>,
    pub end_date: DateTime<Local>,
    pub notes: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Local>>,
    pub end_date: Option<DateTime<Local>>,
    pub notes: Option<String>,
    pub group_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<bool>,
}

impl TaskPatch {
    pub fn status(status: bool) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtaskPatch {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Local>>,
    pub end_date: Option<DateTime<Local>>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<bool>,
}

impl SubtaskPatch {
    pub fn status(status: bool) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub grade_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceHeader {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl WorkspaceHeader {
    pub fn new() -> Self {
        Self {
            schema_version: 1,
            created_at: Utc::now(),
            groups: Vec::new(),
            tasks: Vec::new(),
            subtasks: Vec::new(),
        }
    }
}

/// Everything one store file holds: the documents plus the time records.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub header: WorkspaceHeader,
    pub time_records: Vec<TimeRecord>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            header: WorkspaceHeader::new(),
            time_records: Vec::new(),
        }
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.header.groups.iter().find(|group| group.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.header.tasks.iter().find(|task| task.id == id)
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.header.subtasks.iter().find(|subtask| subtask.id == id)
    }

    pub fn groups_for_owner(&self, owner: &str) -> Vec<&Group> {
        self.header
            .groups
            .iter()
            .filter(|group| group.created_by == owner)
            .collect()
    }

    pub fn tasks_for_owner(&self, owner: &str) -> Vec<&Task> {
        self.header
            .tasks
            .iter()
            .filter(|task| task.created_by == owner)
            .collect()
    }

    pub fn tasks_in_group(&self, group_id: &str) -> Vec<&Task> {
        self.header
            .tasks
            .iter()
            .filter(|task| task.group_id == group_id)
            .collect()
    }

    pub fn subtasks_of(&self, task_id: &str) -> Vec<&Subtask> {
        self.header
            .subtasks
            .iter()
            .filter(|subtask| subtask.task_id == task_id)
            .collect()
    }

    pub fn subtasks_for_owner(&self, owner: &str) -> Vec<&Subtask> {
        self.header
            .subtasks
            .iter()
            .filter(|subtask| subtask.created_by == owner)
            .collect()
    }

    pub fn time_records_for(&self, owner: &TimeOwner) -> Vec<&TimeRecord> {
        self.time_records
            .iter()
            .filter(|record| &record.owner == owner)
            .collect()
    }

    pub fn time_spent(&self, owner: &TimeOwner) -> u64 {
        self.time_records_for(owner)
            .iter()
            .map(|record| record.duration_ms)
            .sum()
    }

    /// Subjects with a grade suggest from the grade, everything else from the due date.
    pub fn suggested_priority(
        &self,
        group_id: &str,
        due: DateTime<Local>,
        now: DateTime<Utc>,
    ) -> Priority {
        match self.group(group_id).and_then(Group::grade) {
            Some(grade) => suggest_grade_priority(grade),
            None => suggest_date_priority(Some(due), now),
        }
    }

    pub fn owner_exists(&self, owner: &TimeOwner) -> bool {
        match owner {
            TimeOwner::Task(id) => self.task(id).is_some(),
            TimeOwner::Subtask(id) => self.subtask(id).is_some(),
        }
    }

    pub fn add_group(
        &mut self,
        owner: &str,
        name: &str,
        kind: GroupKind,
        grade_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<String, DomainError> {
        let owner = required(owner, "owner")?;
        let name = required(name, "group name")?;
        let grade_id = grade_for(kind, grade_id);

        let id = generate_id();
        self.header.groups.push(Group {
            id: id.clone(),
            name,
            created_by: owner,
            kind,
            grade_id,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    pub fn update_group(
        &mut self,
        id: &str,
        patch: &GroupPatch,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let name = patch
            .name
            .as_deref()
            .map(|name| required(name, "group name"))
            .transpose()?;
        let group = self
            .header
            .groups
            .iter_mut()
            .find(|group| group.id == id)
            .ok_or_else(|| DomainError::not_found("group", id))?;

        if let Some(name) = name {
            group.name = name;
        }
        if patch.grade_id.is_some() {
            group.grade_id = grade_for(group.kind, patch.grade_id.clone());
        }
        group.updated_at = now;
        Ok(())
    }

    pub fn delete_group(&mut self, id: &str) -> Result<(), DomainError> {
        let before = self.header.groups.len();
        self.header.groups.retain(|group| group.id != id);
        if self.header.groups.len() == before {
            return Err(DomainError::not_found("group", id));
        }
        Ok(())
    }

    pub fn add_task(
        &mut self,
        owner: &str,
        new_task: NewTask,
        now: DateTime<Utc>,
    ) -> Result<String, DomainError> {
        let owner = required(owner, "owner")?;
        let name = required(&new_task.name, "task name")?;
        let group_id = required(&new_task.group_id, "group")?;
        if self.group(&group_id).is_none() {
            return Err(DomainError::not_found("group", &group_id));
        }
        let duration_ms = span_millis(new_task.start_date, new_task.end_date)?;

        let id = generate_id();
        self.header.tasks.push(Task {
            id: id.clone(),
            name,
            created_by: owner,
            start_date: Some(new_task.start_date),
            end_date: Some(new_task.end_date),
            duration_ms,
            notes: new_task.notes.unwrap_or_default(),
            group_id,
            priority: new_task.priority,
            status: false,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    pub fn update_task(
        &mut self,
        id: &str,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let name = patch
            .name
            .as_deref()
            .map(|name| required(name, "task name"))
            .transpose()?;
        if let Some(group_id) = &patch.group_id {
            if self.group(group_id).is_none() {
                return Err(DomainError::not_found("group", group_id));
            }
        }

        let task = self
            .header
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| DomainError::not_found("task", id))?;

        // Stored dates are only re-checked when the patch moves one of them.
        let dates_changed = patch.start_date.is_some() || patch.end_date.is_some();
        let start_date = patch.start_date.or(task.start_date);
        let end_date = patch.end_date.or(task.end_date);
        let duration_ms = match (start_date, end_date) {
            (Some(start), Some(end)) if dates_changed => span_millis(start, end)?,
            _ => task.duration_ms,
        };

        if let Some(name) = &name {
            task.name = name.clone();
        }
        task.start_date = start_date;
        task.end_date = end_date;
        task.duration_ms = duration_ms;
        if let Some(notes) = &patch.notes {
            task.notes = notes.trim().to_string();
        }
        if let Some(group_id) = &patch.group_id {
            task.group_id = group_id.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = now;

        if let Some(name) = name {
            for subtask in self
                .header
                .subtasks
                .iter_mut()
                .filter(|subtask| subtask.task_id == id)
            {
                subtask.task_name = name.clone();
            }
        }
        Ok(())
    }

    /// Removes a task together with its subtasks and every linked time record.
    pub fn delete_task(&mut self, id: &str) -> Result<usize, DomainError> {
        if self.task(id).is_none() {
            return Err(DomainError::not_found("task", id));
        }

        let subtask_ids = self
            .subtasks_of(id)
            .into_iter()
            .map(|subtask| subtask.id.clone())
            .collect::<Vec<_>>();
        for subtask_id in &subtask_ids {
            self.delete_subtask(subtask_id)?;
        }

        let owner = TimeOwner::Task(id.to_string());
        self.time_records.retain(|record| record.owner != owner);
        self.header.tasks.retain(|task| task.id != id);
        Ok(subtask_ids.len())
    }

    pub fn add_subtask(
        &mut self,
        owner: &str,
        new_subtask: NewSubtask,
        now: DateTime<Utc>,
    ) -> Result<String, DomainError> {
        let owner = required(owner, "owner")?;
        let name = required(&new_subtask.name, "subtask name")?;
        let task_name = self
            .task(&new_subtask.task_id)
            .map(|task| task.name.clone())
            .ok_or_else(|| DomainError::not_found("task", &new_subtask.task_id))?;
        let duration_ms = span_millis(new_subtask.start_date, new_subtask.end_date)?;

        let id = generate_id();
        self.header.subtasks.push(Subtask {
            id: id.clone(),
            name,
            task_id: new_subtask.task_id,
            task_name,
            created_by: owner,
            start_date: Some(new_subtask.start_date),
            end_date: Some(new_subtask.end_date),
            duration_ms,
            notes: new_subtask.notes.unwrap_or_default(),
            priority: new_subtask.priority,
            status: false,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    pub fn update_subtask(
        &mut self,
        id: &str,
        patch: &SubtaskPatch,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let name = patch
            .name
            .as_deref()
            .map(|name| required(name, "subtask name"))
            .transpose()?;
        let subtask = self
            .header
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == id)
            .ok_or_else(|| DomainError::not_found("subtask", id))?;

        // Stored dates are only re-checked when the patch moves one of them.
        let dates_changed = patch.start_date.is_some() || patch.end_date.is_some();
        let start_date = patch.start_date.or(subtask.start_date);
        let end_date = patch.end_date.or(subtask.end_date);
        let duration_ms = match (start_date, end_date) {
            (Some(start), Some(end)) if dates_changed => span_millis(start, end)?,
            _ => subtask.duration_ms,
        };

        if let Some(name) = name {
            subtask.name = name;
        }
        subtask.start_date = start_date;
        subtask.end_date = end_date;
        subtask.duration_ms = duration_ms;
        if let Some(notes) = &patch.notes {
            subtask.notes = notes.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            subtask.priority = priority;
        }
        if let Some(status) = patch.status {
            subtask.status = status;
        }
        subtask.updated_at = now;
        Ok(())
    }

    pub fn delete_subtask(&mut self, id: &str) -> Result<(), DomainError> {
        let before = self.header.subtasks.len();
        self.header.subtasks.retain(|subtask| subtask.id != id);
        if self.header.subtasks.len() == before {
            return Err(DomainError::not_found("subtask", id));
        }

        let owner = TimeOwner::Subtask(id.to_string());
        self.time_records.retain(|record| record.owner != owner);
        Ok(())
    }

    pub fn add_time_record(
        &mut self,
        owner: TimeOwner,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) -> Result<String, DomainError> {
        if duration_ms == 0 {
            return Err(DomainError::ZeroDuration);
        }
        if !self.owner_exists(&owner) {
            return Err(DomainError::not_found(owner.kind(), owner.id()));
        }

        let id = generate_id();
        self.time_records.push(TimeRecord {
            id: id.clone(),
            owner,
            duration_ms,
            created_at: now,
        });
        Ok(id)
    }

    pub fn delete_time_record(&mut self, id: &str) -> Result<(), DomainError> {
        let before = self.time_records.len();
        self.time_records.retain(|record| record.id != id);
        if self.time_records.len() == before {
            return Err(DomainError::not_found("time record", id));
        }
        Ok(())
    }
}

/// Priority hint derived from a subject grade letter.
pub fn suggest_grade_priority(grade: &str) -> Priority {
    match grade.trim().to_uppercase().as_str() {
        "A" | "B" => Priority::Low,
        "C" => Priority::Medium,
        "D" => Priority::High,
        "E" | "F" => Priority::Urgent,
        _ => Priority::NotApplicable,
    }
}

/// Priority hint derived from how many days remain until the due date.
pub fn suggest_date_priority(due: Option<DateTime<Local>>, now: DateTime<Utc>) -> Priority {
    let Some(due) = due else {
        return Priority::Low;
    };

    let days_left = (due.with_timezone(&Utc) - now).num_milliseconds() as f64 / MS_PER_DAY;
    if days_left < 1.0 {
        Priority::Urgent
    } else if days_left < 5.0 {
        Priority::High
    } else if days_left < 10.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn required(input: &str, field_name: &'static str) -> Result<String, DomainError> {
    let value = input.trim();
    if value.is_empty() {
        Err(DomainError::EmptyField(field_name))
    } else {
        Ok(value.to_string())
    }
}

fn grade_for(kind: GroupKind, grade_id: Option<String>) -> String {
    match kind {
        GroupKind::Categories => default_grade(),
        GroupKind::Subjects => grade_id
            .map(|grade| grade.trim().to_string())
            .filter(|grade| !grade.is_empty())
            .unwrap_or_else(default_grade),
    }
}

fn span_millis(start: DateTime<Local>, end: DateTime<Local>) -> Result<u64, DomainError> {
    if end < start {
        return Err(DomainError::InvalidDateRange);
    }
    Ok((end - start).num_milliseconds().max(0) as u64)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
