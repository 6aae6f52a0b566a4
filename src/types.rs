//! Core types for the task tracking service.

use crate::error::ApiError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Used with `#[serde(default)]`: absent -> `None`, `null` -> `Some(None)`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Treat empty strings as missing.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Employee role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

/// Lifecycle stage of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Open, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TaskStatus::Open),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Display label used in exports and messages.
    pub fn label_ar(&self) -> &'static str {
        match self {
            TaskStatus::Open => "مفتوح",
            TaskStatus::InProgress => "جاري العمل",
            TaskStatus::Done => "مكتمل",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency tier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn label_ar(&self) -> &'static str {
        match self {
            Priority::Critical => "حرج",
            Priority::High => "عالي",
            Priority::Medium => "متوسط",
            Priority::Low => "منخفض",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Employees
// =============================================================================

/// An employee account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name_ar: String,
    pub full_name_en: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Employee {
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            username: self.username.clone(),
            full_name_ar: self.full_name_ar.clone(),
            full_name_en: self.full_name_en.clone(),
            role: self.role,
        }
    }
}

/// Reduced user record carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub full_name_ar: String,
    pub full_name_en: Option<String>,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEmployee {
    pub username: String,
    pub password: String,
    pub full_name_ar: String,
    #[serde(default)]
    pub full_name_en: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::missing_field("username"));
        }
        if self.full_name_ar.trim().is_empty() {
            return Err(ApiError::missing_field("full_name_ar"));
        }
        if self.password.is_empty() {
            return Err(ApiError::missing_field("password"));
        }
        Ok(())
    }
}

/// Partial employee update. An absent or empty password keeps the current one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name_ar: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub full_name_en: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl EmployeeUpdate {
    /// The new password, if one was actually supplied.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

// =============================================================================
// Companies
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub legal_entity: Option<String>,
    pub sector: Option<String>,
    pub tax_authority: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCompany {
    pub name_ar: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub legal_entity: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub tax_authority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub name_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub legal_entity: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sector: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tax_authority: Option<Option<String>>,
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCategory {
    pub id: String,
    pub classification: String,
    pub task_type: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Input for both creating and editing a category; both fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryInput {
    pub classification: String,
    pub task_type: String,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.classification.trim().is_empty() {
            return Err(ApiError::missing_field("classification"));
        }
        if self.task_type.trim().is_empty() {
            return Err(ApiError::missing_field("task_type"));
        }
        Ok(())
    }
}

/// Categories sharing one classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub classification: String,
    pub categories: Vec<TaskCategory>,
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub company_id: String,
    pub category_id: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRef {
    pub id: String,
    pub name_ar: String,
    pub name_en: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub classification: String,
    pub task_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRef {
    pub id: String,
    pub username: String,
    pub full_name_ar: String,
    pub full_name_en: Option<String>,
}

/// A task joined with the records it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub company: Option<CompanyRef>,
    pub category: Option<CategoryRef>,
    pub assignee: Option<EmployeeRef>,
    pub reviewer: Option<EmployeeRef>,
    /// Statuses the task can move to next.
    #[serde(default)]
    pub next_statuses: Vec<TaskStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub company_id: String,
    pub category_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.company_id.trim().is_empty() {
            return Err(ApiError::missing_field("company_id"));
        }
        if self.category_id.trim().is_empty() {
            return Err(ApiError::missing_field("category_id"));
        }
        Ok(())
    }
}

/// Partial task update.
///
/// A `status` different from the current one goes through the lifecycle,
/// with the same validation and history as an explicit transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reviewed_by: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Task list filters. Absent fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Inclusive lower bound on `created_at` (ms).
    #[serde(default)]
    pub created_from: Option<i64>,
    /// Inclusive upper bound on `created_at` (ms).
    #[serde(default)]
    pub created_to: Option<i64>,
}

/// Which tasks a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    All,
    AssignedTo(String),
}

impl TaskScope {
    pub fn for_user(user: &SessionUser) -> Self {
        if user.is_admin() {
            TaskScope::All
        } else {
            TaskScope::AssignedTo(user.id.clone())
        }
    }

    pub fn allows(&self, task: &Task) -> bool {
        match self {
            TaskScope::All => true,
            TaskScope::AssignedTo(id) => task.assigned_to.as_deref() == Some(id.as_str()),
        }
    }
}

/// One status change of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    pub id: i64,
    pub task_id: String,
    pub changed_by: Option<String>,
    pub old_status: TaskStatus,
    pub new_status: TaskStatus,
    pub changed_at: i64,
}

/// Derived counts over a set of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub done: i64,
    /// Critical tasks not yet done.
    pub critical: i64,
    /// High-priority tasks not yet done.
    pub high: i64,
    /// Tasks not yet done.
    pub pending: i64,
}
