use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStatus {
    pub status: RunState,
    pub uptime: f64,
    pub active_agents: u32,
    pub tasks_completed: u32,
    #[serde(default)]
    pub current_task: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Stopped => "stopped",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, RunState::Running)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub status: TaskStatus,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Push frames carry a `type` discriminant; task lifecycle frames also carry
// task_id/result fields the client deliberately ignores (authoritative task
// state comes from the pull endpoints, never from the push payload).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    Log(LogEntry),
    TaskStarted,
    TaskCompleted,
    Connected,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_parses() {
        let body = r#"{
            "status": "running",
            "uptime": 12.5,
            "active_agents": 2,
            "tasks_completed": 7,
            "current_task": "build report"
        }"#;
        let status: SystemStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.status, RunState::Running);
        assert_eq!(status.tasks_completed, 7);
        assert_eq!(status.current_task.as_deref(), Some("build report"));
    }

    #[test]
    fn status_body_without_current_task_parses() {
        let body = r#"{"status":"stopped","uptime":0.0,"active_agents":0,"tasks_completed":0}"#;
        let status: SystemStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.status, RunState::Stopped);
        assert!(status.current_task.is_none());
    }

    #[test]
    fn task_list_body_parses() {
        let body = r#"[
            {"id": 7, "name": "build report", "status": "completed",
             "created_at": "2024-01-01 00:00:00", "completed_at": "2024-01-01 00:01:00"},
            {"id": 8, "name": "scan logs", "status": "running",
             "created_at": "2024-01-01 00:02:00", "completed_at": null}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(body).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 7);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert!(tasks[0].status.is_done());
        assert_eq!(tasks[0].created_at, "2024-01-01 00:00:00");
        assert_eq!(tasks[1].status, TaskStatus::Running);
        assert!(tasks[1].completed_at.is_none());
    }

    #[test]
    fn task_without_created_at_is_an_error() {
        let body = r#"[{"id": 7, "name": "build report", "status": "running"}]"#;
        assert!(serde_json::from_str::<Vec<Task>>(body).is_err());
    }

    #[test]
    fn log_frame_parses_with_exact_fields() {
        let frame: PushFrame = serde_json::from_str(
            r#"{"type":"log","level":"warning","message":"disk low","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let PushFrame::Log(entry) = frame else {
            panic!("expected log frame");
        };
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "disk low");
        assert_eq!(entry.timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn lifecycle_frames_parse_ignoring_payload() {
        let started: PushFrame = serde_json::from_str(
            r#"{"type":"task_started","task_id":"task_1","task":"build","timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(started, PushFrame::TaskStarted);

        let completed: PushFrame = serde_json::from_str(
            r#"{"type":"task_completed","task_id":"task_1","result":"ok","timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(completed, PushFrame::TaskCompleted);
    }

    #[test]
    fn welcome_frame_parses() {
        let frame: PushFrame = serde_json::from_str(
            r#"{"type":"connected","message":"monitor online","timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(frame, PushFrame::Connected);
    }

    #[test]
    fn unknown_tag_maps_to_unknown() {
        let frame: PushFrame =
            serde_json::from_str(r#"{"type":"heartbeat","agent":"a"}"#).unwrap();
        assert_eq!(frame, PushFrame::Unknown);
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(serde_json::from_str::<PushFrame>(r#"{"level":"info"}"#).is_err());
        assert!(serde_json::from_str::<PushFrame>("not json").is_err());
    }
}
