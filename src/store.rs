use chrono::{DateTime, Utc};

use crate::model::{LogEntry, SystemStatus, Task};
use crate::ring::LogRing;

// Completed fetches land here via the update channel; whichever response
// arrives last wins, since every payload is a full snapshot of its resource.
#[derive(Debug, Clone)]
pub enum StoreUpdate {
    Status(SystemStatus),
    Tasks(Vec<Task>),
    SeedLogs(Vec<LogEntry>),
}

// Single source of truth for everything the display reads. All writes go
// through the named methods below; logs and status/tasks are disjoint, so
// the push path and the poll path never conflict.
#[derive(Debug, Default)]
pub struct StateStore {
    status: Option<SystemStatus>,
    tasks: Vec<Task>,
    logs: LogRing,
    connected: bool,
    last_snapshot_at: Option<DateTime<Utc>>,
    dirty: bool,
}

impl StateStore {
    pub fn apply(&mut self, update: StoreUpdate) {
        match update {
            StoreUpdate::Status(status) => self.replace_status(status),
            StoreUpdate::Tasks(tasks) => self.replace_tasks(tasks),
            StoreUpdate::SeedLogs(entries) => self.seed_logs(entries),
        }
    }

    pub fn replace_status(&mut self, status: SystemStatus) {
        self.status = Some(status);
        self.last_snapshot_at = Some(Utc::now());
        self.mark_dirty();
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.last_snapshot_at = Some(Utc::now());
        self.mark_dirty();
    }

    pub fn seed_logs(&mut self, entries: Vec<LogEntry>) {
        self.logs.replace_all(entries);
        self.mark_dirty();
    }

    pub fn append_log(&mut self, entry: LogEntry) {
        self.logs.append(entry);
        self.mark_dirty();
    }

    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            self.mark_dirty();
        }
    }

    pub fn status(&self) -> Option<&SystemStatus> {
        self.status.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[allow(dead_code)]
    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn logs(&self) -> &LogRing {
        &self.logs
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn last_snapshot_at(&self) -> Option<DateTime<Utc>> {
        self.last_snapshot_at
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        let value = self.dirty;
        self.dirty = false;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogLevel, RunState, TaskStatus};

    fn status(tasks_completed: u32) -> SystemStatus {
        SystemStatus {
            status: RunState::Running,
            uptime: 42.0,
            active_agents: 1,
            tasks_completed,
            current_task: None,
        }
    }

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            status,
            created_at: "2024-01-01 00:00:00".to_string(),
            completed_at: status.is_done().then(|| "2024-01-01 00:01:00".to_string()),
        }
    }

    fn log(message: &str) -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            message: message.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn replace_status_is_wholesale() {
        let mut store = StateStore::default();
        store.replace_status(status(1));
        store.replace_status(status(5));
        assert_eq!(store.status().unwrap().tasks_completed, 5);
    }

    #[test]
    fn last_applied_tasks_snapshot_wins() {
        let mut store = StateStore::default();
        store.replace_tasks(vec![task(7, TaskStatus::Running)]);
        store.replace_tasks(vec![task(7, TaskStatus::Completed), task(8, TaskStatus::Running)]);
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.task(7).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn log_append_leaves_tasks_and_status_untouched() {
        let mut store = StateStore::default();
        store.replace_status(status(3));
        store.replace_tasks(vec![task(1, TaskStatus::Running)]);
        store.append_log(log("push path"));
        assert_eq!(store.status().unwrap().tasks_completed, 3);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.logs().last().unwrap().message, "push path");
    }

    #[test]
    fn disconnect_keeps_last_snapshot() {
        let mut store = StateStore::default();
        store.set_connected(true);
        store.replace_status(status(2));
        store.replace_tasks(vec![task(1, TaskStatus::Running)]);
        store.set_connected(false);
        assert!(!store.connected());
        assert_eq!(store.status().unwrap().tasks_completed, 2);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn mutations_mark_the_store_dirty() {
        let mut store = StateStore::default();
        assert!(!store.take_dirty());
        store.append_log(log("x"));
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
        store.apply(StoreUpdate::Status(status(0)));
        assert!(store.take_dirty());
        store.seed_logs(vec![log("a"), log("b")]);
        assert!(store.take_dirty());
    }

    #[test]
    fn set_connected_is_idempotent_on_dirty_flag() {
        let mut store = StateStore::default();
        store.set_connected(false);
        assert!(!store.take_dirty());
        store.set_connected(true);
        assert!(store.take_dirty());
    }
}
