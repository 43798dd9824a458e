//! Agent state: role, status, position and battery behind a per-agent lock.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::sim::scheduler::DelayedTaskHandle;

/// The four roles of the security scenario. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Drone,
    Camera,
    Guard,
    Robber,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Drone, Role::Camera, Role::Guard, Role::Robber];

    /// Routing name used in envelope sender/receiver fields.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Drone => "DroneAgent",
            Role::Camera => "CameraAgent",
            Role::Guard => "GuardAgent",
            Role::Robber => "RobberAgent",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Status an agent of this role starts in.
    pub fn initial_status(&self) -> Status {
        match self {
            Role::Drone | Role::Guard => Status::Idle,
            Role::Camera => Status::Monitoring,
            Role::Robber => Status::Active,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status labels. Persisted and displayed as their human-readable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    /// Part of the drone's state set; no current transition enters it.
    Bidding,
    PerformingTask,
    TaskCompleted,
    Monitoring,
    Active,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Idle => "Idle",
            Status::Bidding => "Bidding",
            Status::PerformingTask => "Performing Task",
            Status::TaskCompleted => "Task Completed",
            Status::Monitoring => "Monitoring",
            Status::Active => "Active",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::TaskCompleted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// Mutable part of an agent. Only reachable through [`Agent::lock`].
#[derive(Debug)]
pub struct AgentState {
    pub status: Status,
    pub position: Position,
    /// Drone only.
    pub battery: Option<f64>,
    /// Completion timer armed by the last accepted proposal, if any.
    pub pending_task: Option<DelayedTaskHandle>,
}

/// A simulated agent. Lives for the whole process.
#[derive(Debug)]
pub struct Agent {
    role: Role,
    state: Mutex<AgentState>,
}

pub type SharedAgent = Arc<Agent>;

impl Agent {
    pub fn new(role: Role, position: Position, battery: Option<f64>) -> SharedAgent {
        Arc::new(Self {
            role,
            state: Mutex::new(AgentState {
                status: role.initial_status(),
                position,
                battery,
                pending_task: None,
            }),
        })
    }

    pub fn drone(battery: f64, position: Position) -> SharedAgent {
        Self::new(Role::Drone, position, Some(battery))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    /// Acquire the agent's state lock.
    ///
    /// Envelope handlers and fired delayed tasks both go through this lock,
    /// so they never observe each other's half-applied updates.
    pub fn lock(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock()
    }

    pub fn status(&self) -> Status {
        self.lock().status
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::capture(self.role, &self.lock())
    }
}

/// Point-in-time copy of an agent, as recorded by the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub role: String,
    pub status: String,
    pub position: Position,
    pub battery: Option<f64>,
    /// Capture time (unix ms)
    pub captured_at: i64,
}

impl AgentSnapshot {
    pub fn capture(role: Role, state: &AgentState) -> Self {
        Self {
            role: role.name().to_string(),
            status: state.status.label().to_string(),
            position: state.position,
            battery: state.battery,
            captured_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_name(role.name()), Some(role));
        }
        assert_eq!(Role::from_name("SimulationServer"), None);
    }

    #[test]
    fn test_initial_statuses() {
        assert_eq!(Role::Drone.initial_status(), Status::Idle);
        assert_eq!(Role::Camera.initial_status(), Status::Monitoring);
        assert_eq!(Role::Guard.initial_status(), Status::Idle);
        assert_eq!(Role::Robber.initial_status(), Status::Active);
    }

    #[test]
    fn test_snapshot_uses_labels() {
        let drone = Agent::drone(100.0, Position::default());
        drone.lock().status = Status::PerformingTask;

        let snapshot = drone.snapshot();
        assert_eq!(snapshot.role, "DroneAgent");
        assert_eq!(snapshot.status, "Performing Task");
        assert_eq!(snapshot.battery, Some(100.0));
    }

    #[test]
    fn test_only_drone_has_battery() {
        let camera = Agent::new(Role::Camera, Position::default(), None);
        assert!(camera.snapshot().battery.is_none());
    }
}
