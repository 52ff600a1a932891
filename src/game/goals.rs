//! Floor goals
//!
//! Three objectives per floor. The in-between room reads the results and
//! walls off the reward of every goal that failed.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GoalKind {
    /// Kill at least this many enemies
    Kills,
    /// Reach the exit within this many seconds
    TimeLimit,
    /// Get hit fewer than this many times
    TimesHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorGoal {
    pub kind: GoalKind,
    pub target: f32,
}

impl FloorGoal {
    pub const fn new(kind: GoalKind, target: f32) -> Self {
        Self { kind, target }
    }
}

pub const DEFAULT_GOALS: [FloorGoal; 3] = [
    FloorGoal::new(GoalKind::Kills, 20.0),
    FloorGoal::new(GoalKind::TimeLimit, 240.0),
    FloorGoal::new(GoalKind::TimesHit, 5.0),
];

/// Goal targets and live counters for the current floor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalManager {
    pub goals: [FloorGoal; 3],
    pub kills: u32,
    /// Seconds spent on procedural floors since the last reset
    pub elapsed: f32,
    pub times_hit: u32,
    timer_running: bool,
}

impl Default for GoalManager {
    fn default() -> Self {
        Self::new(DEFAULT_GOALS)
    }
}

impl GoalManager {
    pub fn new(goals: [FloorGoal; 3]) -> Self {
        Self {
            goals,
            kills: 0,
            elapsed: 0.0,
            times_hit: 0,
            timer_running: false,
        }
    }

    /// Zero the counters for a new floor
    pub fn reset(&mut self) {
        self.kills = 0;
        self.elapsed = 0.0;
        self.times_hit = 0;
        self.timer_running = false;
    }

    pub fn set_timer_running(&mut self, running: bool) {
        self.timer_running = running;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.timer_running {
            self.elapsed += dt;
        }
    }

    pub fn on_kill(&mut self) {
        self.kills += 1;
    }

    pub fn on_player_hit(&mut self) {
        self.times_hit += 1;
    }

    pub fn is_met(&self, goal: &FloorGoal) -> bool {
        match goal.kind {
            GoalKind::Kills => self.kills as f32 >= goal.target,
            GoalKind::TimeLimit => self.elapsed <= goal.target,
            GoalKind::TimesHit => (self.times_hit as f32) < goal.target,
        }
    }

    /// Met or failed, in goal order
    pub fn results(&self) -> [bool; 3] {
        [
            self.is_met(&self.goals[0]),
            self.is_met(&self.goals[1]),
            self.is_met(&self.goals[2]),
        ]
    }
}
