//! Transition tuples stored in the replay buffer.
//!
//! A transition records one environment interaction. It is immutable once
//! stored: the interaction loop writes it, the replay sampler only reads it.
//! `terminal` and `truncated` are kept apart because only a true terminal
//! cuts the bootstrapped value target; a time-limit truncation does not.

/// One environment step: (state, action, reward, next_state, end flags).
#[derive(Debug, Clone)]
pub struct Transition {
    /// Observation before the action.
    pub state: Vec<f32>,
    /// Continuous action vector as sent to the environment.
    pub action: Vec<f32>,
    /// Reward received.
    pub reward: f32,
    /// Observation after the action.
    pub next_state: Vec<f32>,
    /// Episode terminated (collision, goal).
    pub terminal: bool,
    /// Episode truncated (step limit).
    pub truncated: bool,
}

impl Transition {
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: Vec<f32>,
        terminal: bool,
        truncated: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            terminal,
            truncated,
        }
    }

    /// Episode ended for any reason.
    pub fn done(&self) -> bool {
        self.terminal || self.truncated
    }

    pub fn state_dim(&self) -> usize {
        self.state.len()
    }

    pub fn action_dim(&self) -> usize {
        self.action.len()
    }
}
