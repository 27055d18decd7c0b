//! Kinematic car on a walled track.
//!
//! The car follows a bicycle model: throttle commands wheel angular
//! velocity, steering commands front-wheel angle. Seven distance sensors
//! fan across the front arc; the observation combines them with the heading
//! error against the track's direction field and the commanded speed.
//!
//! Reward is `v * cos(diff) - v * sin(diff)` with `v` the commanded wheel
//! velocity: full speed aligned with the field scores highest, speed spent
//! across it is penalized. Hitting a wall terminates the episode.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::env::track::{Track, TrackLayout, RAY_MISS};
use crate::env::{Environment, StepResult};

/// Wheel angular velocity at full throttle, rad/s.
pub const SPEED_MULTIPLIER: f32 = 51.0;
/// Front wheel angle at full steering, rad.
pub const STEERING_MULTIPLIER: f32 = 0.5;
/// Episode length cutoff.
pub const MAX_EPISODE_STEPS: usize = 10_000;

const N_SENSORS: usize = 7;
const SENSOR_ANGLES_DEG: [f32; N_SENSORS] = [-90.0, -60.0, -30.0, 0.0, 30.0, 60.0, 90.0];

const OBS_SIZE: usize = N_SENSORS + 2;
const ACTION_DIM: usize = 2;

const WHEEL_RADIUS: f32 = 0.05;
const WHEELBASE: f32 = 0.13;
const CAR_RADIUS: f32 = 0.1;
const DT: f32 = 0.05;

const START_X: f32 = 2.5;
const START_Y: f32 = 0.35;
const START_YAW: f32 = FRAC_PI_2;

/// The track environment.
///
/// Actions: `[throttle, steering]` with throttle in [0, 1] and steering in
/// [-1, 1]. Observations are 9 floats: seven normalized sensor distances,
/// heading error over π, and commanded speed over [`SPEED_MULTIPLIER`].
pub struct RacecarEnv {
    track: Track,
    x: f32,
    y: f32,
    yaw: f32,
    /// Commanded wheel velocity from the last action.
    speed: f32,
    steps: usize,
}

impl RacecarEnv {
    pub fn new(layout: TrackLayout) -> Self {
        Self {
            track: Track::new(layout),
            x: START_X,
            y: START_Y,
            yaw: START_YAW,
            speed: 0.0,
            steps: 0,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    fn sensor_readings(&self) -> [f32; N_SENSORS] {
        let mut readings = [RAY_MISS; N_SENSORS];
        for (reading, angle_deg) in readings.iter_mut().zip(SENSOR_ANGLES_DEG) {
            // Negated offset: the -90° entry looks left of the car, +90° right.
            let angle = self.yaw - angle_deg.to_radians();
            *reading = self.track.raycast(self.x, self.y, angle);
        }
        readings
    }

    fn observation(&self) -> Vec<f32> {
        let mut obs = Vec::with_capacity(OBS_SIZE);
        for d in self.sensor_readings() {
            obs.push(d / RAY_MISS);
        }
        obs.push(self.track.diff_angle(self.x, self.y, self.yaw) / PI);
        obs.push(self.speed / SPEED_MULTIPLIER);
        obs
    }
}

fn wrap_to_pi(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

impl Environment for RacecarEnv {
    fn obs_size(&self) -> usize {
        OBS_SIZE
    }

    fn action_dim(&self) -> usize {
        ACTION_DIM
    }

    fn action_low(&self) -> Vec<f32> {
        vec![0.0, -1.0]
    }

    fn action_high(&self) -> Vec<f32> {
        vec![1.0, 1.0]
    }

    fn reset(&mut self) -> Vec<f32> {
        self.x = START_X;
        self.y = START_Y;
        self.yaw = START_YAW;
        self.speed = 0.0;
        self.steps = 0;
        self.observation()
    }

    fn step(&mut self, action: &[f32]) -> StepResult {
        debug_assert_eq!(action.len(), ACTION_DIM);

        let throttle = action[0].clamp(0.0, 1.0);
        let steering = action[1].clamp(-1.0, 1.0);

        self.speed = throttle * SPEED_MULTIPLIER;
        let steer_angle = steering * STEERING_MULTIPLIER;
        let velocity = self.speed * WHEEL_RADIUS;

        self.x += velocity * self.yaw.cos() * DT;
        self.y += velocity * self.yaw.sin() * DT;
        self.yaw = wrap_to_pi(self.yaw + velocity / WHEELBASE * steer_angle.tan() * DT);
        self.steps += 1;

        let diff = self.track.diff_angle(self.x, self.y, self.yaw);
        let reward = self.speed * diff.cos() - self.speed * diff.sin();

        let terminal = self.track.collides(self.x, self.y, CAR_RADIUS);
        let truncated = !terminal && self.steps >= MAX_EPISODE_STEPS;

        StepResult {
            obs: self.observation(),
            reward,
            terminal,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_observation() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        let obs = env.reset();

        assert_eq!(obs.len(), OBS_SIZE);
        // Sensors are normalized by the miss value.
        for &s in &obs[..N_SENSORS] {
            assert!(s > 0.0 && s <= 1.0);
        }
        // Start region expects 45°, yaw is 90°: error π/4 normalized to 0.25.
        assert!((obs[7] - 0.25).abs() < 1e-4);
        // No throttle commanded yet.
        assert_eq!(obs[8], 0.0);
    }

    #[test]
    fn test_sensor_array_reads_left_to_right() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        let obs = env.reset();

        // Facing +y from (2.5, 0.35): the first sensor looks left across
        // the track to the outer wall at x = -0.025, the last looks right
        // at the near outer wall at x = 2.875.
        assert!((obs[0] * RAY_MISS - 2.525).abs() < 1e-3);
        assert!((obs[6] * RAY_MISS - 0.375).abs() < 1e-3);
    }

    #[test]
    fn test_step_moves_along_heading() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        env.reset();

        let (x0, y0) = env.position();
        env.step(&[1.0, 0.0]);
        let (x1, y1) = env.position();

        // Facing +y at the start.
        assert!((x1 - x0).abs() < 1e-6);
        assert!(y1 > y0);
    }

    #[test]
    fn test_steering_turns_the_car() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        env.reset();

        let yaw0 = env.yaw();
        env.step(&[1.0, 1.0]);
        assert!(env.yaw() > yaw0);

        env.reset();
        env.step(&[1.0, -1.0]);
        assert!(env.yaw() < yaw0);
    }

    #[test]
    fn test_reward_full_speed_aligned() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        env.reset();

        // Drive straight up into the 90° corridor; once aligned the reward
        // equals the commanded wheel velocity.
        let mut reward = 0.0;
        for _ in 0..5 {
            reward = env.step(&[1.0, 0.0]).reward;
        }
        assert!((reward - SPEED_MULTIPLIER).abs() < 1e-3);
    }

    #[test]
    fn test_zero_throttle_zero_reward() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        env.reset();

        let result = env.step(&[0.0, 0.0]);
        assert_eq!(result.reward, 0.0);
        assert!(!result.done());
    }

    #[test]
    fn test_collision_terminates() {
        let mut env = RacecarEnv::new(TrackLayout::Map1);
        env.reset();

        // Full throttle straight up ends at the top outer wall.
        let mut terminated = false;
        for _ in 0..200 {
            let result = env.step(&[1.0, 0.0]);
            if result.terminal {
                terminated = true;
                assert!(!result.truncated);
                break;
            }
        }
        assert!(terminated, "car should eventually hit a wall");
    }

    #[test]
    fn test_time_limit_truncates() {
        let mut env = RacecarEnv::new(TrackLayout::Map2);
        env.reset();

        // Parked car never collides; the step limit must cut the episode.
        let mut result = env.step(&[0.0, 0.0]);
        for _ in 1..MAX_EPISODE_STEPS {
            result = env.step(&[0.0, 0.0]);
        }
        assert!(result.truncated);
        assert!(!result.terminal);
    }

    #[test]
    fn test_action_bounds() {
        let env = RacecarEnv::new(TrackLayout::Map1);
        assert_eq!(env.action_low(), vec![0.0, -1.0]);
        assert_eq!(env.action_high(), vec![1.0, 1.0]);
        assert_eq!(env.action_dim(), 2);
        assert_eq!(env.obs_size(), 9);
    }

    #[test]
    fn test_yaw_stays_wrapped() {
        let mut env = RacecarEnv::new(TrackLayout::Map2);
        env.reset();

        for _ in 0..50 {
            env.step(&[0.5, 1.0]);
            let yaw = env.yaw();
            assert!((-PI..=PI).contains(&yaw));
        }
    }
}
