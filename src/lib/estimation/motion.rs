// Tilt fusion and dead-reckoned displacement from one MPU-6050

use crate::drivers::imu::mpu6050::{Mpu6050, RawSample};
use crate::filtering::kalman::{KalmanConfig, TiltKalman};
use core::f32::consts::PI;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use libm::{atan2f, cosf, sinf, sqrtf};

const RAD_TO_DEG: f32 = 180.0 / PI;
const DEG_TO_RAD: f32 = PI / 180.0;
const STANDARD_GRAVITY: f32 = 9.81; // m/s^2

/// Full kinematic snapshot, updated once per cycle.
///
/// Velocity and position accumulate for the process lifetime until
/// [`reset_displacement`](MotionState::reset_displacement) redefines the
/// origin. Yaw is open gyro integration with no heading reference and drifts
/// without bound; treat it as best-effort.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MotionState {
    pub accel_raw: (i16, i16, i16),
    pub gyro_raw: (i16, i16, i16),
    /// Filtered tilt angles in degrees.
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    /// Elapsed time covered by the last cycle, seconds.
    pub dt: f32,
    /// m/s per axis.
    pub velocity: (f32, f32, f32),
    /// m per axis.
    pub position: (f32, f32, f32),
}

impl MotionState {
    /// Redefines the origin: zeroes velocity and position only. Orientation,
    /// yaw and the filters deliberately carry over.
    pub fn reset_displacement(&mut self) {
        self.velocity = (0.0, 0.0, 0.0);
        self.position = (0.0, 0.0, 0.0);
    }
}

/// Drives the per-axis tilt filters and integrates gravity-compensated
/// acceleration into velocity and position.
///
/// Owns the pitch/roll filter pair and the millisecond epoch of the previous
/// sample; timestamps are passed in by the caller so the cadence source stays
/// external.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEstimator {
    pitch_filter: TiltKalman<f32>,
    roll_filter: TiltKalman<f32>,
    last_update_ms: u32,
}

impl MotionEstimator {
    /// `epoch_ms` is the monotonic time the first cycle's `dt` is measured
    /// from.
    pub fn new(config: KalmanConfig<f32>, epoch_ms: u32) -> Self {
        Self {
            pitch_filter: TiltKalman::new(config),
            roll_filter: TiltKalman::new(config),
            last_update_ms: epoch_ms,
        }
    }

    /// One full estimation cycle: burst-read the sensor, then fold the sample
    /// in. A failed read propagates the bus error and leaves `state`, both
    /// filters and the recorded epoch untouched.
    pub fn run_cycle<I2C, E>(
        &mut self,
        imu: &mut Mpu6050<I2C>,
        state: &mut MotionState,
        now_ms: u32,
    ) -> Result<(), E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        let raw = imu.read_raw()?;
        self.ingest(raw, state, now_ms);
        Ok(())
    }

    /// Folds one raw sample into `state`. Pure numeric step, no bus access.
    pub fn ingest(&mut self, raw: RawSample, state: &mut MotionState, now_ms: u32) {
        let (ax, ay, az) = raw.accel_g();
        let (gx, gy, gz) = raw.gyro_dps();

        // modular subtraction tolerates a single timer wrap
        let dt = now_ms.wrapping_sub(self.last_update_ms) as f32 / 1000.0;
        self.last_update_ms = now_ms;

        // instantaneous tilt from gravity-only accelerometer geometry
        let pitch_acc = atan2f(ay, sqrtf(ax * ax + az * az)) * RAD_TO_DEG;
        let roll_acc = atan2f(-ax, sqrtf(ay * ay + az * az)) * RAD_TO_DEG;

        state.pitch = self.pitch_filter.estimate(pitch_acc, gx, dt);
        state.roll = self.roll_filter.estimate(roll_acc, gy, dt);
        state.yaw += gz * dt;

        // subtract the gravity component implied by the filtered tilt
        let ax_lin = ax - sinf(state.pitch * DEG_TO_RAD);
        let ay_lin = ay - sinf(state.roll * DEG_TO_RAD);
        let az_lin = az - cosf(state.pitch * DEG_TO_RAD) * cosf(state.roll * DEG_TO_RAD);

        state.velocity.0 += ax_lin * STANDARD_GRAVITY * dt;
        state.velocity.1 += ay_lin * STANDARD_GRAVITY * dt;
        state.velocity.2 += az_lin * STANDARD_GRAVITY * dt;

        state.position.0 += state.velocity.0 * dt;
        state.position.1 += state.velocity.1 * dt;
        state.position.2 += state.velocity.2 * dt;

        state.accel_raw = raw.accel;
        state.gyro_raw = raw.gyro;
        state.dt = dt;
    }

    pub fn pitch_filter(&self) -> &TiltKalman<f32> {
        &self.pitch_filter
    }

    pub fn roll_filter(&self) -> &TiltKalman<f32> {
        &self.roll_filter
    }
}
