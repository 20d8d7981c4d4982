// Two-state (angle, gyro bias) Kalman filter for a single tilt axis

use num_traits::{Float, NumAssignOps};

/// Noise tuning for [`TiltKalman`].
///
/// `Default` gives the reference tuning: `q_angle = 0.001`, `q_bias = 0.003`,
/// `r_measure = 0.03`. Higher process noise trusts the gyro rate more, higher
/// measurement noise trusts the accelerometer angle less.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanConfig<F> {
    pub q_angle: F,
    pub q_bias: F,
    pub r_measure: F,
}

impl<F> Default for KalmanConfig<F>
where
    F: Float,
{
    fn default() -> KalmanConfig<F> {
        KalmanConfig {
            q_angle: F::from(0.001).unwrap(),
            q_bias: F::from(0.003).unwrap(),
            r_measure: F::from(0.03).unwrap(),
        }
    }
}

/// Fuses a noisy absolute angle (accelerometer geometry) with a noisy angular
/// rate (gyro) into a smoothed angle estimate, tracking the gyro bias as a
/// hidden state. One instance per independent tilt axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltKalman<F> {
    config: KalmanConfig<F>,
    angle: F,
    bias: F,
    p: [[F; 2]; 2],
}

impl<F> TiltKalman<F>
where
    F: Float + NumAssignOps,
{
    pub fn new(config: KalmanConfig<F>) -> TiltKalman<F> {
        TiltKalman {
            config,
            angle: F::zero(),
            bias: F::zero(),
            p: [[F::zero(); 2]; 2],
        }
    }

    /// One predict-correct cycle.
    ///
    /// `new_angle` in degrees, `new_rate` in degrees/second, `dt` in seconds.
    /// Returns the updated angle estimate. With `dt == 0` the predict step is
    /// a no-op and only the correction toward `new_angle` applies. Inputs must
    /// be finite.
    pub fn estimate(&mut self, new_angle: F, new_rate: F, dt: F) -> F {
        // predict
        let rate = new_rate - self.bias;
        self.angle += dt * rate;

        self.p[0][0] +=
            dt * (dt * self.p[1][1] - self.p[0][1] - self.p[1][0] + self.config.q_angle);
        self.p[0][1] -= dt * self.p[1][1];
        self.p[1][0] -= dt * self.p[1][1];
        self.p[1][1] += self.config.q_bias * dt;

        // correct
        let s = self.p[0][0] + self.config.r_measure;
        let k = [self.p[0][0] / s, self.p[1][0] / s];
        let y = new_angle - self.angle;

        self.angle += k[0] * y;
        self.bias += k[1] * y;

        // covariance correction must use the pre-update entries
        let p00 = self.p[0][0];
        let p01 = self.p[0][1];
        self.p[0][0] -= k[0] * p00;
        self.p[0][1] -= k[0] * p01;
        self.p[1][0] -= k[1] * p00;
        self.p[1][1] -= k[1] * p01;

        self.angle
    }

    pub fn angle(&self) -> F {
        self.angle
    }

    /// Current gyro bias estimate in degrees/second.
    pub fn bias(&self) -> F {
        self.bias
    }

    pub fn covariance(&self) -> [[F; 2]; 2] {
        self.p
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn zero_dt_with_matching_measurement_is_a_no_op() {
        let mut filter = TiltKalman::<f32>::new(KalmanConfig::default());
        let angle = filter.estimate(0.0, 5.0, 0.0);
        assert_eq!(angle, 0.0);
        assert_eq!(filter.bias(), 0.0);
    }

    #[test]
    fn zero_dt_only_applies_the_correction() {
        let mut filter = TiltKalman::<f32>::new(KalmanConfig::default());
        // build up some covariance first
        for _ in 0..50 {
            filter.estimate(10.0, 0.0, 0.01);
        }
        let before = filter.angle();
        let after = filter.estimate(before + 1.0, 100.0, 0.0);
        // the rate input is ignored when dt is zero; the innovation still pulls
        assert!(after > before);
        assert!(after < before + 1.0);
    }

    #[test]
    fn converges_to_constant_angle() {
        let mut filter = TiltKalman::<f32>::new(KalmanConfig::default());
        let mut errs = [0.0f32; 2000];
        for err in errs.iter_mut() {
            let angle = filter.estimate(25.0, 0.0, 0.01);
            *err = (angle - 25.0).abs();
        }
        assert_abs_diff_eq!(filter.angle(), 25.0, epsilon = 0.01);
        // once the transient settles the error keeps shrinking
        for pair in errs[1900..].windows(2) {
            assert!(pair[1] <= pair[0] + 1e-4);
        }
    }

    #[test]
    fn absorbs_constant_rate_offset_into_bias() {
        let mut filter = TiltKalman::<f32>::new(KalmanConfig::default());
        // body is still (angle measurement 0) but the gyro reports 3 deg/s
        for _ in 0..5000 {
            filter.estimate(0.0, 3.0, 0.01);
        }
        assert_abs_diff_eq!(filter.bias(), 3.0, epsilon = 0.05);
        assert_abs_diff_eq!(filter.angle(), 0.0, epsilon = 0.05);
    }

    #[test]
    fn covariance_diagonal_stays_non_negative() {
        let mut filter = TiltKalman::<f32>::new(KalmanConfig::default());
        for i in 0..1000 {
            let angle = if i % 2 == 0 { 5.0 } else { -5.0 };
            filter.estimate(angle, 1.0, 0.02);
            let p = filter.covariance();
            assert!(p[0][0] >= 0.0);
            assert!(p[1][1] >= 0.0);
        }
    }

    #[test]
    fn works_at_f64() {
        let mut filter = TiltKalman::<f64>::new(KalmanConfig::default());
        for _ in 0..500 {
            filter.estimate(-12.5, 0.0, 0.01);
        }
        assert_abs_diff_eq!(filter.angle(), -12.5, epsilon = 0.05);
    }
}
