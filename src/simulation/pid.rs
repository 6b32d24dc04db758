//! Proportional-integral-derivative controller

/// PID gains
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

/// Classic PID over a scalar error signal.
///
/// The first call has no previous error to differentiate against and
/// returns 0, but still records the error and adds it to the integral.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    prev_error: Option<f64>,
    i_sum: f64,
}

impl Pid {
    pub fn new(p: f64, i: f64, d: f64) -> Self {
        Self::from_gains(PidGains { p, i, d })
    }

    pub fn from_gains(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: None,
            i_sum: 0.0,
        }
    }

    /// Controller output for `error`; `dt` scales the derivative term
    pub fn value(&mut self, error: f64, dt: f64) -> f64 {
        self.i_sum += error;
        let Some(prev) = self.prev_error.replace(error) else {
            return 0.0;
        };

        let d_val = (error - prev) * dt;
        self.gains.p * error + self.gains.i * self.i_sum + self.gains.d * d_val
    }

    /// [`Pid::value`] with a unit timestep
    pub fn update(&mut self, error: f64) -> f64 {
        self.value(error, 1.0)
    }

    pub fn integral(&self) -> f64 {
        self.i_sum
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Forget history and integral
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.i_sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_returns_zero_but_integrates() {
        let mut pid = Pid::new(1.0, 1.0, 1.0);
        assert_eq!(pid.value(3.0, 1.0), 0.0);
        assert_eq!(pid.integral(), 3.0);
    }

    #[test]
    fn test_terms_combine() {
        let mut pid = Pid::new(2.0, 0.5, 4.0);
        pid.value(1.0, 1.0);
        // p*2 + i*(1+2) + d*(2-1)*0.5
        let out = pid.value(2.0, 0.5);
        assert!((out - (4.0 + 1.5 + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        pid.value(1.0, 1.0);
        pid.reset();
        assert_eq!(pid.value(5.0, 1.0), 0.0);
        assert_eq!(pid.integral(), 5.0);
    }
}
