use std::time::Duration;

/// Tracks real time and game time (real time scaled and possibly paused).
/// Time itself never reads a clock: callers feed it the elapsed real time, so the same
/// code runs under `Instant` on native targets and under `requestAnimationFrame`
/// timestamps in the browser.
pub struct Time {
    /// How much time elapsed since the start of Time, as latest recorded during update()
    real_time: Duration,

    /// The latest updated real delta time
    real_dt: Duration,

    /// How much game time elapsed since the start of Time, as latest recorded during update()
    game_time: Duration,

    /// The latest updated game delta time
    dt: Duration,

    /// Upper bound for a single game delta time
    pub max_dt: Duration,

    /// How fast does game_time pass relative to real_time
    pub time_scale: f32,

    /// Whether game_time passes or not
    pub paused: bool,
}

impl Default for Time {
    fn default() -> Self {
        Time {
            real_time: Duration::default(),
            real_dt: Duration::default(),
            game_time: Duration::default(),
            dt: Duration::default(),
            max_dt: Duration::from_millis(100),
            time_scale: 1.,
            paused: false,
        }
    }
}

impl Time {
    pub fn with_max_dt(max_dt: Duration) -> Self {
        Time {
            max_dt,
            ..Default::default()
        }
    }

    /// `real_time` is the total real time elapsed since start. Going backwards is treated as
    /// a zero delta.
    pub fn update(&mut self, real_time: Duration) {
        self.real_dt = real_time.checked_sub(self.real_time).unwrap_or_default();
        self.real_time = self.real_time.max(real_time);

        let scaled = if self.paused {
            Duration::default()
        } else if self.time_scale == 1. {
            self.real_dt
        } else {
            mul_duration(&self.real_dt, self.time_scale)
        };
        self.dt = scaled.min(self.max_dt);
        self.game_time += self.dt;
    }

    #[inline(always)]
    pub fn dt(&self) -> Duration {
        self.dt
    }

    #[inline(always)]
    pub fn real_dt(&self) -> Duration {
        self.real_dt
    }

    #[inline(always)]
    pub fn dt_secs(&self) -> f32 {
        self.dt().as_secs_f32()
    }

    #[inline(always)]
    pub fn pause_toggle(&mut self) {
        self.paused = !self.paused;
    }

    #[inline(always)]
    pub fn real_time(&self) -> Duration {
        self.real_time
    }

    #[inline(always)]
    pub fn game_time(&self) -> Duration {
        self.game_time
    }
}

#[inline(always)]
pub fn to_ms_frac(d: &Duration) -> f32 {
    d.as_secs_f32() * 1000.
}

#[inline]
pub fn mul_duration(d: &Duration, s: f32) -> Duration {
    Duration::from_secs_f32((d.as_secs_f32() * s).max(0.))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lively_test::assert_approx_eq;

    #[test]
    fn dt_follows_real_time() {
        let mut time = Time::default();
        time.update(Duration::from_millis(16));
        assert_eq!(time.real_dt(), Duration::from_millis(16));
        assert_eq!(time.dt(), Duration::from_millis(16));
        time.update(Duration::from_millis(40));
        assert_eq!(time.dt(), Duration::from_millis(24));
        assert_eq!(time.game_time(), Duration::from_millis(40));
    }

    #[test]
    fn dt_is_clamped() {
        let mut time = Time::with_max_dt(Duration::from_millis(50));
        time.update(Duration::from_secs(3));
        assert_eq!(time.real_dt(), Duration::from_secs(3));
        assert_eq!(time.dt(), Duration::from_millis(50));
    }

    #[test]
    fn paused_time_does_not_advance() {
        let mut time = Time::default();
        time.pause_toggle();
        time.update(Duration::from_millis(30));
        assert_eq!(time.dt(), Duration::default());
        assert_eq!(time.game_time(), Duration::default());
        assert_eq!(time.real_time(), Duration::from_millis(30));
    }

    #[test]
    fn time_scale_applies() {
        let mut time = Time::default();
        time.time_scale = 0.5;
        time.update(Duration::from_millis(20));
        assert_approx_eq!(time.dt_secs(), 0.010_f32, eps = 0.0001);
    }

    #[test]
    fn backwards_time_is_zero_dt() {
        let mut time = Time::default();
        time.update(Duration::from_millis(20));
        time.update(Duration::from_millis(10));
        assert_eq!(time.real_dt(), Duration::default());
        assert_eq!(time.real_time(), Duration::from_millis(20));
    }

    #[test]
    fn to_ms_frac_converts() {
        assert_approx_eq!(to_ms_frac(&Duration::from_micros(1500)), 1.5_f32, eps = 0.0001);
    }
}
