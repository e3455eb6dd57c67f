use std::time::{Duration, Instant};

/// Measures frame times and optionally sleeps the frame out to a fixed cap.
///
/// The simulation's decay constants assume a 60 fps reference rate, so the
/// default cap keeps the observable timing honest on faster displays.
pub struct Framepacer {
    begin: Instant,
    previous_begin: Instant,
}

impl Framepacer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            begin: now,
            previous_begin: now,
        }
    }

    pub fn begin_frame(&mut self) {
        self.previous_begin = self.begin;
        self.begin = Instant::now();
    }

    /// Duration of the last completed frame, begin to begin.
    pub fn frametime(&self) -> f32 {
        (self.begin - self.previous_begin).as_secs_f32()
    }

    /// Sleeps until `limit_frametime` has elapsed since `begin_frame`, then
    /// spins out the remainder. A non-finite or zero limit leaves the frame
    /// uncapped.
    pub fn end_frame(&mut self, limit_frametime: f32) {
        if limit_frametime <= f32::EPSILON || !limit_frametime.is_finite() {
            return;
        }

        const ACCURACY: f32 = 0.0001; // 100 microseconds
        let sleep_time = limit_frametime - self.begin.elapsed().as_secs_f32() - ACCURACY;
        if sleep_time > 0.0 {
            std::thread::sleep(Duration::from_secs_f32(sleep_time));
        }

        while self.begin.elapsed().as_secs_f32() < limit_frametime {
            std::thread::yield_now();
        }
    }
}
