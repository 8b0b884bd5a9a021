//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-timestep accumulator for the simulation update loop
///
/// Frame time is accumulated and handed out in fixed steps so the physics
/// simulation always advances by the same delta regardless of frame rate.
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    /// Create an accumulator producing steps of `step` seconds
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Add elapsed frame time to the accumulator
    pub fn accumulate(&mut self, delta_time: f32) {
        self.accumulator += delta_time;
    }

    /// Consume one fixed step if enough time has accumulated
    ///
    /// Call in a loop until it returns `None` to catch up after long frames.
    pub fn consume(&mut self) -> Option<f32> {
        if self.accumulator >= self.step {
            self.accumulator -= self.step;
            Some(self.step)
        } else {
            None
        }
    }

    /// The fixed step size in seconds
    pub fn step(&self) -> f32 {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_consumes_whole_steps() {
        let mut stepper = FixedStep::new(0.25);
        stepper.accumulate(0.6);

        assert_eq!(stepper.consume(), Some(0.25));
        assert_eq!(stepper.consume(), Some(0.25));
        assert_eq!(stepper.consume(), None);

        stepper.accumulate(0.2);
        assert_eq!(stepper.consume(), Some(0.25));
        assert_eq!(stepper.consume(), None);
    }
}
