/// Frame timing driven by scheduler timestamps (seconds).

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clock {
    running: bool,
    old_time: Option<f64>,
    elapsed_time: f64,
}

impl Clock {
    /// Running clock; the first tick yields a zero delta
    pub fn new() -> Self {
        Self { running: true, old_time: None, elapsed_time: 0.0 }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.old_time = None;
        self.elapsed_time = 0.0;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Advance to `timestamp`, returning the delta since the previous tick
    pub fn tick(&mut self, timestamp: f64) -> f64 {
        if !self.running {
            return 0.0;
        }
        let delta = match self.old_time {
            Some(old) => (timestamp - old).max(0.0),
            None => 0.0,
        };
        self.old_time = Some(timestamp);
        self.elapsed_time += delta;
        delta
    }

    /// Jump straight to `timestamp` as elapsed time (manual stepping)
    pub fn set_elapsed(&mut self, timestamp: f64) -> f64 {
        let delta = timestamp - self.elapsed_time;
        self.old_time = Some(timestamp);
        self.elapsed_time = timestamp;
        delta
    }
}
