//! Edge detection for the planting button.

/// Reports `true` only on a false → true transition between consecutive samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    /// Create a detector that starts released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current level; returns whether it is a rising edge.
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.last;
        self.last = level;
        edge
    }

    /// Level seen on the previous sample.
    pub fn last_level(&self) -> bool {
        self.last
    }
}
