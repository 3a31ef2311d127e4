//! Progress snapshots.

use serde::{Deserialize, Serialize};

/// Point-in-time progress of a run, counted in applied tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Tasks applied so far.
    pub completed: usize,
    /// Applied tasks that carried a per-task error.
    pub failed: usize,
    /// Total tasks in the run.
    pub total: usize,
}

impl Progress {
    /// Initial snapshot for a run of `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            failed: 0,
            total,
        }
    }

    /// Fraction applied, in `[0, 1]`. An empty run counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Returns true once every task has been applied.
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut progress = Progress::new(4);
        assert_eq!(progress.fraction(), 0.0);
        progress.completed = 1;
        assert_eq!(progress.fraction(), 0.25);
        assert!(!progress.is_done());
        progress.completed = 4;
        assert!(progress.is_done());

        assert!(Progress::new(0).is_done());
    }

    #[test]
    fn test_serializes_flat() {
        let json = serde_json::to_string(&Progress::new(3)).unwrap();
        assert_eq!(json, r#"{"completed":0,"failed":0,"total":3}"#);
    }
}
