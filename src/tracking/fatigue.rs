use std::collections::VecDeque;

use crate::params::FatigueParams;
use crate::sanitize::trim_front;
use crate::stats;
use crate::types::SessionEntry;

/// Split-half comparison of the session window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueSignals {
    pub older_accuracy: f64,
    pub newer_accuracy: f64,
    pub acc_drop: f64,
    pub rt_increase: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FatigueMonitor {
    window: VecDeque<SessionEntry>,
    fatigued: bool,
    pre_fatigue_accuracy: Option<f64>,
}

impl FatigueMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fatigued(&self) -> bool {
        self.fatigued
    }

    pub fn pre_fatigue_accuracy(&self) -> Option<f64> {
        self.pre_fatigue_accuracy
    }

    pub fn window(&self) -> &VecDeque<SessionEntry> {
        &self.window
    }

    /// Outcomes in the window, oldest first.
    pub fn outcomes(&self) -> Vec<bool> {
        self.window.iter().map(|e| e.ok).collect()
    }

    pub fn session_accuracy(&self) -> f64 {
        stats::ratio_true(self.window.iter().map(|e| &e.ok))
    }

    /// Appends one outcome and re-evaluates the fatigue flag.
    pub fn push(&mut self, entry: SessionEntry, p: &FatigueParams) -> bool {
        self.window.push_back(entry);
        trim_front(&mut self.window, p.session_window);

        let Some(signals) = self.signals(p) else {
            return self.fatigued;
        };

        if self.fatigued {
            let pre = self.pre_fatigue_accuracy.unwrap_or(signals.older_accuracy);
            if signals.newer_accuracy >= pre * p.recovery_threshold {
                tracing::debug!(newer = signals.newer_accuracy, "fatigue recovered");
                self.fatigued = false;
                self.pre_fatigue_accuracy = None;
            }
        } else if signals.acc_drop > p.acc_drop_threshold
            || signals.rt_increase > p.rt_increase_threshold
        {
            tracing::debug!(
                acc_drop = signals.acc_drop,
                rt_increase = signals.rt_increase,
                "fatigue detected"
            );
            self.fatigued = true;
            self.pre_fatigue_accuracy = Some(signals.older_accuracy);
        }
        self.fatigued
    }

    /// None until the window is full.
    pub fn signals(&self, p: &FatigueParams) -> Option<FatigueSignals> {
        if p.session_window < 2 || self.window.len() < p.session_window {
            return None;
        }
        let entries: Vec<&SessionEntry> = self.window.iter().collect();
        let (older, newer) = entries.split_at(entries.len() / 2);

        let older_accuracy = stats::ratio_true(older.iter().map(|e| &e.ok));
        let newer_accuracy = stats::ratio_true(newer.iter().map(|e| &e.ok));
        let acc_drop = if older_accuracy > 0.0 {
            (older_accuracy - newer_accuracy) / older_accuracy
        } else {
            0.0
        };

        let avg_time = |half: &[&SessionEntry]| {
            stats::mean(half.iter().map(|e| e.time_ms).filter(|t| *t > 0.0))
        };
        let rt_increase = match (avg_time(older), avg_time(newer)) {
            (Some(o), Some(n)) if o > 0.0 => (n - o) / o,
            _ => 0.0,
        };

        Some(FatigueSignals {
            older_accuracy,
            newer_accuracy,
            acc_drop,
            rt_increase,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ok: bool) -> SessionEntry {
        SessionEntry { ok, time_ms: 1000.0 }
    }

    /// Ten entries with `hits` correct answers, the misses first.
    fn block(hits: usize) -> Vec<SessionEntry> {
        (0..10).map(|i| entry(i >= 10 - hits)).collect()
    }

    #[test]
    fn test_needs_full_window() {
        let p = FatigueParams::default();
        let mut m = FatigueMonitor::new();
        for _ in 0..19 {
            m.push(entry(false), &p);
        }
        assert!(m.signals(&p).is_none());
        assert!(!m.is_fatigued());
    }

    #[test]
    fn test_accuracy_drop_flags_fatigue() {
        let p = FatigueParams::default();
        let mut m = FatigueMonitor::new();
        for e in block(9).into_iter().chain(block(6)) {
            m.push(e, &p);
        }
        let s = m.signals(&p).unwrap();
        assert!((s.acc_drop - 1.0 / 3.0).abs() < 1e-12);
        assert!(m.is_fatigued());
        assert_eq!(m.pre_fatigue_accuracy(), Some(0.9));
    }

    #[test]
    fn test_recovery_at_ninety_percent_of_pre_fatigue() {
        let p = FatigueParams::default();
        let mut m = FatigueMonitor::new();
        for e in block(9).into_iter().chain(block(6)) {
            m.push(e, &p);
        }
        assert!(m.is_fatigued());
        // Newer half reaches .8 then .9; recovery needs >= .81
        for _ in 0..2 {
            m.push(entry(true), &p);
        }
        let newer = m.signals(&p).unwrap().newer_accuracy;
        if newer < 0.81 {
            assert!(m.is_fatigued());
        }
        for _ in 0..10 {
            m.push(entry(true), &p);
        }
        assert!(!m.is_fatigued());
        assert_eq!(m.pre_fatigue_accuracy(), None);
    }

    #[test]
    fn test_response_time_increase_flags_fatigue() {
        let p = FatigueParams::default();
        let mut m = FatigueMonitor::new();
        for i in 0..20 {
            let time_ms = if i < 10 { 1000.0 } else { 1500.0 };
            m.push(SessionEntry { ok: true, time_ms }, &p);
        }
        assert!(m.is_fatigued());
        assert_eq!(m.pre_fatigue_accuracy(), Some(1.0));
    }

    #[test]
    fn test_window_capped() {
        let p = FatigueParams::default();
        let mut m = FatigueMonitor::new();
        for _ in 0..45 {
            m.push(entry(true), &p);
        }
        assert_eq!(m.window().len(), 20);
        assert_eq!(m.session_accuracy(), 1.0);
    }
}
