//! Tier 1 - fixed constants.
//!
//! Structural and mathematical constants baked into the algorithms. They
//! sit below every override tier and are never merge targets.

/// FSRS forgetting-curve constants and weight vector.
#[derive(Debug, Clone, Copy)]
pub struct FsrsConstants {
    pub factor: f64,
    pub decay: f64,
    /// w0-3 initial stability per grade, w4-5 initial difficulty, w6 difficulty
    /// delta, w7 mean reversion, w8-10 success stability, w11-14 failure
    /// stability, w15 hard penalty, w16 easy bonus, w17-18 same-day review
    pub w: [f64; 19],
    pub ms_per_day: f64,
}

/// Caps on every bounded buffer kept by the engine.
#[derive(Debug, Clone, Copy)]
pub struct HistoryCaps {
    pub max_hist: usize,
    pub max_times: usize,
    pub max_correct_times: usize,
    pub max_confusions: usize,
    pub max_recent: usize,
    pub session_window: usize,
    pub max_theta_history: usize,
}

/// Attempt-count cadences for periodic bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub theta_snapshot_every: u32,
    pub adaptive_every: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Constants {
    pub fsrs: FsrsConstants,
    pub history: HistoryCaps,
    pub cadence: Cadence,
}

pub const CONSTANTS: Constants = Constants {
    fsrs: FsrsConstants {
        factor: 19.0 / 81.0,
        decay: -0.5,
        w: [
            0.4026, 1.1839, 3.173, 15.691, // w0-w3
            7.195, 0.535, // w4-w5
            1.460, // w6
            0.005, // w7
            1.546, 0.119, 1.019, // w8-w10
            1.940, 0.110, 0.296, 2.270, // w11-w14
            0.232, 2.990, // w15-w16
            0.517, 0.662, // w17-w18
        ],
        ms_per_day: 86_400_000.0,
    },
    history: HistoryCaps {
        max_hist: 5,
        max_times: 10,
        max_correct_times: 200,
        max_confusions: 10,
        max_recent: 5,
        session_window: 20,
        max_theta_history: 50,
    },
    cadence: Cadence {
        theta_snapshot_every: 20,
        adaptive_every: 20,
    },
};
