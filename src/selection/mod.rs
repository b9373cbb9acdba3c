//! Selection: candidate scoring and the remedial drill queues.

pub mod drills;
pub mod scorer;

pub use drills::{build_overdue_queue, confusion_drill_value, confusion_sequence, should_micro_drill};
pub use scorer::{breakdown, is_mastered, score_known, score_new, target_time, ScoreBreakdown, ScoringContext};
