//! # fretwise - adaptive item scheduling
//!
//! Picks the next practice item for a learner and folds each answer back
//! into per-item and global learner models:
//!
//! - **BKT** - per-item mastery probability with a speed-aware guess rate
//! - **FSRS** - stability, difficulty and retrievability for review timing
//! - **Theta** - a single global ability estimate with plateau detection
//! - **Drills** - micro-drills after repeated failure, confusion drills,
//!   overdue review queues
//! - **Fatigue** - split-half accuracy and response time monitoring
//! - **Adaptive estimates** - guess/slip/learn rates fitted from history
//!
//! ## Module structure
//!
//! - [`engine`] - [`LearningEngine`], the `next`/`report` orchestrator and mastery views
//! - [`config`] - the [`ItemConfig`] trait, [`GridConfig`] and [`UnifiedConfig`]
//! - [`knowledge`] - BKT, FSRS and theta updates
//! - [`selection`] - candidate scoring and drill queues
//! - [`tracking`] - fatigue, confusions, coverage
//! - [`adaptive`] - parameter estimators, drill effectiveness, feature difficulty
//! - [`params`] - defaults, constants and override resolution
//! - [`persistence`] - storage adapters, versioned saves, migrations
//! - [`store`] - item records, cluster counters, recency buffer
//! - [`sanitize`] - numerical guards
//!
//! ## Usage
//!
//! ```rust
//! use fretwise::{GridConfig, GridSettings, LearningEngine, ReportMeta};
//!
//! let mut engine = LearningEngine::in_memory(GridConfig::with_seed(GridSettings::default(), 7));
//! let item = engine.next();
//! engine.report(&item, true, Some(900.0), &ReportMeta::default());
//! assert_eq!(engine.total_attempts(), 1);
//! ```

// ============================================================================
// module declarations
// ============================================================================

pub mod adaptive;
pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod params;
pub mod persistence;
pub mod sanitize;
pub mod selection;
pub mod stats;
pub mod store;
pub mod tracking;
pub mod types;

// ============================================================================
// re-exports
// ============================================================================

pub use types::*;

pub use config::{
    DifficultyBand, Family, FamilySpec, GridConfig, GridItem, GridSettings, ItemConfig,
    SelectionContext, UnifiedConfig, UnifiedItem,
};

pub use engine::{
    now_ms, AdaptiveSummary, ClusterSummary, ItemStats, LearningEngine, MasteryReport,
    OverallStats, ReportMeta, TopConfusion,
};

pub use error::{ConfigError, DecodeError, ParamError, StorageError};

pub use params::{resolve, ParamOverrides, Params, CONSTANTS};

pub use persistence::{
    deserialize, serialize, Decoded, FileStorage, MemoryStorage, SavedState, StorageAdapter,
    CURRENT_VERSION,
};

pub use store::ItemStore;
