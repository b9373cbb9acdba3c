#![allow(dead_code)]

use fretwise::{
    DifficultyBand, FamilySpec, GridConfig, GridItem, GridSettings, LearningEngine, MemoryStorage,
    ParamOverrides, ReportMeta, UnifiedConfig,
};

pub const T0: i64 = 1_700_000_000_000;
pub const EXERCISE_ID: &str = "fretboard-notes";

/// Engine over the full neck, persisting into a shared memory store.
pub fn grid_engine(seed: u64) -> (LearningEngine<GridConfig>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let engine = grid_engine_on(&storage, seed);
    (engine, storage)
}

pub fn grid_engine_on(storage: &MemoryStorage, seed: u64) -> LearningEngine<GridConfig> {
    LearningEngine::new(
        GridConfig::with_seed(GridSettings::full_neck(), seed),
        Some(EXERCISE_ID),
        Box::new(storage.clone()),
        ParamOverrides::new(),
    )
    .expect("default params resolve")
}

/// Naturals first position, accidentals first position, full neck.
pub fn unified_config(seed: u64) -> UnifiedConfig<GridItem> {
    UnifiedConfig::with_seed(
        vec![
            FamilySpec::new(
                "neck",
                "Full neck",
                DifficultyBand::new(0.35, 0.5),
                GridConfig::with_seed(GridSettings::full_neck(), seed + 3),
            ),
            FamilySpec::new(
                "nf",
                "Naturals",
                DifficultyBand::new(0.0, 0.4),
                GridConfig::with_seed(GridSettings::default(), seed + 1),
            ),
            FamilySpec::new(
                "acc",
                "Accidentals",
                DifficultyBand::new(0.1, 0.3),
                GridConfig::with_seed(
                    GridSettings {
                        max_fret: 5,
                        naturals_only: false,
                    },
                    seed + 2,
                ),
            ),
        ],
        seed,
    )
    .expect("valid family table")
}

/// Answers the cold-start window correctly at a fixed clock.
pub fn warm_up(engine: &mut LearningEngine<GridConfig>) {
    let window = engine.params().cold_start.min_questions;
    for _ in 0..window {
        let item = engine.next_at(T0);
        engine.report_at(&item, true, Some(900.0), &ReportMeta::default(), T0);
    }
}
