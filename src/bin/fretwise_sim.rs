//! Simulated practice session.
//!
//! Drives a [`LearningEngine`] over a two-family fretboard config with a
//! synthetic learner and prints the final mastery report as JSON.
//!
//! Env:
//! - `FRETWISE_SIM_QUESTIONS` - questions to answer (default 200)
//! - `FRETWISE_SIM_SEED` - seed for the config and the learner (default 42)
//! - `FRETWISE_SIM_DIR` - persist to this directory instead of memory
//! - `FRETWISE_LOG` - tracing filter (default `info`)

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fretwise::logging::init_tracing_from_env;
use fretwise::{
    DifficultyBand, FamilySpec, FileStorage, GridConfig, GridItem, GridSettings, ItemConfig,
    LearningEngine, MemoryStorage, ParamOverrides, ReportMeta, StorageAdapter, UnifiedConfig,
    UnifiedItem,
};

const EXERCISE_ID: &str = "fretwise-sim";

#[derive(Debug, Clone)]
struct SimConfig {
    questions: u32,
    seed: u64,
    storage_dir: Option<String>,
}

impl SimConfig {
    fn from_env() -> Self {
        let questions = std::env::var("FRETWISE_SIM_QUESTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(200);
        let seed = std::env::var("FRETWISE_SIM_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(42);
        let storage_dir = std::env::var("FRETWISE_SIM_DIR").ok();
        Self {
            questions,
            seed,
            storage_dir,
        }
    }
}

/// Answers from a hidden per-item skill that grows with practice.
struct SimLearner {
    rng: ChaCha8Rng,
    skill: HashMap<String, f64>,
}

impl SimLearner {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            skill: HashMap::new(),
        }
    }

    /// Returns (correct, response time ms, wrong answer if any).
    fn answer(&mut self, key: &str, difficulty: f64, item: &GridItem) -> (bool, f64, Option<String>) {
        let skill = self.skill.entry(key.to_string()).or_insert(0.2);
        let p_correct = (*skill * (1.2 - difficulty)).clamp(0.05, 0.97);
        let ok = self.rng.gen::<f64>() < p_correct;
        *skill = (*skill + if ok { 0.08 } else { 0.04 }).min(1.0);

        let time_ms = 600.0 + (1.0 - p_correct) * 2500.0 + self.rng.gen_range(0.0..400.0);
        let detected = (!ok).then(|| {
            // Neighbouring fret is the usual slip.
            let fret = if item.fret == 0 { 1 } else { item.fret - 1 };
            GridItem::new(item.string, fret).note.to_string()
        });
        (ok, time_ms, detected)
    }
}

fn build_config(seed: u64) -> Result<UnifiedConfig<GridItem>, fretwise::ConfigError> {
    UnifiedConfig::with_seed(
        vec![
            FamilySpec::new(
                "nf",
                "Naturals, first position",
                DifficultyBand::new(0.0, 0.4),
                GridConfig::with_seed(GridSettings::default(), seed.wrapping_add(1)),
            ),
            FamilySpec::new(
                "neck",
                "Full neck",
                DifficultyBand::new(0.35, 0.5),
                GridConfig::with_seed(GridSettings::full_neck(), seed.wrapping_add(2)),
            ),
        ],
        seed,
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing_from_env();
    let sim = SimConfig::from_env();

    let storage: Box<dyn StorageAdapter> = match &sim.storage_dir {
        Some(dir) => Box::new(FileStorage::new(dir)?),
        None => Box::new(MemoryStorage::new()),
    };
    let overrides = ParamOverrides::from_env()?;
    let mut engine = LearningEngine::new(
        build_config(sim.seed)?,
        Some(EXERCISE_ID),
        storage,
        overrides,
    )?;
    let mut learner = SimLearner::new(sim.seed);

    tracing::info!(questions = sim.questions, seed = sim.seed, "simulation started");

    for _ in 0..sim.questions {
        let item: UnifiedItem<GridItem> = engine.next();
        let key = engine.config().item_key(&item);
        let difficulty = engine.config().item_difficulty(&item);
        let (ok, time_ms, detected) = learner.answer(&key, difficulty, &item.inner);
        let meta = match detected {
            Some(value) => ReportMeta::detected(value),
            None => ReportMeta::default(),
        };
        engine.report(&item, ok, Some(time_ms), &meta);
    }
    engine.save();

    let report = engine.mastery_report();
    tracing::info!(
        theta = report.overall.theta,
        mastered = report.overall.mastered_count,
        items = report.overall.total_items,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
