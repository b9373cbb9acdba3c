//! Fretboard note grid: six strings in standard tuning, frets 0..=max_fret.
//!
//! Items are `(string, fret)` cells. Clusters tag the string, note name,
//! neck zone, natural/accidental and landmark frets.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{ItemConfig, SelectionContext};

pub const NOTES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Open-string MIDI numbers, low E first.
pub const BASE_MIDI: [u8; 6] = [40, 45, 50, 55, 59, 64];

pub const STRING_COUNT: u8 = 6;
pub const LANDMARK_FRETS: [u8; 4] = [0, 5, 7, 12];
const DRILL_LANDMARKS: [u8; 3] = [5, 7, 12];
/// Generation stops avoiding the last note once the grid is this small.
const AVOID_LAST_MIN_CANDIDATES: usize = 6;
const SCAFFOLD_FRET_RADIUS: u8 = 2;
const MAX_FRET_CAP: u8 = 24;
/// Adjustments below this magnitude leave the settings alone.
const ADJUST_DEAD_ZONE: f64 = 0.3;

pub fn note_at(string: u8, fret: u8) -> &'static str {
    let midi = BASE_MIDI[usize::from(string % STRING_COUNT)] as usize + fret as usize;
    NOTES[midi % 12]
}

pub fn is_natural(note: &str) -> bool {
    !note.contains('#')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridItem {
    pub string: u8,
    pub fret: u8,
    pub note: &'static str,
    pub midi: u8,
}

impl GridItem {
    pub fn new(string: u8, fret: u8) -> Self {
        Self {
            string,
            fret,
            note: note_at(string, fret),
            midi: BASE_MIDI[usize::from(string % STRING_COUNT)] + fret,
        }
    }

    pub fn zone(&self) -> &'static str {
        match self.fret {
            0..=5 => "lo",
            6..=12 => "mid",
            _ => "hi",
        }
    }

    pub fn is_natural(&self) -> bool {
        is_natural(self.note)
    }

    pub fn is_landmark(&self) -> bool {
        LANDMARK_FRETS.contains(&self.fret)
    }

    fn same_note_and_string(&self, other: &GridItem) -> bool {
        self.note == other.note && self.string == other.string
    }
}

/// Which part of the neck is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    pub max_fret: u8,
    pub naturals_only: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            max_fret: 5,
            naturals_only: true,
        }
    }
}

impl GridSettings {
    pub fn full_neck() -> Self {
        Self {
            max_fret: 12,
            naturals_only: false,
        }
    }

    /// One progression step. Harder widens the neck 5 -> 12 -> 19 and then
    /// adds accidentals; easier walks back.
    pub fn adjusted(self, direction: f64, magnitude: f64) -> Self {
        let mut s = self;
        if magnitude <= ADJUST_DEAD_ZONE {
            return s;
        }
        if direction > 0.0 {
            if s.max_fret < 12 {
                s.max_fret = 12;
            } else if s.max_fret < 19 {
                s.max_fret = 19;
            } else if s.naturals_only {
                s.naturals_only = false;
            }
        } else if !s.naturals_only {
            s.naturals_only = true;
        } else if s.max_fret > 12 {
            s.max_fret = 12;
        } else if s.max_fret > 5 {
            s.max_fret = 5;
        }
        s
    }

    fn admits(&self, item: &GridItem) -> bool {
        item.fret <= self.max_fret && (!self.naturals_only || item.is_natural())
    }
}

/// A predicate form of the cluster ids produced by [`GridConfig`].
enum ClusterFilter {
    String(u8),
    Note(String),
    Zone(&'static str),
    Natural,
    Accidental,
    Landmark,
}

impl ClusterFilter {
    fn parse(cluster: &str) -> Option<Self> {
        if let Some(s) = cluster.strip_prefix("str_") {
            return s.parse().ok().map(Self::String);
        }
        if let Some(n) = cluster.strip_prefix("note_") {
            return NOTES.contains(&n).then(|| Self::Note(n.to_string()));
        }
        match cluster {
            "zone_lo" => Some(Self::Zone("lo")),
            "zone_mid" => Some(Self::Zone("mid")),
            "zone_hi" => Some(Self::Zone("hi")),
            "natural" => Some(Self::Natural),
            "accidental" => Some(Self::Accidental),
            "landmark" => Some(Self::Landmark),
            _ => None,
        }
    }

    fn matches(&self, item: &GridItem) -> bool {
        match self {
            Self::String(s) => item.string == *s,
            Self::Note(n) => item.note == n.as_str(),
            Self::Zone(z) => item.zone() == *z,
            Self::Natural => item.is_natural(),
            Self::Accidental => !item.is_natural(),
            Self::Landmark => item.is_landmark(),
        }
    }
}

pub struct GridConfig {
    settings: GridSettings,
    rng: ChaCha8Rng,
}

impl GridConfig {
    pub fn new(settings: GridSettings) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(settings, seed)
    }

    pub fn with_seed(settings: GridSettings, seed: u64) -> Self {
        Self {
            settings,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: GridSettings) {
        self.settings = settings;
    }

    pub fn adjust(&mut self, direction: f64, magnitude: f64) {
        self.settings = self.settings.adjusted(direction, magnitude);
    }

    /// Every admitted cell, string-major.
    pub fn candidates(&self) -> Vec<GridItem> {
        let mut out = Vec::new();
        for s in 0..STRING_COUNT {
            for f in 0..=self.settings.max_fret {
                let item = GridItem::new(s, f);
                if self.settings.admits(&item) {
                    out.push(item);
                }
            }
        }
        out
    }

    /// Picks uniformly, avoiding `last`'s note on `last`'s string while
    /// more than `min` candidates exist.
    fn pick_avoiding(&mut self, cands: &[GridItem], last: Option<&GridItem>, min: usize) -> Option<GridItem> {
        if let Some(last) = last {
            if cands.len() > min {
                let filtered: Vec<&GridItem> = cands.iter().filter(|c| !c.same_note_and_string(last)).collect();
                if let Some(pick) = filtered.choose(&mut self.rng) {
                    return Some(**pick);
                }
            }
        }
        cands.choose(&mut self.rng).copied()
    }

    fn pick_one(&mut self, cands: Vec<GridItem>) -> Vec<GridItem> {
        cands.choose(&mut self.rng).copied().into_iter().collect()
    }
}

impl ItemConfig for GridConfig {
    type Item = GridItem;

    fn item_key(&self, item: &GridItem) -> String {
        format!("s{}f{}", item.string, item.fret)
    }

    /// Higher frets and accidentals are harder.
    fn item_difficulty(&self, item: &GridItem) -> f64 {
        let position = f64::from(item.fret.min(MAX_FRET_CAP)) / f64::from(MAX_FRET_CAP) * 0.7;
        let accidental = if item.is_natural() { 0.0 } else { 0.2 };
        (0.05 + position + accidental).min(1.0)
    }

    fn item_clusters(&self, item: &GridItem) -> Vec<String> {
        let mut clusters = vec![
            format!("str_{}", item.string),
            format!("note_{}", item.note),
            format!("zone_{}", item.zone()),
            if item.is_natural() { "natural" } else { "accidental" }.to_string(),
        ];
        if item.is_landmark() {
            clusters.push("landmark".to_string());
        }
        clusters
    }

    fn item_from_key(&self, key: &str) -> Option<GridItem> {
        let rest = key.strip_prefix('s')?;
        let (s, f) = rest.split_once('f')?;
        let string: u8 = s.parse().ok()?;
        let fret: u8 = f.parse().ok()?;
        (string < STRING_COUNT && fret <= MAX_FRET_CAP).then(|| GridItem::new(string, fret))
    }

    fn gen_random(&mut self, last: Option<&GridItem>, _ctx: &SelectionContext<'_>) -> GridItem {
        let cands = self.candidates();
        self.pick_avoiding(&cands, last, AVOID_LAST_MIN_CANDIDATES)
            .unwrap_or_else(|| GridItem::new(0, 0))
    }

    fn gen_from_cluster(
        &mut self,
        cluster: &str,
        last: Option<&GridItem>,
        _ctx: &SelectionContext<'_>,
    ) -> Option<GridItem> {
        let filter = ClusterFilter::parse(cluster)?;
        let cands: Vec<GridItem> = self.candidates().into_iter().filter(|c| filter.matches(c)).collect();
        self.pick_avoiding(&cands, last, 1)
    }

    /// The open string and the nearest landmark fret on the same string.
    fn micro_drill(&mut self, failed: &GridItem) -> Vec<GridItem> {
        let mut nearest = DRILL_LANDMARKS[0];
        for lm in DRILL_LANDMARKS {
            if failed.fret.abs_diff(lm) < failed.fret.abs_diff(nearest) {
                nearest = lm;
            }
        }
        vec![GridItem::new(failed.string, 0), GridItem::new(failed.string, nearest)]
    }

    fn pick_scaffold(&mut self, item: &GridItem, weak_cluster: Option<&str>) -> Vec<GridItem> {
        let Some(weak) = weak_cluster else {
            return Vec::new();
        };
        let max_fret = self.settings.max_fret;

        if weak.starts_with("str_") {
            let cands: Vec<GridItem> = (0..=max_fret)
                .filter(|f| *f != item.fret)
                .map(|f| GridItem::new(item.string, f))
                .filter(|c| self.settings.admits(c))
                .collect();
            if !cands.is_empty() {
                return self.pick_one(cands);
            }
        }

        if weak.starts_with("note_") {
            let cands: Vec<GridItem> = (0..STRING_COUNT)
                .filter(|s| *s != item.string)
                .flat_map(|s| (0..=max_fret).map(move |f| GridItem::new(s, f)))
                .filter(|c| c.note == item.note)
                .collect();
            if !cands.is_empty() {
                return self.pick_one(cands);
            }
        }

        if weak == "accidental" {
            let lo = item.fret.saturating_sub(SCAFFOLD_FRET_RADIUS);
            let hi = max_fret.min(item.fret.saturating_add(SCAFFOLD_FRET_RADIUS));
            let cands: Vec<GridItem> = (lo..=hi)
                .flat_map(|f| (0..STRING_COUNT).map(move |s| GridItem::new(s, f)))
                .filter(|c| !c.is_natural())
                .collect();
            if !cands.is_empty() {
                return self.pick_one(cands);
            }
        }

        Vec::new()
    }

    fn item_features(&self, item: &GridItem) -> Option<Vec<(String, String)>> {
        Some(vec![
            ("string".to_string(), item.string.to_string()),
            ("zone".to_string(), item.zone().to_string()),
            ("accidental".to_string(), (!item.is_natural()).to_string()),
        ])
    }
}
