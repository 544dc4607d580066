//! Blink pattern catalog.
//!
//! A pattern is an ordered list of timed on/off steps.  The catalog holds
//! the canonical patterns for the lifetime of the manager and hands out
//! shared handles, so an indicator keeps its pattern alive for as long as
//! it is blinking even if the catalog is rebuilt underneath it.
//!
//! ## Canonical patterns
//!
//! | Pattern      | Sequence (ms)                 | Period  |
//! |--------------|-------------------------------|---------|
//! | SlowBlink    | 500 on, 1000 off              | 1500 ms |
//! | DoubleBlink  | 200 on, 100 off, 200 on, 1000 off | 1500 ms |
//! | FastBlink    | 200 on, 100 off               | 300 ms  |

use std::sync::Arc;

use heapless::Vec;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Maximum number of steps a single pattern can hold.
pub const MAX_PATTERN_STEPS: usize = 16;

/// Number of canonical patterns in the catalog.
pub const NUM_PATTERNS: usize = 3;

/// One leg of a blink pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkStep {
    /// How long this step is held, in milliseconds.
    pub duration_ms: u32,
    /// Whether the indicator is lit during this step.
    pub is_on: bool,
}

impl BlinkStep {
    pub const fn on(duration_ms: u32) -> Self {
        Self { duration_ms, is_on: true }
    }

    pub const fn off(duration_ms: u32) -> Self {
        Self { duration_ms, is_on: false }
    }
}

/// Catalog key.  The discriminant doubles as the catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PatternKind {
    /// 500 ms on, 1000 ms off.
    SlowBlink = 0,
    /// (200 ms on, 100 ms off) x 2, then the off leg stretches to 1000 ms.
    DoubleBlink = 1,
    /// 200 ms on, 100 ms off.
    FastBlink = 2,
}

impl PatternKind {
    pub const ALL: [Self; NUM_PATTERNS] = [Self::SlowBlink, Self::DoubleBlink, Self::FastBlink];

    const fn index(self) -> usize {
        self as usize
    }
}

/// A named, ordered sequence of steps.
///
/// Construction does not enforce the two-step minimum; that is checked
/// when a blink is started so a short pattern is a caller error at the
/// point of use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkPattern {
    id: PatternKind,
    sequence: Vec<BlinkStep, MAX_PATTERN_STEPS>,
}

impl BlinkPattern {
    pub fn new(id: PatternKind, steps: &[BlinkStep]) -> Result<Self, PatternError> {
        let sequence = Vec::from_slice(steps).map_err(|()| PatternError::TooManySteps)?;
        Ok(Self { id, sequence })
    }

    pub fn id(&self) -> PatternKind {
        self.id
    }

    pub fn steps(&self) -> &[BlinkStep] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Total duration of one traversal, in milliseconds.
    pub fn period_ms(&self) -> u32 {
        self.sequence.iter().map(|s| s.duration_ms).sum()
    }

    /// The step the indicator is left on when a finite run completes.
    pub fn last_step(&self) -> Option<&BlinkStep> {
        self.sequence.last()
    }
}

const SLOW_BLINK: [BlinkStep; 2] = [BlinkStep::on(500), BlinkStep::off(1000)];
const DOUBLE_BLINK: [BlinkStep; 4] = [
    BlinkStep::on(200),
    BlinkStep::off(100),
    BlinkStep::on(200),
    BlinkStep::off(1000),
];
const FAST_BLINK: [BlinkStep; 2] = [BlinkStep::on(200), BlinkStep::off(100)];

fn canonical_steps(kind: PatternKind) -> &'static [BlinkStep] {
    match kind {
        PatternKind::SlowBlink => &SLOW_BLINK,
        PatternKind::DoubleBlink => &DOUBLE_BLINK,
        PatternKind::FastBlink => &FAST_BLINK,
    }
}

/// Fixed table of canonical patterns, indexed by [`PatternKind`].
#[derive(Debug)]
pub struct PatternCatalog {
    patterns: [Arc<BlinkPattern>; NUM_PATTERNS],
}

impl PatternCatalog {
    /// Build a fully populated catalog.
    pub fn new() -> Self {
        Self {
            patterns: PatternKind::ALL.map(Self::build),
        }
    }

    /// Re-populate every entry with the canonical data.  Indicators that
    /// are mid-blink keep the handle they were given.
    pub fn create_patterns(&mut self) {
        self.patterns = PatternKind::ALL.map(Self::build);
        info!("patterns: catalog created ({} entries)", NUM_PATTERNS);
    }

    /// Constant-time lookup.
    pub fn get_pattern(&self, kind: PatternKind) -> Arc<BlinkPattern> {
        Arc::clone(&self.patterns[kind.index()])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlinkPattern> {
        self.patterns.iter().map(AsRef::as_ref)
    }

    fn build(kind: PatternKind) -> Arc<BlinkPattern> {
        let steps = canonical_steps(kind);
        debug!("patterns: {:?} -> {} steps", kind, steps.len());
        Arc::new(BlinkPattern {
            id: kind,
            sequence: steps.iter().copied().collect(),
        })
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}
