//! Procesbrede identifiers voor elementen.
//!
//! De enige gedeelde, muteerbare toestand van de kern is de globale
//! ID-reeks. Ze wordt expliciet als [`IdGenerator`] doorgegeven aan alles wat
//! elementen aanmaakt.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier van een element. Wordt nooit hergebruikt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ElementId(u64);

impl ElementId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static GLOBAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
enum Sequence {
    Global,
    Isolated(Arc<AtomicU64>),
}

/// Handle op een monotone ID-reeks.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    sequence: Sequence,
}

impl IdGenerator {
    /// De procesbrede reeks. Alle handles delen dezelfde teller.
    #[must_use]
    pub const fn global() -> Self {
        Self {
            sequence: Sequence::Global,
        }
    }

    /// Een eigen reeks die bij 1 begint. IDs zijn alleen uniek binnen deze
    /// reeks; bedoeld voor tests die voorspelbare IDs willen.
    #[must_use]
    pub fn isolated() -> Self {
        Self {
            sequence: Sequence::Isolated(Arc::new(AtomicU64::new(1))),
        }
    }

    /// Geeft het volgende ID uit.
    pub fn next_id(&self) -> ElementId {
        ElementId(self.counter().fetch_add(1, Ordering::Relaxed))
    }

    fn counter(&self) -> &AtomicU64 {
        match &self.sequence {
            Sequence::Global => &GLOBAL_SEQUENCE,
            Sequence::Isolated(counter) => counter,
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::global()
    }
}
