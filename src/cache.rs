use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::Ipv4Addr;

use log::info;

use crate::access::AccessConfig;
use crate::classifier::Classifier;
use crate::tier::PriorityTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRecord {
    pub marking: u8,
    pub tier: PriorityTier,
    pub access: AccessConfig,
}

/// Memoized classification decisions.
///
/// Records are keyed by marking and never evicted or overwritten: the first
/// decision for a marking is the one every later caller sees. The last
/// marking seen from each source address is tracked alongside.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    records: HashMap<u8, ClassificationRecord>,
    sources: HashMap<Ipv4Addr, u8>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for `marking`, classifying it on first sight.
    pub fn resolve(&mut self, marking: u8, classifier: &Classifier) -> ClassificationRecord {
        match self.records.entry(marking) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let (tier, access) = classifier.classify(marking);
                info!(
                    "new marking 0x{:02x} -> {} ({}, TXOP {} us)",
                    marking,
                    tier,
                    tier.access_category(),
                    access.txop_limit_micros
                );
                *entry.insert(ClassificationRecord {
                    marking,
                    tier,
                    access,
                })
            }
        }
    }

    /// Like [`resolve`](Self::resolve), also remembering `source` as a sender of `marking`.
    pub fn resolve_for_source(
        &mut self,
        source: Ipv4Addr,
        marking: u8,
        classifier: &Classifier,
    ) -> ClassificationRecord {
        self.sources.insert(source, marking);
        self.resolve(marking, classifier)
    }

    pub fn get(&self, marking: u8) -> Option<&ClassificationRecord> {
        self.records.get(&marking)
    }

    /// Tier of the last marking seen from `source`.
    pub fn source_tier(&self, source: Ipv4Addr) -> Option<PriorityTier> {
        let marking = self.sources.get(&source)?;
        self.records.get(marking).map(|record| record.tier)
    }

    /// Distinct sources per tier, in drain order.
    pub fn flows_per_tier(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for marking in self.sources.values() {
            if let Some(record) = self.records.get(marking) {
                counts[record.tier.index()] += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
