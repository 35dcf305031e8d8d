use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{QuizError, Result};

/// Identifier of a sample inside a catalog.
pub type SampleId = u32;

const BUNDLED_SAMPLES: &str = include_str!("../../data/samples.json");

/// A single audio excerpt together with its composer and artwork metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    #[serde(default)]
    pub title: String,
    pub composer: String,
    pub uri: String,
    /// Opaque reference the host resolves to an image.
    #[serde(default)]
    pub artwork: String,
}

/// Read-only lookup of the fixed sample metadata.
pub trait SampleCatalog {
    /// Every id in the catalog, in ascending order.
    fn all_ids(&self) -> Vec<SampleId>;

    fn sample(&self, id: SampleId) -> Option<&Sample>;

    fn len(&self) -> usize {
        self.all_ids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: SampleId) -> bool {
        self.sample(id).is_some()
    }

    /// Looks up `id`, treating a miss as a consistency fault.
    fn require(&self, id: SampleId) -> Result<&Sample> {
        self.sample(id).ok_or(QuizError::InvalidSampleId(id))
    }
}

/// Catalog loaded once from a fixed dataset and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    samples: BTreeMap<SampleId, Sample>,
}

impl StaticCatalog {
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for sample in samples {
            let id = sample.id;
            if map.insert(id, sample).is_some() {
                return Err(QuizError::msg(format!(
                    "sample id {id} appears more than once in the catalog"
                )));
            }
        }
        Ok(Self { samples: map })
    }

    /// Parses a JSON array of samples.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let samples: Vec<Sample> = serde_json::from_str(json)?;
        Self::from_samples(samples)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The dataset shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_SAMPLES)
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }
}

impl SampleCatalog for StaticCatalog {
    fn all_ids(&self) -> Vec<SampleId> {
        self.samples.keys().copied().collect()
    }

    fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(&id)
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
pub(crate) fn composers(entries: &[(SampleId, &str)]) -> StaticCatalog {
    StaticCatalog::from_samples(entries.iter().map(|(id, composer)| Sample {
        id: *id,
        title: String::new(),
        composer: composer.to_string(),
        uri: format!("asset:///samples/{id}.mp3"),
        artwork: composer.to_lowercase(),
    }))
    .unwrap()
}
