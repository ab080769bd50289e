//! Built-in sample machines, embedded at compile time and parsed once on first use.

use crate::definition::MachineDefinition;
use crate::loader::{DefinitionLoader, Format};
use crate::machine::Machine;
use crate::types::MachineError;
use tracing::warn;

// Embedded samples as (name, format, source).
const SAMPLE_TEXTS: [(&str, Format, &str); 4] = [
    ("mod2", Format::Yaml, include_str!("../machines/mod2.yaml")),
    (
        "traffic-light",
        Format::Yaml,
        include_str!("../machines/traffic-light.yaml"),
    ),
    (
        "add-markers",
        Format::Yaml,
        include_str!("../machines/add-markers.yaml"),
    ),
    (
        "wildcard-rewrite",
        Format::Text,
        include_str!("../machines/wildcard-rewrite.tm"),
    ),
];

lazy_static::lazy_static! {
    pub static ref SAMPLES: Vec<Sample> = load_samples();
}

/// A named, parsed sample definition.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
    pub definition: MachineDefinition,
}

impl Sample {
    pub fn build(&self) -> Result<Machine, MachineError> {
        self.definition.build()
    }
}

fn load_samples() -> Vec<Sample> {
    SAMPLE_TEXTS
        .iter()
        .filter_map(|&(name, format, source)| {
            match DefinitionLoader::load_definition_from_string(source, format) {
                Ok(definition) => Some(Sample {
                    name,
                    source,
                    definition,
                }),
                Err(e) => {
                    warn!(sample = name, error = %e, "skipping sample");
                    None
                }
            }
        })
        .collect()
}

pub struct Catalog;

impl Catalog {
    /// List all sample names
    pub fn list_names() -> Vec<&'static str> {
        SAMPLES.iter().map(|sample| sample.name).collect()
    }

    /// Get a sample by its name
    pub fn get(name: &str) -> Result<&'static Sample, MachineError> {
        SAMPLES
            .iter()
            .find(|sample| sample.name == name)
            .ok_or_else(|| MachineError::ValidationError(format!("Sample '{}' not found", name)))
    }
}
