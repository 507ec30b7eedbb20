//! Boundary to the breeding collaborator.
//!
//! At each generation boundary the population manager exports the breeding
//! pool as a [`BreedingRequest`] and expects a non-empty list of offspring
//! genomes back. Where the offspring come from is up to the implementation:
//! [`LocalBreeder`] breeds in-process, [`HttpBreeder`] asks a remote service.

mod http;
mod local;

pub use http::{parse_offspring, HttpBreeder, HttpBreederConfig};
pub use local::LocalBreeder;

use crate::config::SimulationConfig;
use crate::error::BreedingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shoal_data::Genome;

/// One breeding-pool member, best first.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParentRecord {
    pub genome: Genome,
}

/// One offspring returned by the collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OffspringRecord {
    pub genome: Genome,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreedingRequest {
    pub parents: Vec<ParentRecord>,
    pub target_population: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

impl BreedingRequest {
    #[must_use]
    pub fn new(parents: Vec<Genome>, simulation: &SimulationConfig) -> Self {
        Self {
            parents: parents
                .into_iter()
                .map(|genome| ParentRecord { genome })
                .collect(),
            target_population: simulation.population_size,
            mutation_rate: simulation.mutation_rate,
            crossover_rate: simulation.crossover_rate,
        }
    }
}

#[async_trait]
pub trait Breeder: Send + Sync {
    /// Offspring genomes for `request`. An `Ok` result is never empty.
    async fn breed(&self, request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = BreedingRequest::new(
            vec![Genome::new(0.1, 0.2, 0.3)],
            &SimulationConfig::default(),
        );
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["targetPopulation"], 10);
        assert_eq!(json["crossoverRate"], 0.7);
        assert_eq!(json["parents"][0]["genome"]["size"], 0.3);
    }
}
