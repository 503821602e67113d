use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Supported ontology embedding algorithms
///
/// The lowercase name doubles as the directory under the ontology namespace
/// that holds the trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Owl2Vec,
    Rdf2Vec,
    Onto2Vec,
    Opa2Vec,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Owl2Vec,
        Algorithm::Rdf2Vec,
        Algorithm::Onto2Vec,
        Algorithm::Opa2Vec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owl2Vec => "owl2vec",
            Self::Rdf2Vec => "rdf2vec",
            Self::Onto2Vec => "onto2vec",
            Self::Opa2Vec => "opa2vec",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Owl2Vec => "OWL2Vec*",
            Self::Rdf2Vec => "RDF2Vec",
            Self::Onto2Vec => "Onto2Vec",
            Self::Opa2Vec => "OPA2Vec",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('*').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == normalized)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}
