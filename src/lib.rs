use serde::{Deserialize, Serialize};
use std::fmt;

pub mod benches;
pub mod corpus;
pub mod harness;
pub mod hashing;
pub mod orchestrator;
pub mod schema;
pub mod suite;

/// Perceptual hash algorithm measured by the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmLabel {
    /// Average (mean) hash.
    Ahash,
    /// DCT-based perceptual hash.
    Phash,
    /// Difference (gradient) hash.
    Dhash,
    /// Haar wavelet hash.
    Whash,
}

impl AlgorithmLabel {
    /// In-process emission order.
    pub const ALL: [AlgorithmLabel; 4] = [
        AlgorithmLabel::Ahash,
        AlgorithmLabel::Phash,
        AlgorithmLabel::Dhash,
        AlgorithmLabel::Whash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmLabel::Ahash => "ahash",
            AlgorithmLabel::Phash => "phash",
            AlgorithmLabel::Dhash => "dhash",
            AlgorithmLabel::Whash => "whash",
        }
    }
}

impl fmt::Display for AlgorithmLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
