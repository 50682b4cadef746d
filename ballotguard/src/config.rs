use crate::*;
use std::collections::BTreeSet;

/// A candidate standing in the election
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: i32,
    pub full_name: String,
}

impl Candidate {
    pub fn new(id: i32, full_name: impl Into<String>) -> Self {
        Candidate {
            id,
            full_name: full_name.into(),
        }
    }
}

/// Election configuration
///
/// ```json
/// {
///   "candidates": [
///     { "id": 1, "full_name": "Ishaan Allison" },
///     { "id": 2, "full_name": "Oliver Mendez" }
///   ]
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ElectionConfig {
    pub candidates: Vec<Candidate>,
}

impl ElectionConfig {
    pub fn new(candidates: Vec<Candidate>) -> Result<Self> {
        let config = ElectionConfig { candidates };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ElectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: ElectionConfig = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Make sure candidate ids are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for candidate in &self.candidates {
            if !seen.insert(candidate.id) {
                return Err(Error::DuplicateCandidate(candidate.id));
            }
        }
        Ok(())
    }

    pub fn get_candidate(&self, id: i32) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }
}
