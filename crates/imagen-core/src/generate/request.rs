//! Text-to-image request model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GenerateError;

/// Output aspect ratios supported by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    /// The `W:H` form used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| {
                let supported: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
                GenerateError::InvalidRequest(format!(
                    "unsupported aspect_ratio '{}'; expected one of {}",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

/// A single text-to-image request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    /// A request with default options for `prompt`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            seed: None,
            aspect_ratio: AspectRatio::default(),
        }
    }

    /// Reject requests the model would refuse anyway.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("prompt is required".to_string()));
        }
        Ok(())
    }
}
