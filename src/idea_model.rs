//! Data model for planted ideas.
//!
//! An [`Idea`] is the only record the garden persists. Its JSON field names
//! (`flowerType`, `flowerImage`, `isNew`) are the ones written into the
//! storage slot, so existing saves stay readable.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::app_response::AppResponse;

/// Visual style of a planted flower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowerType {
    Sunflower,
    Tulip,
    Rose,
    Daisy,
    Custom,
}

impl FlowerType {
    /// Styles the bloom form picks from. `Custom` is only ever set by a caller.
    pub const STOCK: [FlowerType; 4] = [
        FlowerType::Sunflower,
        FlowerType::Tulip,
        FlowerType::Rose,
        FlowerType::Daisy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowerType::Sunflower => "sunflower",
            FlowerType::Tulip => "tulip",
            FlowerType::Rose => "rose",
            FlowerType::Daisy => "daisy",
            FlowerType::Custom => "custom",
        }
    }

    /// Parses a tag from a host request. Unlike [`FlowerType::from_tag`],
    /// unknown tags are rejected.
    pub fn parse_strict(tag: &str) -> Result<Self, AppResponse> {
        match tag {
            "sunflower" | "tulip" | "rose" | "daisy" | "custom" => Ok(FlowerType::from_tag(tag)),
            _ => Err(AppResponse::ValidationError(format!("Unknown flowerType '{tag}'"))),
        }
    }

    /// Parses a persisted tag. Unknown tags fall back to `Sunflower`, which is
    /// also the asset hosts draw for anything they do not recognise.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "sunflower" => FlowerType::Sunflower,
            "tulip" => FlowerType::Tulip,
            "rose" => FlowerType::Rose,
            "daisy" => FlowerType::Daisy,
            "custom" => FlowerType::Custom,
            _ => FlowerType::Sunflower,
        }
    }
}

impl Display for FlowerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FlowerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FlowerType::from_tag(&tag))
    }
}

/// One planted idea as stored in the garden slot.
///
/// `x`, `y` and `scale` are fixed at creation. `is_new` is the only field that
/// ever changes, and it is forced back to `false` whenever the garden is
/// reloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Creation date, already formatted for display.
    pub date: String,
    /// Horizontal placement, percent of the garden width.
    pub x: f64,
    /// Vertical placement, percent of the garden height.
    pub y: f64,
    pub flower_type: FlowerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flower_image: Option<String>,
    pub scale: f64,
    #[serde(default)]
    pub is_new: bool,
}

/// What the presentation layer supplies when planting an idea.
///
/// Identity, date, placement and scale are filled in by the store. Host JSON
/// goes through [`IdeaCandidate::from_json`], which is strict about
/// `flowerType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaCandidate {
    pub title: String,
    pub description: String,
    pub flower_type: FlowerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flower_image: Option<String>,
}

/// Wire shape of a candidate before its flower tag is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateRequest {
    title: String,
    description: String,
    flower_type: String,
    #[serde(default)]
    flower_image: Option<String>,
}

impl IdeaCandidate {
    /// Parses a host request. Malformed JSON is a `SerializationError`; an
    /// unknown `flowerType` is a `ValidationError`.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let request: CandidateRequest = serde_json::from_str(json)?;
        Ok(Self {
            title: request.title,
            description: request.description,
            flower_type: FlowerType::parse_strict(&request.flower_type)?,
            flower_image: request.flower_image,
        })
    }

    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        flower_type: FlowerType,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            flower_type,
            flower_image: None,
        }
    }

    /// A candidate drawn with a caller supplied image (URL or data URI).
    pub fn custom(
        title: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            flower_type: FlowerType::Custom,
            flower_image: Some(image.into()),
        }
    }

    /// Both text fields must carry something other than whitespace.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}
