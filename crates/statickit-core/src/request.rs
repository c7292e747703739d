use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use super::error::EditorError;
use super::presets::preset;
use super::presets::PresetId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeLabel(pub String);

impl SizeLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SizeLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn dimensions_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,5})\s*[xX×]\s*(\d{1,5})\s*$").expect("dimensions pattern is valid")
    })
}

impl FromStr for Dimensions {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidRequest(format!("invalid dimensions: {s:?}"));
        let captures = dimensions_pattern().captures(s).ok_or_else(invalid)?;
        let width: u32 = captures[1].parse().map_err(|_| invalid())?;
        let height: u32 = captures[2].parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        Self::Square,
        Self::Portrait4x5,
        Self::Portrait3x4,
        Self::Portrait9x16,
        Self::Landscape4x3,
        Self::Landscape16x9,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait4x5 => "4:5",
            Self::Portrait3x4 => "3:4",
            Self::Portrait9x16 => "9:16",
            Self::Landscape4x3 => "4:3",
            Self::Landscape16x9 => "16:9",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| EditorError::InvalidRequest(format!("unsupported aspect ratio: {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageModel {
    #[default]
    #[serde(rename = "gemini-2.5-flash-image")]
    GeminiFlashImage,
    #[serde(rename = "gemini-3-pro-image-preview")]
    GeminiProImage,
}

impl ImageModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeminiFlashImage => "gemini-2.5-flash-image",
            Self::GeminiProImage => "gemini-3-pro-image-preview",
        }
    }
}

impl FromStr for ImageModel {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gemini-2.5-flash-image" | "flash" => Ok(Self::GeminiFlashImage),
            "gemini-3-pro-image-preview" | "pro" => Ok(Self::GeminiProImage),
            other => Err(EditorError::InvalidRequest(format!(
                "unsupported model: {other:?}"
            ))),
        }
    }
}

/// What part of the image an edit may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    Full,
    BackgroundOnly,
    ModelOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub aspect_ratio: Option<AspectRatio>,
    pub model: ImageModel,
}

/// Which request produced a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Edit,
    Preset,
    Background,
    Model,
}

impl GenerationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Preset => "preset",
            Self::Background => "background",
            Self::Model => "model",
        }
    }
}

/// A user request against a branch. Everything except `Resize` derives a
/// new version from `source_index`; `Resize` derives a variant from the
/// branch cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Edit {
        source_index: usize,
        instruction: String,
    },
    PresetApply {
        source_index: usize,
        preset: PresetId,
    },
    BackgroundChange {
        source_index: usize,
        background: String,
    },
    ModelChange {
        source_index: usize,
        model: String,
    },
    Resize {
        label: SizeLabel,
        dims: Dimensions,
    },
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Edit { .. } => "edit",
            Self::PresetApply { .. } => "preset",
            Self::BackgroundChange { .. } => "background",
            Self::ModelChange { .. } => "model",
            Self::Resize { .. } => "resize",
        }
    }

    /// `None` for `Resize`, which produces a variant rather than a version.
    pub fn generation_kind(&self) -> Option<GenerationKind> {
        match self {
            Self::Edit { .. } => Some(GenerationKind::Edit),
            Self::PresetApply { .. } => Some(GenerationKind::Preset),
            Self::BackgroundChange { .. } => Some(GenerationKind::Background),
            Self::ModelChange { .. } => Some(GenerationKind::Model),
            Self::Resize { .. } => None,
        }
    }

    pub fn source_index(&self) -> Option<usize> {
        match self {
            Self::Edit { source_index, .. }
            | Self::PresetApply { source_index, .. }
            | Self::BackgroundChange { source_index, .. }
            | Self::ModelChange { source_index, .. } => Some(*source_index),
            Self::Resize { .. } => None,
        }
    }

    pub fn scope(&self) -> EditScope {
        match self {
            Self::BackgroundChange { .. } => EditScope::BackgroundOnly,
            Self::ModelChange { .. } => EditScope::ModelOnly,
            Self::Edit { .. } | Self::PresetApply { .. } | Self::Resize { .. } => EditScope::Full,
        }
    }

    /// The instruction sent to the generation service and recorded as the
    /// node prompt. `Resize` carries none.
    pub fn instruction(&self) -> Result<String, EditorError> {
        match self {
            Self::Edit { instruction, .. } => {
                let trimmed = instruction.trim();
                if trimmed.is_empty() {
                    return Err(EditorError::InvalidRequest(
                        "edit instruction is empty".to_string(),
                    ));
                }
                Ok(trimmed.to_string())
            }
            Self::PresetApply { preset: id, .. } => Ok(preset(*id).prompt.to_string()),
            Self::BackgroundChange { background, .. } => {
                let background = non_empty(background, "background description")?;
                Ok(format!(
                    "Replace only the background with {background}. Keep the subject and framing unchanged."
                ))
            }
            Self::ModelChange { model, .. } => {
                let model = non_empty(model, "model description")?;
                Ok(format!(
                    "Replace the person in the image with {model}. Keep the product, pose and composition unchanged."
                ))
            }
            Self::Resize { .. } => Err(EditorError::InvalidRequest(
                "resize requests carry no instruction".to_string(),
            )),
        }
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, EditorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EditorError::InvalidRequest(format!("{what} is empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dimensions_parse_common_spellings() {
        assert_eq!("1080x1920".parse::<Dimensions>().expect("parse"), Dimensions::new(1080, 1920));
        assert_eq!(" 1200 X 628 ".parse::<Dimensions>().expect("parse"), Dimensions::new(1200, 628));
        assert_eq!("800×800".parse::<Dimensions>().expect("parse"), Dimensions::new(800, 800));
    }

    #[test]
    fn dimensions_reject_garbage_and_zero() {
        assert!("1080".parse::<Dimensions>().is_err());
        assert!("0x100".parse::<Dimensions>().is_err());
        assert!("axb".parse::<Dimensions>().is_err());
    }

    #[test]
    fn scope_follows_request_kind() {
        let background = RequestKind::BackgroundChange {
            source_index: 0,
            background: "a beach at dusk".to_string(),
        };
        let model = RequestKind::ModelChange {
            source_index: 0,
            model: "an older man".to_string(),
        };
        assert_eq!(background.scope(), EditScope::BackgroundOnly);
        assert_eq!(model.scope(), EditScope::ModelOnly);
        assert!(background
            .instruction()
            .expect("instruction")
            .contains("a beach at dusk"));
    }

    #[test]
    fn empty_edit_instruction_is_rejected() {
        let kind = RequestKind::Edit {
            source_index: 0,
            instruction: "   ".to_string(),
        };
        assert_eq!(kind.instruction().expect_err("empty").code(), "invalid-request");
    }

    #[test]
    fn aspect_ratio_round_trips_through_labels() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>().expect("parse"), ratio);
        }
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait9x16).expect("json"),
            "\"9:16\""
        );
    }

    #[test]
    fn model_accepts_short_names() {
        assert_eq!("pro".parse::<ImageModel>().expect("parse"), ImageModel::GeminiProImage);
        assert_eq!(ImageModel::default().as_str(), "gemini-2.5-flash-image");
    }
}
