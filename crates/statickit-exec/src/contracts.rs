//! JSON bodies exchanged with the image service.

use serde::Deserialize;
use serde::Serialize;
use statickit_core::AspectRatio;
use statickit_core::EditScope;
use statickit_core::GenerationKind;
use statickit_core::GenerationJob;
use statickit_core::ImageModel;
use statickit_core::ResizeJob;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Source image as an http(s) or `data:` URL.
    pub image: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    pub model: ImageModel,
    pub is_edit: bool,
    pub is_background_only: bool,
    pub is_model_only: bool,
}

impl GenerateRequest {
    pub fn from_job(job: &GenerationJob) -> Self {
        Self {
            image: job.source_image_url.clone(),
            prompt: job.instruction.clone(),
            aspect_ratio: job.options.aspect_ratio,
            model: job.options.model,
            is_edit: job.kind == GenerationKind::Edit,
            is_background_only: job.scope == EditScope::BackgroundOnly,
            is_model_only: job.scope == EditScope::ModelOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerateResponse {
    pub image: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzeResponse {
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeRequest {
    pub image: String,
    pub width: u32,
    pub height: u32,
}

impl ResizeRequest {
    pub fn from_job(job: &ResizeJob) -> Self {
        Self {
            image: job.source_image_url.clone(),
            width: job.dims.width,
            height: job.dims.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResizeResponse {
    pub image: Option<String>,
    pub error: Option<String>,
}
