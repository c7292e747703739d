use serde::Deserialize;
use serde::Serialize;

use super::request::Dimensions;
use super::request::SizeLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetId {
    StudioLighting,
    ProductShot,
    Cinematic,
    Vintage,
    BlackAndWhite,
    Watercolor,
    WhiteBackground,
    Enhance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub id: PresetId,
    pub slug: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub static PRESETS: [Preset; 8] = [
    Preset {
        id: PresetId::StudioLighting,
        slug: "studio-lighting",
        label: "Studio lighting",
        prompt: "Relight the subject with soft, even studio lighting and a subtle rim light.",
    },
    Preset {
        id: PresetId::ProductShot,
        slug: "product-shot",
        label: "Product shot",
        prompt: "Turn this into a clean commercial product photo on a seamless backdrop.",
    },
    Preset {
        id: PresetId::Cinematic,
        slug: "cinematic",
        label: "Cinematic",
        prompt: "Apply a cinematic color grade with teal shadows and warm highlights.",
    },
    Preset {
        id: PresetId::Vintage,
        slug: "vintage",
        label: "Vintage film",
        prompt: "Give the photo a faded vintage film look with grain and warm tones.",
    },
    Preset {
        id: PresetId::BlackAndWhite,
        slug: "black-and-white",
        label: "Black & white",
        prompt: "Convert to a high-contrast black and white photograph.",
    },
    Preset {
        id: PresetId::Watercolor,
        slug: "watercolor",
        label: "Watercolor",
        prompt: "Repaint the image as a loose watercolor illustration.",
    },
    Preset {
        id: PresetId::WhiteBackground,
        slug: "white-background",
        label: "White background",
        prompt: "Place the subject on a pure white background with a soft contact shadow.",
    },
    Preset {
        id: PresetId::Enhance,
        slug: "enhance",
        label: "Enhance",
        prompt: "Enhance sharpness, clarity and dynamic range without changing the content.",
    },
];

pub fn preset(id: PresetId) -> &'static Preset {
    match id {
        PresetId::StudioLighting => &PRESETS[0],
        PresetId::ProductShot => &PRESETS[1],
        PresetId::Cinematic => &PRESETS[2],
        PresetId::Vintage => &PRESETS[3],
        PresetId::BlackAndWhite => &PRESETS[4],
        PresetId::Watercolor => &PRESETS[5],
        PresetId::WhiteBackground => &PRESETS[6],
        PresetId::Enhance => &PRESETS[7],
    }
}

pub fn preset_by_slug(slug: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.slug == slug)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTarget {
    pub slug: &'static str,
    pub label: &'static str,
    pub dims: Dimensions,
}

impl SizeTarget {
    pub fn size_label(&self) -> SizeLabel {
        SizeLabel(self.slug.to_string())
    }
}

pub static SIZE_TARGETS: [SizeTarget; 7] = [
    SizeTarget {
        slug: "instagram-square",
        label: "Instagram post",
        dims: Dimensions::new(1080, 1080),
    },
    SizeTarget {
        slug: "instagram-portrait",
        label: "Instagram portrait",
        dims: Dimensions::new(1080, 1350),
    },
    SizeTarget {
        slug: "instagram-story",
        label: "Instagram story",
        dims: Dimensions::new(1080, 1920),
    },
    SizeTarget {
        slug: "facebook-post",
        label: "Facebook post",
        dims: Dimensions::new(1200, 630),
    },
    SizeTarget {
        slug: "twitter-post",
        label: "X post",
        dims: Dimensions::new(1600, 900),
    },
    SizeTarget {
        slug: "linkedin-post",
        label: "LinkedIn post",
        dims: Dimensions::new(1200, 627),
    },
    SizeTarget {
        slug: "youtube-thumbnail",
        label: "YouTube thumbnail",
        dims: Dimensions::new(1280, 720),
    },
];

pub fn size_target(slug: &str) -> Option<&'static SizeTarget> {
    SIZE_TARGETS.iter().find(|target| target.slug == slug)
}
