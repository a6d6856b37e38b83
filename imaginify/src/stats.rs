//! Usage stats shown next to a transformed image.

use std::fmt::{Display, Formatter};

/// Quality gain reported for the restore transformation.
pub const RESTORE_QUALITY_IMPROVEMENT_PERCENT: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformationKind {
    Restore,
    RemoveBackground,
    Fill,
    Remove,
    Recolor,
}

impl TransformationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::RemoveBackground => "removeBackground",
            Self::Fill => "fill",
            Self::Remove => "remove",
            Self::Recolor => "recolor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "restore" => Some(Self::Restore),
            "removeBackground" => Some(Self::RemoveBackground),
            "fill" => Some(Self::Fill),
            "remove" => Some(Self::Remove),
            "recolor" => Some(Self::Recolor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformationStats {
    pub original: Dimensions,
    pub enhanced: Dimensions,
    pub quality_improvement_percent: u8,
    pub pixels_enhanced: u64,
}

impl TransformationStats {
    /// Stats for a finished transformation, or `None` for kinds that do not
    /// report any.
    ///
    /// Each enhanced axis is the larger of the original and transformed
    /// value; a zero or missing transformed axis keeps the original.
    pub fn compute(
        kind: TransformationKind,
        original: Dimensions,
        transformed: Option<Dimensions>,
    ) -> Option<Self> {
        if kind != TransformationKind::Restore {
            return None;
        }

        let transformed = transformed.unwrap_or(original);
        let enhanced = Dimensions::new(
            enhanced_axis(original.width, transformed.width),
            enhanced_axis(original.height, transformed.height),
        );

        Some(Self {
            original,
            enhanced,
            quality_improvement_percent: RESTORE_QUALITY_IMPROVEMENT_PERCENT,
            pixels_enhanced: enhanced.area().saturating_sub(original.area()),
        })
    }
}

fn enhanced_axis(original: u32, transformed: u32) -> u32 {
    if transformed == 0 {
        original
    } else {
        original.max(transformed)
    }
}
