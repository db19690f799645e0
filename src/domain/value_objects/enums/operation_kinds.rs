use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Closed set of image transformations the dispatcher accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Grayscale,
    Sepia,
    Crop,
    Resize,
    Rotate,
    Blur,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            OperationKind::Grayscale => "grayscale",
            OperationKind::Sepia => "sepia",
            OperationKind::Crop => "crop",
            OperationKind::Resize => "resize",
            OperationKind::Rotate => "rotate",
            OperationKind::Blur => "blur",
        };
        write!(f, "{}", kind)
    }
}

impl OperationKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "grayscale" => Some(OperationKind::Grayscale),
            "sepia" => Some(OperationKind::Sepia),
            "crop" => Some(OperationKind::Crop),
            "resize" => Some(OperationKind::Resize),
            "rotate" => Some(OperationKind::Rotate),
            "blur" => Some(OperationKind::Blur),
            _ => None,
        }
    }
}
