use std::collections::HashMap;

use crate::domain::{
    errors::{CoreError, CoreResult},
    value_objects::{enums::operation_kinds::OperationKind, images::ImageDimensions},
};

/// Raw parameter map as submitted by the caller, before any typing.
pub type RawParams = HashMap<String, String>;

/// Typed parameter set per operation kind. Produced by [`validate`] at the
/// boundary so everything downstream works on a fixed record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationParams {
    Grayscale,
    Sepia,
    Crop { x: i32, y: i32, width: i32, height: i32 },
    Resize { width: Option<i32>, height: Option<i32> },
    Rotate { angle: i32 },
    Blur { radius: i32 },
}

impl OperationParams {
    /// Flattens the params into query pairs for the engine wire call.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            OperationParams::Grayscale | OperationParams::Sepia => Vec::new(),
            OperationParams::Crop { x, y, width, height } => vec![
                ("x", x.to_string()),
                ("y", y.to_string()),
                ("width", width.to_string()),
                ("height", height.to_string()),
            ],
            OperationParams::Resize { width, height } => {
                let mut pairs = Vec::new();
                if let Some(width) = width {
                    pairs.push(("width", width.to_string()));
                }
                if let Some(height) = height {
                    pairs.push(("height", height.to_string()));
                }
                pairs
            }
            OperationParams::Rotate { angle } => vec![("angle", angle.to_string())],
            OperationParams::Blur { radius } => vec![("blur_radius", radius.to_string())],
        }
    }
}

/// Validates and types the raw parameter map for one operation kind.
///
/// Unknown extra parameters are ignored for forward compatibility. Known
/// numeric parameters that fail to parse are a `Validation` error naming the
/// field, never a silent default. `source` carries the natural dimensions of
/// the image being transformed; it is only consulted for aspect-locked
/// resizes with a single dimension.
pub fn validate(
    kind: OperationKind,
    raw: &RawParams,
    source: Option<ImageDimensions>,
) -> CoreResult<OperationParams> {
    match kind {
        OperationKind::Grayscale => Ok(OperationParams::Grayscale),
        OperationKind::Sepia => Ok(OperationParams::Sepia),
        OperationKind::Crop => {
            let x = required_int(raw, "x")?;
            let y = required_int(raw, "y")?;
            let width = required_int(raw, "width")?;
            let height = required_int(raw, "height")?;
            if x < 0 || y < 0 {
                return Err(CoreError::Validation(
                    "crop offsets `x` and `y` must be non-negative".to_string(),
                ));
            }
            if width <= 0 || height <= 0 {
                return Err(CoreError::Validation(
                    "crop `width` and `height` must be positive".to_string(),
                ));
            }
            Ok(OperationParams::Crop { x, y, width, height })
        }
        OperationKind::Resize => {
            let mut width = optional_int(raw, "width")?;
            let mut height = optional_int(raw, "height")?;
            if width.is_none() && height.is_none() {
                return Err(CoreError::Validation(
                    "resize requires at least one of `width` or `height`".to_string(),
                ));
            }
            for (field, value) in [("width", width), ("height", height)] {
                if let Some(value) = value {
                    if value <= 0 {
                        return Err(CoreError::Validation(format!(
                            "resize `{}` must be positive",
                            field
                        )));
                    }
                }
            }

            let aspect_lock = optional_flag(raw, "aspect_lock")?.unwrap_or(false);
            if aspect_lock && (width.is_none() || height.is_none()) {
                let dims = source.ok_or_else(|| {
                    CoreError::Validation(
                        "aspect lock requires the source image dimensions".to_string(),
                    )
                })?;
                if dims.width == 0 || dims.height == 0 {
                    return Err(CoreError::Validation(
                        "source image has degenerate dimensions".to_string(),
                    ));
                }
                match (width, height) {
                    (Some(given), None) => {
                        height = Some(derive_dimension(given, dims.height, dims.width)?);
                    }
                    (None, Some(given)) => {
                        width = Some(derive_dimension(given, dims.width, dims.height)?);
                    }
                    _ => {}
                }
            }

            Ok(OperationParams::Resize { width, height })
        }
        OperationKind::Rotate => {
            // Any integer angle; the engine normalizes mod 360.
            let angle = required_int(raw, "angle")?;
            Ok(OperationParams::Rotate { angle })
        }
        OperationKind::Blur => {
            let radius = required_int(raw, "blur_radius")?;
            if radius <= 0 {
                return Err(CoreError::Validation(
                    "blur `blur_radius` must be positive".to_string(),
                ));
            }
            Ok(OperationParams::Blur { radius })
        }
    }
}

fn derive_dimension(given: i32, numerator: u32, denominator: u32) -> CoreResult<i32> {
    let derived = (f64::from(given) * f64::from(numerator) / f64::from(denominator)).round() as i32;
    if derived <= 0 {
        return Err(CoreError::Validation(
            "aspect-locked resize derived a degenerate dimension".to_string(),
        ));
    }
    Ok(derived)
}

fn required_int(raw: &RawParams, field: &str) -> CoreResult<i32> {
    match raw.get(field) {
        None => Err(CoreError::Validation(format!(
            "missing required parameter `{}`",
            field
        ))),
        Some(value) => parse_int(field, value),
    }
}

fn optional_int(raw: &RawParams, field: &str) -> CoreResult<Option<i32>> {
    raw.get(field)
        .map(|value| parse_int(field, value))
        .transpose()
}

fn parse_int(field: &str, value: &str) -> CoreResult<i32> {
    value.trim().parse::<i32>().map_err(|_| {
        CoreError::Validation(format!("parameter `{}` must be an integer", field))
    })
}

fn optional_flag(raw: &RawParams, field: &str) -> CoreResult<Option<bool>> {
    match raw.get(field).map(|value| value.trim()) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(_) => Err(CoreError::Validation(format!(
            "parameter `{}` must be a boolean flag",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn grayscale_accepts_empty_params() {
        let result = validate(OperationKind::Grayscale, &params(&[]), None).unwrap();
        assert_eq!(result, OperationParams::Grayscale);
    }

    #[test]
    fn crop_with_full_params_keeps_exact_values() {
        let raw = params(&[("x", "0"), ("y", "0"), ("width", "100"), ("height", "50")]);
        let result = validate(OperationKind::Crop, &raw, None).unwrap();
        assert_eq!(
            result,
            OperationParams::Crop {
                x: 0,
                y: 0,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn crop_missing_dimensions_is_a_validation_error() {
        let raw = params(&[("x", "0"), ("y", "0")]);
        let err = validate(OperationKind::Crop, &raw, None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("width")));
    }

    #[test]
    fn crop_rejects_negative_offsets() {
        let raw = params(&[("x", "-1"), ("y", "0"), ("width", "10"), ("height", "10")]);
        assert!(matches!(
            validate(OperationKind::Crop, &raw, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn resize_with_aspect_lock_derives_height_from_source_ratio() {
        let raw = params(&[("width", "800"), ("aspect_lock", "true")]);
        let source = ImageDimensions {
            width: 1920,
            height: 1080,
        };
        let result = validate(OperationKind::Resize, &raw, Some(source)).unwrap();
        assert_eq!(
            result,
            OperationParams::Resize {
                width: Some(800),
                height: Some(450)
            }
        );
    }

    #[test]
    fn resize_with_aspect_lock_derives_width_from_source_ratio() {
        let raw = params(&[("height", "450"), ("aspect_lock", "1")]);
        let source = ImageDimensions {
            width: 1920,
            height: 1080,
        };
        let result = validate(OperationKind::Resize, &raw, Some(source)).unwrap();
        assert_eq!(
            result,
            OperationParams::Resize {
                width: Some(800),
                height: Some(450)
            }
        );
    }

    #[test]
    fn resize_without_any_dimension_is_rejected() {
        let err = validate(OperationKind::Resize, &params(&[]), None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn resize_single_dimension_without_aspect_lock_stays_partial() {
        let raw = params(&[("width", "640")]);
        let result = validate(OperationKind::Resize, &raw, None).unwrap();
        assert_eq!(
            result,
            OperationParams::Resize {
                width: Some(640),
                height: None
            }
        );
    }

    #[test]
    fn resize_rejects_non_positive_dimensions() {
        let raw = params(&[("width", "0")]);
        assert!(matches!(
            validate(OperationKind::Resize, &raw, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rotate_accepts_any_integer_angle() {
        let raw = params(&[("angle", "-450")]);
        let result = validate(OperationKind::Rotate, &raw, None).unwrap();
        assert_eq!(result, OperationParams::Rotate { angle: -450 });
    }

    #[test]
    fn rotate_requires_the_angle() {
        let err = validate(OperationKind::Rotate, &params(&[]), None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("angle")));
    }

    #[test]
    fn blur_rejects_zero_radius() {
        let raw = params(&[("blur_radius", "0")]);
        assert!(matches!(
            validate(OperationKind::Blur, &raw, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn non_integer_values_never_fall_back_to_defaults() {
        let raw = params(&[("blur_radius", "soft")]);
        let err = validate(OperationKind::Blur, &raw, None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("blur_radius")));
    }

    #[test]
    fn unknown_extra_parameters_are_ignored() {
        let raw = params(&[("angle", "90"), ("intensity", "high")]);
        let result = validate(OperationKind::Rotate, &raw, None).unwrap();
        assert_eq!(result, OperationParams::Rotate { angle: 90 });
    }
}
