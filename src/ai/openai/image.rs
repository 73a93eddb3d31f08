//! Image generation request building and response decoding.

use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::models::ImageRequest;
use crate::{ErrorKind, GatewayError, Result};
use base64::Engine as _;
use serde_json::Value;

pub const IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

pub fn build_request(request: &ImageRequest) -> Result<ImageGenerationRequest> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(GatewayError::invalid_request("Missing prompt."));
    }

    let size = request
        .size
        .as_deref()
        .map(str::trim)
        .filter(|size| !size.is_empty())
        .unwrap_or(DEFAULT_IMAGE_SIZE);

    Ok(ImageGenerationRequest {
        model: IMAGE_MODEL.to_string(),
        prompt: prompt.to_string(),
        size: size.to_string(),
    })
}

/// Turn an image envelope into a `data:` URL for the first returned image.
pub fn data_url(envelope: &Value) -> Result<String> {
    let b64 = serde_json::from_value::<ImageGenerationResponse>(envelope.clone())
        .unwrap_or_default()
        .data
        .into_iter()
        .next()
        .and_then(|image| image.b64_json)
        .filter(|b64| !b64.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::new(ErrorKind::EmptyUpstreamOutput, "No image returned.")
                .with_details(envelope.to_string())
        })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| {
            tracing::error!("Failed to decode base64 image: {}", e);
            GatewayError::new(
                ErrorKind::UpstreamMalformed,
                "Upstream returned an undecodable image.",
            )
            .with_details(e.to_string())
        })?;

    Ok(format!("data:{};base64,{}", sniff_mime(&bytes), b64.trim()))
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}
