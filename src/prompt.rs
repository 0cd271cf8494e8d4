//! Prompt payload construction for the generation backend.
//!
//! Pure: a payload is a function of the request, the fetched images, and the
//! target dimensions. No concurrency concerns.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::fetch::FetchedImage;
use crate::orchestrator::request::{GenerationRequest, ProductReference, SurfaceType};

/// One image attachment for the backend call
#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    /// Base64 encoded image data
    pub data: String,
    pub mime: String,
}

impl ImagePayload {
    fn from_image(image: &FetchedImage) -> Self {
        Self {
            data: STANDARD.encode(&image.bytes),
            mime: image.mime.clone(),
        }
    }
}

/// Complete payload for one backend call: prompt text, the room photo plus
/// one swatch per product reference (two or three images), target dimensions
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub text: String,
    pub images: Vec<ImagePayload>,
    pub width: u32,
    pub height: u32,
}

pub fn build_payload(
    request: &GenerationRequest,
    dimensions: (u32, u32),
    room: &FetchedImage,
    swatches: &[FetchedImage],
) -> PromptPayload {
    let mut images = Vec::with_capacity(1 + swatches.len());
    images.push(ImagePayload::from_image(room));
    for swatch in swatches {
        images.push(ImagePayload::from_image(swatch));
    }

    PromptPayload {
        text: prompt_text(request),
        images,
        width: dimensions.0,
        height: dimensions.1,
    }
}

fn prompt_text(request: &GenerationRequest) -> String {
    let pattern = request.pattern.as_deref().unwrap_or("standard");
    let first = product_phrase(request.products.first());

    match request.surface {
        SurfaceType::Floor => format!(
            "Photorealistic edit of the supplied room photo: replace the floor with {first}, \
             laid out in a {pattern} pattern. Keep the original lighting and perspective."
        ),
        SurfaceType::Wall => format!(
            "Photorealistic edit of the supplied room photo: cover the walls with {first}. \
             Keep the original lighting and perspective."
        ),
        SurfaceType::Both => {
            let second = product_phrase(request.products.get(1));
            format!(
                "Photorealistic edit of the supplied room photo: replace the floor with {first}, \
                 laid out in a {pattern} pattern, and cover the walls with {second}. \
                 Keep the original lighting and perspective."
            )
        }
    }
}

fn product_phrase(product: Option<&ProductReference>) -> String {
    match product {
        Some(product) => match &product.descriptor {
            Some(descriptor) => format!("{} ({})", product.name, descriptor),
            None => product.name.clone(),
        },
        None => "the selected material".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::request::ImageSource;
    use uuid::Uuid;

    fn fetched(mime: &str) -> FetchedImage {
        FetchedImage {
            bytes: vec![1, 2, 3],
            mime: mime.to_string(),
        }
    }

    fn request(surface: SurfaceType, names: &[&str]) -> GenerationRequest {
        GenerationRequest {
            id: Uuid::new_v4(),
            source_image: ImageSource::from("https://example.com/room.png".to_string()),
            products: names
                .iter()
                .map(|name| ProductReference {
                    name: name.to_string(),
                    swatch: ImageSource::from(format!("https://example.com/{name}.png")),
                    descriptor: Some("matte".to_string()),
                })
                .collect(),
            surface,
            pattern: Some("herringbone".to_string()),
        }
    }

    #[test]
    fn floor_payload_has_room_and_one_swatch() {
        let req = request(SurfaceType::Floor, &["Oak Classic"]);
        let payload = build_payload(&req, (800, 600), &fetched("image/png"), &[fetched("image/jpeg")]);

        assert_eq!(payload.images.len(), 2);
        assert_eq!(payload.width, 800);
        assert_eq!(payload.height, 600);
        assert!(payload.text.contains("Oak Classic"));
        assert!(payload.text.contains("herringbone"));
        assert!(payload.text.contains("floor"));
    }

    #[test]
    fn both_payload_has_three_images_and_both_products() {
        let req = request(SurfaceType::Both, &["Oak Classic", "Linen White"]);
        let payload = build_payload(
            &req,
            (640, 480),
            &fetched("image/png"),
            &[fetched("image/png"), fetched("image/png")],
        );

        assert_eq!(payload.images.len(), 3);
        assert!(payload.text.contains("Oak Classic"));
        assert!(payload.text.contains("Linen White"));
        assert!(payload.text.contains("walls"));
    }

    #[test]
    fn wall_prompt_omits_pattern() {
        let req = request(SurfaceType::Wall, &["Linen White"]);
        let payload = build_payload(&req, (640, 480), &fetched("image/png"), &[fetched("image/png")]);
        assert!(!payload.text.contains("herringbone"));
    }

    #[test]
    fn image_payloads_are_base64() {
        let payload = build_payload(
            &request(SurfaceType::Floor, &["Oak"]),
            (10, 10),
            &fetched("image/png"),
            &[fetched("image/png")],
        );
        assert_eq!(payload.images[0].data, STANDARD.encode([1u8, 2, 3]));
        assert_eq!(payload.images[0].mime, "image/png");
    }
}
