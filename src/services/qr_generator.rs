use chrono::{DateTime, Utc};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::services::signature;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("JSON serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Payload structure embedded in certificate QR codes.
///
/// The signature covers the canonical JSON form with the `signature` field
/// absent; the rendered QR carries the payload with the signature included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificatePayload {
    /// Credential ID
    pub credential_id: String,

    /// Certified batch facts
    pub batch: BatchInfo,

    /// Owning exporter
    pub exporter: ExporterInfo,

    /// Issuing QA agency
    pub issuer: IssuerInfo,

    /// Grade assigned at review
    pub quality_grade: String,

    /// Issuance time
    pub issued_at: DateTime<Utc>,

    /// HMAC signature of the payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    pub id: String,
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterInfo {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerInfo {
    pub id: String,
    pub agency_name: String,
}

impl CertificatePayload {
    /// Creates an unsigned payload from certificate components
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credential_id: Uuid,
        batch_id: Uuid,
        product_type: String,
        quantity: String,
        origin_location: String,
        destination: String,
        exporter_id: Uuid,
        exporter_name: String,
        issuer_id: Uuid,
        issuer_name: String,
        quality_grade: String,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            credential_id: credential_id.to_string(),
            batch: BatchInfo {
                id: batch_id.to_string(),
                product_type,
                quantity,
                origin_location,
                destination,
            },
            exporter: ExporterInfo {
                id: exporter_id.to_string(),
                full_name: exporter_name,
            },
            issuer: IssuerInfo {
                id: issuer_id.to_string(),
                agency_name: issuer_name,
            },
            quality_grade,
            issued_at,
            signature: None,
        }
    }

    /// Serializes the canonical (signature-free) form used for signing
    pub fn to_signing_string(&self) -> Result<String, QrGenerationError> {
        let mut canonical = self.clone();
        canonical.signature = None;
        Ok(serde_json::to_string(&canonical)?)
    }

    /// Signs the canonical payload and returns the hex signature
    pub fn sign(&self, signing_key: &[u8]) -> Result<String, QrGenerationError> {
        let canonical = self.to_signing_string()?;
        Ok(signature::sign(&canonical, signing_key))
    }

    /// Checks an embedded or detached signature against the canonical payload
    pub fn verify_signature(&self, sig: &str, signing_key: &[u8]) -> bool {
        match self.to_signing_string() {
            Ok(canonical) => signature::verify(&canonical, sig, signing_key),
            Err(_) => false,
        }
    }

    /// Converts the signed payload to a JSONB value for database storage
    pub fn to_jsonb(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Generates a QR code SVG from a signed payload
pub fn generate_qr_svg(
    payload: &CertificatePayload,
    signature: &str,
) -> Result<String, QrGenerationError> {
    let json_str = render_payload_json(payload, signature)?;

    let code = QrCode::new(json_str.as_bytes())?;

    let svg = code.render::<svg::Color>().min_dimensions(200, 200).build();

    Ok(svg)
}

/// Generates a QR code PNG from a signed payload
pub fn generate_qr_png(
    payload: &CertificatePayload,
    signature: &str,
) -> Result<Vec<u8>, QrGenerationError> {
    use image::{ImageBuffer, Luma};

    let json_str = render_payload_json(payload, signature)?;

    let code = QrCode::new(json_str.as_bytes())?;

    // Each module is 10x10 pixels
    let module_size = 10u32;
    let width = code.width() as u32;
    let img_size = width * module_size;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, color) in img.enumerate_pixels_mut() {
        let module_x = x / module_size;
        let module_y = y / module_size;
        let module_color = code[(module_x as usize, module_y as usize)];
        let pixel_value = match module_color {
            qrcode::types::Color::Dark => Luma([0u8]),
            qrcode::types::Color::Light => Luma([255u8]),
        };
        *color = pixel_value;
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut png_data),
            image::ImageFormat::Png,
        )
        .map_err(|_| QrGenerationError::QrCodeError(qrcode::types::QrError::DataTooLong))?;

    Ok(png_data)
}

fn render_payload_json(
    payload: &CertificatePayload,
    signature: &str,
) -> Result<String, QrGenerationError> {
    let mut final_payload = payload.clone();
    final_payload.signature = Some(signature.to_string());
    Ok(serde_json::to_string(&final_payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_payload() -> CertificatePayload {
        CertificatePayload::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Rice".to_string(),
            "10kg".to_string(),
            "Punjab, India".to_string(),
            "Rotterdam, Netherlands".to_string(),
            Uuid::new_v4(),
            "Rajesh Kumar".to_string(),
            Uuid::new_v4(),
            "Indian Agricultural Quality Authority".to_string(),
            "Excellent".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_payload_creation() {
        let payload = test_payload();

        assert_eq!(payload.batch.product_type, "Rice");
        assert_eq!(payload.exporter.full_name, "Rajesh Kumar");
        assert!(payload.signature.is_none());
    }

    #[test]
    fn test_payload_signing() {
        let payload = test_payload();

        let key = b"test-signing-key";
        let signature = payload.sign(key).unwrap();

        assert!(!signature.is_empty());
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(payload.verify_signature(&signature, key));
    }

    #[test]
    fn test_embedded_signature_covers_canonical_form() {
        let mut payload = test_payload();

        let key = b"test-signing-key";
        let signature = payload.sign(key).unwrap();

        // Embedding the signature must not change what gets verified
        payload.signature = Some(signature.clone());
        assert!(payload.verify_signature(&signature, key));
        assert!(!payload.verify_signature(&signature, b"other-key"));
    }

    #[test]
    fn test_qr_svg_generation() {
        let payload = test_payload();

        let key = b"test-signing-key";
        let signature = payload.sign(key).unwrap();
        let svg = generate_qr_svg(&payload, &signature);

        assert!(svg.is_ok());
        let svg_str = svg.unwrap();
        assert!(svg_str.contains("<svg"));
        assert!(svg_str.contains("</svg>"));
    }

    #[test]
    fn test_rendered_qr_json_carries_signature() {
        let payload = test_payload();

        let key = b"test-signing-key";
        let signature = payload.sign(key).unwrap();
        let json = render_payload_json(&payload, &signature).unwrap();

        let parsed: CertificatePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.signature.as_deref(), Some(signature.as_str()));
    }
}
