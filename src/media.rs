use base64::Engine;

use crate::gemini::GatewayError;

/// Base64 payload + mime type, shaped for a Gemini `inlineData` part.
/// Produced fresh per request; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    pub data: String,
    pub mime_type: String,
}

/// Encode a product image for inline transport. The declared content type
/// from the upload wins when present; otherwise the mime type is sniffed
/// from magic bytes. Empty input or an unresolvable mime type is an
/// `Encoding` failure.
pub fn encode_image(bytes: &[u8], declared_mime: Option<&str>) -> Result<EncodedMedia, GatewayError> {
    if bytes.is_empty() {
        return Err(GatewayError::Encoding("image upload was empty".into()));
    }
    let mime_type = declared_mime
        .filter(|m| m.starts_with("image/"))
        .map(str::to_string)
        .or_else(|| sniff_mime(bytes).map(str::to_string))
        .ok_or_else(|| GatewayError::Encoding("could not determine image mime type".into()))?;
    Ok(EncodedMedia {
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
        mime_type,
    })
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
