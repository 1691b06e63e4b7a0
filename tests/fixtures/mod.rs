//! Sample workflow states used across tests

#![allow(dead_code)]

use autoshot_core::models::ui_state::{MapData, UiState, UploadedFile};
use base64::Engine;
use serde_json::json;

/// PNG signature plus the start of an IHDR chunk; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

pub fn png_upload(name: &str) -> UploadedFile {
    UploadedFile {
        name: name.to_string(),
        mime_type: "image/png".to_string(),
        size_bytes: PNG_BYTES.len() as u64,
        data: base64::engine::general_purpose::STANDARD.encode(PNG_BYTES),
    }
}

pub fn uploaded(name: &str) -> UiState {
    UiState {
        uploaded_file: Some(png_upload(name)),
        ..Default::default()
    }
}

pub fn scene(image: &str) -> UiState {
    UiState {
        scene_image: Some(image.to_string()),
        ..Default::default()
    }
}

pub fn located(lat: f64, lng: f64) -> UiState {
    UiState {
        map_data: Some(MapData {
            position: json!({"lat": lat, "lng": lng}),
            marker: json!({"label": "shoot location"}),
        }),
        ..Default::default()
    }
}

/// A PNG upload padded to `len` bytes.
pub fn large_png_upload(name: &str, len: usize) -> UploadedFile {
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(len.max(PNG_BYTES.len()), 0);
    UploadedFile {
        name: name.to_string(),
        mime_type: "image/png".to_string(),
        size_bytes: bytes.len() as u64,
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    }
}
