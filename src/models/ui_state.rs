use base64::Engine;
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default upper bound for an uploaded file (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Limits applied when validating an incoming state patch.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_upload_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Per-user workflow state for the upload → preview → generate → download flow.
///
/// Every field is optional; `None` means the step that produces it has not
/// run yet. A `UiState` doubles as a patch: [`UiState::merge`] only overwrites
/// the fields the patch actually carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[garde(context(UploadLimits))]
pub struct UiState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(dive)]
    pub uploaded_file: Option<UploadedFile>,

    /// URL or encoded image of the intermediate scene preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 16777216))]
    pub scene_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub map_data: Option<MapData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 2048))]
    pub generated_image_url: Option<String>,
}

/// Metadata and contents of the image the user uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[garde(context(UploadLimits))]
pub struct UploadedFile {
    #[garde(length(min = 1, max = 255))]
    pub name: String,

    #[garde(custom(image_mime_type))]
    pub mime_type: String,

    #[garde(custom(within_upload_limit))]
    pub size_bytes: u64,

    /// Base64-encoded file contents.
    #[garde(custom(base64_image))]
    pub data: String,
}

/// Location picked on the map step. Both values are owned by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub position: serde_json::Value,
    pub marker: serde_json::Value,
}

/// A single `UiState` field together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum UiStateField {
    UploadedFile(UploadedFile),
    SceneImage(String),
    MapData(MapData),
    GeneratedImageUrl(String),
}

/// Field names as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase")]
pub enum UiStateKey {
    UploadedFile,
    SceneImage,
    MapData,
    GeneratedImageUrl,
}

#[derive(Debug, thiserror::Error)]
pub enum StateValidationError {
    #[error("Invalid state: {0}")]
    Invalid(#[from] garde::Report),

    #[error("Uploaded file data is {actual} bytes but sizeBytes declares {declared}")]
    SizeMismatch { declared: u64, actual: usize },

    #[error("Invalid value for {key}: {source}")]
    Value {
        key: UiStateKey,
        source: serde_json::Error,
    },
}

impl UiState {
    /// Overlay `patch` onto `self`, keeping every field the patch leaves unset.
    pub fn merge(self, patch: UiState) -> UiState {
        UiState {
            uploaded_file: patch.uploaded_file.or(self.uploaded_file),
            scene_image: patch.scene_image.or(self.scene_image),
            map_data: patch.map_data.or(self.map_data),
            generated_image_url: patch.generated_image_url.or(self.generated_image_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded_file.is_none()
            && self.scene_image.is_none()
            && self.map_data.is_none()
            && self.generated_image_url.is_none()
    }

    /// Field rules plus the cross-field check that `sizeBytes` matches the payload.
    pub fn validate_patch(&self, limits: &UploadLimits) -> Result<(), StateValidationError> {
        self.validate_with(limits)?;
        if let Some(file) = &self.uploaded_file {
            file.check_declared_size()?;
        }
        Ok(())
    }
}

impl UploadedFile {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }

    fn check_declared_size(&self) -> Result<(), StateValidationError> {
        // `data` already passed the base64 rule, so a decode failure here is unreachable in practice.
        let actual = self.decode().map(|bytes| bytes.len()).unwrap_or(0);
        if actual as u64 != self.size_bytes {
            return Err(StateValidationError::SizeMismatch {
                declared: self.size_bytes,
                actual,
            });
        }
        Ok(())
    }
}

impl UiStateKey {
    /// Deserialize a raw JSON value into the field this key names.
    pub fn with_value(self, value: serde_json::Value) -> Result<UiStateField, StateValidationError> {
        let wrap = |source| StateValidationError::Value { key: self, source };
        Ok(match self {
            UiStateKey::UploadedFile => {
                UiStateField::UploadedFile(serde_json::from_value(value).map_err(wrap)?)
            }
            UiStateKey::SceneImage => {
                UiStateField::SceneImage(serde_json::from_value(value).map_err(wrap)?)
            }
            UiStateKey::MapData => UiStateField::MapData(serde_json::from_value(value).map_err(wrap)?),
            UiStateKey::GeneratedImageUrl => {
                UiStateField::GeneratedImageUrl(serde_json::from_value(value).map_err(wrap)?)
            }
        })
    }
}

impl UiStateField {
    pub fn key(&self) -> UiStateKey {
        match self {
            UiStateField::UploadedFile(_) => UiStateKey::UploadedFile,
            UiStateField::SceneImage(_) => UiStateKey::SceneImage,
            UiStateField::MapData(_) => UiStateKey::MapData,
            UiStateField::GeneratedImageUrl(_) => UiStateKey::GeneratedImageUrl,
        }
    }
}

impl From<UiStateField> for UiState {
    fn from(field: UiStateField) -> Self {
        let mut state = UiState::default();
        match field {
            UiStateField::UploadedFile(file) => state.uploaded_file = Some(file),
            UiStateField::SceneImage(image) => state.scene_image = Some(image),
            UiStateField::MapData(map) => state.map_data = Some(map),
            UiStateField::GeneratedImageUrl(url) => state.generated_image_url = Some(url),
        }
        state
    }
}

fn image_mime_type(value: &str, _ctx: &UploadLimits) -> garde::Result {
    match value.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => Ok(()),
        _ => Err(garde::Error::new(format!("unsupported MIME type: {value}"))),
    }
}

fn within_upload_limit(value: &u64, ctx: &UploadLimits) -> garde::Result {
    if *value > ctx.max_upload_bytes {
        return Err(garde::Error::new(format!(
            "file is {value} bytes, limit is {}",
            ctx.max_upload_bytes
        )));
    }
    Ok(())
}

fn base64_image(value: &str, _ctx: &UploadLimits) -> garde::Result {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|_| garde::Error::new("data is not valid base64"))?;
    image::guess_format(&bytes).map_err(|_| garde::Error::new("data is not a supported image"))?;
    Ok(())
}
