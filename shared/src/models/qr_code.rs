//! QR Code Model

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default message shown next to a printed code
pub const DEFAULT_QR_MESSAGE: &str =
    "Scan to receive WhatsApp notifications when your food is ready!";

/// Code length
pub const CODE_LENGTH: usize = 8;

/// Code alphabet (uppercase alphanumeric)
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Per-code opt-in behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrSettings {
    pub auto_opt_in: bool,
    pub require_confirmation: bool,
    /// Text shown next to the printed code
    #[serde(rename = "message", alias = "customMessage")]
    pub custom_message: String,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            auto_opt_in: true,
            require_confirmation: false,
            custom_message: DEFAULT_QR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrSettingsPatch {
    pub auto_opt_in: Option<bool>,
    pub require_confirmation: Option<bool>,
    #[serde(rename = "message", alias = "customMessage")]
    pub custom_message: Option<String>,
}

impl QrSettings {
    pub fn merge(&mut self, patch: QrSettingsPatch) {
        if let Some(v) = patch.auto_opt_in {
            self.auto_opt_in = v;
        }
        if let Some(v) = patch.require_confirmation {
            self.require_confirmation = v;
        }
        if let Some(v) = patch.custom_message {
            self.custom_message = v;
        }
    }
}

/// QR code record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: String,
    /// Unique 8-character code
    pub code: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Opt-in URL the printed image points to
    pub url: String,
    pub is_active: bool,
    pub scan_count: i64,
    pub opt_in_count: i64,
    pub settings: QrSettings,
    pub last_scanned: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl QrCode {
    pub fn record_scan(&mut self, now: i64) {
        self.scan_count += 1;
        self.last_scanned = Some(now);
        self.updated_at = now;
    }

    pub fn record_opt_in(&mut self, now: i64) {
        self.opt_in_count += 1;
        self.updated_at = now;
    }

    pub fn apply_update(&mut self, update: QrCodeUpdate, now: i64) {
        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        if let Some(patch) = update.settings {
            self.settings.merge(patch);
        }
        self.updated_at = now;
    }
}

/// Opt-in URL for a code
pub fn opt_in_url(frontend_url: &str, code: &str, restaurant_id: &str) -> String {
    format!(
        "{}/optin?code={code}&restaurant={restaurant_id}",
        frontend_url.trim_end_matches('/')
    )
}

/// Create QR code payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<QrSettingsPatch>,
}

impl QrCodeCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(AppError::required("QR code name is required."));
        }
        Ok(())
    }
}

/// Update QR code payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub settings: Option<QrSettingsPatch>,
}

/// What an anonymous scanner gets to see
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPublicView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub restaurant_name: String,
    pub settings: QrSettings,
}

/// Opt-in payload posted from the scan page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInRequest {
    pub phone_number: Option<String>,
    pub customer_name: Option<String>,
}
