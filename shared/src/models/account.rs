//! Account Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default ready-notification template
pub const DEFAULT_NOTIFICATION_TEMPLATE: &str =
    "Your order #{orderId} is ready! Please collect it from the counter.";

/// Principal / account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    #[default]
    Staff,
    /// Ephemeral opt-in principal, never persisted as an account
    Customer,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "staff" => Ok(Role::Staff),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Per-account notification preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountSettings {
    pub auto_notifications: bool,
    pub notification_template: String,
    pub qr_code_enabled: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            auto_notifications: true,
            notification_template: DEFAULT_NOTIFICATION_TEMPLATE.to_string(),
            qr_code_enabled: true,
        }
    }
}

/// Partial settings update, merged over the stored settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettingsPatch {
    pub auto_notifications: Option<bool>,
    pub notification_template: Option<String>,
    pub qr_code_enabled: Option<bool>,
}

impl AccountSettings {
    pub fn merge(&mut self, patch: AccountSettingsPatch) {
        if let Some(v) = patch.auto_notifications {
            self.auto_notifications = v;
        }
        if let Some(v) = patch.notification_template {
            self.notification_template = v;
        }
        if let Some(v) = patch.qr_code_enabled {
            self.qr_code_enabled = v;
        }
    }
}

/// Restaurant account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub restaurant_name: String,
    /// Unique across accounts
    pub phone_number: String,
    pub email: Option<String>,
    /// Argon2 PHC string; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub whatsapp_enabled: bool,
    pub settings: AccountSettings,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn new(
        id: String,
        restaurant_name: String,
        phone_number: String,
        role: Role,
        now: i64,
    ) -> Self {
        Self {
            id,
            restaurant_name,
            phone_number,
            email: None,
            password_hash: None,
            role,
            is_active: true,
            whatsapp_enabled: true,
            settings: AccountSettings::default(),
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a ready transition should message the customer
    pub fn notifications_enabled(&self) -> bool {
        self.whatsapp_enabled && self.settings.auto_notifications
    }
}

/// Register payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub restaurant_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub restaurant_name: Option<String>,
    pub email: Option<String>,
    pub settings: Option<AccountSettingsPatch>,
}

impl Account {
    pub fn apply_profile(&mut self, update: ProfileUpdate, now: i64) {
        if let Some(name) = update.restaurant_name.filter(|n| !n.trim().is_empty()) {
            self.restaurant_name = name.trim().to_string();
        }
        if let Some(email) = update.email.filter(|e| !e.trim().is_empty()) {
            self.email = Some(email.trim().to_lowercase());
        }
        if let Some(patch) = update.settings {
            self.settings.merge(patch);
        }
        self.updated_at = now;
    }
}

/// Principal as returned to clients after login / registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub restaurant_name: Option<String>,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub settings: Option<AccountSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<i64>,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: None,
            restaurant_name: Some(account.restaurant_name.clone()),
            phone_number: account.phone_number.clone(),
            email: account.email.clone(),
            role: account.role,
            settings: Some(account.settings.clone()),
            last_login: account.last_login,
        }
    }
}
