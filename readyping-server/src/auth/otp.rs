//! One-time codes, held only in process memory

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::error::AppError;
use shared::models::Role;
use std::sync::Arc;

/// Validity window
pub const OTP_TTL_MS: i64 = 5 * 60 * 1000;

/// Wrong guesses before the pending code is discarded
pub const MAX_OTP_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,
    pub expires_at: i64,
    /// Restaurant name given at request time
    pub restaurant_name: Option<String>,
    /// Principal role requested (`customer` or `owner`)
    pub role: Role,
    /// Wrong codes tried so far
    pub attempts: u32,
}

/// phone → pending code; a new request replaces the previous one
#[derive(Clone, Default)]
pub struct OtpStore {
    records: Arc<DashMap<String, OtpRecord>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, phone: &str, restaurant_name: Option<String>, role: Role) -> String {
        self.issue_at(phone, restaurant_name, role, shared::util::now_millis())
    }

    pub fn issue_at(
        &self,
        phone: &str,
        restaurant_name: Option<String>,
        role: Role,
        now: i64,
    ) -> String {
        let code = shared::util::numeric_code();
        self.records.insert(
            phone.to_string(),
            OtpRecord {
                code: code.clone(),
                expires_at: now + OTP_TTL_MS,
                restaurant_name,
                role,
                attempts: 0,
            },
        );
        code
    }

    pub fn verify(&self, phone: &str, code: &str) -> Result<OtpRecord, AppError> {
        self.verify_at(phone, code, shared::util::now_millis())
    }

    /// Consume the record on success. Expired records are dropped, and so is
    /// a record after `MAX_OTP_ATTEMPTS` wrong codes.
    pub fn verify_at(&self, phone: &str, code: &str, now: i64) -> Result<OtpRecord, AppError> {
        let Entry::Occupied(mut entry) = self.records.entry(phone.to_string()) else {
            return Err(AppError::invalid_credentials());
        };
        if now > entry.get().expires_at {
            entry.remove();
            return Err(AppError::invalid_credentials());
        }
        if entry.get().code == code {
            return Ok(entry.remove());
        }

        let attempts = {
            let record = entry.get_mut();
            record.attempts += 1;
            record.attempts
        };
        if attempts >= MAX_OTP_ATTEMPTS {
            entry.remove();
            crate::security_log!("WARN", "otp_locked", phone = phone, attempts = attempts);
        }
        Err(AppError::invalid_credentials())
    }

    /// Drop expired records
    pub fn sweep(&self, now: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at >= now);
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
