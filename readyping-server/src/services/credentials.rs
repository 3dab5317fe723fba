//! OTP login, registration and profile

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Account, ProfileUpdate, RegisterRequest, Role, UserResponse};
use shared::util::{now_millis, phone_suffix, prefixed_id};

use crate::auth::{CurrentUser, STAFF_ROLES};
use crate::db::StoreError;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::phone;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone_number: Option<String>,
    pub restaurant_name: Option<String>,
    /// `customer` (default) or any restaurant-side type
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: &'static str,
    pub phone_number: String,
    /// Only echoed when `EXPOSE_OTP` is on; there is no real delivery channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub demo: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone_number: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: UserResponse,
}

/// Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalized_phone(state: &AppState, raw: &str) -> Result<String, AppError> {
    if !phone::has_digits(raw) {
        return Err(AppError::validation("Invalid phone number."));
    }
    Ok(state.notifier.normalize(raw))
}

fn issue_token(state: &AppState, user: &CurrentUser) -> Result<String, AppError> {
    state.jwt.generate_token(user).map_err(|e| {
        tracing::error!(error = %e, "Token generation failed");
        AppError::internal("Failed to issue session token.")
    })
}

fn principal_for(account: &Account) -> CurrentUser {
    CurrentUser {
        id: account.id.clone(),
        phone_number: account.phone_number.clone(),
        role: account.role,
        name: None,
        restaurant_id: account.id.clone(),
    }
}

/// Store a fresh code for the phone number
pub fn send_otp(state: &AppState, req: SendOtpRequest) -> ServiceResult<SendOtpResponse> {
    let raw = required(req.phone_number).ok_or_else(|| AppError::required("Phone number is required."))?;
    let phone_number = normalized_phone(state, &raw)?;

    let role = match req.user_type.as_deref() {
        None | Some("customer") => Role::Customer,
        Some(_) => Role::Owner,
    };
    let code = state
        .otp
        .issue(&phone_number, required(req.restaurant_name), role);

    tracing::info!(phone = %phone_number, role = %role, "OTP issued");
    if state.config.expose_otp {
        tracing::debug!(phone = %phone_number, otp = %code, "OTP echoed to caller");
    }

    Ok(SendOtpResponse {
        message: "OTP sent successfully.",
        phone_number,
        otp: state.config.expose_otp.then_some(code),
        demo: state.config.expose_otp,
    })
}

/// Consume the code and open a session
///
/// Customers get an ephemeral principal. Restaurant-side logins are bound to
/// the account with that phone number, created on first login.
pub async fn verify_otp(state: &AppState, req: VerifyOtpRequest) -> ServiceResult<SessionResponse> {
    let (Some(raw), Some(code)) = (required(req.phone_number), required(req.otp)) else {
        return Err(AppError::required("Phone number and OTP are required.").into());
    };
    let phone_number = normalized_phone(state, &raw)?;

    let record = state.otp.verify(&phone_number, &code).inspect_err(|_| {
        crate::security_log!("WARN", "otp_rejected", phone = phone_number.as_str());
    })?;

    let (principal, user) = if record.role == Role::Customer {
        let id = prefixed_id("cust");
        let name = format!("Customer {}", phone_suffix(&phone_number));
        let principal = CurrentUser {
            id: id.clone(),
            phone_number: phone_number.clone(),
            role: Role::Customer,
            name: Some(name.clone()),
            restaurant_id: id.clone(),
        };
        let user = UserResponse {
            id,
            name: Some(name),
            restaurant_name: None,
            phone_number,
            email: None,
            role: Role::Customer,
            settings: None,
            last_login: Some(now_millis()),
        };
        (principal, user)
    } else {
        let account = login_account(state, &phone_number, record.restaurant_name).await?;
        (principal_for(&account), UserResponse::from(&account))
    };

    let token = issue_token(state, &principal)?;
    tracing::info!(user_id = %principal.id, role = %principal.role, "Login successful");

    Ok(SessionResponse {
        message: "Login successful.",
        token,
        user,
    })
}

async fn login_account(
    state: &AppState,
    phone_number: &str,
    restaurant_name: Option<String>,
) -> ServiceResult<Account> {
    let now = now_millis();
    if let Some(mut account) = state.accounts.find_by_phone(phone_number).await? {
        if !account.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled).into());
        }
        account.last_login = Some(now);
        account.updated_at = now;
        state.accounts.update(&account).await?;
        return Ok(account);
    }

    let name =
        restaurant_name.unwrap_or_else(|| format!("Restaurant {}", phone_suffix(phone_number)));
    let account = Account::new(
        prefixed_id("acc"),
        name,
        phone_number.to_string(),
        Role::Owner,
        now,
    );
    match state.accounts.insert(account).await {
        Ok(account) => {
            tracing::info!(account_id = %account.id, "Account created on first login");
            Ok(account)
        }
        // Lost a race with a concurrent first login
        Err(StoreError::Conflict(_)) => state
            .accounts
            .find_by_phone(phone_number)
            .await?
            .ok_or_else(|| AppError::internal("Account vanished after conflict").into()),
        Err(e) => Err(e.into()),
    }
}

/// Create a persisted owner account
pub async fn register(state: &AppState, req: RegisterRequest) -> ServiceResult<SessionResponse> {
    let (Some(restaurant_name), Some(raw_phone)) =
        (required(req.restaurant_name), required(req.phone_number))
    else {
        return Err(AppError::required("Restaurant name and phone number are required.").into());
    };
    let phone_number = normalized_phone(state, &raw_phone)?;

    if state.accounts.find_by_phone(&phone_number).await?.is_some() {
        return Err(AppError::new(ErrorCode::PhoneNumberExists).into());
    }

    let mut account = Account::new(
        prefixed_id("acc"),
        restaurant_name,
        phone_number,
        Role::Owner,
        now_millis(),
    );
    account.email = required(req.email).map(|e| e.to_lowercase());
    if let Some(password) = required(req.password) {
        account.password_hash = Some(hash_password(&password)?);
    }

    let account = state.accounts.insert(account).await.map_err(|e| match e {
        StoreError::Conflict(_) => ServiceError::App(AppError::new(ErrorCode::PhoneNumberExists)),
        other => other.into(),
    })?;

    let token = issue_token(state, &principal_for(&account))?;
    tracing::info!(account_id = %account.id, "Restaurant registered");

    Ok(SessionResponse {
        message: "Registration successful.",
        token,
        user: UserResponse::from(&account),
    })
}

/// Stored account when there is one, otherwise the token principal
pub async fn profile(state: &AppState, user: &CurrentUser) -> ServiceResult<ProfileResponse> {
    let view = if user.has_role(STAFF_ROLES) {
        match state.accounts.find_by_id(&user.restaurant_id).await? {
            Some(account) => UserResponse::from(&account),
            None => principal_view(user),
        }
    } else {
        principal_view(user)
    };
    Ok(ProfileResponse {
        message: None,
        user: view,
    })
}

fn principal_view(user: &CurrentUser) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        name: user.name.clone(),
        restaurant_name: None,
        phone_number: user.phone_number.clone(),
        email: None,
        role: user.role,
        settings: None,
        last_login: None,
    }
}

pub async fn update_profile(
    state: &AppState,
    user: &CurrentUser,
    update: ProfileUpdate,
) -> ServiceResult<ProfileResponse> {
    user.require_role(STAFF_ROLES)?;
    let mut account = state
        .accounts
        .find_by_id(&user.restaurant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    account.apply_profile(update, now_millis());
    state.accounts.update(&account).await?;
    tracing::info!(account_id = %account.id, "Profile updated");

    Ok(ProfileResponse {
        message: Some("Profile updated successfully."),
        user: UserResponse::from(&account),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::Notifier;

    fn state() -> AppState {
        let config = Config::for_tests();
        let notifier = Notifier::from_config(&config);
        AppState::in_memory(config, notifier)
    }

    fn otp_for(state: &AppState, phone: &str, user_type: Option<&str>) -> String {
        send_otp(
            state,
            SendOtpRequest {
                phone_number: Some(phone.into()),
                restaurant_name: Some("Cafe Uno".into()),
                user_type: user_type.map(Into::into),
            },
        )
        .unwrap()
        .otp
        .unwrap()
    }

    #[test]
    fn password_hash_is_phc() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn owner_login_creates_account_once() {
        let state = state();
        let code = otp_for(&state, "555-123-4567", Some("restaurant"));
        let first = verify_otp(
            &state,
            VerifyOtpRequest {
                phone_number: Some("5551234567".into()),
                otp: Some(code),
            },
        )
        .await
        .unwrap();
        assert_eq!(first.user.role, Role::Owner);
        assert_eq!(first.user.restaurant_name.as_deref(), Some("Cafe Uno"));

        let code = otp_for(&state, "+15551234567", Some("restaurant"));
        let second = verify_otp(
            &state,
            VerifyOtpRequest {
                phone_number: Some("+15551234567".into()),
                otp: Some(code),
            },
        )
        .await
        .unwrap();
        assert_eq!(first.user.id, second.user.id);
    }

    #[tokio::test]
    async fn customer_login_is_ephemeral() {
        let state = state();
        let code = otp_for(&state, "+15551234567", None);
        let session = verify_otp(
            &state,
            VerifyOtpRequest {
                phone_number: Some("+15551234567".into()),
                otp: Some(code),
            },
        )
        .await
        .unwrap();
        assert_eq!(session.user.role, Role::Customer);
        assert_eq!(session.user.name.as_deref(), Some("Customer 4567"));
        assert!(
            state
                .accounts
                .find_by_phone("+15551234567")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_register_rejected() {
        let state = state();
        let req = RegisterRequest {
            restaurant_name: Some("Cafe".into()),
            phone_number: Some("5551234567".into()),
            email: Some("Owner@Cafe.com".into()),
            password: Some("hunter22".into()),
        };
        let created = register(&state, req.clone()).await.unwrap();
        assert_eq!(created.user.email.as_deref(), Some("owner@cafe.com"));

        let err: AppError = register(&state, req).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::PhoneNumberExists);
        assert_eq!(err.http_status().as_u16(), 400);
    }

    #[test]
    fn send_otp_requires_phone() {
        let state = state();
        let err: AppError = send_otp(&state, SendOtpRequest::default()).unwrap_err().into();
        assert_eq!(err.message, "Phone number is required.");
    }
}
