//! QR code registry: issuing, scanning, opt-in and image rendering

use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CODE_ALPHABET, CODE_LENGTH, OptInRequest, QrCode, QrCodeCreate, QrCodeUpdate, QrPublicView,
    QrSettings, opt_in_url,
};
use shared::util::{now_millis, prefixed_id, random_code};

use crate::auth::CurrentUser;
use crate::db::QrCodeStore;
use crate::error::ServiceResult;
use crate::notify::phone;
use crate::state::AppState;

const DEFAULT_IMAGE_SIZE: u32 = 200;
const MIN_IMAGE_SIZE: u32 = 100;
const MAX_IMAGE_SIZE: u32 = 1000;
/// Entries in `recentScans`
const RECENT_SCANS: usize = 5;

fn unavailable() -> AppError {
    AppError::with_message(ErrorCode::QrCodeNotFound, "QR code not found or inactive.")
}

fn not_owned() -> AppError {
    AppError::new(ErrorCode::QrCodeNotFound)
}

/// Draw codes until one is unused
pub async fn generate_unique_code(store: &dyn QrCodeStore) -> ServiceResult<String> {
    loop {
        let code = random_code(CODE_ALPHABET, CODE_LENGTH);
        if !store.code_exists(&code).await? {
            return Ok(code);
        }
        tracing::debug!(code = %code, "QR code collision, drawing again");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrTotals {
    pub total_codes: u64,
    pub active_codes: u64,
    pub total_scans: i64,
    pub total_opt_ins: i64,
}

pub fn totals(codes: &[QrCode]) -> QrTotals {
    codes.iter().fold(QrTotals::default(), |mut acc, qr| {
        acc.total_codes += 1;
        acc.active_codes += u64::from(qr.is_active);
        acc.total_scans += qr.scan_count;
        acc.total_opt_ins += qr.opt_in_count;
        acc
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentScan {
    pub id: String,
    pub name: String,
    pub scan_count: i64,
    pub last_scanned: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrOverview {
    pub stats: QrTotals,
    pub recent_scans: Vec<RecentScan>,
}

pub async fn list(state: &AppState, user: &CurrentUser) -> ServiceResult<Vec<QrCode>> {
    Ok(state.qr_codes.list(&user.restaurant_id).await?)
}

pub async fn overview(state: &AppState, user: &CurrentUser) -> ServiceResult<QrOverview> {
    let codes = state.qr_codes.list(&user.restaurant_id).await?;
    let mut scanned: Vec<&QrCode> = codes.iter().filter(|qr| qr.last_scanned.is_some()).collect();
    scanned.sort_by(|a, b| b.last_scanned.cmp(&a.last_scanned));

    Ok(QrOverview {
        stats: totals(&codes),
        recent_scans: scanned
            .into_iter()
            .take(RECENT_SCANS)
            .map(|qr| RecentScan {
                id: qr.id.clone(),
                name: qr.name.clone(),
                scan_count: qr.scan_count,
                last_scanned: qr.last_scanned,
            })
            .collect(),
    })
}

pub async fn create(state: &AppState, user: &CurrentUser, payload: QrCodeCreate) -> ServiceResult<QrCode> {
    payload.validate()?;
    let code = generate_unique_code(state.qr_codes.as_ref()).await?;
    let now = now_millis();

    let mut settings = QrSettings::default();
    if let Some(patch) = payload.settings {
        settings.merge(patch);
    }

    let qr = QrCode {
        id: prefixed_id("qr"),
        url: opt_in_url(&state.config.frontend_url, &code, &user.restaurant_id),
        code,
        restaurant_id: user.restaurant_id.clone(),
        name: payload.name.unwrap_or_default().trim().to_string(),
        description: payload.description.filter(|d| !d.trim().is_empty()),
        is_active: true,
        scan_count: 0,
        opt_in_count: 0,
        settings,
        last_scanned: None,
        created_at: now,
        updated_at: now,
    };
    let qr = state.qr_codes.insert(qr).await?;
    tracing::info!(code = %qr.code, restaurant_id = %qr.restaurant_id, "QR code created");
    Ok(qr)
}

pub async fn update(
    state: &AppState,
    user: &CurrentUser,
    key: &str,
    payload: QrCodeUpdate,
) -> ServiceResult<QrCode> {
    let mut qr = state
        .qr_codes
        .find_owned(&user.restaurant_id, key)
        .await?
        .ok_or_else(not_owned)?;
    qr.apply_update(payload, now_millis());
    state.qr_codes.update(&qr).await?;
    tracing::info!(code = %qr.code, active = qr.is_active, "QR code updated");
    Ok(qr)
}

pub async fn delete(state: &AppState, user: &CurrentUser, key: &str) -> ServiceResult<()> {
    if !state.qr_codes.delete(&user.restaurant_id, key).await? {
        return Err(not_owned().into());
    }
    tracing::info!(key = %key, restaurant_id = %user.restaurant_id, "QR code deleted");
    Ok(())
}

async fn active(state: &AppState, code: &str) -> ServiceResult<QrCode> {
    Ok(state
        .qr_codes
        .find_by_code(code)
        .await?
        .filter(|qr| qr.is_active)
        .ok_or_else(unavailable)?)
}

async fn restaurant_name(state: &AppState, restaurant_id: &str) -> ServiceResult<String> {
    Ok(state
        .accounts
        .find_by_id(restaurant_id)
        .await?
        .map(|account| account.restaurant_name)
        .unwrap_or_else(|| "Restaurant".to_string()))
}

/// Public lookup; counts as a scan
pub async fn scan(state: &AppState, code: &str) -> ServiceResult<QrPublicView> {
    let mut qr = active(state, code).await?;
    qr.record_scan(now_millis());
    state.qr_codes.update(&qr).await?;
    tracing::debug!(code = %qr.code, scans = qr.scan_count, "QR code scanned");

    Ok(QrPublicView {
        restaurant_name: restaurant_name(state, &qr.restaurant_id).await?,
        id: qr.id,
        name: qr.name,
        description: qr.description,
        settings: qr.settings,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInResponse {
    pub message: &'static str,
    pub phone_number: String,
    pub restaurant_name: String,
    pub custom_message: String,
}

/// Register a customer phone against an active code
pub async fn opt_in(state: &AppState, code: &str, req: OptInRequest) -> ServiceResult<OptInResponse> {
    let raw = req
        .phone_number
        .filter(|p| phone::has_digits(p))
        .ok_or_else(|| AppError::required("Phone number is required."))?;

    let mut qr = active(state, code).await?;
    qr.record_opt_in(now_millis());
    state.qr_codes.update(&qr).await?;

    let phone_number = state.notifier.normalize(&raw);
    tracing::info!(
        code = %qr.code,
        phone = %phone_number,
        customer = req.customer_name.as_deref().unwrap_or("-"),
        "Customer opted in"
    );

    Ok(OptInResponse {
        message: "Opt-in successful.",
        phone_number,
        restaurant_name: restaurant_name(state, &qr.restaurant_id).await?,
        custom_message: qr.settings.custom_message,
    })
}

// ==================== Image rendering ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl FromStr for ImageFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(AppError::validation(format!("Unsupported image format: {other}"))),
        }
    }
}

/// `?size=&format=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    pub size: Option<u32>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrImage {
    /// `data:<mime>;base64,...`
    pub image: String,
    pub url: String,
}

pub async fn image(state: &AppState, code: &str, query: ImageQuery) -> ServiceResult<QrImage> {
    let format = match query.format.as_deref() {
        None | Some("") => ImageFormat::default(),
        Some(f) => f.parse()?,
    };
    let size = query
        .size
        .unwrap_or(DEFAULT_IMAGE_SIZE)
        .clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);

    let qr = active(state, code).await?;
    let image = render_data_url(&qr.url, size, format)?;
    Ok(QrImage { image, url: qr.url })
}

/// Render `data` as a base64 data URL at least `size` pixels wide
pub fn render_data_url(data: &str, size: u32, format: ImageFormat) -> Result<String, AppError> {
    let code = qrcode::QrCode::new(data.as_bytes()).map_err(render_failed)?;
    match format {
        ImageFormat::Png => {
            let img = code
                .render::<image::Luma<u8>>()
                .quiet_zone(true)
                .min_dimensions(size, size)
                .build();
            let mut buffer = Vec::new();
            {
                let mut cursor = Cursor::new(&mut buffer);
                let encoder = image::codecs::png::PngEncoder::new(&mut cursor);
                img.write_with_encoder(encoder).map_err(render_failed)?;
            }
            Ok(format!("data:image/png;base64,{}", BASE64.encode(&buffer)))
        }
        ImageFormat::Svg => {
            let svg = code
                .render::<qrcode::render::svg::Color<'_>>()
                .quiet_zone(true)
                .min_dimensions(size, size)
                .dark_color(qrcode::render::svg::Color("#000000"))
                .light_color(qrcode::render::svg::Color("#ffffff"))
                .build();
            Ok(format!("data:image/svg+xml;base64,{}", BASE64.encode(svg.as_bytes())))
        }
    }
}

fn render_failed(e: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %e, "QR render failed");
    AppError::new(ErrorCode::QrRenderFailed)
}
