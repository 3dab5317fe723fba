//! PostgreSQL store
//!
//! Line items, notification history, tags and settings are JSONB columns;
//! timestamps are epoch milliseconds (BIGINT).

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{
    Account, AccountSettings, NotificationRecord, Order, OrderItem, QrCode, QrSettings,
};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{
    AccountStore, OrderQuery, OrderStore, Page, QrCodeStore, StoreError, StoreResult,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run embedded migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;
        Ok(Self { pool })
    }
}

/// Map unique violations to `Conflict`
fn unique_violation(e: sqlx::Error, message: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => e.into(),
    }
}

/// Lowercase serde enums are stored as their JSON string form
fn enum_text<T: Serialize>(value: &T) -> StoreResult<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::Backend(
            format!("expected string enum, got {other}").into(),
        )),
    }
}

fn parse_enum<T: DeserializeOwned>(text: String) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(text))?)
}

// ── Accounts ──

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    restaurant_name: String,
    phone_number: String,
    email: Option<String>,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    whatsapp_enabled: bool,
    settings: Json<AccountSettings>,
    last_login: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> StoreResult<Self> {
        Ok(Account {
            id: row.id,
            restaurant_name: row.restaurant_name,
            phone_number: row.phone_number,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_enum(row.role)?,
            is_active: row.is_active,
            whatsapp_enabled: row.whatsapp_enabled,
            settings: row.settings.0,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, restaurant_name, phone_number, email, password_hash, role, \
     is_active, whatsapp_enabled, settings, last_login, created_at, updated_at";

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: Account) -> StoreResult<Account> {
        sqlx::query(
            "INSERT INTO accounts (id, restaurant_name, phone_number, email, password_hash, role, is_active, whatsapp_enabled, settings, last_login, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&account.id)
        .bind(&account.restaurant_name)
        .bind(&account.phone_number)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_active)
        .bind(account.whatsapp_enabled)
        .bind(Json(&account.settings))
        .bind(account.last_login)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "User with this phone number already exists."))?;
        Ok(account)
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            "UPDATE accounts SET restaurant_name = $2, email = $3, password_hash = $4, role = $5, is_active = $6, \
             whatsapp_enabled = $7, settings = $8, last_login = $9, updated_at = $10 WHERE id = $1",
        )
        .bind(&account.id)
        .bind(&account.restaurant_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_active)
        .bind(account.whatsapp_enabled)
        .bind(Json(&account.settings))
        .bind(account.last_login)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ── Orders ──

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_id: String,
    restaurant_id: String,
    customer_name: String,
    phone_number: String,
    status: String,
    items: Json<Vec<OrderItem>>,
    total_amount: f64,
    estimated_time: i32,
    ready_at: Option<i64>,
    completed_at: Option<i64>,
    notification_sent: bool,
    notification_history: Json<Vec<NotificationRecord>>,
    notes: Option<String>,
    priority: String,
    tags: Json<Vec<String>>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> StoreResult<Self> {
        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            restaurant_id: row.restaurant_id,
            customer_name: row.customer_name,
            phone_number: row.phone_number,
            status: parse_enum(row.status)?,
            items: row.items.0,
            total_amount: row.total_amount,
            estimated_time: u32::try_from(row.estimated_time).unwrap_or_default(),
            ready_at: row.ready_at,
            completed_at: row.completed_at,
            notification_sent: row.notification_sent,
            notification_history: row.notification_history.0,
            notes: row.notes,
            priority: parse_enum(row.priority)?,
            tags: row.tags.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_id, restaurant_id, customer_name, phone_number, status, items, \
     total_amount, estimated_time, ready_at, completed_at, notification_sent, notification_history, \
     notes, priority, tags, created_at, updated_at";

fn collect_orders(rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert(&self, order: Order) -> StoreResult<Order> {
        sqlx::query(
            "INSERT INTO orders (id, order_id, restaurant_id, customer_name, phone_number, status, items, total_amount, \
             estimated_time, ready_at, completed_at, notification_sent, notification_history, notes, priority, tags, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(&order.id)
        .bind(&order.order_id)
        .bind(&order.restaurant_id)
        .bind(&order.customer_name)
        .bind(&order.phone_number)
        .bind(order.status.as_str())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(i32::try_from(order.estimated_time).unwrap_or(i32::MAX))
        .bind(order.ready_at)
        .bind(order.completed_at)
        .bind(order.notification_sent)
        .bind(Json(&order.notification_history))
        .bind(&order.notes)
        .bind(enum_text(&order.priority)?)
        .bind(Json(&order.tags))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Order ID already exists."))?;
        Ok(order)
    }

    async fn get(&self, restaurant_id: &str, order_id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 AND order_id = $2"
        ))
        .bind(restaurant_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            "UPDATE orders SET customer_name = $2, phone_number = $3, status = $4, items = $5, total_amount = $6, \
             estimated_time = $7, ready_at = $8, completed_at = $9, notification_sent = $10, notification_history = $11, \
             notes = $12, priority = $13, tags = $14, updated_at = $15 WHERE id = $1",
        )
        .bind(&order.id)
        .bind(&order.customer_name)
        .bind(&order.phone_number)
        .bind(order.status.as_str())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(i32::try_from(order.estimated_time).unwrap_or(i32::MAX))
        .bind(order.ready_at)
        .bind(order.completed_at)
        .bind(order.notification_sent)
        .bind(Json(&order.notification_history))
        .bind(&order.notes)
        .bind(enum_text(&order.priority)?)
        .bind(Json(&order.tags))
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, restaurant_id: &str, order_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE restaurant_id = $1 AND order_id = $2")
            .bind(restaurant_id)
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, restaurant_id: &str, query: &OrderQuery) -> StoreResult<Page<Order>> {
        let status = query.status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(restaurant_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        // Sort column comes from a closed enum, never from user text
        let direction = if query.descending { "DESC" } else { "ASC" };
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY {} {direction}, order_id {direction} LIMIT $3 OFFSET $4",
            query.sort.column()
        ))
        .bind(restaurant_id)
        .bind(status)
        .bind(i64::from(query.limit))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: collect_orders(rows)?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_many(
        &self,
        restaurant_id: &str,
        order_ids: &[String],
    ) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 AND order_id = ANY($2)"
        ))
        .bind(restaurant_id)
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        collect_orders(rows)
    }

    async fn created_since(
        &self,
        restaurant_id: &str,
        since: Option<i64>,
    ) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 AND ($2::BIGINT IS NULL OR created_at >= $2) \
             ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        collect_orders(rows)
    }
}

// ── QR codes ──

#[derive(sqlx::FromRow)]
struct QrCodeRow {
    id: String,
    code: String,
    restaurant_id: String,
    name: String,
    description: Option<String>,
    url: String,
    is_active: bool,
    scan_count: i64,
    opt_in_count: i64,
    settings: Json<QrSettings>,
    last_scanned: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<QrCodeRow> for QrCode {
    fn from(row: QrCodeRow) -> Self {
        QrCode {
            id: row.id,
            code: row.code,
            restaurant_id: row.restaurant_id,
            name: row.name,
            description: row.description,
            url: row.url,
            is_active: row.is_active,
            scan_count: row.scan_count,
            opt_in_count: row.opt_in_count,
            settings: row.settings.0,
            last_scanned: row.last_scanned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const QR_COLUMNS: &str = "id, code, restaurant_id, name, description, url, is_active, scan_count, \
     opt_in_count, settings, last_scanned, created_at, updated_at";

#[async_trait]
impl QrCodeStore for PgStore {
    async fn insert(&self, qr: QrCode) -> StoreResult<QrCode> {
        sqlx::query(
            "INSERT INTO qr_codes (id, code, restaurant_id, name, description, url, is_active, scan_count, opt_in_count, \
             settings, last_scanned, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&qr.id)
        .bind(&qr.code)
        .bind(&qr.restaurant_id)
        .bind(&qr.name)
        .bind(&qr.description)
        .bind(&qr.url)
        .bind(qr.is_active)
        .bind(qr.scan_count)
        .bind(qr.opt_in_count)
        .bind(Json(&qr.settings))
        .bind(qr.last_scanned)
        .bind(qr.created_at)
        .bind(qr.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "QR code already exists."))?;
        Ok(qr)
    }

    async fn code_exists(&self, code: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM qr_codes WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<QrCode>> {
        let row: Option<QrCodeRow> =
            sqlx::query_as(&format!("SELECT {QR_COLUMNS} FROM qr_codes WHERE code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(QrCode::from))
    }

    async fn find_owned(&self, restaurant_id: &str, key: &str) -> StoreResult<Option<QrCode>> {
        let row: Option<QrCodeRow> = sqlx::query_as(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE restaurant_id = $1 AND (id = $2 OR code = $2)"
        ))
        .bind(restaurant_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QrCode::from))
    }

    async fn list(&self, restaurant_id: &str) -> StoreResult<Vec<QrCode>> {
        let rows: Vec<QrCodeRow> = sqlx::query_as(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE restaurant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(QrCode::from).collect())
    }

    async fn update(&self, qr: &QrCode) -> StoreResult<()> {
        sqlx::query(
            "UPDATE qr_codes SET name = $2, description = $3, is_active = $4, scan_count = $5, opt_in_count = $6, \
             settings = $7, last_scanned = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(&qr.id)
        .bind(&qr.name)
        .bind(&qr.description)
        .bind(qr.is_active)
        .bind(qr.scan_count)
        .bind(qr.opt_in_count)
        .bind(Json(&qr.settings))
        .bind(qr.last_scanned)
        .bind(qr.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, restaurant_id: &str, key: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM qr_codes WHERE restaurant_id = $1 AND (id = $2 OR code = $2)",
        )
        .bind(restaurant_id)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
