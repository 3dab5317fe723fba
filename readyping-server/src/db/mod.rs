//! Persistence layer
//!
//! Handlers and services only see the store traits; the backend is picked at
//! startup (`PgStore` when `DATABASE_URL` is set, `MemoryStore` otherwise).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{Account, Order, OrderStatus, QrCode};

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique key already taken
    #[error("{0}")]
    Conflict(String),
    #[error("store backend error: {0}")]
    Backend(BoxError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Backend(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort key for order listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    OrderId,
    Status,
}

impl OrderSort {
    /// Parse `createdAt` / `-createdAt` style keys; the leading `-` means descending.
    pub fn parse(key: &str) -> Option<(Self, bool)> {
        let (descending, name) = match key.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, key),
        };
        let sort = match name {
            "createdAt" => OrderSort::CreatedAt,
            "updatedAt" => OrderSort::UpdatedAt,
            "totalAmount" => OrderSort::TotalAmount,
            "orderId" => OrderSort::OrderId,
            "status" => OrderSort::Status,
            _ => return None,
        };
        Some((sort, descending))
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            OrderSort::CreatedAt => "created_at",
            OrderSort::UpdatedAt => "updated_at",
            OrderSort::TotalAmount => "total_amount",
            OrderSort::OrderId => "order_id",
            OrderSort::Status => "status",
        }
    }
}

/// Order listing filter + page
#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: u32,
    pub limit: u32,
    pub sort: OrderSort,
    pub descending: bool,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: 20,
            sort: OrderSort::CreatedAt,
            descending: true,
        }
    }
}

impl OrderQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>>;
    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<Account>>;
    /// Fails with `Conflict` if the phone number is taken
    async fn insert(&self, account: Account) -> StoreResult<Account>;
    async fn update(&self, account: &Account) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with `Conflict` if the external order id is taken (system-wide)
    async fn insert(&self, order: Order) -> StoreResult<Order>;
    async fn get(&self, restaurant_id: &str, order_id: &str) -> StoreResult<Option<Order>>;
    async fn update(&self, order: &Order) -> StoreResult<()>;
    /// Returns whether a row was removed
    async fn delete(&self, restaurant_id: &str, order_id: &str) -> StoreResult<bool>;
    async fn list(&self, restaurant_id: &str, query: &OrderQuery) -> StoreResult<Page<Order>>;
    /// Orders among `order_ids` that belong to the restaurant
    async fn find_many(&self, restaurant_id: &str, order_ids: &[String])
    -> StoreResult<Vec<Order>>;
    /// Orders created at or after `since` (all when `None`), newest first
    async fn created_since(&self, restaurant_id: &str, since: Option<i64>)
    -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait QrCodeStore: Send + Sync {
    /// Fails with `Conflict` if the code is taken
    async fn insert(&self, qr: QrCode) -> StoreResult<QrCode>;
    async fn code_exists(&self, code: &str) -> StoreResult<bool>;
    /// Lookup by public code, any restaurant
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<QrCode>>;
    /// Lookup by id or code within one restaurant
    async fn find_owned(&self, restaurant_id: &str, key: &str) -> StoreResult<Option<QrCode>>;
    /// Newest first
    async fn list(&self, restaurant_id: &str) -> StoreResult<Vec<QrCode>>;
    async fn update(&self, qr: &QrCode) -> StoreResult<()>;
    async fn delete(&self, restaurant_id: &str, key: &str) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_parsing() {
        assert_eq!(
            OrderSort::parse("-createdAt"),
            Some((OrderSort::CreatedAt, true))
        );
        assert_eq!(
            OrderSort::parse("totalAmount"),
            Some((OrderSort::TotalAmount, false))
        );
        assert_eq!(OrderSort::parse("customerPhone"), None);
    }

    #[test]
    fn query_offset() {
        let query = OrderQuery {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
        let first = OrderQuery {
            page: 0,
            ..Default::default()
        };
        assert_eq!(first.offset(), 0);
    }
}
