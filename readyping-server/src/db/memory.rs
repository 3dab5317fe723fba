//! In-memory store
//!
//! Built at process start, gone on restart. Each map is a `DashMap`, so single
//! record writes are atomic; concurrent edits of the same order are last-writer-wins.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::models::{Account, Order, QrCode};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use super::{
    AccountStore, OrderQuery, OrderSort, OrderStore, Page, QrCodeStore, StoreError, StoreResult,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    /// account id → account
    accounts: Arc<DashMap<String, Account>>,
    /// phone number → account id
    phones: Arc<DashMap<String, String>>,
    /// external order id → order
    orders: Arc<DashMap<String, Order>>,
    /// code → QR record
    qr_codes: Arc<DashMap<String, QrCode>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(id).map(|a| a.clone()))
    }

    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<Account>> {
        let Some(id) = self.phones.get(phone_number).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn insert(&self, account: Account) -> StoreResult<Account> {
        match self.phones.entry(account.phone_number.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "User with this phone number already exists.".into(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(account.id.clone());
                self.accounts.insert(account.id.clone(), account.clone());
                Ok(account)
            }
        }
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }
}

fn compare_orders(a: &Order, b: &Order, sort: OrderSort) -> Ordering {
    match sort {
        OrderSort::CreatedAt => a.created_at.cmp(&b.created_at),
        OrderSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        OrderSort::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
        OrderSort::OrderId => a.order_id.cmp(&b.order_id),
        OrderSort::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: Order) -> StoreResult<Order> {
        match self.orders.entry(order.order_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("Order ID already exists.".into())),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(order)
            }
        }
    }

    async fn get(&self, restaurant_id: &str, order_id: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .get(order_id)
            .filter(|o| o.restaurant_id == restaurant_id)
            .map(|o| o.clone()))
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        self.orders.insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    async fn delete(&self, restaurant_id: &str, order_id: &str) -> StoreResult<bool> {
        Ok(self
            .orders
            .remove_if(order_id, |_, o| o.restaurant_id == restaurant_id)
            .is_some())
    }

    async fn list(&self, restaurant_id: &str, query: &OrderQuery) -> StoreResult<Page<Order>> {
        let mut matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .map(|o| o.clone())
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare_orders(a, b, query.sort).then_with(|| a.order_id.cmp(&b.order_id));
            if query.descending { ord.reverse() } else { ord }
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn find_many(
        &self,
        restaurant_id: &str,
        order_ids: &[String],
    ) -> StoreResult<Vec<Order>> {
        let mut seen = HashSet::new();
        Ok(order_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.orders.get(id))
            .filter(|o| o.restaurant_id == restaurant_id)
            .map(|o| o.clone())
            .collect())
    }

    async fn created_since(
        &self,
        restaurant_id: &str,
        since: Option<i64>,
    ) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter(|o| since.is_none_or(|from| o.created_at >= from))
            .map(|o| o.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl QrCodeStore for MemoryStore {
    async fn insert(&self, qr: QrCode) -> StoreResult<QrCode> {
        match self.qr_codes.entry(qr.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("QR code already exists.".into())),
            Entry::Vacant(slot) => {
                slot.insert(qr.clone());
                Ok(qr)
            }
        }
    }

    async fn code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self.qr_codes.contains_key(code))
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<QrCode>> {
        Ok(self.qr_codes.get(code).map(|q| q.clone()))
    }

    async fn find_owned(&self, restaurant_id: &str, key: &str) -> StoreResult<Option<QrCode>> {
        Ok(self
            .qr_codes
            .iter()
            .find(|q| q.restaurant_id == restaurant_id && (q.id == key || q.code == key))
            .map(|q| q.clone()))
    }

    async fn list(&self, restaurant_id: &str) -> StoreResult<Vec<QrCode>> {
        let mut codes: Vec<QrCode> = self
            .qr_codes
            .iter()
            .filter(|q| q.restaurant_id == restaurant_id)
            .map(|q| q.clone())
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(codes)
    }

    async fn update(&self, qr: &QrCode) -> StoreResult<()> {
        self.qr_codes.insert(qr.code.clone(), qr.clone());
        Ok(())
    }

    async fn delete(&self, restaurant_id: &str, key: &str) -> StoreResult<bool> {
        let Some(code) = self
            .find_owned(restaurant_id, key)
            .await?
            .map(|q| q.code)
        else {
            return Ok(false);
        };
        Ok(self.qr_codes.remove(&code).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderCreate, OrderStatus, Role};

    fn order(order_id: &str, restaurant: &str, created_at: i64, total: f64) -> Order {
        Order::new(
            format!("ord_{order_id}"),
            restaurant.into(),
            OrderCreate {
                order_id: Some(order_id.into()),
                customer_name: Some("Ana".into()),
                phone_number: Some("5551234567".into()),
                total_amount: Some(total),
                ..Default::default()
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn duplicate_phone_is_conflict() {
        let store = MemoryStore::new();
        let a = Account::new("acc_1".into(), "Cafe".into(), "+15550001111".into(), Role::Owner, 0);
        let b = Account::new("acc_2".into(), "Bar".into(), "+15550001111".into(), Role::Owner, 0);
        AccountStore::insert(&store, a).await.unwrap();
        let err = AccountStore::insert(&store, b).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.find_by_id("acc_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn order_id_unique_across_restaurants() {
        let store = MemoryStore::new();
        OrderStore::insert(&store, order("A1", "r1", 0, 1.0)).await.unwrap();
        let err = OrderStore::insert(&store, order("A1", "r2", 0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn orders_scoped_to_restaurant() {
        let store = MemoryStore::new();
        OrderStore::insert(&store, order("A1", "r1", 0, 1.0)).await.unwrap();
        assert!(OrderStore::get(&store, "r2", "A1").await.unwrap().is_none());
        assert!(!OrderStore::delete(&store, "r2", "A1").await.unwrap());
        assert!(OrderStore::delete(&store, "r1", "A1").await.unwrap());
    }

    #[tokio::test]
    async fn find_many_returns_each_order_once() {
        let store = MemoryStore::new();
        OrderStore::insert(&store, order("A1", "r1", 0, 1.0)).await.unwrap();
        OrderStore::insert(&store, order("A2", "r2", 0, 1.0)).await.unwrap();
        let ids = ["A1".to_string(), "A1".to_string(), "A2".to_string()];
        let found = store.find_many("r1", &ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].order_id, "A1");
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let store = MemoryStore::new();
        for i in 0..5 {
            OrderStore::insert(&store, order(&format!("A{i}"), "r1", i * 1000, 1.0))
                .await
                .unwrap();
        }
        let mut ready = order("B1", "r1", 10_000, 1.0);
        ready.apply_status(OrderStatus::Ready, 11_000);
        OrderStore::insert(&store, ready).await.unwrap();

        let query = OrderQuery {
            limit: 2,
            page: 2,
            ..Default::default()
        };
        let page = OrderStore::list(&store, "r1", &query).await.unwrap();
        assert_eq!(page.total, 6);
        let ids: Vec<_> = page.items.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, ["A3", "A2"]);

        let only_ready = OrderQuery {
            status: Some(OrderStatus::Ready),
            ..Default::default()
        };
        let page = OrderStore::list(&store, "r1", &only_ready).await.unwrap();
        assert_eq!(page.total, 1);
    }
}
