//! Read-only aggregates over a restaurant's orders and QR codes

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{DeliveryStatus, Order, OrderStatus};
use shared::util::{to_decimal, to_f64};

use super::qr::{self, QrTotals};
use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::state::AppState;

/// Number of orders in `recentOrders`
const RECENT_ORDERS: usize = 5;
/// Default and maximum window for trends, in days
const DEFAULT_TREND_DAYS: i64 = 7;
const MAX_TREND_DAYS: i64 = 90;

/// Coarse reporting window, always anchored in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Quarter,
    All,
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "all" => Ok(Period::All),
            other => Err(AppError::validation(format!("Invalid period: {other}"))),
        }
    }
}

impl Period {
    /// Parse an optional `?period=` value
    pub fn parse_or(value: Option<&str>, default: Period) -> Result<Self, AppError> {
        match value {
            None | Some("") => Ok(default),
            Some(v) => v.parse(),
        }
    }

    /// Inclusive lower bound in epoch millis; `None` for `all`
    pub fn start(&self, now: DateTime<Utc>) -> Option<i64> {
        let today = now.date_naive();
        let day_start = |date: NaiveDate| {
            Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
                .timestamp_millis()
        };
        match self {
            Period::Today => Some(day_start(today)),
            Period::Week => Some((now - Duration::days(7)).timestamp_millis()),
            Period::Month => Some(day_start(today.with_day(1).unwrap_or(today))),
            Period::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(today.year(), first_month, 1).unwrap_or(today);
                Some(day_start(start))
            }
            Period::All => None,
        }
    }
}

/// Decimal accumulator for one status bucket
#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    count: u64,
    total: Decimal,
}

impl Bucket {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.total += to_decimal(amount);
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            to_f64(self.total / Decimal::from(self.count))
        }
    }
}

fn by_status(orders: &[Order]) -> BTreeMap<&'static str, Bucket> {
    let mut buckets: BTreeMap<&'static str, Bucket> = BTreeMap::new();
    for order in orders {
        buckets
            .entry(order.status.as_str())
            .or_default()
            .add(order.total_amount);
    }
    buckets
}

fn completed(orders: &[Order]) -> Bucket {
    let mut bucket = Bucket::default();
    for order in orders.iter().filter(|o| o.status == OrderStatus::Completed) {
        bucket.add(order.total_amount);
    }
    bucket
}

fn successful_sends(orders: &[Order]) -> u64 {
    orders
        .iter()
        .flat_map(|o| o.notification_history.iter())
        .filter(|n| n.status == DeliveryStatus::Sent)
        .count() as u64
}

fn minutes(from: i64, to: i64) -> f64 {
    ((to - from) as f64 / 60_000.0 * 100.0).round() / 100.0
}

/// (avg, min, max), all zero when empty
fn spread(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (
        (sum / values.len() as f64 * 100.0).round() / 100.0,
        min,
        max,
    )
}

fn prep_minutes(orders: &[Order]) -> Vec<f64> {
    orders
        .iter()
        .filter_map(|o| o.ready_at.map(|ready| minutes(o.created_at, ready)))
        .collect()
}

fn completion_minutes(orders: &[Order]) -> Vec<f64> {
    orders
        .iter()
        .filter_map(|o| o.completed_at.map(|done| minutes(o.created_at, done)))
        .collect()
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 10_000.0).round() / 100.0
    }
}

async fn orders_in(state: &AppState, user: &CurrentUser, period: Period) -> ServiceResult<Vec<Order>> {
    let since = period.start(Utc::now());
    Ok(state.orders.created_since(&user.restaurant_id, since).await?)
}

// ==================== Order overview ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotal {
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOverview {
    pub stats: BTreeMap<&'static str, StatusTotal>,
    pub total_orders: u64,
    pub total_revenue: f64,
    pub period: Period,
}

/// Per-status counts plus completed revenue
pub async fn order_overview(state: &AppState, user: &CurrentUser, period: Period) -> ServiceResult<OrderOverview> {
    let orders = orders_in(state, user, period).await?;
    Ok(OrderOverview {
        stats: by_status(&orders)
            .into_iter()
            .map(|(status, b)| {
                (
                    status,
                    StatusTotal {
                        count: b.count,
                        total_amount: to_f64(b.total),
                    },
                )
            })
            .collect(),
        total_orders: orders.len() as u64,
        total_revenue: to_f64(completed(&orders).total),
        period,
    })
}

// ==================== Dashboard ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStats {
    pub count: u64,
    pub total_amount: f64,
    pub avg_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub total_orders: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    /// Orders flagged as notified
    pub total_notifications: u64,
    /// History entries recorded as sent
    pub successful_notifications: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub order_id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub period: Period,
    pub order_stats: BTreeMap<&'static str, StatusStats>,
    pub revenue: Revenue,
    pub notifications: NotificationStats,
    pub qr_codes: QrTotals,
    pub recent_orders: Vec<RecentOrder>,
    /// Mean minutes from creation to ready
    pub avg_prep_time: f64,
}

pub async fn dashboard(state: &AppState, user: &CurrentUser, period: Period) -> ServiceResult<Dashboard> {
    let orders = orders_in(state, user, period).await?;
    let codes = state.qr_codes.list(&user.restaurant_id).await?;

    // Recent orders ignore the period
    let recent = if period == Period::All {
        orders.iter().take(RECENT_ORDERS).cloned().collect::<Vec<_>>()
    } else {
        let mut all = state.orders.created_since(&user.restaurant_id, None).await?;
        all.truncate(RECENT_ORDERS);
        all
    };

    let revenue = completed(&orders);
    let (avg_prep_time, _, _) = spread(&prep_minutes(&orders));

    Ok(Dashboard {
        period,
        order_stats: by_status(&orders)
            .into_iter()
            .map(|(status, b)| {
                (
                    status,
                    StatusStats {
                        count: b.count,
                        total_amount: to_f64(b.total),
                        avg_amount: b.avg(),
                    },
                )
            })
            .collect(),
        revenue: Revenue {
            total_revenue: to_f64(revenue.total),
            avg_order_value: revenue.avg(),
            total_orders: revenue.count,
        },
        notifications: NotificationStats {
            total_notifications: orders.iter().filter(|o| o.notification_sent).count() as u64,
            successful_notifications: successful_sends(&orders),
        },
        qr_codes: qr::totals(&codes),
        recent_orders: recent
            .into_iter()
            .map(|o| RecentOrder {
                order_id: o.order_id,
                customer_name: o.customer_name,
                status: o.status,
                total_amount: o.total_amount,
                created_at: o.created_at,
            })
            .collect(),
        avg_prep_time,
    })
}

// ==================== Trends ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStatus {
    pub status: OrderStatus,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDay {
    /// UTC calendar date, `YYYY-MM-DD`
    pub date: String,
    pub statuses: Vec<TrendStatus>,
    pub total_orders: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trends {
    pub trends: Vec<TrendDay>,
}

/// Daily per-status counts for the last `days` days, oldest first
pub async fn trends(state: &AppState, user: &CurrentUser, days: Option<i64>) -> ServiceResult<Trends> {
    let days = days.unwrap_or(DEFAULT_TREND_DAYS).clamp(1, MAX_TREND_DAYS);
    let since = (Utc::now() - Duration::days(days)).timestamp_millis();
    let orders = state
        .orders
        .created_since(&user.restaurant_id, Some(since))
        .await?;
    Ok(Trends {
        trends: group_by_day(&orders),
    })
}

fn group_by_day(orders: &[Order]) -> Vec<TrendDay> {
    let mut days: BTreeMap<String, BTreeMap<&'static str, (OrderStatus, Bucket)>> = BTreeMap::new();
    for order in orders {
        let date = DateTime::<Utc>::from_timestamp_millis(order.created_at)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        days.entry(date)
            .or_default()
            .entry(order.status.as_str())
            .or_insert((order.status, Bucket::default()))
            .1
            .add(order.total_amount);
    }

    days.into_iter()
        .map(|(date, statuses)| {
            let total_orders = statuses.values().map(|(_, b)| b.count).sum();
            let total: Decimal = statuses.values().map(|(_, b)| b.total).sum();
            TrendDay {
                date,
                statuses: statuses
                    .into_values()
                    .map(|(status, b)| TrendStatus {
                        status,
                        count: b.count,
                        total_amount: to_f64(b.total),
                    })
                    .collect(),
                total_orders,
                total_amount: to_f64(total),
            }
        })
        .collect()
}

// ==================== Performance ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTime {
    pub avg_completion_time: f64,
    pub min_completion_time: f64,
    pub max_completion_time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepTime {
    pub avg_prep_time: f64,
    pub min_prep_time: f64,
    pub max_prep_time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRate {
    pub total_notifications: u64,
    pub successful_notifications: u64,
    /// Percentage of notified orders with at least one successful send
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Satisfaction {
    pub total_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub period: Period,
    pub completion_time: CompletionTime,
    pub prep_time: PrepTime,
    pub notification_rate: NotificationRate,
    pub satisfaction: Satisfaction,
}

pub async fn performance(state: &AppState, user: &CurrentUser, period: Period) -> ServiceResult<Performance> {
    let orders = orders_in(state, user, period).await?;
    Ok(performance_of(period, &orders))
}

fn performance_of(period: Period, orders: &[Order]) -> Performance {
    let (avg_c, min_c, max_c) = spread(&completion_minutes(orders));
    let (avg_p, min_p, max_p) = spread(&prep_minutes(orders));

    let notified: Vec<Order> = orders.iter().filter(|o| o.notification_sent).cloned().collect();
    let reached = notified
        .iter()
        .filter(|o| {
            o.notification_history
                .iter()
                .any(|n| n.status == DeliveryStatus::Sent)
        })
        .count() as u64;

    let total = orders.len() as u64;
    let done = orders.iter().filter(|o| o.status == OrderStatus::Completed).count() as u64;
    let cancelled = orders.iter().filter(|o| o.status == OrderStatus::Cancelled).count() as u64;

    Performance {
        period,
        completion_time: CompletionTime {
            avg_completion_time: avg_c,
            min_completion_time: min_c,
            max_completion_time: max_c,
        },
        prep_time: PrepTime {
            avg_prep_time: avg_p,
            min_prep_time: min_p,
            max_prep_time: max_p,
        },
        notification_rate: NotificationRate {
            total_notifications: notified.len() as u64,
            successful_notifications: successful_sends(&notified),
            success_rate: rate(reached, notified.len() as u64),
        },
        satisfaction: Satisfaction {
            total_orders: total,
            completed_orders: done,
            cancelled_orders: cancelled,
            completion_rate: rate(done, total),
            cancellation_rate: rate(cancelled, total),
        },
    }
}
