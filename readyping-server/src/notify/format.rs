//! Outbound message text

use shared::models::{Order, OrderStatus};

/// Fill the ready template
///
/// Known placeholders: `#{orderId}`, `#{customerName}`, `#{restaurantName}`.
pub fn ready_message(template: &str, order: &Order, restaurant_name: Option<&str>) -> String {
    template
        .replace("#{orderId}", &order.order_id)
        .replace("#{customerName}", &order.customer_name)
        .replace("#{restaurantName}", restaurant_name.unwrap_or("Restaurant"))
}

/// Canned message for a status change
pub fn status_message(order_id: &str, status: OrderStatus) -> String {
    match status {
        OrderStatus::Preparing => format!(
            "Your order #{order_id} is now being prepared. We'll notify you when it's ready!"
        ),
        OrderStatus::Ready => {
            format!("Your order #{order_id} is ready! Please collect it from the counter.")
        }
        OrderStatus::Completed => format!(
            "Thank you for choosing us! Your order #{order_id} has been completed."
        ),
        OrderStatus::Cancelled => format!(
            "Your order #{order_id} has been cancelled. Please contact us if you have any questions."
        ),
        other => format!("Your order #{order_id} status has been updated to: {other}"),
    }
}
