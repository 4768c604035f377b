//! Event handlers that react to order events across aggregate boundaries.

pub mod customer_notification;
pub mod stock_reservation;

pub use customer_notification::CustomerNotificationHandler;
pub use stock_reservation::StockReservationHandler;
