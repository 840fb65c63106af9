pub mod auth;
pub mod membership;
pub mod shipment;
pub mod tenant;
pub mod user;
