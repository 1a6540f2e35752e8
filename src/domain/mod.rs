//! Domain layer: value types, the order aggregate and its state machine,
//! and the ports the application layer is written against.

pub mod cart;
pub mod catalog;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod user;
