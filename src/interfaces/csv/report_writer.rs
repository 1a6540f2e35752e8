use crate::domain::catalog::{Product, ProductId};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderId, OrderStatus, PaymentMethod};
use crate::domain::user::UserId;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRecord<'a> {
    order: OrderId,
    user: UserId,
    status: OrderStatus,
    payment_method: PaymentMethod,
    total: Money,
    payment_id: &'a str,
    items: usize,
}

#[derive(Serialize)]
struct StockRecord<'a> {
    product: ProductId,
    name: &'a str,
    stock: i64,
}

/// Writes end-of-run reports as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per order: `order,user,status,payment_method,total,payment_id,items`.
    pub fn write_orders(&mut self, orders: &[Order]) -> Result<()> {
        for order in orders {
            self.writer.serialize(OrderRecord {
                order: order.id(),
                user: order.user_id(),
                status: order.status(),
                payment_method: order.payment_method(),
                total: order.total(),
                payment_id: order.payment_reference().unwrap_or_default(),
                items: order.lines().len(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// One row per product: `product,name,stock`.
    pub fn write_stock(&mut self, products: &[Product]) -> Result<()> {
        for product in products {
            self.writer.serialize(StockRecord {
                product: product.id,
                name: &product.name,
                stock: product.stock,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
