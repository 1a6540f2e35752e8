use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use webshop::domain::cart::{CartLine, CheckoutRequest};
use webshop::domain::catalog::ProductId;
use webshop::domain::order::{OrderId, OrderStatus, PaymentMethod};
use webshop::domain::ports::OrderStore;
use webshop::domain::user::User;
use webshop::error::ShopError;

mod common;
use common::{Behavior, Shop};

fn request(items: Vec<CartLine>, method: &str) -> CheckoutRequest {
    CheckoutRequest {
        cart_items: items,
        shipping_address: "Ilica 1, Zagreb".to_string(),
        payment_method: method.to_string(),
    }
}

#[tokio::test]
async fn test_cash_checkout_confirms_and_decrements() {
    let shop = Shop::new(Behavior::Approve);
    let result = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 2)], "CASH"), &User::customer(7))
        .await
        .unwrap();

    assert_eq!(result.order_id, OrderId(1));
    assert!(result.approval_url.is_none());
    assert_eq!(shop.status(result.order_id).await, OrderStatus::Confirmed);
    assert_eq!(shop.stock(1).await, 3);

    let order = shop.store.get_by_id(result.order_id).await.unwrap();
    assert_eq!(order.total().value(), dec!(20.00));
    assert_eq!(order.payment_method(), PaymentMethod::CashOnDelivery);
    assert_eq!(order.lines()[0].product_name, "Desk");
    assert!(shop.gateway.created.lock().await.is_empty());
}

#[tokio::test]
async fn test_insufficient_stock_creates_nothing() {
    let shop = Shop::new(Behavior::Approve);
    let err = shop
        .checkout
        .checkout(request(vec![CartLine::new(2, 2)], "CASH"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::InsufficientStock(ProductId(2))));
    assert!(shop.store.all_orders().await.unwrap().is_empty());
    assert_eq!(shop.stock(2).await, 1);
}

#[tokio::test]
async fn test_stock_check_uses_aggregated_quantity() {
    let shop = Shop::new(Behavior::Approve);
    let cart = vec![CartLine::new(1, 3), CartLine::new(1, 3)];
    let err = shop
        .checkout
        .checkout(request(cart, "CASH"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::InsufficientStock(ProductId(1))));
    assert_eq!(shop.stock(1).await, 5);
}

#[tokio::test]
async fn test_paypal_checkout_leaves_order_pending() {
    let shop = Shop::new(Behavior::Approve);
    let result = shop
        .checkout
        .checkout(
            request(vec![CartLine::new(1, 1), CartLine::new(2, 1)], "paypal"),
            &User::customer(7),
        )
        .await
        .unwrap();

    assert_eq!(
        result.approval_url.as_deref(),
        Some("https://provider.test/approve/PAY-1")
    );
    assert_eq!(shop.status(result.order_id).await, OrderStatus::PendingPayment);
    assert_eq!(shop.stock(1).await, 5);
    assert_eq!(shop.stock(2).await, 1);

    let order = shop.store.get_by_id(result.order_id).await.unwrap();
    assert_eq!(order.payment_reference(), Some("PAY-1"));

    let created = shop.gateway.created.lock().await;
    assert_eq!(created[0].amount, dec!(35.50));
    assert_eq!(created[0].currency, "EUR");
    assert_eq!(created[0].description, "Order 1");
    assert_eq!(
        created[0].success_url,
        "http://localhost:5173/payment/success?orderId=1"
    );
    assert_eq!(
        created[0].cancel_url,
        "http://localhost:5173/payment/cancel?orderId=1"
    );
}

#[tokio::test]
async fn test_client_price_is_ignored() {
    let shop = Shop::new(Behavior::Approve);
    let cart = vec![CartLine::new(1, 2).with_price(dec!(0.01))];
    let result = shop
        .checkout
        .checkout(request(cart, "CASH_ON_DELIVERY"), &User::customer(7))
        .await
        .unwrap();

    let order = shop.store.get_by_id(result.order_id).await.unwrap();
    assert_eq!(order.total().value(), dec!(20.00));
    assert_eq!(order.lines()[0].unit_price.value(), dec!(10.00));
}

#[tokio::test]
async fn test_rejected_carts_persist_nothing() {
    let shop = Shop::new(Behavior::Approve);
    let user = User::customer(7);

    let empty = shop.checkout.checkout(request(vec![], "CASH"), &user).await;
    assert!(matches!(empty, Err(ShopError::InvalidInput(_))));

    let zero = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 0)], "CASH"), &user)
        .await;
    assert!(matches!(zero, Err(ShopError::InvalidInput(_))));

    let unknown = shop
        .checkout
        .checkout(request(vec![CartLine::new(99, 1)], "CASH"), &user)
        .await;
    assert!(matches!(unknown, Err(ShopError::ProductNotFound(ProductId(99)))));

    let deleted = shop
        .checkout
        .checkout(request(vec![CartLine::new(3, 1)], "CASH"), &user)
        .await;
    assert!(matches!(deleted, Err(ShopError::ProductNotFound(ProductId(3)))));

    let method = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 1)], "BITCOIN"), &user)
        .await;
    assert!(matches!(method, Err(ShopError::InvalidInput(ref msg)) if msg.contains("unsupported payment method")));

    assert!(shop.store.all_orders().await.unwrap().is_empty());
    assert_eq!(shop.stock(1).await, 5);
}

#[tokio::test]
async fn test_provider_failure_cancels_new_order() {
    let shop = Shop::new(Behavior::Approve);
    shop.gateway.fail_create.store(true, Ordering::SeqCst);

    let err = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 1)], "PAYPAL"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::PaymentProvider(_)));
    assert_eq!(shop.status(OrderId(1)).await, OrderStatus::Cancelled);
    assert_eq!(shop.stock(1).await, 5);
}

#[tokio::test]
async fn test_reference_write_failure_cancels_new_order() {
    let shop = Shop::new(Behavior::Approve);
    shop.store.fail_set_reference.store(true, Ordering::SeqCst);

    let err = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 1)], "PAYPAL"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::Persistence(_)));
    assert_eq!(shop.status(OrderId(1)).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_cash_confirm_failure_cancels_order() {
    let shop = Shop::new(Behavior::Approve);
    shop.store.fail_confirm.store(true, Ordering::SeqCst);

    let err = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 1)], "CASH"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::Persistence(_)));
    assert_eq!(shop.status(OrderId(1)).await, OrderStatus::Cancelled);
    assert_eq!(shop.stock(1).await, 5);
}

#[tokio::test]
async fn test_failed_cancel_surfaces_and_leaves_pending() {
    let shop = Shop::new(Behavior::Approve);
    shop.gateway.fail_create.store(true, Ordering::SeqCst);
    shop.store.fail_cancel.store(true, Ordering::SeqCst);

    let err = shop
        .checkout
        .checkout(request(vec![CartLine::new(1, 1)], "PAYPAL"), &User::customer(7))
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::CancelFailed { order_id: OrderId(1), .. }));
    assert_eq!(shop.status(OrderId(1)).await, OrderStatus::PendingPayment);
}
