use crate::application::checkout::CheckoutService;
use crate::application::orders::OrderQueries;
use crate::application::payment_callback::{PaymentCallback, PaymentCallbackHandler};
use crate::config::ShopConfig;
use crate::domain::cart::{CartLine, CheckoutRequest};
use crate::domain::order::OrderId;
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::user::User;
use crate::error::{Result, ShopError};
use crate::infrastructure::Backend;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One boundary call, as the HTTP layer would hand it over.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Checkout {
        user: User,
        #[serde(default)]
        cart_items: Vec<CartLine>,
        #[serde(default)]
        shipping_address: String,
        payment_method: String,
    },
    PaymentSuccess {
        payment_id: String,
        #[serde(alias = "PayerID")]
        payer_id: String,
        order_id: OrderId,
    },
    PaymentCancel {
        order_id: OrderId,
    },
    OrderStatus {
        order_id: OrderId,
    },
    Orders {
        user: User,
    },
    AllOrders {
        user: User,
    },
    Order {
        user: User,
        order_id: OrderId,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    kind: &'static str,
    status: u16,
}

impl From<&ShopError> for ErrorBody {
    fn from(err: &ShopError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            kind: err.kind(),
            status: if err.is_client_error() { 400 } else { 500 },
        }
    }
}

/// The core's boundary operations behind a single request/response surface.
pub struct ShopApi {
    checkout: CheckoutService,
    callbacks: PaymentCallbackHandler,
    queries: OrderQueries,
}

impl ShopApi {
    pub fn new(backend: &Backend, gateway: PaymentGatewayRef, config: ShopConfig) -> Self {
        Self {
            checkout: CheckoutService::new(
                backend.catalog.clone(),
                backend.orders.clone(),
                gateway.clone(),
                config,
            ),
            callbacks: PaymentCallbackHandler::new(backend.orders.clone(), gateway),
            queries: OrderQueries::new(backend.orders.clone()),
        }
    }

    /// Dispatches `request` and renders the result as a JSON response body.
    /// Errors become structured bodies rather than propagating.
    pub async fn handle(&self, request: Request) -> Value {
        match request {
            Request::Checkout {
                user,
                cart_items,
                shipping_address,
                payment_method,
            } => {
                let request = CheckoutRequest {
                    cart_items,
                    shipping_address,
                    payment_method,
                };
                respond(self.checkout.checkout(request, &user).await)
            }
            Request::PaymentSuccess {
                payment_id,
                payer_id,
                order_id,
            } => respond(
                self.callbacks
                    .handle_success(PaymentCallback {
                        payment_id,
                        payer_id,
                        order_id,
                    })
                    .await,
            ),
            Request::PaymentCancel { order_id } => {
                respond(self.callbacks.handle_cancel(order_id).await)
            }
            Request::OrderStatus { order_id } => respond(self.queries.status(order_id).await),
            Request::Orders { user } => respond(self.queries.orders_for(&user).await),
            Request::AllOrders { user } => respond(self.queries.all_orders(&user).await),
            Request::Order { user, order_id } => respond(self.queries.order(&user, order_id).await),
        }
    }
}

/// Renders `err` as the structured body the client receives.
pub fn error_response(err: &ShopError) -> Value {
    if !err.is_client_error() {
        tracing::error!(error = %err, "request failed");
    }
    serde_json::to_value(ErrorBody::from(err))
        .unwrap_or_else(|_| json!({ "success": false, "error": err.to_string() }))
}

fn respond<T: Serialize>(result: Result<T>) -> Value {
    let rendered = result.and_then(|body| serde_json::to_value(body).map_err(ShopError::from));
    match rendered {
        Ok(body) => body,
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;
    use crate::domain::money::Money;
    use crate::infrastructure::in_memory::InMemoryStore;
    use crate::infrastructure::sandbox_gateway::SandboxGateway;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn api() -> ShopApi {
        let store = InMemoryStore::with_products([Product::new(
            1,
            "Desk",
            "Furniture",
            Money::new(dec!(10.00)).unwrap(),
            5,
        )]);
        ShopApi::new(
            &Backend::from_store(store),
            Arc::new(SandboxGateway::new()),
            ShopConfig::default(),
        )
    }

    fn parse(line: &str) -> Request {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_request_deserialization() {
        let request = parse(
            r#"{"op":"checkout","user":{"id":1},"paymentMethod":"CASH","shippingAddress":"Ilica 1","cartItems":[{"productId":1,"quantity":2,"price":"9.99"}]}"#,
        );
        assert!(matches!(request, Request::Checkout { ref cart_items, .. } if cart_items.len() == 1));

        let callback = parse(
            r#"{"op":"paymentSuccess","paymentId":"PAYID-00000001","PayerID":"P1","orderId":3}"#,
        );
        assert_eq!(
            callback,
            Request::PaymentSuccess {
                payment_id: "PAYID-00000001".to_string(),
                payer_id: "P1".to_string(),
                order_id: OrderId(3),
            }
        );
    }

    #[tokio::test]
    async fn test_cash_checkout_and_status() {
        let api = api();
        let body = api
            .handle(parse(
                r#"{"op":"checkout","user":{"id":1},"paymentMethod":"CASH","shippingAddress":"Ilica 1","cartItems":[{"productId":1,"quantity":2,"price":"0.01"}]}"#,
            ))
            .await;
        assert_eq!(body, json!({ "orderId": 1 }));

        let status = api.handle(parse(r#"{"op":"orderStatus","orderId":1}"#)).await;
        assert_eq!(
            status,
            json!({ "orderId": 1, "status": "CONFIRMED", "isConfirmed": true })
        );

        let order = api
            .handle(parse(r#"{"op":"order","orderId":1,"user":{"id":1}}"#))
            .await;
        assert_eq!(order["totalPrice"], json!("20.00"));
        assert_eq!(order["paymentMethod"], json!("CASH_ON_DELIVERY"));
    }

    #[tokio::test]
    async fn test_errors_render_as_bodies() {
        let api = api();
        let body = api
            .handle(parse(
                r#"{"op":"checkout","user":{"id":1},"paymentMethod":"CASH","cartItems":[]}"#,
            ))
            .await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("invalid_input"));
        assert_eq!(body["status"], json!(400));

        let missing = api.handle(parse(r#"{"op":"orderStatus","orderId":9}"#)).await;
        assert_eq!(missing["kind"], json!("not_found"));

        let forbidden = api
            .handle(parse(r#"{"op":"allOrders","user":{"id":1,"role":"customer"}}"#))
            .await;
        assert_eq!(forbidden["kind"], json!("forbidden"));
    }

    #[test]
    fn test_error_response_for_unreadable_request() {
        let err = serde_json::from_str::<Request>(
            r#"{"op":"checkout","user":{"id":1},"paymentMethod":"CASH","cartItems":[{"productId":1,"quantity":-1}]}"#,
        )
        .map_err(|e| ShopError::InvalidInput(e.to_string()))
        .unwrap_err();

        let body = error_response(&err);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("invalid_input"));
        assert_eq!(body["status"], json!(400));
    }
}
