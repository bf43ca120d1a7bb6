mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{payment, provider};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use sumup_gateway::models::payment::{OrderPayment, PaymentState};
use sumup_gateway::services::InMemoryPaymentStore;
use sumup_gateway::{build_router, AppState};
use tower::ServiceExt;

fn app(server: &MockServer, payments: Vec<OrderPayment>) -> (Router, Arc<InMemoryPaymentStore>) {
    let store = Arc::new(InMemoryPaymentStore::new());
    for p in payments {
        store.insert(p);
    }
    let provider = Arc::new(provider(&server.base_url(), store.clone()));
    (build_router(AppState::new(provider).unwrap()), store)
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

const WIDGET: &str = "/democon/sumup/widget/ABC12/s3cr3t/42/";

#[tokio::test]
async fn checkout_event_synchronizes_and_returns_204() {
    let server = MockServer::start_async().await;
    let checkout = server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1");
            then.status(200).json_body(json!({
                "id": "chk_1",
                "status": "PAID",
                "transaction_id": "TX-1"
            }));
        })
        .await;
    let (app, store) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::POST, "/democon/sumup/return/42/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_text(resp).await.is_empty());
    checkout.assert_async().await;
    assert_eq!(store.get(42).unwrap().state, PaymentState::Confirmed);
}

#[tokio::test]
async fn checkout_event_is_post_only() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::GET, "/democon/sumup/return/42/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn checkout_event_for_other_event_is_404() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::POST, "/otherfest/sumup/return/42/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn widget_renders_checkout_for_pending_payment() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1");
            then.status(200).json_body(json!({"id": "chk_1", "status": "PENDING"}));
        })
        .await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let req = Request::builder()
        .uri(WIDGET)
        .header(header::ACCEPT_LANGUAGE, "de-informal, en;q=0.5")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let csp = resp
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap()
        .to_string();
    assert_eq!(nonce.len(), 10);

    let html = body_text(resp).await;
    assert!(html.contains("checkoutId: \"chk_1\""), "unexpected body: {}", html);
    assert!(html.contains("locale: \"de-DE\""));
    assert!(html.contains("amount: \"23.50\""));
    assert!(html.contains(&format!("nonce=\"{nonce}\"")));
    assert!(!html.contains("window.parent.location.reload"));
    assert!(!html.contains("class=\"sumup-retry\""));
}

#[tokio::test]
async fn widget_embeds_buyer_email_as_script_literal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1");
            then.status(200).json_body(json!({"id": "chk_1", "status": "PENDING"}));
        })
        .await;
    let mut p = payment(PaymentState::Pending, Some("chk_1"));
    p.order_email = "o\"brien</script>@example.org".into();
    let (app, _) = app(&server, vec![p]);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(
        html.contains(r#"email: "o\"brien\u003c/script\u003e@example.org","#),
        "unexpected body: {}",
        html
    );
    assert!(!html.contains("&quot;"));
}

#[tokio::test]
async fn widget_reloads_once_paid() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1");
            then.status(200).json_body(json!({"id": "chk_1", "status": "PAID"}));
        })
        .await;
    let (app, store) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("window.parent.location.reload()"));
    assert!(!html.contains("SumUpCard.mount"));
    assert_eq!(store.get(42).unwrap().state, PaymentState::Confirmed);
}

#[tokio::test]
async fn widget_marks_failed_payment_as_retry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1");
            then.status(200).json_body(json!({"id": "chk_1", "status": "FAILED"}));
        })
        .await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("class=\"sumup-retry\""));
    assert!(html.contains("locale: \"en-GB\""));
}

#[tokio::test]
async fn widget_for_canceled_payment_is_empty_404() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Canceled, Some("chk_1"))]);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.is_empty());
}

#[tokio::test]
async fn widget_without_checkout_id_is_validation_error() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, None)]);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["message"], "No SumUp checkout ID found.");
}

#[tokio::test]
async fn widget_with_wrong_secret_is_404() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::GET, "/democon/sumup/widget/ABC12/guess/42/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ideal_returns_redirect_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/checkouts/chk_1");
            then.status(200)
                .json_body(json!({"next_step": {"full": "https://bank.example/pay"}}));
        })
        .await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    for method in [Method::GET, Method::POST] {
        let resp = app
            .clone()
            .oneshot(request(method, "/democon/sumup/ideal/42/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body, json!({"redirect_url": "https://bank.example/pay"}));
    }
}

#[tokio::test]
async fn ideal_rejected_by_sumup_is_bad_gateway() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/checkouts/chk_1");
            then.status(409).json_body(json!({
                "message": "Checkout already processed",
                "error_code": "CHECKOUT_PROCESSED"
            }));
        })
        .await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::POST, "/democon/sumup/ideal/42/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["message"], "CHECKOUT_PROCESSED - Checkout already processed");
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn registration() -> Value {
    json!({
        "id": 42,
        "order_code": "ABC12",
        "order_secret": "s3cr3t",
        "order_email": "buyer@example.org",
        "amount": "19.99",
        "currency": "EUR",
        "buyer": {"first_name": "Ada", "city": "Berlin"}
    })
}

#[tokio::test]
async fn registering_payment_opens_checkout() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/checkouts")
                .body_contains("\"amount\":19.99,")
                .json_body_partial(
                    r#"{"checkout_reference": "democon-ABC12-P-42",
                        "personal_details": {"first_name": "Ada", "address": {"city": "Berlin"}}}"#,
                );
            then.status(201).json_body(json!({"id": "chk_new"}));
        })
        .await;
    let (app, store) = app(&server, vec![]);

    let resp = app
        .oneshot(json_request("/democon/sumup/payments/", registration()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["checkout_id"], "chk_new");
    assert_eq!(
        body["widget_url"],
        "https://tickets.example/democon/sumup/widget/ABC12/s3cr3t/42/"
    );
    create.assert_async().await;

    let saved = store.get(42).unwrap();
    assert_eq!(saved.state, PaymentState::Pending);
    assert_eq!(saved.checkout_id(), Some("chk_new"));
}

#[tokio::test]
async fn registered_payment_is_served_by_widget() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/checkouts");
            then.status(201).json_body(json!({"id": "chk_new"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_new");
            then.status(200).json_body(json!({"id": "chk_new", "status": "PENDING"}));
        })
        .await;
    let (app, _) = app(&server, vec![]);

    let resp = app
        .clone()
        .oneshot(json_request("/democon/sumup/payments/", registration()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.oneshot(request(Method::GET, WIDGET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("checkoutId: \"chk_new\""));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(json_request("/democon/sumup/payments/", registration()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_checkout_leaves_store_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/checkouts");
            then.status(400).json_body(json!({
                "message": "Currency not supported",
                "error_code": "INVALID",
                "param": "currency"
            }));
        })
        .await;
    let (app, store) = app(&server, vec![]);

    let resp = app
        .oneshot(json_request("/democon/sumup/payments/", registration()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(store.is_empty());
}

#[tokio::test]
async fn cancel_route_cancels_checkout() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/checkouts/chk_1");
            then.status(200).json_body(json!({"id": "chk_1"}));
        })
        .await;
    let (app, store) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::POST, "/democon/sumup/payments/42/cancel/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    delete.assert_async().await;
    assert_eq!(store.get(42).unwrap().state, PaymentState::Canceled);
}

#[tokio::test]
async fn refund_route_sends_partial_amount() {
    let server = MockServer::start_async().await;
    let refund = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/me/refund/TX-9")
                .json_body(json!({"amount": 5.5}));
            then.status(204);
        })
        .await;
    let mut p = payment(PaymentState::Confirmed, Some("chk_1"));
    p.info.insert("sumup_transaction_id".into(), json!("TX-9"));
    let (app, store) = app(&server, vec![p]);

    let resp = app
        .oneshot(json_request(
            "/democon/sumup/payments/42/refund/",
            json!({"amount": "5.50"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    refund.assert_async().await;
    assert_eq!(store.get(42).unwrap().state, PaymentState::Confirmed);
}

#[tokio::test]
async fn methods_route_returns_sumup_document() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/checkouts/chk_1/payment-methods");
            then.status(200)
                .json_body(json!({"available_payment_methods": [{"id": "ideal"}]}));
        })
        .await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::GET, "/democon/sumup/payments/42/methods/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["available_payment_methods"][0]["id"], "ideal");
}

#[tokio::test]
async fn transaction_route_without_transaction_is_validation_error() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server, vec![payment(PaymentState::Pending, Some("chk_1"))]);

    let resp = app
        .oneshot(request(Method::GET, "/democon/sumup/payments/42/transaction/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
