//! Shipping quotes through the HTTP API with live carriers and without.

#![allow(clippy::unwrap_used)]

use atelier_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn carrier_vars(uri: &str) -> Vec<(&'static str, String)> {
    vec![
        ("DHL_BASE_URL", format!("{uri}/dhl")),
        ("DHL_API_KEY", "apX1bY2cZ3".to_string()),
        ("DHL_API_SECRET", "Q7w!e9R$t2Y".to_string()),
        ("DHL_ACCOUNT_NUMBER", "451234567".to_string()),
        ("ARAMEX_BASE_URL", format!("{uri}/aramex")),
        ("ARAMEX_USERNAME", "ops@atelier.sa".to_string()),
        ("ARAMEX_PASSWORD", "Zx8!kP2#qL5".to_string()),
        ("ARAMEX_ACCOUNT_NUMBER", "20016".to_string()),
        ("ARAMEX_ACCOUNT_PIN", "331421".to_string()),
        ("ARAMEX_ACCOUNT_ENTITY", "RUH".to_string()),
    ]
}

async fn quote(ctx: &TestContext, body: &Value) -> (StatusCode, Value) {
    let response = ctx
        .client
        .post(ctx.url("/api/shipping/rates"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_live_rates_cheapest_first() {
    let carriers = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dhl/rates"))
        .and(query_param("destinationCountryCode", "AE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "productName": "EXPRESS WORLDWIDE",
                "productCode": "P",
                "totalPrice": [{ "currencyType": "BILLC", "priceCurrency": "SAR", "price": 117.5 }],
                "deliveryCapabilities": { "totalTransitDays": 2 }
            }]
        })))
        .expect(1)
        .mount(&carriers)
        .await;
    Mock::given(method("POST"))
        .and(path("/aramex/RateCalculator/Service_1_0.svc/json/CalculateRate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "HasErrors": false,
            "Notifications": [],
            "TotalAmount": { "CurrencyCode": "SAR", "Value": 61.0 }
        })))
        .expect(1)
        .mount(&carriers)
        .await;

    let ctx = TestContext::spawn(&carrier_vars(&carriers.uri())).await.unwrap();
    let (status, body) = quote(
        &ctx,
        &json!({ "country": "AE", "city": "Dubai", "itemCount": 3 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    let rates = body["rates"].as_array().unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0]["provider"], "aramex");
    assert_eq!(rates[0]["service"], "Priority Parcel Express");
    assert_eq!(rates[1]["provider"], "dhl");
    assert_eq!(rates[1]["estimatedDays"], 2);
}

#[tokio::test]
async fn test_carrier_outage_falls_back_to_table() {
    let carriers = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dhl/rates"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&carriers)
        .await;
    Mock::given(method("POST"))
        .and(path("/aramex/RateCalculator/Service_1_0.svc/json/CalculateRate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "HasErrors": true,
            "Notifications": [{ "Code": "ERR52", "Message": "Destination city is invalid" }],
            "TotalAmount": null
        })))
        .mount(&carriers)
        .await;

    let ctx = TestContext::spawn(&carrier_vars(&carriers.uri())).await.unwrap();
    let (status, body) = quote(&ctx, &json!({ "country": "SA", "city": "Jeddah", "itemCount": 1 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["rates"][0]["provider"], "standard");
}

#[tokio::test]
async fn test_invalid_destination_never_reaches_carriers() {
    let carriers = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&carriers)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&carriers)
        .await;

    let ctx = TestContext::spawn(&carrier_vars(&carriers.uri())).await.unwrap();
    let (status, body) = quote(&ctx, &json!({ "country": "KSA", "itemCount": 1 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);
}
