use bigdecimal::BigDecimal;
use buckaroo_client::{
    CircuitState, ClientSettings, GatewayClient, GatewayError, HttpTransport, PaymentService,
    RequestSigner, SignedPayload, Transport, TransportError, TransportSettings,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// RUST_LOG=buckaroo_client=debug shows the masked request and response trees.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const SUCCESS_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <TransactionResponse xmlns="https://checkout.buckaroo.nl/PaymentEngine/">
      <Key>4C1BE53E2C42412AB32A799D9316E7DD</Key>
      <Status>
        <Code Code="190">Success</Code>
        <DateTime>2024-05-11T11:52:10</DateTime>
      </Status>
      <Invoice>INV-200</Invoice>
      <ServiceCode>paypal</ServiceCode>
      <Currency>EUR</Currency>
      <AmountDebit>25.00</AmountDebit>
      <CustomParameters>
        <CustomParameter Name="orderRef">A-7</CustomParameter>
      </CustomParameters>
    </TransactionResponse>
  </s:Body>
</s:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Client</faultcode>
      <faultstring>Signature invalid</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;

fn settings_for(url: &str, breaker_failures: u32) -> TransportSettings {
    TransportSettings {
        live_url: format!("{}/live", url),
        test_url: format!("{}/test", url),
        timeout: Duration::from_secs(5),
        breaker_failures,
        breaker_reset: Duration::from_secs(60),
    }
}

fn client_for(url: String) -> GatewayClient {
    let signer =
        RequestSigner::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/merchant.pem")).unwrap();
    let transport = HttpTransport::new(settings_for(&url, 3)).unwrap();
    GatewayClient::new(ClientSettings::new("WEBSITEKEY1").unwrap(), signer, Arc::new(transport))
}

fn payload(client: &GatewayClient) -> SignedPayload {
    client
        .transaction()
        .put_in_test_mode()
        .set_service(PaymentService::PayPal)
        .set_amount_debit(BigDecimal::from_str("25").unwrap())
        .unwrap()
        .set_invoice("INV-200")
        .unwrap()
        .sign()
        .unwrap()
}

#[tokio::test]
async fn test_successful_round_trip_uses_test_endpoint() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/test")
        .match_header("SOAPAction", "\"TransactionRequest\"")
        .match_body(mockito::Matcher::Regex("Name=\"Invoice\">INV-200<".into()))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(SUCCESS_RESPONSE)
        .create_async()
        .await;

    let client = client_for(server.url());
    let response = client
        .transaction()
        .put_in_test_mode()
        .set_service(PaymentService::PayPal)
        .set_amount_debit(BigDecimal::from_str("25").unwrap())
        .unwrap()
        .set_invoice("INV-200")
        .unwrap()
        .perform()
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.is_successful());
    assert!(response.has_permanent_status());
    assert_eq!(response.status_description(), Some("Success"));
    assert_eq!(response.transaction_key(), Some("4C1BE53E2C42412AB32A799D9316E7DD"));
    assert_eq!(response.amount(), Some(&BigDecimal::from_str("25.00").unwrap()));
    assert_eq!(
        response.custom_parameters().and_then(|p| p.get("orderRef")),
        Some("A-7")
    );
    assert!(!response.has_required_action());
    assert_eq!(response.redirect_url(), None);
}

#[tokio::test]
async fn test_soap_fault_surfaces_as_decode_error() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/test")
        .with_status(500)
        .with_body(FAULT_RESPONSE)
        .create_async()
        .await;

    let client = client_for(server.url());
    let transport = HttpTransport::new(settings_for(&server.url(), 3)).unwrap();

    match transport.send(&payload(&client)).await {
        Err(TransportError::SoapFault(message)) => assert_eq!(message, "Signature invalid"),
        other => panic!("expected SOAP fault, got {:?}", other),
    }

    let err = client
        .transaction()
        .put_in_test_mode()
        .set_service(PaymentService::PayPal)
        .set_amount_debit(BigDecimal::from_str("25").unwrap())
        .unwrap()
        .set_invoice("INV-200")
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::DecodeError(_)));
}

#[tokio::test]
async fn test_unavailable_gateway_is_transport_failure() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/live")
        .with_status(503)
        .create_async()
        .await;

    let client = client_for(server.url());
    let err = client
        .transaction()
        .set_service(PaymentService::PayPal)
        .set_amount_debit(BigDecimal::from_str("25").unwrap())
        .unwrap()
        .set_invoice("INV-200")
        .unwrap()
        .perform()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::TransportFailure(TransportError::HttpStatus(503))
    ));
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_failures() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/test")
        .with_status(502)
        .expect_at_least(2)
        .create_async()
        .await;

    let client = client_for(server.url());
    let transport = HttpTransport::new(settings_for(&server.url(), 2)).unwrap();
    let payload = payload(&client);

    for _ in 0..2 {
        assert!(matches!(
            transport.send(&payload).await,
            Err(TransportError::HttpStatus(502))
        ));
    }

    assert_eq!(transport.circuit_state(), CircuitState::Open);
    assert!(matches!(
        transport.send(&payload).await,
        Err(TransportError::CircuitBreakerOpen(_))
    ));
}
