use httpstub::prelude::*;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn observer_sees_matched_and_unmatched_exchanges() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();
    let exchanges: Arc<Mutex<Vec<InterceptedExchange>>> = Arc::new(Mutex::new(Vec::new()));

    let recorded = exchanges.clone();
    let _guard = Interceptor::builder()
        .mock(mock().get("/known").respond_with().status(202).body("ok").end())
        .observer(move |exchange| recorded.lock().unwrap().push(exchange.clone()))
        .http_client(&client)
        .install();

    // Act
    let hit = client.get("http://localhost/known").await;
    let miss = client.get("http://localhost/unknown").await;

    // Assert
    assert_eq!(hit.unwrap().status(), 202);
    assert!(miss.is_err());

    let exchanges = exchanges.lock().unwrap();
    assert_eq!(exchanges.len(), 2);

    assert_eq!(exchanges[0].request.path(), "/known");
    let response = exchanges[0].response.as_ref().unwrap();
    assert_eq!(response.status, 202);
    assert_eq!(response.body_string(), "ok");

    assert_eq!(exchanges[1].request.path(), "/unknown");
    assert!(exchanges[1].response.is_none());
}
