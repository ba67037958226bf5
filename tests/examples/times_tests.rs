use httpstub::prelude::*;

#[tokio::test]
async fn mock_is_consumed_after_times_uses() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let guard = Interceptor::builder()
        .mock(
            mock()
                .get("http://example.com/user")
                .respond_with()
                .status(200)
                .times(2)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let first = client.get("http://example.com/user").await.unwrap();
    let second = client.get("http://example.com/user").await.unwrap();
    let third = client.get("http://example.com/user").await;

    // Assert
    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);

    match third {
        Err(TransportError::Unmatched(err)) => {
            assert!(err.exhausted().contains(&1));
            assert!(err.to_string().contains("Mock 1 is exhausted"));
        }
        other => panic!("expected an unmatched error, got {:?}", other.map(|r| r.status())),
    }

    assert_eq!(guard.registry().remaining(1), Some(0));
    guard.assert_all_consumed();
}

#[tokio::test]
async fn default_mock_answers_once() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(mock().get("/once").respond_with().status(204).end())
        .http_client(&client)
        .install();

    // Act
    let first = client.get("http://localhost/once").await;
    let second = client.get("http://localhost/once").await;

    // Assert
    assert_eq!(first.unwrap().status(), 204);
    assert!(matches!(second, Err(TransportError::Unmatched(_))));
}

#[tokio::test]
#[should_panic(expected = "1 of 2 mocks were not consumed, positions: [2]")]
async fn unconsumed_mocks_fail_the_assertion() {
    let client = HttpClient::new();

    let guard = Interceptor::builder()
        .mock(mock().get("/a").respond_with().end())
        .mock(mock().get("/b").respond_with().end())
        .http_client(&client)
        .install();

    client.get("http://localhost/a").await.unwrap();

    guard.assert_all_consumed();
}
