use httpstub::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_use_mock_has_exactly_one_winner() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(mock().get("/ticket").respond_with().status(200).end())
        .http_client(&client)
        .install();

    // Act
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get("http://localhost/ticket").await })
        })
        .collect();

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(res) => {
                assert_eq!(res.status(), 200);
                winners += 1;
            }
            Err(TransportError::Unmatched(err)) => {
                assert!(err.exhausted().contains(&1));
                losers += 1;
            }
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    // Assert
    assert_eq!(winners, 1);
    assert_eq!(losers, 31);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_consume_all_uses() {
    // Arrange
    let client = HttpClient::new();

    let guard = Interceptor::builder()
        .mock(mock().get("/a").respond_with().status(200).times(10).end())
        .mock(mock().get("/b").respond_with().status(201).times(10).end())
        .http_client(&client)
        .install();

    // Act
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            let path = if i % 2 == 0 { "a" } else { "b" };
            tokio::spawn(async move { client.get(&format!("http://localhost/{}", path)).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    // Assert
    guard.assert_all_consumed();
}
