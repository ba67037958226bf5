use bytes::Bytes;
use httpstub::prelude::*;

#[tokio::test]
async fn custom_request_matcher_test() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .get("http://example.com/orders")
                .add_matcher(FunctionMatcher::new("tenant", |req, _| {
                    match req.header_values("x-tenant").as_slice() {
                        [tenant] if tenant.starts_with("acme-") => Ok(()),
                        other => Err(format!("unexpected tenant headers {:?}", other)),
                    }
                }))
                .respond_with()
                .status(200)
                .times(2)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let accepted = client
        .request(
            Method::GET,
            "http://example.com/orders",
            vec![("x-tenant", "acme-eu")],
            Bytes::new(),
        )
        .await;
    let rejected = client
        .request(
            Method::GET,
            "http://example.com/orders",
            vec![("x-tenant", "globex")],
            Bytes::new(),
        )
        .await;

    // Assert
    assert_eq!(accepted.unwrap().status(), 200);

    match rejected {
        Err(TransportError::Unmatched(err)) => {
            let errors = err.errors_for(1).unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].matcher, "tenant");
            assert_eq!(errors[0].message, "unexpected tenant headers [\"globex\"]");
        }
        other => panic!("expected an unmatched error, got {:?}", other.map(|r| r.status())),
    }
}
