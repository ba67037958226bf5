use bytes::Bytes;
use httpstub::prelude::*;

#[tokio::test]
async fn first_matching_mock_answers() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let guard = Interceptor::builder()
        .mock(
            mock()
                .get("http://example.com/user/12345")
                .header("B", "12345")
                .respond_with()
                .status(200)
                .body("mock one")
                .end(),
        )
        .mock(
            mock()
                .get("http://example.com/user/12345")
                .header("A", "12345")
                .respond_with()
                .status(201)
                .body("mock two")
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client
        .request(
            Method::GET,
            "http://example.com/user/12345",
            vec![("A", "12345")],
            Bytes::new(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 201);
    assert_eq!(response.body().as_ref(), b"mock two");
    assert_eq!(guard.registry().unconsumed(), vec![1]);
}

#[tokio::test]
async fn mock_without_headers_answers_when_header_mock_does_not_match() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let guard = Interceptor::builder()
        .mock(
            mock()
                .get("http://example.com/env")
                .header("X-Env", "staging")
                .respond_with()
                .status(200)
                .body("staging")
                .end(),
        )
        .mock(
            mock()
                .get("http://example.com/env")
                .respond_with()
                .status(200)
                .body("any")
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client.get("http://example.com/env").await.unwrap();

    // Assert
    assert_eq!(response.body().as_ref(), b"any");
    assert_eq!(guard.registry().remaining(1), Some(1));
    assert_eq!(guard.registry().remaining(2), Some(0));
}

#[tokio::test]
async fn header_values_match_as_regex_and_presence() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .post("/orders")
                .header("Content-Type", "application/.*json")
                .header_present("X-Request-Id")
                .header_not_present("X-Debug")
                .respond_with()
                .status(202)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client
        .request(
            Method::POST,
            "http://localhost/orders",
            vec![
                ("content-type", "application/vnd.api+json"),
                ("x-request-id", "42"),
            ],
            Bytes::from_static(b"{}"),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn response_headers_are_returned() {
    // Arrange
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .get("/")
                .respond_with()
                .header("X-Trace", "abc")
                .header("Content-Type", "text/csv")
                .body("a,b\n1,2")
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client.get("http://localhost/").await.unwrap();

    // Assert
    assert_eq!(response.headers().get("x-trace").unwrap(), "abc");
    assert_eq!(response.headers().get("content-type").unwrap(), "text/csv");
}
