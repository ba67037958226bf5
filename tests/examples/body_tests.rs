use httpstub::prelude::*;
use regex::Regex;
use serde_json::json;

#[tokio::test]
async fn json_body_ignores_key_order_and_whitespace() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .post("http://example.com/users")
                .body(r#"{"name":"jon","roles":["admin","dev"]}"#)
                .respond_with()
                .status(201)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client
        .post(
            "http://example.com/users",
            "{\n  \"roles\": [\"admin\", \"dev\"],\n  \"name\": \"jon\"\n}",
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn explicit_json_and_regex_bodies() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .post("/json")
                .json_body(json!({ "a": 1, "b": { "c": [1, 2] } }))
                .respond_with()
                .status(200)
                .end(),
        )
        .mock(
            mock()
                .post("/regex")
                .body_matches(Regex::new(r"^id=\d+$").unwrap())
                .respond_with()
                .status(200)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let json_response = client
        .post("http://localhost/json", r#"{"b":{"c":[1,2]},"a":1}"#)
        .await
        .unwrap();
    let regex_response = client.post("http://localhost/regex", "id=42").await.unwrap();

    // Assert
    assert_eq!(json_response.status(), 200);
    assert_eq!(regex_response.status(), 200);
}

#[tokio::test]
async fn body_mismatch_is_explained_with_a_diff() {
    // Arrange
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .post("/users")
                .json_body(json!({ "name": "jon" }))
                .respond_with()
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let err = client
        .post("http://localhost/users", r#"{"name":"jim"}"#)
        .await
        .unwrap_err();

    // Assert
    let message = err.to_string();
    assert!(message.contains(
        r#"• received body {"name":"jim"} did not match expected mock body {"name":"jon"}"#
    ));
    assert!(message.contains("    -  \"name\": \"jon\""));
    assert!(message.contains("    +  \"name\": \"jim\""));
}

#[tokio::test]
async fn missing_body_is_reported() {
    // Arrange
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(mock().post("/users").body("x").respond_with().end())
        .http_client(&client)
        .install();

    // Act
    let err = client.post("http://localhost/users", "").await.unwrap_err();

    // Assert
    assert!(err.to_string().contains("• expected a body but received none"));
}
