use httpstub::prelude::*;

#[tokio::test]
async fn unmatched_request_explains_every_mock() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .get("http://example.com/user/1")
                .respond_with()
                .status(200)
                .end(),
        )
        .mock(
            mock()
                .post("http://example.com/user/2")
                .respond_with()
                .status(200)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let err = match client.get("http://example.org/user/2").await {
        Err(TransportError::Unmatched(err)) => err,
        other => panic!("expected an unmatched error, got {:?}", other.map(|r| r.status())),
    };

    // Assert
    let first: Vec<&str> = err
        .errors_for(1)
        .unwrap()
        .iter()
        .map(|e| e.matcher.as_str())
        .collect();
    assert_eq!(first, vec!["path", "host"]);

    let second: Vec<&str> = err
        .errors_for(2)
        .unwrap()
        .iter()
        .map(|e| e.matcher.as_str())
        .collect();
    assert_eq!(second, vec!["host", "method"]);

    assert_eq!(
        err.to_string(),
        "received request did not match any mocks\n\n\
         Mock 1 mismatches:\n\
         • received path /user/2 did not match mock path /user/1\n\
         • received host example.org did not match mock host example.com\n\n\
         Mock 2 mismatches:\n\
         • received host example.org did not match mock host example.com\n\
         • received method GET did not match mock method POST\n\n"
    );
}

#[tokio::test]
async fn single_attribute_mismatch_yields_one_error() {
    // Arrange
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(mock().get("http://example.com/a").respond_with().end())
        .http_client(&client)
        .install();

    // Act
    let result = client.get("https://example.com/a").await;

    // Assert
    match result {
        Err(TransportError::Unmatched(err)) => {
            let errors = err.errors_for(1).unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].matcher, "scheme");
            assert_eq!(
                errors[0].message,
                "received scheme https did not match mock scheme http"
            );
        }
        other => panic!("expected an unmatched error, got {:?}", other.map(|r| r.status())),
    }
}

#[tokio::test]
async fn each_changed_attribute_is_reported_by_its_own_matcher() {
    // Arrange
    let _ = env_logger::try_init();
    let url = "http://example.com/a";
    let cases: Vec<(&str, Mock, Method, &str, Vec<(&str, &str)>, &str)> = vec![
        (
            "path",
            mock().get(url).respond_with().end(),
            Method::GET,
            "http://example.com/b",
            vec![],
            "",
        ),
        (
            "host",
            mock().get(url).respond_with().end(),
            Method::GET,
            "http://example.org/a",
            vec![],
            "",
        ),
        (
            "scheme",
            mock().get(url).respond_with().end(),
            Method::GET,
            "https://example.com/a",
            vec![],
            "",
        ),
        (
            "method",
            mock().post(url).respond_with().end(),
            Method::GET,
            url,
            vec![],
            "",
        ),
        (
            "method",
            mock().request("get", url).respond_with().end(),
            Method::GET,
            url,
            vec![],
            "",
        ),
        (
            "header",
            mock().get(url).header("X-Env", "staging").respond_with().end(),
            Method::GET,
            url,
            vec![("X-Env", "production")],
            "",
        ),
        (
            "header_present",
            mock().get(url).header_present("X-Id").respond_with().end(),
            Method::GET,
            url,
            vec![],
            "",
        ),
        (
            "header_not_present",
            mock().get(url).header_not_present("X-Debug").respond_with().end(),
            Method::GET,
            url,
            vec![("X-Debug", "1")],
            "",
        ),
        (
            "query",
            mock().get(url).query("q", "1").respond_with().end(),
            Method::GET,
            "http://example.com/a?q=2",
            vec![],
            "",
        ),
        (
            "query_present",
            mock().get(url).query_present("q").respond_with().end(),
            Method::GET,
            url,
            vec![],
            "",
        ),
        (
            "query_not_present",
            mock().get(url).query_not_present("q").respond_with().end(),
            Method::GET,
            "http://example.com/a?q=1",
            vec![],
            "",
        ),
        (
            "form",
            mock().post(url).form_field("f", "1").respond_with().end(),
            Method::POST,
            url,
            vec![],
            "f=2",
        ),
        (
            "form_present",
            mock().post(url).form_present("f").respond_with().end(),
            Method::POST,
            url,
            vec![],
            "g=1",
        ),
        (
            "form_not_present",
            mock().post(url).form_not_present("f").respond_with().end(),
            Method::POST,
            url,
            vec![],
            "f=1",
        ),
        (
            "body",
            mock().post(url).body("hello").respond_with().end(),
            Method::POST,
            url,
            vec![],
            "world",
        ),
        (
            "cookie",
            mock().get(url).cookie("session", "abc").respond_with().end(),
            Method::GET,
            url,
            vec![("Cookie", "session=xyz")],
            "",
        ),
        (
            "cookie_present",
            mock().get(url).cookie_present("session").respond_with().end(),
            Method::GET,
            url,
            vec![],
            "",
        ),
        (
            "cookie_not_present",
            mock().get(url).cookie_not_present("session").respond_with().end(),
            Method::GET,
            url,
            vec![("Cookie", "session=abc")],
            "",
        ),
    ];

    for (matcher, declared, method, uri, headers, body) in cases {
        let client = HttpClient::new();
        let _guard = Interceptor::builder()
            .mock(declared)
            .http_client(&client)
            .install();

        // Act
        let result = client
            .request(method, uri, headers, bytes::Bytes::from(body))
            .await;

        // Assert
        match result {
            Err(TransportError::Unmatched(err)) => {
                let errors = err.errors_for(1).unwrap();
                assert_eq!(errors.len(), 1, "{}: {:?}", matcher, errors);
                assert_eq!(errors[0].matcher, matcher);
            }
            other => panic!(
                "{}: expected an unmatched error, got {:?}",
                matcher,
                other.map(|r| r.status())
            ),
        }
    }
}
