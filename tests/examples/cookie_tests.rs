use bytes::Bytes;
use chrono::{TimeZone, Utc};
use httpstub::{parse_set_cookie, prelude::*};

#[tokio::test]
async fn cookie_matching_test() {
    // Arrange
    let _ = env_logger::try_init();
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .get("/")
                .cookie_present("SESSIONID")
                .cookie("SESSIONID", "298zf09hf012fh2")
                .cookie_not_present("TRACKING")
                .respond_with()
                .status(200)
                .end(),
        )
        .http_client(&client)
        .install();

    // Act: Send the request with cookies
    let response = client
        .request(
            Method::GET,
            "http://localhost/",
            vec![(
                "Cookie",
                "OTHERCOOKIE1=01234; SESSIONID=298zf09hf012fh2; OTHERCOOKIE2=56789",
            )],
            Bytes::new(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn cookie_mismatch_names_the_field() {
    // Arrange
    let client = HttpClient::new();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .get("/")
                .cookie("SESSIONID", "expected")
                .respond_with()
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let err = client
        .request(
            Method::GET,
            "http://localhost/",
            vec![("Cookie", "SESSIONID=actual")],
            Bytes::new(),
        )
        .await
        .unwrap_err();

    // Assert
    assert!(err.to_string().contains(
        "• failed to match cookie 'SESSIONID': field Value: expected expected, got actual"
    ));
}

#[tokio::test]
async fn response_cookies_are_set() {
    // Arrange
    let client = HttpClient::new();
    let expires = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();

    let _guard = Interceptor::builder()
        .mock(
            mock()
                .post("/login")
                .respond_with()
                .cookie("theme", "dark")
                .cookies(vec![Cookie::new("session")
                    .value("abc")
                    .path("/")
                    .expires(expires)
                    .http_only(true)])
                .end(),
        )
        .http_client(&client)
        .install();

    // Act
    let response = client.post("http://localhost/login", "").await.unwrap();

    // Assert
    let cookies: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| parse_set_cookie(v.to_str().unwrap()))
        .collect();

    assert_eq!(cookies.len(), 2);
    assert_eq!(cookies[0].name, "theme");
    assert_eq!(cookies[0].value, "dark");
    assert_eq!(cookies[1].name, "session");
    assert_eq!(cookies[1].path, "/");
    assert_eq!(cookies[1].expires, Some(expires));
    assert!(cookies[1].http_only);
    assert!(!cookies[1].secure);
}
