use crate::{
    common::data::MockResponseTemplate,
    intercept::{cookies::to_set_cookie, error::Error},
};
use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};

/// Guesses a content type for bodies that did not declare one.
fn infer_content_type(body: &Bytes) -> Option<&'static str> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(_) => Some("application/json"),
        Err(_) => Some("text/plain"),
    }
}

/// Builds the HTTP response a mock answers with.
///
/// Declared headers are written as they are. If none of them is a `content-type`, one is inferred
/// from the body. Every declared cookie becomes its own `set-cookie` header.
pub fn synthesize(template: &MockResponseTemplate) -> Result<Response<Bytes>, Error> {
    let status = StatusCode::from_u16(template.status)?;
    let mut builder = Response::builder().status(status);

    let mut has_content_type = false;
    for (name, value) in &template.headers {
        has_content_type |= name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str());
        builder = builder.header(name.as_str(), value.as_str());
    }

    if !has_content_type {
        if let Some(content_type) = infer_content_type(&template.body) {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
    }

    for cookie in &template.cookies {
        builder = builder.header(header::SET_COOKIE, to_set_cookie(cookie));
    }

    builder = builder.header(
        header::CONTENT_LENGTH,
        HeaderValue::from(template.body.len()),
    );

    Ok(builder.body(template.body.clone())?)
}
