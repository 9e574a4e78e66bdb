//! Response value rendered by handlers.

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode};

/// Content types set by the typed constructors.
pub(crate) mod content_types {
    use http::HeaderValue;

    pub static TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
    pub static TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");
    pub static APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");
}

/// Status, headers and a fully buffered body.
///
/// Not `Clone`: a response is rendered once and moved to the client.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    fn with_type(status: StatusCode, content_type: &HeaderValue, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(header::CONTENT_TYPE, content_type.clone());
        Self { status, headers, body }
    }

    /// 200 with `body` and no content type.
    #[inline]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::empty(StatusCode::OK).with_body(body)
    }

    /// 200 `text/plain`.
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::with_type(StatusCode::OK, &content_types::TEXT_PLAIN, body.into())
    }

    /// 200 `text/html`.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::with_type(StatusCode::OK, &content_types::TEXT_HTML, body.into())
    }

    /// 200 `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::with_type(StatusCode::OK, &content_types::APPLICATION_JSON, body.into())
    }

    /// `status` with its canonical reason phrase as body.
    #[inline]
    pub fn status_only(status: StatusCode) -> Self {
        Self::empty(status).with_body(Bytes::from_static(
            status.canonical_reason().unwrap_or("").as_bytes(),
        ))
    }

    /// `status` with a Location header. An unrepresentable location is left out.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let mut response = Self::empty(status);
        if let Ok(value) = HeaderValue::try_from(location) {
            response.headers.insert(header::LOCATION, value);
        }
        response
    }

    /// 500 with `msg` as body.
    pub fn internal_error(msg: &str) -> Self {
        Self::empty(StatusCode::INTERNAL_SERVER_ERROR).with_body(Bytes::copy_from_slice(msg.as_bytes()))
    }

    /// `status` with no headers and no body.
    #[inline]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    #[inline]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Header value by name, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing earlier values. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<Response> for http::Response<Bytes> {
    fn from(res: Response) -> Self {
        let mut http_res = http::Response::new(res.body);
        *http_res.status_mut() = res.status;
        *http_res.headers_mut() = res.headers;
        http_res
    }
}
