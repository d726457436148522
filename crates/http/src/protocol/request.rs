//! HTTP request head handling.
//!
//! The parser hands a [`RequestHeader`] to the connection once the head of a
//! request has been read. The body is read separately through the connection's
//! input.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// The head of an HTTP request: method, uri, version and header fields.
///
/// Wraps a `http::Request<()>` so that the body can be attached later with
/// [`RequestHeader::body`].
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body, converting the head into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let put = RequestHeader::from(Request::put("/upload?part=1").version(Version::HTTP_10).body(()).unwrap());
        assert_eq!(put.method(), &Method::PUT);
        assert_eq!(put.uri().query(), Some("part=1"));
        assert_eq!(put.version(), Version::HTTP_10);
        assert!(put.headers().is_empty());
    }

    #[test]
    fn attach_body() {
        let header = RequestHeader::from(Request::post("/echo").header("Host", "x").body(()).unwrap());
        let request = header.body(b"hello".to_vec());
        assert_eq!(request.uri().path(), "/echo");
        assert_eq!(request.headers().get("host").unwrap(), "x");
        assert_eq!(request.body(), b"hello");
    }
}
