//! Render a request as a curl command for debug logging.

use std::fmt::Write as _;

use reqwest::Request;

/// Bodies at or above this size are left out of the rendered command.
const MAX_BODY_BYTES: usize = 128 * 1024;

/// Render `request` as a copy-pasteable curl command.
///
/// Buffered bodies under the size limit are printed with `--data-raw`;
/// streaming bodies are never read.
pub fn render(request: &Request) -> String {
    let mut out = String::with_capacity(128);
    let _ = write!(
        out,
        "curl -X {} '{}'",
        request.method(),
        escape(request.url().as_str())
    );

    for (name, value) in request.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let _ = write!(out, " \\\n  --header '{}: {}'", name, escape(&value));
    }

    if let Some(body) = request
        .body()
        .and_then(reqwest::Body::as_bytes)
        .filter(|body| !body.is_empty() && body.len() < MAX_BODY_BYTES)
    {
        let body = String::from_utf8_lossy(body);
        let _ = write!(out, " \\\n  --data-raw '{}'", escape(body.trim_end_matches('\n')));
    }

    out
}

fn escape(s: &str) -> String {
    s.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method};

    fn request(method: Method, body: Option<&'static str>) -> Request {
        let mut request = Request::new(method, "http://localhost:8080/users?id=1".parse().unwrap());
        request
            .headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        *request.body_mut() = body.map(reqwest::Body::from);
        request
    }

    #[test]
    fn test_render_with_body() {
        let rendered = render(&request(Method::POST, Some("{\"name\":\"o'neil\"}\n")));
        assert_eq!(
            rendered,
            "curl -X POST 'http://localhost:8080/users?id=1' \\\n  \
             --header 'content-type: application/json' \\\n  \
             --data-raw '{\"name\":\"o'\\''neil\"}'"
        );
    }

    #[test]
    fn test_render_without_body() {
        let rendered = render(&request(Method::GET, None));
        assert!(rendered.starts_with("curl -X GET 'http://localhost:8080/users?id=1'"));
        assert!(!rendered.contains("--data-raw"));
    }

    #[test]
    fn test_large_body_is_omitted() {
        let mut req = request(Method::POST, None);
        *req.body_mut() = Some(reqwest::Body::from(vec![b'a'; MAX_BODY_BYTES]));
        assert!(!render(&req).contains("--data-raw"));
    }

    #[test]
    fn test_render_leaves_body_in_place() {
        let req = request(Method::PUT, Some("payload"));
        let _ = render(&req);
        assert_eq!(req.body().and_then(reqwest::Body::as_bytes), Some(&b"payload"[..]));
    }
}
