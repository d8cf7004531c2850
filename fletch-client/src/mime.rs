//! Content-type strings sent on the wire.

/// JSON bodies.
pub const JSON: &str = "application/json;charset=utf-8";
/// URL-encoded form bodies.
pub const FORM: &str = "application/x-www-form-urlencoded";
/// XML bodies.
pub const XML: &str = "application/xml;charset=utf-8";
/// YAML bodies.
pub const YAML: &str = "application/x-yaml;charset=utf-8";
/// Protobuf bodies.
pub const PROTOBUF: &str = "application/x-protobuf";
/// Opaque byte streams.
pub const OCTET_STREAM: &str = "application/octet-stream";
/// JPEG image stream.
pub const JPEG: &str = "image/jpeg";
/// GIF image stream.
pub const GIF: &str = "image/gif";
/// PNG image stream.
pub const PNG: &str = "image/png";
/// MPEG-4 video stream.
pub const MP4: &str = "video/mpeg4";
