//! YAML codec.

use serde::de::DeserializeOwned;

use super::{pooled_body, unsupported};
use crate::{HttpClientError, Payload, Result};

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    match payload {
        Payload::Record(record) => pooled_body(|buf| record.encode_yaml(buf)),
        Payload::Form(values) => pooled_body(|buf| {
            serde_yaml::to_writer(buf, &values).map_err(|e| HttpClientError::encode("yaml", e))
        }),
        other => Err(unsupported("yaml", &other)),
    }
}

/// Decode a YAML body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_yaml::from_slice(body).map_err(|e| HttpClientError::decode("yaml", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Codec;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        user: User,
    }

    #[test]
    fn test_round_trip() {
        let user = User {
            name: "aha".into(),
            age: 1,
        };
        let body = Codec::Yaml.encode(Payload::record(&user)).unwrap().unwrap();
        let decoded: User = decode(body.as_bytes().unwrap()).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_decode_nested() {
        let text = "user:\n  name: \"caster\"\n  age: 1\n";
        let wrapper: Wrapper = decode(text.as_bytes()).unwrap();
        assert_eq!(wrapper.user.name, "caster");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(Codec::Yaml.content_type(), "application/x-yaml;charset=utf-8");
    }
}
