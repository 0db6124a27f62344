use std::collections::BTreeMap;
use std::fmt;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Digest algorithm used for the request signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignType {
    #[default]
    #[serde(rename = "MD5", alias = "md5")]
    Md5,
    #[serde(rename = "SHA1", alias = "sha1")]
    Sha1,
}

impl SignType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignType::Md5 => "MD5",
            SignType::Sha1 => "SHA1",
        }
    }

    /// Length of the hex encoded digest
    pub fn hex_len(&self) -> usize {
        match self {
            SignType::Md5 => 32,
            SignType::Sha1 => 40,
        }
    }

    fn digest_upper_hex(&self, input: &str) -> String {
        match self {
            SignType::Md5 => hex::encode_upper(Md5::digest(input.as_bytes())),
            SignType::Sha1 => hex::encode_upper(Sha1::digest(input.as_bytes())),
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the canonical query string: empty values dropped, keys in byte order,
/// joined as `key=value` pairs with `&`.
pub fn canonical_query_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let sorted: BTreeMap<String, String> = params
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(key, value)| (key.as_ref().to_string(), value.as_ref().to_string()))
        .collect();

    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a parameter set with the merchant key.
///
/// The digest input is the canonical query string followed by `&key=<secret>`.
/// The result is the uppercase hex digest, so the same parameters always yield
/// the same signature whatever order they were supplied in.
pub fn sign<I, K, V>(params: I, secret_key: &str, sign_type: SignType) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let message = format!("{}&key={secret_key}", canonical_query_string(params));
    sign_type.digest_upper_hex(&message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> Vec<(&'static str, &'static str)> {
        vec![
            ("mch_appid", "A"),
            ("mchid", "M"),
            ("nonce_str", "abc"),
            ("amount", "100"),
            ("desc", "d"),
        ]
    }

    #[test]
    fn test_canonical_query_string_sorts_keys() {
        let query = canonical_query_string(sample());
        assert_eq!(query, "amount=100&desc=d&mch_appid=A&mchid=M&nonce_str=abc");
    }

    #[test]
    fn test_canonical_query_string_uses_byte_order() {
        let query = canonical_query_string([("b", "1"), ("B", "2"), ("a_b", "3"), ("ab", "4")]);
        assert_eq!(query, "B=2&a_b=3&ab=4&b=1");
    }

    #[test]
    fn test_sign_is_order_independent() {
        let forward = sign(sample(), "K", SignType::Md5);

        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(forward, sign(reversed, "K", SignType::Md5));

        let hashed: HashMap<String, String> = sample()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(forward, sign(&hashed, "K", SignType::Md5));
    }

    #[test]
    fn test_sign_ignores_empty_values() {
        let base = sign(sample(), "K", SignType::Md5);

        let mut with_empty = sample();
        with_empty.push(("re_user_name", ""));
        assert_eq!(base, sign(with_empty, "K", SignType::Md5));
    }

    #[test]
    fn test_sign_matches_known_digests() {
        // digests of "a=1&key=K"
        assert_eq!(
            sign([("a", "1")], "K", SignType::Md5),
            "EA3D702E18C9ADBB80DB27C87FBD612C"
        );
        assert_eq!(
            sign([("a", "1")], "K", SignType::Sha1),
            "8BFBC609EBF1F87EEE8876125AF98410A89A823F"
        );
    }

    #[test]
    fn test_sign_output_shape() {
        for sign_type in [SignType::Md5, SignType::Sha1] {
            let signature = sign(sample(), "secret", sign_type);
            assert_eq!(signature.len(), sign_type.hex_len());
            assert!(
                signature
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            );
        }
    }

    #[test]
    fn test_sign_is_case_sensitive() {
        let lower = sign([("desc", "hello")], "K", SignType::Md5);
        let upper = sign([("desc", "HELLO")], "K", SignType::Md5);
        assert_ne!(lower, upper);

        assert_ne!(
            sign([("desc", "hello")], "k", SignType::Md5),
            sign([("desc", "hello")], "K", SignType::Md5)
        );
    }

    #[test]
    fn test_sign_type_default_and_display() {
        assert_eq!(SignType::default(), SignType::Md5);
        assert_eq!(SignType::Md5.to_string(), "MD5");
        assert_eq!(SignType::Sha1.to_string(), "SHA1");
    }
}
