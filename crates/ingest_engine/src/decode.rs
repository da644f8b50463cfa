use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bytes are not valid {encoding}")]
pub struct DecodeError {
    pub encoding: &'static str,
}

/// Decode a fetched page to UTF-8.
///
/// Order of precedence: byte order mark, then the `charset` parameter of the
/// Content-Type header, then `chardetng` detection hinted by the URL's
/// top-level domain. Malformed sequences for the chosen encoding are an
/// error rather than being replaced.
pub fn decode_page(
    bytes: &[u8],
    content_type: Option<&str>,
    url: Option<&Url>,
) -> Result<String, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_strict(&bytes[bom_len..], encoding);
    }

    if let Some(encoding) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_strict(bytes, encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return decode_strict(bytes, UTF_8);
    }

    let tld = url.and_then(Url::host_str).and_then(top_level_domain);
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(tld.map(str::as_bytes), true);
    decode_strict(bytes, encoding)
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(DecodeError {
            encoding: encoding.name(),
        })
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

fn top_level_domain(host: &str) -> Option<&str> {
    host.rsplit('.')
        .next()
        .filter(|tld| !tld.is_empty() && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_param_is_case_insensitive_and_unquoted() {
        assert_eq!(
            charset_param("text/html; Charset=\"ISO-8859-1\""),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_param("text/html"), None);
    }

    #[test]
    fn numeric_hosts_have_no_tld_hint() {
        assert_eq!(top_level_domain("127.0.0.1"), None);
        assert_eq!(top_level_domain("example.jp"), Some("jp"));
    }
}
