use percent_encoding::percent_decode_str;

/// Percent-decodes a URL; invalid UTF-8 sequences become U+FFFD.
pub fn decode_url(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_persian_slugs() {
        assert_eq!(
            decode_url("https://example.com/blog/%DA%AF%D9%88%D8%B4%DB%8C"),
            "https://example.com/blog/گوشی"
        );
    }

    #[test]
    fn leaves_plain_urls_alone() {
        assert_eq!(decode_url("/shop/widget?a=1"), "/shop/widget?a=1");
        assert_eq!(decode_url("/100%"), "/100%");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_url("/a%FFb"), "/a\u{FFFD}b");
    }
}
