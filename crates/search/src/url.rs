//! Path segments and slugs of absolute or relative URLs.

use percent_encoding::percent_decode_str;
use url::Url;

/// Base that relative inputs such as `/blog/post` are resolved against.
const RELATIVE_BASE: &str = "http://relative.invalid/";

fn parse(url: &str) -> Option<Url> {
    let base = Url::parse(RELATIVE_BASE).ok()?;
    match Url::options().base_url(Some(&base)).parse(url.trim()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log::debug!("Unparseable URL '{url}': {err}");
            None
        }
    }
}

/// Percent-decoded path components, empty ones included.
///
/// `Url` re-encodes non-ASCII characters, so each component is decoded
/// again to keep slugs such as `گوشی` readable.
pub fn path_components(url: &str) -> Vec<String> {
    let Some(parsed) = parse(url) else {
        return Vec::new();
    };
    let Some(components) = parsed.path_segments() else {
        return Vec::new();
    };
    components
        .map(|c| percent_decode_str(c).decode_utf8_lossy().into_owned())
        .collect()
}

/// Non-empty `/`-separated path components, in order.
pub fn segments(url: &str) -> Vec<String> {
    path_components(url)
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn primary_segment(url: &str) -> String {
    segments(url).into_iter().next().unwrap_or_default()
}

pub fn slug(url: &str) -> String {
    segments(url).pop().unwrap_or_default()
}

/// Last path component, empty when the path ends in `/`.
pub fn last_path_component(url: &str) -> String {
    path_components(url).pop().unwrap_or_default()
}

/// Word tokens of a slug: `-`, `_` and whitespace separate words. Case is kept.
pub fn tokenize(slug: &str) -> Vec<&str> {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Segments of a URL computed once and reused for every comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlShape {
    segments: Vec<String>,
}

impl UrlShape {
    pub fn parse(url: &str) -> Self {
        Self {
            segments: segments(url),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn primary_segment(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    pub fn slug(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn components_of_absolute_and_relative_urls() {
        assert_eq!(
            path_components("https://example.com/blog/post?x=1#top"),
            vec!["blog", "post"]
        );
        assert_eq!(path_components("https://example.com"), vec![""]);
        assert_eq!(path_components("//cdn.example.com/a/b"), vec!["a", "b"]);
        assert_eq!(path_components("/shop/widget"), vec!["shop", "widget"]);
        assert_eq!(path_components("shop/widget#frag"), vec!["shop", "widget"]);
    }

    #[test]
    fn persian_slugs_stay_decoded() {
        let url = "https://example.com/فروشگاه/گوشی-موبایل";
        assert_eq!(segments(url), vec!["فروشگاه", "گوشی-موبایل"]);
        assert_eq!(slug(url), "گوشی-موبایل");
        assert_eq!(primary_segment("/وبلاگ/پست"), "وبلاگ");
        assert_eq!(slug("/blog/my post"), "my post");
        assert_eq!(slug("/discount/100%"), "100%");
    }

    #[test]
    fn last_component_keeps_trailing_slash() {
        assert_eq!(last_path_component("https://example.com/maps/post.xml?p=2"), "post.xml");
        assert_eq!(last_path_component("https://example.com/maps/"), "");
        assert_eq!(last_path_component("https://example.com"), "");
    }

    #[test]
    fn segments_drop_empty_components() {
        assert_eq!(segments("https://example.com//blog///my-post/"), vec!["blog", "my-post"]);
        assert!(segments("https://example.com/").is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn primary_segment_and_slug() {
        let url = "https://example.com/shop/electronics/phone-123";
        assert_eq!(primary_segment(url), "shop");
        assert_eq!(slug(url), "phone-123");
        assert_eq!(primary_segment("https://example.com"), "");
        assert_eq!(slug("https://example.com"), "");
        assert_eq!(slug("/blog/"), "blog");
    }

    #[test]
    fn tokenize_keeps_case_and_script() {
        assert_eq!(tokenize("My_Post-title  two"), vec!["My", "Post", "title", "two"]);
        assert_eq!(tokenize("گوشی-موبایل_سامسونگ"), vec!["گوشی", "موبایل", "سامسونگ"]);
        assert!(tokenize("--__").is_empty());
    }

    #[test]
    fn shape_matches_free_functions() {
        let url = "https://example.com/blog/category/news";
        let shape = UrlShape::parse(url);
        assert_eq!(shape.segments(), ["blog", "category", "news"]);
        assert_eq!(shape.primary_segment(), primary_segment(url));
        assert_eq!(shape.slug(), slug(url));
        assert_eq!(shape.depth(), 3);
        assert_eq!(UrlShape::parse("/").primary_segment(), "");
    }
}
