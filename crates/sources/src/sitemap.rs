use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::decode::decode_url;
use crate::error::{Result, SourceError};

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Other,
    Url,
    Loc,
}

/// Page URLs listed in a sitemap document, in document order.
///
/// Only `<loc>` elements that are the first `loc` child of a `<url>` child of
/// the root count, and both must be in the sitemap namespace. Values are
/// trimmed and percent-decoded; blank ones are dropped.
pub fn parse_sitemap_str(xml: &str) -> Result<Vec<String>> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut saw_root = false;
    let mut url_has_loc = false;
    let mut loc_text: Option<String> = None;
    let mut urls = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        let sitemap_ns = in_sitemap_namespace(&ns);
        match event {
            Event::Start(start) => {
                saw_root = true;
                let node = match (stack.len(), start.local_name().as_ref()) {
                    (1, b"url") if sitemap_ns => Node::Url,
                    (2, b"loc") if sitemap_ns && stack[1] == Node::Url && !url_has_loc => {
                        Node::Loc
                    }
                    _ => Node::Other,
                };
                match node {
                    Node::Url => url_has_loc = false,
                    Node::Loc => loc_text = Some(String::new()),
                    Node::Other => {}
                }
                stack.push(node);
            }
            Event::Empty(empty) => {
                saw_root = true;
                let is_first_loc = stack.len() == 2
                    && stack[1] == Node::Url
                    && sitemap_ns
                    && empty.local_name().as_ref() == b"loc";
                if is_first_loc {
                    url_has_loc = true;
                }
            }
            Event::Text(text) => {
                if stack.last() == Some(&Node::Loc) {
                    let text = text.unescape().map_err(xml_error)?;
                    if let Some(buf) = loc_text.as_mut() {
                        buf.push_str(&text);
                    }
                }
            }
            Event::CData(cdata) => {
                if stack.last() == Some(&Node::Loc) {
                    if let Some(buf) = loc_text.as_mut() {
                        buf.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
            }
            Event::End(_) => {
                if stack.pop() == Some(Node::Loc) {
                    url_has_loc = true;
                    if let Some(loc) = loc_text.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            urls.push(decode_url(loc));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(SourceError::XmlError("no root element".to_string()));
    }
    if !stack.is_empty() {
        return Err(SourceError::XmlError(format!(
            "document ended with {} unclosed element(s)",
            stack.len()
        )));
    }
    Ok(urls)
}

pub fn parse_sitemap_file(path: &Path) -> Result<Vec<String>> {
    let xml = std::fs::read_to_string(path)?;
    parse_sitemap_str(&xml)
}

/// Union of all URLs across sitemap files, first occurrence wins.
///
/// A file that cannot be read or parsed is logged and skipped.
pub fn collect_sitemaps(paths: &[PathBuf]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for path in paths {
        match parse_sitemap_file(path) {
            Ok(found) => {
                log::info!("Loaded {} URLs from {}", found.len(), path.display());
                for url in found {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
            }
            Err(err) => {
                log::error!("Skipping sitemap {}: {err}", path.display());
            }
        }
    }

    urls
}

fn in_sitemap_namespace(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NAMESPACE.as_bytes())
}

fn xml_error(err: quick_xml::Error) -> SourceError {
    SourceError::XmlError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc> https://example.com/blog/a </loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>https://example.com/shop/%DA%AF%D9%88%D8%B4%DB%8C</loc></url>
  <url><loc>   </loc></url>
  <url><loc>https://example.com/a&amp;b</loc><loc>https://example.com/second</loc></url>
</urlset>"#;

    #[test]
    fn reads_namespaced_locs() {
        let urls = parse_sitemap_str(SITEMAP).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/blog/a",
                "https://example.com/shop/گوشی",
                "https://example.com/a&b",
            ]
        );
    }

    #[test]
    fn prefixed_namespace_is_accepted() {
        let xml = r#"<s:urlset xmlns:s="http://www.sitemaps.org/schemas/sitemap/0.9">
            <s:url><s:loc>/x</s:loc></s:url>
        </s:urlset>"#;
        assert_eq!(parse_sitemap_str(xml).unwrap(), vec!["/x"]);
    }

    #[test]
    fn elements_outside_namespace_are_ignored() {
        let xml = "<urlset><url><loc>/x</loc></url></urlset>";
        assert!(parse_sitemap_str(xml).unwrap().is_empty());
    }

    #[test]
    fn nested_locs_are_ignored() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><image><loc>/img.png</loc></image><loc>/page</loc></url>
            <group><url><loc>/deep</loc></url></group>
        </urlset>"#;
        assert_eq!(parse_sitemap_str(xml).unwrap(), vec!["/page"]);
    }

    #[test]
    fn cdata_loc_is_read() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc><![CDATA[/cdata?a=1&b=2]]></loc></url>
        </urlset>"#;
        assert_eq!(parse_sitemap_str(xml).unwrap(), vec!["/cdata?a=1&b=2"]);
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(parse_sitemap_str("").is_err());
        assert!(parse_sitemap_str("<urlset><url></urlset>").is_err());
    }

    #[test]
    fn collect_dedups_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.xml");
        let second = dir.path().join("b.xml");
        let broken = dir.path().join("broken.xml");
        std::fs::write(&first, SITEMAP).unwrap();
        std::fs::write(
            &second,
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/blog/a</loc></url>
                <url><loc>https://example.com/new</loc></url>
            </urlset>"#,
        )
        .unwrap();
        std::fs::write(&broken, "<urlset><url>").unwrap();

        let urls = collect_sitemaps(&[
            first,
            broken,
            dir.path().join("missing.xml"),
            second,
        ]);
        assert_eq!(
            urls,
            vec![
                "https://example.com/blog/a",
                "https://example.com/shop/گوشی",
                "https://example.com/a&b",
                "https://example.com/new",
            ]
        );
    }
}
