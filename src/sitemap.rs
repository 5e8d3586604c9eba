use quick_xml::events::Event;
use quick_xml::Reader;

/// Extract every `<url><loc>` value from a sitemap document.
///
/// Elements are matched on local names, so documents with or without a
/// default namespace (or with a prefix) yield the same result. Any parse
/// error logs and returns an empty list: a broken sitemap is a non-fatal
/// outcome for that source, not a run failure.
pub fn extract_article_urls(sitemap_url: &str, xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => {
                    let end = e.to_end().into_owned();
                    match reader.read_text(end.name()) {
                        Ok(text) => {
                            let loc = text.trim().to_string();
                            if !loc.is_empty() {
                                urls.push(loc);
                            }
                        }
                        Err(e) => {
                            tracing::error!("{} => Error Document: {}", sitemap_url, e);
                            return Vec::new();
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"url" {
                    in_url = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("{} => Error Document: {}", sitemap_url, e);
                return Vec::new();
            }
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_DEFAULT_NS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url>
    <loc>https://example.com/b</loc>
    <lastmod>2025-01-01</lastmod>
  </url>
  <url>
    <loc>
      https://example.com/c
    </loc>
  </url>
</urlset>"#;

    const WITHOUT_NS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset>
  <url><loc>https://example.com/a</loc></url>
  <url>
    <loc>https://example.com/b</loc>
    <lastmod>2025-01-01</lastmod>
  </url>
  <url>
    <loc>
      https://example.com/c
    </loc>
  </url>
</urlset>"#;

    const WITH_PREFIX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:url><sm:loc>https://example.com/a</sm:loc></sm:url>
  <sm:url><sm:loc>https://example.com/b</sm:loc></sm:url>
  <sm:url><sm:loc>https://example.com/c</sm:loc></sm:url>
</sm:urlset>"#;

    #[test]
    fn default_namespace_and_bare_documents_extract_the_same_urls() {
        let a = extract_article_urls("test", WITH_DEFAULT_NS);
        let b = extract_article_urls("test", WITHOUT_NS);
        assert_eq!(a, b);
        assert_eq!(
            a,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
            ]
        );
    }

    #[test]
    fn prefixed_namespace_extracts_the_same_urls() {
        let urls = extract_article_urls("test", WITH_PREFIX);
        assert_eq!(
            urls,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
            ]
        );
    }

    #[test]
    fn loc_outside_url_is_ignored() {
        let xml = r#"<sitemapindex><sitemap><loc>https://example.com/other.xml</loc></sitemap></sitemapindex>"#;
        assert!(extract_article_urls("test", xml).is_empty());
    }

    #[test]
    fn malformed_document_yields_empty_list() {
        // Truncated mid end-tag; the <loc> read fails before anything is kept.
        let xml = "<urlset><url><loc>https://example.com/a</loc";
        assert!(extract_article_urls("test", xml).is_empty());
    }
}
