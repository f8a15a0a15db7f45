#![allow(dead_code)]

use std::path::PathBuf;

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
}

/// Generate a sitemap with `count` pages, every third one carrying an image.
pub fn large_sitemap(count: usize) -> String {
    let mut xml = String::with_capacity(count * 160);
    xml.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
"#,
    );
    for i in 0..count {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>https://example.com/page/{i}</loc>\n"));
        xml.push_str("    <lastmod>2024-01-15</lastmod>\n");
        if i % 3 == 0 {
            xml.push_str(&format!(
                "    <image:image><image:loc>https://example.com/img/{i}.jpg</image:loc></image:image>\n"
            ));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}
