//! Streaming extraction of page URLs from sitemap XML.
//!
//! A sitemap lists pages as `<url><loc>…</loc></url>`, but image extensions
//! nest their own `<loc>` inside the same `<url>`:
//!
//! ```xml
//! <url>
//!   <loc>https://example.com/page</loc>
//!   <image:image>
//!     <image:loc>https://example.com/photo.png</image:loc>
//!   </image:image>
//! </url>
//! ```
//!
//! Only the first kind is a page. The parser reads the document one event at a
//! time and keeps two flags, "inside `<url>`" and "inside `<image>`", to tell the
//! two apart. Names are matched on their local part, so namespace prefixes do
//! not matter. The document itself is never held in memory.
//!
//! The flags are flipped by start and end tags only, so unusual but well-formed
//! nesting (a `<url>` inside a `<url>`, say) can leave them out of step with
//! the real structure. That is accepted: such documents parse without error and
//! simply yield fewer URLs.
//!
//! Collected URLs are otherwise passed through as written, with one exception:
//! whitespace around the text of a `<loc>` is stripped. Pretty-printed
//! sitemaps often wrap their URLs in newlines, and those would otherwise end
//! up in the `Location` header. Nothing inside the URL is touched.
//!
//! ## Examples
//!
//! ```rust
//! use sitred_core::sitemap;
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
//!         xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
//!   <url>
//!     <loc>https://example.com/page</loc>
//!     <image:image><image:loc>https://example.com/photo.png</image:loc></image:image>
//!   </url>
//! </urlset>"#;
//!
//! assert_eq!(sitemap::parse(xml.as_bytes())?, ["https://example.com/page"]);
//! # Ok::<(), sitred_core::Error>(())
//! ```

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::Event;
use tokio::io::AsyncBufRead;
use tracing::{debug, instrument};

use crate::{Error, Result};

/// Initial capacity of the URL list.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Parse a sitemap from a synchronous reader.
///
/// Returns every page `<loc>` in document order, duplicates included. A
/// document without `<url>` elements yields an empty list.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the XML is malformed or truncated, and
/// [`Error::Io`] if the reader fails. No partial result is returned.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut reader = configure(Reader::from_reader(reader));
    let mut collector = LocCollector::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(e, reader.error_position()))?;
        if collector.feed(event)?.is_done() {
            break;
        }
        buf.clear();
    }

    Ok(collector.finish())
}

/// Parse a sitemap from an asynchronous reader, such as an HTTP body.
///
/// Behaves exactly like [`parse`]. The reader is only awaited when its buffer
/// runs dry, so a response body can be parsed while it is still arriving.
///
/// # Errors
///
/// Same as [`parse`].
#[instrument(level = "debug", skip_all)]
pub async fn parse_async<R: AsyncBufRead + Unpin>(reader: R) -> Result<Vec<String>> {
    let mut reader = configure(Reader::from_reader(reader));
    let mut collector = LocCollector::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into_async(&mut buf)
            .await
            .map_err(|e| xml_error(e, reader.error_position()))?;
        if collector.feed(event)?.is_done() {
            break;
        }
        buf.clear();
    }

    let urls = collector.finish();
    debug!(count = urls.len(), "parsed sitemap");
    Ok(urls)
}

fn configure<R>(mut reader: Reader<R>) -> Reader<R> {
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.check_end_names = true;
    reader
}

fn xml_error(err: quick_xml::Error, position: impl std::fmt::Display) -> Error {
    match err {
        quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
        other => Error::Parse(format!("XML parse error at position {position}: {other}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
}

impl Step {
    const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Text of the `<loc>` currently being collected.
#[derive(Debug)]
struct OpenLoc {
    depth: usize,
    text: String,
}

#[derive(Debug)]
struct LocCollector {
    urls: Vec<String>,
    in_url: bool,
    in_image: bool,
    depth: usize,
    open: Option<OpenLoc>,
}

impl Default for LocCollector {
    fn default() -> Self {
        Self {
            urls: Vec::with_capacity(DEFAULT_CAPACITY),
            in_url: false,
            in_image: false,
            depth: 0,
            open: None,
        }
    }
}

impl LocCollector {
    fn feed(&mut self, event: Event<'_>) -> Result<Step> {
        match event {
            Event::Start(e) => {
                self.depth += 1;
                // Markup nested inside a collected <loc> belongs to that loc.
                if self.open.is_some() {
                    return Ok(Step::Continue);
                }
                match e.local_name().as_ref() {
                    b"url" => self.in_url = true,
                    b"image" => self.in_image = true,
                    b"loc" if self.in_url && !self.in_image => {
                        self.open = Some(OpenLoc {
                            depth: self.depth,
                            text: String::new(),
                        });
                    },
                    _ => {},
                }
            },
            Event::End(e) => {
                let depth = self.depth;
                self.depth = self.depth.saturating_sub(1);
                if let Some(loc) = self.open.take_if(|loc| loc.depth == depth) {
                    self.urls.push(loc.text.trim().to_owned());
                } else if self.open.is_none() {
                    match e.local_name().as_ref() {
                        b"url" => self.in_url = false,
                        b"image" => self.in_image = false,
                        _ => {},
                    }
                }
            },
            Event::Text(e) => {
                let depth = self.depth;
                if let Some(loc) = self.open.as_mut().filter(|loc| loc.depth == depth) {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Parse(format!("XML parse error: {e}")))?;
                    loc.text.push_str(&text);
                }
            },
            Event::CData(e) => {
                let depth = self.depth;
                if let Some(loc) = self.open.as_mut().filter(|loc| loc.depth == depth) {
                    let text = std::str::from_utf8(&e)
                        .map_err(|e| Error::Parse(format!("XML parse error: {e}")))?;
                    loc.text.push_str(text);
                }
            },
            Event::Eof => {
                if self.depth > 0 {
                    return Err(Error::Parse(format!(
                        "XML parse error: unexpected end of document with {} unclosed element(s)",
                        self.depth
                    )));
                }
                return Ok(Step::Done);
            },
            _ => {},
        }

        Ok(Step::Continue)
    }

    fn finish(self) -> Vec<String> {
        self.urls
    }
}
