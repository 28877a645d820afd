// =============================================================================
// sources/papers.rs: ARXIV, IN ATOM
// =============================================================================
//
// GET https://export.arxiv.org/api/query
//       ?search_query=all:artificial intelligence&start=0&max_results=5
//       &sortBy=submittedDate&sortOrder=descending
//
// arXiv answers with an Atom feed:
//
// <feed xmlns="http://www.w3.org/2005/Atom">
//   <entry>
//     <title>Some Paper About Transformers</title>
//     <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
//     <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related"/>
//     ...
//   </entry>
// </feed>
//
// Rules, all of them strict:
//   - only `entry` elements directly under the root count
//   - per entry, the FIRST `title` child gives the title text and the FIRST
//     `link` child gives the href
//   - matching is by Atom namespace, not by prefix
//   - an entry missing its title or link element, or any XML error anywhere,
//     fails the whole feed. No partial results.
// =============================================================================

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::FetchError;
use crate::models::{Record, ResultSet, Source};
use crate::sources::{Upstream, RESULT_LIMIT};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const SEARCH_QUERY: &str = "all:artificial intelligence";

/// Depth of the root element once it is open.
const ROOT_DEPTH: usize = 1;
const ENTRY_DEPTH: usize = ROOT_DEPTH + 1;
const ENTRY_CHILD_DEPTH: usize = ENTRY_DEPTH + 1;

pub async fn fetch(upstream: &Upstream) -> ResultSet {
    let params = [
        ("search_query", SEARCH_QUERY),
        ("start", "0"),
        ("max_results", RESULT_LIMIT),
        ("sortBy", "submittedDate"),
        ("sortOrder", "descending"),
    ];

    let result = match upstream
        .get_text(Source::Papers, &upstream.config().papers_url, &params)
        .await
    {
        Ok(body) => parse(&body),
        Err(e) => Err(e),
    };

    upstream.settle(Source::Papers, result, Vec::new)
}

/// An entry between its start and end tags.
#[derive(Default)]
struct PendingEntry {
    /// Outer `Some` once the first `<title>` has closed.
    title: Option<Option<String>>,
    /// Outer `Some` once the first `<link>` has been seen.
    link: Option<Option<String>>,
    /// Text collected while inside the first `<title>`.
    title_buf: Option<String>,
    /// Set once `<title>` opens a child. Only text before it counts.
    title_sealed: bool,
}

impl PendingEntry {
    fn open_child(&mut self, e: &BytesStart, self_closing: bool) -> Result<(), FetchError> {
        match e.local_name().as_ref() {
            b"title" if self.title.is_none() && self.title_buf.is_none() => {
                if self_closing {
                    self.title = Some(None);
                } else {
                    self.title_buf = Some(String::new());
                }
            }
            b"link" if self.link.is_none() => {
                self.link = Some(href(e)?);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Record, FetchError> {
        let title = self
            .title
            .ok_or_else(|| FetchError::Xml("entry without a title element".to_string()))?;
        let url = self
            .link
            .ok_or_else(|| FetchError::Xml("entry without a link element".to_string()))?;
        Ok(Record { title, url })
    }

    fn push_title_text(&mut self, text: &str) {
        if self.title_sealed {
            return;
        }
        if let Some(buf) = self.title_buf.as_mut() {
            buf.push_str(text);
        }
    }
}

/// Parse an Atom feed body into one record per entry, in document order.
pub fn parse(body: &str) -> Result<ResultSet, FetchError> {
    let mut reader = NsReader::from_str(body);
    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut root_closed = false;
    let mut entry: Option<PendingEntry> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let in_atom = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == ATOM_NS);

        match event {
            Event::Start(e) => {
                if root_closed {
                    return Err(junk_after_root());
                }
                depth += 1;
                seen_root = true;
                seal_title(&mut entry, depth);
                open_element(&mut entry, &e, depth, in_atom, false)?;
            }
            Event::Empty(e) => {
                if root_closed {
                    return Err(junk_after_root());
                }
                seen_root = true;
                if depth == 0 {
                    root_closed = true;
                }
                seal_title(&mut entry, depth + 1);
                if depth + 1 == ENTRY_DEPTH && in_atom && e.local_name().as_ref() == b"entry" {
                    // `<entry/>`: an entry with neither title nor link.
                    PendingEntry::default().finish()?;
                }
                open_element(&mut entry, &e, depth + 1, in_atom, true)?;
            }
            Event::Text(t) => {
                if depth == 0 {
                    if !t.iter().all(u8::is_ascii_whitespace) {
                        return Err(FetchError::Xml("text outside the root element".to_string()));
                    }
                } else if depth == ENTRY_CHILD_DEPTH {
                    if let Some(pending) = entry.as_mut() {
                        pending.push_title_text(&t.unescape().map_err(quick_xml::Error::from)?);
                    }
                }
            }
            Event::CData(c) => {
                if depth == 0 {
                    return Err(FetchError::Xml("CDATA outside the root element".to_string()));
                }
                if depth == ENTRY_CHILD_DEPTH {
                    if let Some(pending) = entry.as_mut() {
                        pending.push_title_text(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Event::End(_) => {
                if depth == ENTRY_CHILD_DEPTH {
                    if let Some(pending) = entry.as_mut() {
                        if let Some(buf) = pending.title_buf.take() {
                            pending.title = Some((!buf.is_empty()).then_some(buf));
                        }
                    }
                } else if depth == ENTRY_DEPTH {
                    if let Some(pending) = entry.take() {
                        records.push(pending.finish()?);
                    }
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(FetchError::Xml("no root element".to_string()));
    }
    if depth != 0 {
        return Err(FetchError::Xml("document ended inside an element".to_string()));
    }

    Ok(records)
}

fn junk_after_root() -> FetchError {
    FetchError::Xml("element after the root element".to_string())
}

/// An element opening at `depth` inside an open `<title>` ends its text.
fn seal_title(entry: &mut Option<PendingEntry>, depth: usize) {
    if depth > ENTRY_CHILD_DEPTH {
        if let Some(pending) = entry.as_mut().filter(|p| p.title_buf.is_some()) {
            pending.title_sealed = true;
        }
    }
}

/// Handle an opening (or self-closing) tag sitting at `depth`.
fn open_element(
    entry: &mut Option<PendingEntry>,
    e: &BytesStart,
    depth: usize,
    in_atom: bool,
    self_closing: bool,
) -> Result<(), FetchError> {
    if !in_atom {
        return Ok(());
    }
    match depth {
        ENTRY_DEPTH if !self_closing && e.local_name().as_ref() == b"entry" => {
            *entry = Some(PendingEntry::default());
        }
        ENTRY_CHILD_DEPTH => {
            if let Some(pending) = entry.as_mut() {
                pending.open_child(e, self_closing)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn href(e: &BytesStart) -> Result<Option<String>, FetchError> {
    let attr = e.try_get_attribute("href").map_err(quick_xml::Error::from)?;
    match attr {
        Some(attr) => {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}
