//! Content-type driven body formatting.
//!
//! Dispatch order (first match wins):
//!
//! 1. `image/*` renders the content type itself.
//! 2. `multipart/form-data` renders that label.
//! 3. JSON is pretty-printed; malformed JSON is dropped for requests and
//!    retried as XML for responses.
//! 4. XML responses are re-serialized; element-only content is re-indented.
//! 5. Anything else is passed through as text.
//!
//! Every formatter returns `None` for "no body", which the document turns
//! into an omitted section.

use std::collections::BTreeSet;

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::transaction::Body;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Reasons a payload cannot be re-serialized as XML.
#[derive(Debug, thiserror::Error)]
enum XmlFormatError {
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("XML write error: {0}")]
    Write(#[from] std::io::Error),
    #[error("{0}")]
    Structure(&'static str),
}

/// Format a request body. Requests never go through XML reformatting.
pub(crate) fn format_request_body(body: &Body) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let content_type = body.content_type();

    if content_type.starts_with("image/") {
        Some(content_type.to_owned())
    } else if content_type.starts_with(MULTIPART_FORM_DATA) {
        Some(MULTIPART_FORM_DATA.to_owned())
    } else if content_type.contains("application/json") {
        pretty_json(&body.bytes)
            .inspect_err(|err| tracing::debug!(%err, "Request body is not valid JSON, omitting"))
            .ok()
    } else {
        Some(raw_text(&body.bytes))
    }
}

/// Format a response body.
pub(crate) fn format_response_body(body: &Body) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let content_type = body.content_type();

    if content_type.starts_with("image/") {
        Some(content_type.to_owned())
    } else if content_type.starts_with(MULTIPART_FORM_DATA) {
        Some(MULTIPART_FORM_DATA.to_owned())
    } else if content_type.contains("application/json") {
        match pretty_json(&body.bytes) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::debug!(%err, "Response body is not valid JSON, trying XML");
                xml_section(&body.bytes)
            }
        }
    } else if content_type.contains("xml") {
        xml_section(&body.bytes)
    } else {
        Some(raw_text(&body.bytes))
    }
}

/// Wrap a formatted body as a template section: a blank line then the body,
/// or nothing at all.
pub(crate) fn body_section(body: Option<&str>) -> String {
    match body {
        Some(body) if !body.is_empty() => format!("\n\n{body}"),
        _ => String::new(),
    }
}

/// Parse JSON and pretty-print it with two-space indentation.
pub(crate) fn pretty_json(bytes: &[u8]) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    serde_json::to_string_pretty(&value)
}

fn xml_section(bytes: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(bytes).ok()?;
    match reformat_xml(text) {
        Ok(xml) => Some(format!("\n{xml}")),
        Err(err) => {
            tracing::debug!(%err, "Response body is not well-formed XML, omitting");
            None
        }
    }
}

/// Open element while scanning a document.
#[derive(Debug, Default)]
struct Frame {
    /// Has child elements.
    elements: bool,
    /// Has non-blank text, CDATA or entity references.
    text: bool,
    /// Event indices of whitespace-only text directly inside this element.
    blanks: Vec<usize>,
}

/// Strictly parse an XML document and re-serialize it with an XML
/// declaration.
///
/// Element-only content is re-indented by two spaces and the whitespace
/// between elements is replaced. Documents with mixed content (text next to
/// child elements) keep every text node verbatim and are written without
/// indentation.
fn reformat_xml(text: &str) -> Result<String, XmlFormatError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut blanks = BTreeSet::new();
    let mut roots = 0usize;
    let mut mixed = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => {
                note_element(&mut frames, &mut roots);
                frames.push(Frame::default());
            }
            Event::Empty(_) => note_element(&mut frames, &mut roots),
            Event::End(_) => {
                let frame = frames
                    .pop()
                    .ok_or(XmlFormatError::Structure("unexpected closing tag"))?;
                if frame.elements {
                    if frame.text {
                        mixed = true;
                    } else {
                        blanks.extend(frame.blanks);
                    }
                }
            }
            Event::Text(content) => {
                let blank = content.iter().all(u8::is_ascii_whitespace);
                match frames.last_mut() {
                    None if blank => continue,
                    None => return Err(XmlFormatError::Structure("text outside root element")),
                    Some(frame) if blank => frame.blanks.push(events.len()),
                    Some(frame) => frame.text = true,
                }
            }
            Event::CData(_) | Event::GeneralRef(_) => match frames.last_mut() {
                Some(frame) => frame.text = true,
                None => return Err(XmlFormatError::Structure("content outside root element")),
            },
            _ => {}
        }
        events.push(event);
    }

    if !frames.is_empty() {
        return Err(XmlFormatError::Structure("unclosed element"));
    }
    if roots != 1 {
        return Err(XmlFormatError::Structure("document must have one root element"));
    }

    let mut writer = if mixed {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    };

    if !matches!(events.first(), Some(Event::Decl(_))) {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        if mixed {
            writer.get_mut().push(b'\n');
        }
    }

    for (index, event) in events.into_iter().enumerate() {
        if !mixed && blanks.contains(&index) {
            continue;
        }
        let decl = matches!(event, Event::Decl(_));
        let event = match event {
            // Written as raw text so the indenter never breaks a line before it.
            Event::GeneralRef(name) => Event::Text(BytesText::from_escaped(format!(
                "&{};",
                String::from_utf8_lossy(&name)
            ))),
            other => other,
        };
        writer.write_event(event)?;
        if decl && mixed {
            writer.get_mut().push(b'\n');
        }
    }

    let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}

fn note_element(frames: &mut [Frame], roots: &mut usize) {
    match frames.last_mut() {
        Some(parent) => parent.elements = true,
        None => *roots += 1,
    }
}

fn raw_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
