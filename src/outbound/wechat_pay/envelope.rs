use std::collections::BTreeMap;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

/// Root element of every request and response body
pub const ROOT_ELEMENT: &str = "xml";

/// Error type for XML envelope encoding and decoding
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Failed to write XML envelope: {0}")]
    Write(String),

    #[error("Malformed XML envelope: {0}")]
    Malformed(String),

    #[error("Unexpected nested element <{0}> in XML envelope")]
    NotFlat(String),

    #[error("Missing <xml> root element")]
    MissingRoot,
}

/// Serialize a flat parameter mapping as `<xml><key>value</key>...</xml>`.
///
/// Values are written as escaped text content. Children follow the iteration
/// order of the input.
pub fn build_envelope<'a, I>(params: I) -> Result<String, EnvelopeError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(write_err)?;

    for (key, value) in params {
        writer
            .write_event(Event::Start(BytesStart::new(key)))
            .map_err(write_err)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(write_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(key)))
            .map_err(write_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(write_err)?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| EnvelopeError::Write(e.to_string()))
}

/// Decode an `<xml>` envelope into a flat key/value mapping.
///
/// Child values may be plain text or CDATA. A root other than `<xml>`, any
/// element nested below a child, and anything after the root closes are
/// rejected.
pub fn parse_envelope(body: &str) -> Result<BTreeMap<String, String>, EnvelopeError> {
    let mut reader = Reader::from_str(body);
    let mut fields = BTreeMap::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<(String, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        match event {
            Event::Start(start) => {
                let name = element_name(start.name().as_ref())?;
                match depth {
                    0 => seen_root = open_root(&name, seen_root)?,
                    1 => current = Some((name, String::new())),
                    _ => return Err(EnvelopeError::NotFlat(name)),
                }
                depth += 1;
            }
            Event::Empty(empty) => {
                let name = element_name(empty.name().as_ref())?;
                match depth {
                    0 => seen_root = open_root(&name, seen_root)?,
                    1 => {
                        fields.insert(name, String::new());
                    }
                    _ => return Err(EnvelopeError::NotFlat(name)),
                }
            }
            Event::Text(text) => {
                if let Some((_, value)) = current.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
                    value.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some((_, value)) = current.as_mut() {
                    let raw = cdata.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
                    value.push_str(text);
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let Some((key, value)) = current.take() {
                        fields.insert(key, value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(EnvelopeError::MissingRoot);
    }

    Ok(fields)
}

/// Accept the document root once, and only if it is `<xml>`
fn open_root(name: &str, seen_root: bool) -> Result<bool, EnvelopeError> {
    if seen_root {
        return Err(EnvelopeError::Malformed(format!(
            "unexpected element <{name}> after the root element"
        )));
    }
    if name != ROOT_ELEMENT {
        return Err(EnvelopeError::MissingRoot);
    }
    Ok(true)
}

fn write_err(err: impl std::fmt::Display) -> EnvelopeError {
    EnvelopeError::Write(err.to_string())
}

fn element_name(raw: &[u8]) -> Result<String, EnvelopeError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| EnvelopeError::Malformed(e.to_string()))
}
