/*!
 * Parser for Qt Linguist TS catalogs.
 *
 * Built on quick-xml. Fields the pipeline never touches (sources, comments,
 * locations, unknown elements) are captured as raw byte slices of the input
 * so serialization can reproduce them exactly.
 */

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::CatalogError;

use super::model::{
    ContextChild, MessageChild, RootChild, TranslationSlot, TsContext, TsDocument, TsMessage,
};

/// Default indentation used when none can be detected
const DEFAULT_INDENT: &str = "    ";

/// Load and parse a catalog file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<TsDocument, CatalogError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Open(format!("{}: {}", path.display(), e)))?;

    let mut document = parse_str(&content)?;
    document.path = Some(path.to_path_buf());
    Ok(document)
}

/// Parse a catalog from its textual content
pub fn parse_str(content: &str) -> Result<TsDocument, CatalogError> {
    let root_start = find_root_start(content)
        .ok_or_else(|| CatalogError::Parse("No <TS> root element found".to_string()))?;
    let prolog = content[..root_start].to_string();

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    // Skip prolog events; they are preserved via the raw slice above.
    let root_attrs;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"TS" => {
                root_attrs = raw_tag_attrs(content, root_start);
                break;
            }
            Ok(Event::Eof) => {
                return Err(CatalogError::Parse("No <TS> root element found".to_string()));
            }
            Ok(_) => {}
            Err(e) => return Err(parse_error(&reader, e)),
        }
    }

    let mut children = Vec::new();
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"context" {
                    let attrs = attrs_raw_of(content, before);
                    children.push(RootChild::Context(parse_context(&mut reader, content, attrs)?));
                } else {
                    children.push(RootChild::Raw(raw_element(&mut reader, content, before, &e)?));
                }
            }
            Ok(Event::Empty(_)) | Ok(Event::Comment(_)) => {
                let after = reader.buffer_position() as usize;
                children.push(RootChild::Raw(content[before..after].trim().to_string()));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"TS" => break,
            Ok(Event::Text(_)) => {}
            Ok(Event::Eof) => {
                return Err(CatalogError::Parse("Unexpected end of file inside <TS>".to_string()));
            }
            Ok(_) => {}
            Err(e) => return Err(parse_error(&reader, e)),
        }
    }

    Ok(TsDocument {
        path: None,
        prolog,
        root_attrs,
        indent_unit: detect_indent(content),
        children,
    })
}

/// Parse one `<context>` block; the start tag has already been consumed
fn parse_context(
    reader: &mut Reader<&[u8]>,
    content: &str,
    attrs: String,
) -> Result<TsContext, CatalogError> {
    let mut context = TsContext {
        attrs,
        ..Default::default()
    };

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"name" => {
                    context.name_raw = read_raw_text(reader, &e)?;
                }
                b"message" => {
                    let attrs = attrs_raw_of(content, before);
                    context
                        .children
                        .push(ContextChild::Message(parse_message(reader, content, attrs)?));
                }
                _ => {
                    context
                        .children
                        .push(ContextChild::Raw(raw_element(reader, content, before, &e)?));
                }
            },
            Ok(Event::Empty(_)) | Ok(Event::Comment(_)) => {
                let after = reader.buffer_position() as usize;
                context
                    .children
                    .push(ContextChild::Raw(content[before..after].trim().to_string()));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"context" => break,
            Ok(Event::Text(_)) => {}
            Ok(Event::Eof) => {
                return Err(CatalogError::Parse(
                    "Unexpected end of file inside <context>".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, e)),
        }
    }

    Ok(context)
}

/// Parse one `<message>` entry; the start tag has already been consumed
fn parse_message(
    reader: &mut Reader<&[u8]>,
    content: &str,
    attrs: String,
) -> Result<TsMessage, CatalogError> {
    let mut message = TsMessage {
        attrs,
        ..Default::default()
    };

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"source" => {
                    let raw = read_raw_text(reader, &e)?;
                    message.children.push(MessageChild::Source { raw });
                }
                b"comment" => {
                    let raw = read_raw_text(reader, &e)?;
                    message.children.push(MessageChild::Comment { raw });
                }
                b"translation" => {
                    let mut slot = translation_slot_from_attrs(&e)?;
                    slot.raw_text = read_raw_text(reader, &e)?;
                    message.children.push(MessageChild::Translation(slot));
                }
                _ => {
                    message
                        .children
                        .push(MessageChild::Raw(raw_element(reader, content, before, &e)?));
                }
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"source" => {
                    message.children.push(MessageChild::Source { raw: String::new() });
                }
                b"comment" => {
                    message.children.push(MessageChild::Comment { raw: String::new() });
                }
                b"translation" => {
                    let mut slot = translation_slot_from_attrs(&e)?;
                    slot.self_closing = true;
                    message.children.push(MessageChild::Translation(slot));
                }
                _ => {
                    let after = reader.buffer_position() as usize;
                    message
                        .children
                        .push(MessageChild::Raw(content[before..after].trim().to_string()));
                }
            },
            Ok(Event::Comment(_)) => {
                let after = reader.buffer_position() as usize;
                message
                    .children
                    .push(MessageChild::Raw(content[before..after].trim().to_string()));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"message" => break,
            Ok(Event::Text(_)) => {}
            Ok(Event::Eof) => {
                return Err(CatalogError::Parse(
                    "Unexpected end of file inside <message>".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, e)),
        }
    }

    Ok(message)
}

/// Build a translation slot from the element attributes.
///
/// The unfinished marker is lifted out; every other attribute is kept as
/// raw text so unknown markers (vanished, obsolete, variants) round-trip.
fn translation_slot_from_attrs(e: &BytesStart<'_>) -> Result<TranslationSlot, CatalogError> {
    let mut slot = TranslationSlot::default();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| CatalogError::Parse(format!("Bad attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();

        if key == "type" && value == "unfinished" {
            slot.unfinished = true;
        } else {
            slot.extra_attrs.push_str(&format!(" {}=\"{}\"", key, value));
        }
    }

    Ok(slot)
}

/// Read the raw inner content of the element just opened, consuming its end tag
fn read_raw_text(reader: &mut Reader<&[u8]>, e: &BytesStart<'_>) -> Result<String, CatalogError> {
    reader
        .read_text(e.name())
        .map(|cow| cow.into_owned())
        .map_err(|err| CatalogError::Parse(format!("Failed to read element content: {}", err)))
}

/// Capture a whole unknown element verbatim, consuming through its end tag
fn raw_element(
    reader: &mut Reader<&[u8]>,
    content: &str,
    before: usize,
    e: &BytesStart<'_>,
) -> Result<String, CatalogError> {
    reader
        .read_to_end(e.name())
        .map_err(|err| CatalogError::Parse(format!("Unclosed element: {}", err)))?;
    let after = reader.buffer_position() as usize;
    Ok(content[before..after].trim().to_string())
}

/// Raw attribute text of the tag starting at `tag_start` in the source.
///
/// `tag_start` points just past the previous token, so leading whitespace is
/// trimmed before locating the bracket.
fn attrs_raw_of(content: &str, tag_start: usize) -> String {
    let slice = &content[tag_start..];
    let Some(open) = slice.find('<') else {
        return String::new();
    };
    let Some(close) = slice[open..].find('>') else {
        return String::new();
    };
    let inner = &slice[open + 1..open + close];
    let inner = inner.trim_end_matches('/');

    match inner.find(|c: char| c.is_whitespace()) {
        Some(idx) => inner[idx..].trim_end().to_string(),
        None => String::new(),
    }
}

/// Raw attribute text of the `<TS ...>` root tag
fn raw_tag_attrs(content: &str, root_start: usize) -> String {
    attrs_raw_of(content, root_start)
}

/// Find the byte offset of the `<TS` root tag
fn find_root_start(content: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = content[from..].find("<TS") {
        let idx = from + rel;
        match content[idx + 3..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(idx),
            _ => {}
        }
        from = idx + 3;
    }
    None
}

/// Detect the file's indentation unit from the `<name>` line
fn detect_indent(content: &str) -> String {
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("<name>") {
            let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
            if !indent.is_empty() {
                return indent;
            }
        }
    }
    DEFAULT_INDENT.to_string()
}

fn parse_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> CatalogError {
    CatalogError::Parse(format!(
        "XML error at byte {}: {}",
        reader.buffer_position(),
        err
    ))
}
