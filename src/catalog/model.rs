/*!
 * Structured document model for Qt Linguist TS catalogs.
 *
 * The model keeps every field it does not own as the raw escaped text read
 * from disk, so an unchanged document serializes back to its original bytes.
 * Only translation slots are ever mutated.
 */

use std::path::PathBuf;

use quick_xml::escape::unescape;

/// A child of the `<TS>` root element, in document order
#[derive(Debug, Clone)]
pub enum RootChild {
    /// A `<context>` block
    Context(TsContext),
    /// Any other element, preserved verbatim
    Raw(String),
}

/// A child of a `<context>` element, in document order
#[derive(Debug, Clone)]
pub enum ContextChild {
    /// A `<message>` entry
    Message(TsMessage),
    /// Any other element, preserved verbatim
    Raw(String),
}

/// A child of a `<message>` element, in document order
#[derive(Debug, Clone)]
pub enum MessageChild {
    /// The `<source>` element; raw escaped inner text, immutable
    Source { raw: String },
    /// The `<comment>` element; raw escaped inner text, immutable
    Comment { raw: String },
    /// The single `<translation>` slot
    Translation(TranslationSlot),
    /// Anything else (`<location>`, `<extracomment>`, ...), preserved verbatim
    Raw(String),
}

/// The mutable translation slot of one message.
///
/// `raw_text` holds the escaped inner content exactly as read from disk
/// until the slot is filled, at which point it holds the escaped form of
/// the new translation.
#[derive(Debug, Clone, Default)]
pub struct TranslationSlot {
    /// Whether `type="unfinished"` is present
    pub unfinished: bool,
    /// Raw attribute text other than the unfinished marker (e.g. ` variants="yes"`)
    pub extra_attrs: String,
    /// Raw escaped inner content; may contain nested markup for plural forms
    pub raw_text: String,
    /// Whether the original element was self-closing
    pub self_closing: bool,
    /// Set when this run replaced the slot content
    pub dirty: bool,
}

impl TranslationSlot {
    /// Whether the inner content is textually empty
    pub fn is_empty(&self) -> bool {
        self.raw_text.trim().is_empty()
    }

    /// A slot is translatable only when explicitly marked unfinished AND
    /// empty. A marked slot that already carries text was filled by an
    /// earlier run or a human and is never reprocessed.
    pub fn is_pending(&self) -> bool {
        self.unfinished && self.is_empty()
    }
}

/// One `<message>` entry with its ordered children
#[derive(Debug, Clone, Default)]
pub struct TsMessage {
    /// Raw attribute text of the message element (e.g. ` numerus="yes"`)
    pub attrs: String,
    /// Ordered children
    pub children: Vec<MessageChild>,
}

impl TsMessage {
    /// Raw escaped source text, if present
    pub fn source_raw(&self) -> Option<&str> {
        self.children.iter().find_map(|c| match c {
            MessageChild::Source { raw } => Some(raw.as_str()),
            _ => None,
        })
    }

    /// Unescaped source text, if present
    pub fn source_text(&self) -> Option<String> {
        self.source_raw().map(|raw| unescape_lossy(raw))
    }

    /// Unescaped comment text, if present
    pub fn comment_text(&self) -> Option<String> {
        self.children.iter().find_map(|c| match c {
            MessageChild::Comment { raw } => Some(unescape_lossy(raw)),
            _ => None,
        })
    }

    /// The translation slot, if present
    pub fn translation(&self) -> Option<&TranslationSlot> {
        self.children.iter().find_map(|c| match c {
            MessageChild::Translation(slot) => Some(slot),
            _ => None,
        })
    }

    /// Mutable access to the translation slot
    pub fn translation_mut(&mut self) -> Option<&mut TranslationSlot> {
        self.children.iter_mut().find_map(|c| match c {
            MessageChild::Translation(slot) => Some(slot),
            _ => None,
        })
    }

    /// Whether this message awaits translation
    pub fn is_pending(&self) -> bool {
        // Plural (numerus) messages carry nested numerusform markup the
        // unit model cannot fill; they are skipped, never guessed at.
        self.translation().map(|slot| slot.is_pending()).unwrap_or(false)
    }
}

/// One `<context>` block with its name and ordered children
#[derive(Debug, Clone, Default)]
pub struct TsContext {
    /// Raw attribute text of the context element
    pub attrs: String,
    /// Raw escaped name text
    pub name_raw: String,
    /// Ordered children
    pub children: Vec<ContextChild>,
}

impl TsContext {
    /// Unescaped context name
    pub fn name(&self) -> String {
        unescape_lossy(&self.name_raw)
    }

    /// Iterate over the messages of this context in document order
    pub fn messages(&self) -> impl Iterator<Item = &TsMessage> {
        self.children.iter().filter_map(|c| match c {
            ContextChild::Message(m) => Some(m),
            _ => None,
        })
    }
}

/// Addresses one message inside a document.
///
/// Units are projections; the document owns all message state. A unit
/// reaches back into the document through these indices, which stay valid
/// because the tree structure is never rearranged during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRef {
    /// Index into `TsDocument::children`
    pub context_idx: usize,
    /// Index into `TsContext::children`
    pub message_idx: usize,
}

/// One pending (source, comment) pair awaiting translation
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// Position within the current extraction; the canonical index space
    /// for response alignment
    pub index: usize,
    /// Context name the message belongs to
    pub context: String,
    /// Unescaped source text
    pub source: String,
    /// Unescaped disambiguation comment, if any
    pub comment: Option<String>,
    /// Back-reference into the owning document
    pub target: UnitRef,
    /// Candidate translation filled in by the backend
    pub candidate: Option<String>,
}

impl TranslationUnit {
    /// Length in characters of the source text
    pub fn source_chars(&self) -> usize {
        self.source.chars().count()
    }
}

/// A parsed TS catalog document
#[derive(Debug, Clone, Default)]
pub struct TsDocument {
    /// Path the document was loaded from, if any
    pub path: Option<PathBuf>,
    /// Raw bytes preceding the root element (XML declaration, doctype)
    pub prolog: String,
    /// Raw attribute text of the `<TS>` element
    pub root_attrs: String,
    /// Detected indentation unit (defaults to four spaces)
    pub indent_unit: String,
    /// Ordered root children
    pub children: Vec<RootChild>,
}

impl TsDocument {
    /// Iterate over contexts in document order
    pub fn contexts(&self) -> impl Iterator<Item = &TsContext> {
        self.children.iter().filter_map(|c| match c {
            RootChild::Context(ctx) => Some(ctx),
            _ => None,
        })
    }

    /// Total number of messages in the document
    pub fn message_count(&self) -> usize {
        self.contexts().map(|c| c.messages().count()).sum()
    }

    /// Number of messages still awaiting translation
    pub fn pending_count(&self) -> usize {
        self.contexts()
            .map(|c| c.messages().filter(|m| m.is_pending()).count())
            .sum()
    }

    /// Extract the ordered list of pending translation units.
    ///
    /// Output order equals document order; downstream alignment treats the
    /// unit index as the canonical index space.
    pub fn pending_units(&self) -> Vec<TranslationUnit> {
        let mut units = Vec::new();

        for (context_idx, child) in self.children.iter().enumerate() {
            let RootChild::Context(context) = child else {
                continue;
            };
            let context_name = context.name();

            for (message_idx, ctx_child) in context.children.iter().enumerate() {
                let ContextChild::Message(message) = ctx_child else {
                    continue;
                };
                if !message.is_pending() {
                    continue;
                }
                let Some(source) = message.source_text() else {
                    continue;
                };

                units.push(TranslationUnit {
                    index: units.len(),
                    context: context_name.clone(),
                    source,
                    comment: message.comment_text(),
                    target: UnitRef {
                        context_idx,
                        message_idx,
                    },
                    candidate: None,
                });
            }
        }

        units
    }

    /// Write an accepted translation into the slot a unit points at.
    ///
    /// The unfinished marker is removed unless the caller asked to keep it.
    /// Returns false when the reference no longer resolves to a slot.
    pub fn apply_translation(&mut self, target: UnitRef, text: &str, keep_marker: bool) -> bool {
        let Some(RootChild::Context(context)) = self.children.get_mut(target.context_idx) else {
            return false;
        };
        let Some(ContextChild::Message(message)) = context.children.get_mut(target.message_idx)
        else {
            return false;
        };
        let Some(slot) = message.translation_mut() else {
            return false;
        };

        slot.raw_text = quick_xml::escape::partial_escape(text).into_owned();
        slot.unfinished = keep_marker;
        slot.self_closing = false;
        slot.dirty = true;
        true
    }

    /// Look up the unescaped source text a unit reference points at
    pub fn source_text_at(&self, target: UnitRef) -> Option<String> {
        let RootChild::Context(context) = self.children.get(target.context_idx)? else {
            return None;
        };
        let ContextChild::Message(message) = context.children.get(target.message_idx)? else {
            return None;
        };
        message.source_text()
    }
}

/// Unescape raw XML text, falling back to the raw form on malformed entities
pub(crate) fn unescape_lossy(raw: &str) -> String {
    match unescape(raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}
