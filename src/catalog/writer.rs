/*!
 * Serializer for Qt Linguist TS catalogs.
 *
 * Re-emits the declaration, doctype, and every preserved raw field exactly
 * as read; only mutated translation slots serialize differently. Writing is
 * atomic (temp file + rename) so an interrupted run leaves the previously
 * persisted state intact.
 */

use std::io::Write;
use std::path::Path;

use crate::errors::CatalogError;

use super::model::{ContextChild, MessageChild, RootChild, TranslationSlot, TsDocument};

impl TsDocument {
    /// Serialize the document back to its textual form
    pub fn to_ts_string(&self) -> String {
        let indent1 = self.indent_unit.clone();
        let indent2 = self.indent_unit.repeat(2);

        let mut out = String::with_capacity(4096);
        out.push_str(&self.prolog);
        out.push_str(&format!("<TS{}>\n", self.root_attrs));

        for child in &self.children {
            match child {
                RootChild::Raw(raw) => {
                    out.push_str(raw);
                    out.push('\n');
                }
                RootChild::Context(context) => {
                    out.push_str(&format!("<context{}>\n", context.attrs));
                    out.push_str(&format!("{}<name>{}</name>\n", indent1, context.name_raw));

                    for ctx_child in &context.children {
                        match ctx_child {
                            ContextChild::Raw(raw) => {
                                out.push_str(&indent1);
                                out.push_str(raw);
                                out.push('\n');
                            }
                            ContextChild::Message(message) => {
                                out.push_str(&format!("{}<message{}>\n", indent1, message.attrs));
                                for msg_child in &message.children {
                                    match msg_child {
                                        MessageChild::Raw(raw) => {
                                            out.push_str(&indent2);
                                            out.push_str(raw);
                                            out.push('\n');
                                        }
                                        MessageChild::Source { raw } => {
                                            out.push_str(&format!(
                                                "{}<source>{}</source>\n",
                                                indent2, raw
                                            ));
                                        }
                                        MessageChild::Comment { raw } => {
                                            out.push_str(&format!(
                                                "{}<comment>{}</comment>\n",
                                                indent2, raw
                                            ));
                                        }
                                        MessageChild::Translation(slot) => {
                                            out.push_str(&indent2);
                                            out.push_str(&render_translation(slot));
                                            out.push('\n');
                                        }
                                    }
                                }
                                out.push_str(&format!("{}</message>\n", indent1));
                            }
                        }
                    }

                    out.push_str("</context>\n");
                }
            }
        }

        out.push_str("</TS>\n");
        out
    }

    /// Persist the document to the path it was loaded from
    pub fn save(&self) -> Result<(), CatalogError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| CatalogError::Write("Document has no associated path".to_string()))?
            .clone();
        self.save_to(&path)
    }

    /// Persist the document atomically to the given path.
    ///
    /// The content is written to a temporary file in the same directory and
    /// renamed over the target, so a crash mid-write never truncates the
    /// catalog.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let parent = path.parent().unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| CatalogError::Write(format!("{}: {}", path.display(), e)))?;
        tmp.write_all(self.to_ts_string().as_bytes())
            .map_err(|e| CatalogError::Write(format!("{}: {}", path.display(), e)))?;
        tmp.flush()
            .map_err(|e| CatalogError::Write(format!("{}: {}", path.display(), e)))?;
        tmp.persist(path)
            .map_err(|e| CatalogError::Write(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }
}

/// Render one translation element
fn render_translation(slot: &TranslationSlot) -> String {
    let mut attrs = String::new();
    if slot.unfinished {
        attrs.push_str(" type=\"unfinished\"");
    }
    attrs.push_str(&slot.extra_attrs);

    if slot.self_closing && !slot.dirty && slot.raw_text.is_empty() {
        format!("<translation{}/>", attrs)
    } else {
        format!("<translation{}>{}</translation>", attrs, slot.raw_text)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::parser::parse_str;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<!DOCTYPE TS>\n\
<TS version=\"2.1\" language=\"fr_FR\">\n\
<context>\n\
    <name>MainWindow</name>\n\
    <message>\n\
        <location filename=\"../src/mainwindow.cpp\" line=\"42\"/>\n\
        <source>Open File</source>\n\
        <translation type=\"unfinished\"></translation>\n\
    </message>\n\
    <message>\n\
        <source>Save &amp; Quit</source>\n\
        <comment>menu entry</comment>\n\
        <translation>Enregistrer &amp; quitter</translation>\n\
    </message>\n\
</context>\n\
</TS>\n";

    #[test]
    fn test_roundTrip_untouchedDocument_shouldReproduceBytes() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.to_ts_string(), SAMPLE);
    }

    #[test]
    fn test_roundTrip_afterApply_shouldOnlyChangeTranslationSlot() {
        let mut doc = parse_str(SAMPLE).unwrap();
        let units = doc.pending_units();
        assert_eq!(units.len(), 1);

        doc.apply_translation(units[0].target, "Ouvrir un fichier", false);
        let written = doc.to_ts_string();

        assert!(written.contains("<translation>Ouvrir un fichier</translation>"));
        // Everything else is untouched byte-for-byte
        assert!(written.contains("<location filename=\"../src/mainwindow.cpp\" line=\"42\"/>"));
        assert!(written.contains("<source>Save &amp; Quit</source>"));
        assert!(written.contains("<translation>Enregistrer &amp; quitter</translation>"));
        assert!(!written.contains("type=\"unfinished\""));
    }

    #[test]
    fn test_roundTrip_keepMarker_shouldRetainUnfinished() {
        let mut doc = parse_str(SAMPLE).unwrap();
        let units = doc.pending_units();
        doc.apply_translation(units[0].target, "Ouvrir un fichier", true);

        let written = doc.to_ts_string();
        assert!(written.contains("<translation type=\"unfinished\">Ouvrir un fichier</translation>"));
    }
}
