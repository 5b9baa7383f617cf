/*!
 * Message catalog handling for Qt Linguist TS files.
 *
 * This module contains the structured document model, the parser, and the
 * serializer for translation catalogs. It is split into several submodules:
 *
 * - `model`: Document tree, translation slots, and pending-unit extraction
 * - `parser`: quick-xml based reader preserving raw field content
 * - `writer`: Serializer reconstructing the original on-disk layout
 */

// Re-export main types for easier usage
pub use self::model::{
    ContextChild, MessageChild, RootChild, TranslationSlot, TranslationUnit, TsContext,
    TsDocument, TsMessage, UnitRef,
};

// Submodules
pub mod model;
pub mod parser;
pub mod writer;
