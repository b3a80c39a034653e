//! Gettext PO/POT rendering.

mod exporter;
pub mod format;

pub use exporter::{export_filename, ExportRequest, PoExport, PoExporter, POT_MIME, PO_MIME};
pub use format::{escape_po, po_quoted};
