//! Rendering primitives for CLI output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use super::context::UiContext;
use super::theme::Badge;

/// A status line: badge followed by the message.
pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    format!("{} {}", kind.paint(ctx.unicode, ctx.color), message)
}

/// Two-column key/value table.
pub fn kv_table(ctx: &UiContext, rows: &[(&str, String)]) -> String {
    let mut table = Table::new();
    if ctx.unicode {
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(ASCII_MARKDOWN);
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);

    for (key, value) in rows {
        let mut key_cell = Cell::new(key);
        if ctx.color {
            key_cell = key_cell.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![key_cell, Cell::new(value)]);
    }
    table.to_string()
}
