//! Output formatting for the CLI.

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Print a list of items as a table
pub fn print_table<T: TableDisplay>(items: &[T]) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }

    println!("{table}");
}

/// Engine-level pass/fail glyph
pub fn glyph(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

/// Step-level pass/fail mark
pub fn mark(ok: bool) -> ColoredString {
    if ok {
        "✓".green()
    } else {
        "✗".red()
    }
}

pub fn pass_fail(ok: bool) -> ColoredString {
    if ok {
        "Pass".green()
    } else {
        "Fail".red()
    }
}
