use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(valid: bool) -> Cell {
    if valid {
        Cell::new("valid").fg(TableColor::Green)
    } else {
        Cell::new("invalid").fg(TableColor::Red)
    }
}

pub fn color_coded_error_count_cell(count: usize) -> Cell {
    match count {
        0 => Cell::new(count).fg(TableColor::Green),
        1 => Cell::new(count).fg(TableColor::Yellow),
        _ => Cell::new(count).fg(TableColor::Red),
    }
}
