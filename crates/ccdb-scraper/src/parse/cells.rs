use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

pub(super) static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("Failed to parse row selector - this is a bug"));

pub(super) static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td, th").expect("Failed to parse cell selector - this is a bug")
});

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table").expect("Failed to parse table selector - this is a bug")
});

/// True for rows that wrap a nested table. Layout pages nest tables, and an
/// outer row would otherwise repeat every inner row's content.
pub(super) fn has_nested_table(row: ElementRef<'_>) -> bool {
    row.select(&TABLE_SELECTOR).next().is_some()
}

/// Non-empty text fragments of an element, whitespace-collapsed. Fragments
/// separated by `<br>` come out as separate entries.
pub(super) fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

pub(super) fn cell_text(element: ElementRef<'_>) -> String {
    text_lines(element).join(" ")
}

pub(super) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty strings become `None`.
pub(super) fn non_empty(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    (!collapsed.is_empty()).then_some(collapsed)
}
