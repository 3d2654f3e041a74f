//! DOM helpers for the transient list pages.
//!
//! Pages go through `scraper`, so entities (`&minus;`, `&#8722;`, `&deg;`...)
//! are decoded by the HTML parser and never reach the field patterns raw.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text is never visible
const HIDDEN: [&str; 2] = ["script", "style"];

/// One `<tr>`; `header` is set when every cell is a `<th>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<String>,
}

struct TableSelectors {
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl TableSelectors {
    fn new() -> Self {
        Self {
            table: Selector::parse("table").expect("table selector"),
            row: Selector::parse("tr").expect("row selector"),
            cell: Selector::parse("td, th").expect("cell selector"),
        }
    }
}

/// A parsed transient page
pub struct Page {
    document: Html,
}

impl Page {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Visible text of the whole page with whitespace collapsed
    #[must_use]
    pub fn text(&self) -> String {
        visible_text(self.document.root_element(), false)
    }

    /// Visible text outside every `<table>`, for scanning free-text entries
    #[must_use]
    pub fn text_outside_tables(&self) -> String {
        visible_text(self.document.root_element(), true)
    }

    /// Rows of each table in document order, cell text already collapsed
    #[must_use]
    pub fn tables(&self) -> Vec<Vec<TableRow>> {
        let selectors = TableSelectors::new();
        self.document
            .select(&selectors.table)
            .map(|table| {
                table
                    .select(&selectors.row)
                    .filter_map(|row| table_row(row, &selectors.cell))
                    .collect()
            })
            .collect()
    }
}

fn table_row(row: ElementRef<'_>, cell_selector: &Selector) -> Option<TableRow> {
    let mut header = true;
    let cells: Vec<String> = row
        .select(cell_selector)
        .map(|cell| {
            if cell.value().name() != "th" {
                header = false;
            }
            visible_text(cell, false)
        })
        .collect();
    (!cells.is_empty()).then_some(TableRow { header, cells })
}

/// Text nodes under `root` joined by spaces, like a soup `get_text(" ")`
fn visible_text(root: ElementRef<'_>, skip_tables: bool) -> String {
    let mut raw = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|element| {
                let name = element.name();
                HIDDEN.contains(&name) || (skip_tables && name == "table")
            });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    collapse_whitespace(&raw)
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_skips_scripts() {
        let page = Page::parse(
            "<p>AT2025test <b>discovered</b>&nbsp;2025/01/15</p>\n<script>var x = 1;</script><p>Mag 15.5</p>",
        );
        assert_eq!(page.text(), "AT2025test discovered 2025/01/15 Mag 15.5");
    }

    #[test]
    fn test_entities_are_decoded() {
        let page = Page::parse("<pre>+53&deg;17' &amp;c &minus;05 &#8722;06 &#x2212;07</pre>");
        assert_eq!(page.text(), "+53°17' &c \u{2212}05 \u{2212}06 \u{2212}07");
    }

    #[test]
    fn test_tables() {
        let page = Page::parse(
            r#"
            <TABLE border="1">
              <tr><th>Name</th><th>Mag</th><th>Type</th></tr>
              <tr><td><a href="x">AT2025abao</a></td><td>15.1</td><td>LRN</td></tr>
              <tr></tr>
            </TABLE>
            <p>after</p>"#,
        );

        let tables = page.tables();
        assert_eq!(tables.len(), 1);

        let rows = &tables[0];
        assert_eq!(rows.len(), 2);
        assert!(rows[0].header);
        assert_eq!(rows[0].cells, vec!["Name", "Mag", "Type"]);
        assert!(!rows[1].header);
        assert_eq!(rows[1].cells, vec!["AT2025abao", "15.1", "LRN"]);

        let outside = page.text_outside_tables();
        assert!(!outside.contains("AT2025abao"));
        assert!(outside.contains("after"));
    }
}
