//! Terminal tables drawn with box characters.
//!
//! Columns shrink to fit the terminal, widest first, never below
//! [`MIN_COLUMN`] characters; cells that no longer fit are truncated
//! with `...`.

use colored::*;

pub const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    /// Prints to stdout. Output that is not a terminal is never truncated.
    pub fn print(&self) {
        let width = console::Term::stdout()
            .size_checked()
            .map_or(usize::MAX, |(_, w)| w as usize);
        for line in self.render(width) {
            println!("{line}");
        }
    }

    /// Lays the table out for a terminal `max_width` columns wide.
    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let widths = self.column_widths(max_width);
        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {left}{}{right}", segments.join(mid))
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(border("┌", "┬", "┐"));

        let header: Vec<String> = self.headers.iter().map(|h| h.bold().to_string()).collect();
        lines.push(row_line(&header, &widths));
        lines.push(border("├", "┼", "┤"));

        for row in &self.rows {
            lines.push(row_line(row, &widths));
        }

        lines.push(border("└", "┴", "┘"));
        lines
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| console::measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(console::measure_text_width(&flatten(cell)));
            }
        }

        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > budget {
            let Some(widest) = widths
                .iter_mut()
                .filter(|w| **w > MIN_COLUMN)
                .max_by_key(|w| **w)
            else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("  │");
    for (cell, &width) in cells.iter().zip(widths) {
        let text = console::truncate_str(&flatten(cell), width, "...").into_owned();
        let pad = width.saturating_sub(console::measure_text_width(&text));
        line.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
    }
    line
}

/// Cells are single-line.
fn flatten(s: &str) -> String {
    s.replace(['\n', '\r', '\t'], " ")
}
