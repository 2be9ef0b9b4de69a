//! Number formatting and plain-text tables.
//!
//! Kept in one place so the TUI, the CLI output and the CSV export agree on
//! how prices and scores look.

use crate::render::tables::TableRow;

/// `12.5` -> `"$12.50"`
pub fn format_money(v: f64) -> String {
    if v < 0.0 {
        format!("-${:.2}", -v)
    } else {
        format!("${v:.2}")
    }
}

/// Score in `[0, 1]` -> percentage with 2 decimals (`0.8123` -> `"81.23%"`).
pub fn format_percent(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// `"11.00 - 13.00"`
pub fn format_interval(low: f64, high: f64) -> String {
    format!("{low:.2} - {high:.2}")
}

/// Render rows as an aligned plain-text table (for CLI output).
pub fn format_table(columns: &[&str], rows: &[TableRow]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        if let TableRow::Cells { cells, .. } = row {
            for (w, cell) in widths.iter_mut().zip(cells) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|c| c.to_string()), &widths);
    push_line(&mut out, widths.iter().map(|w| "-".repeat(*w)), &widths);

    for row in rows {
        match row {
            TableRow::Cells { cells, .. } => push_line(&mut out, cells.iter().cloned(), &widths),
            TableRow::Placeholder { text, .. } => {
                out.push_str(text);
                out.push('\n');
            }
        }
    }

    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let mut line = String::new();
    for (cell, w) in cells.zip(widths) {
        line.push_str(&format!("{cell:<w$}  ", w = *w));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tables::RowMarker;

    #[test]
    fn money_and_percent() {
        assert_eq!(format_money(12.0), "$12.00");
        assert_eq!(format_money(3.456), "$3.46");
        assert_eq!(format_percent(0.8123), "81.23%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_interval(11.0, 13.0), "11.00 - 13.00");
    }

    #[test]
    fn plain_table_golden() {
        let rows = vec![
            TableRow::Cells {
                cells: vec!["2024-02".into(), "$12.00".into()],
                marker: RowMarker::Plain,
            },
            TableRow::Placeholder { text: "No data".into(), span: 2 },
        ];
        let txt = format_table(&["Date", "Price"], &rows);
        let expected = concat!(
            "Date     Price\n",
            "-------  ------\n",
            "2024-02  $12.00\n",
            "No data\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("ACME Corporation", 6), "ACME .");
        assert_eq!(truncate("ACME", 6), "ACME");
    }
}
