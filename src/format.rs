//! Fixed-width text tables for configuration previews and results.

use crate::results::AnalysisResults;

/// Renders header and data rows as a fixed-width table.
///
/// `col_margin` (clamped to [0, 9]) pads each side of a column;
/// `show_border` draws `=` rules and `|` outer edges; `show_col_sep` draws
/// `|` between columns. Rows shorter than the widest row are padded with
/// empty cells.
pub fn table(
    header_rows: &[Vec<String>],
    data_rows: &[Vec<String>],
    col_margin: usize,
    show_border: bool,
    show_col_sep: bool,
) -> String {
    let mut all_rows: Vec<Vec<String>> = header_rows.to_vec();
    all_rows.extend(data_rows.iter().cloned());
    let ncols = all_rows.iter().map(Vec::len).max().unwrap_or(0);
    if ncols == 0 {
        return String::new();
    }
    let mut width = vec![0usize; ncols];
    for row in &mut all_rows {
        for (c, cell) in row.iter().enumerate() {
            width[c] = width[c].max(cell.len());
        }
        row.resize(ncols, String::new());
    }
    let margin = col_margin.min(9);
    let colpad = " ".repeat(margin);
    let lbord = format!("{}{}", if show_border { "|" } else { " " }, colpad);
    let coldiv = format!("{}{}{}", colpad, if show_col_sep { "|" } else { " " }, colpad);
    let rbord = format!("{}{}", colpad, if show_border { "|" } else { " " });
    let wtot = lbord.len() + (ncols - 1) * coldiv.len() + rbord.len()
        + width.iter().sum::<usize>();
    let hbord = if show_border {
        format!("{}\n", "=".repeat(wtot))
    } else {
        String::new()
    };
    let hdiv = if header_rows.is_empty() {
        String::new()
    } else {
        format!("{}\n", "=".repeat(wtot))
    };
    let mut out = String::new();
    out.push_str(&hbord);
    for (r, row) in all_rows.iter().enumerate() {
        if r == header_rows.len() {
            out.push_str(&hdiv);
        }
        out.push_str(&lbord);
        for (c, cell) in row.iter().enumerate() {
            out.push_str(&format!("{cell:<w$}", w = width[c]));
            if c + 1 < ncols {
                out.push_str(&coldiv);
            }
        }
        out.push_str(&rbord);
        out.push('\n');
    }
    out.push_str(&hbord);
    out
}

/// Renders the scalar metrics of `results` as a Name/Value/Units table.
pub fn results_table(results: &AnalysisResults) -> String {
    let header = vec![vec![
        "Name".to_string(),
        "Value".to_string(),
        "Units".to_string(),
    ]];
    let data: Vec<Vec<String>> = results
        .result_data()
        .into_iter()
        .map(|row| row.to_vec())
        .collect();
    table(&header, &data, 2, true, true)
}
