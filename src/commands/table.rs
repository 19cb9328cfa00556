/// Aligned plain-text table with at most one marked row.
///
/// ```text
///   Date        Fajr   Isha
///   ----------  -----  -----
/// > Sat 28 Feb  05:17  19:10
///   Sun 01 Mar  05:16  19:12
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    marked: Option<usize>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            marked: None,
        }
    }

    pub fn add_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Mark the row at `idx` (0-based) with `>`.
    pub fn mark_row(&mut self, idx: usize) {
        self.marked = Some(idx);
    }

    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, "  ", &self.headers, &widths);
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, "  ", &dashes, &widths);
        for (i, row) in self.rows.iter().enumerate() {
            let prefix = if self.marked == Some(i) { "> " } else { "  " };
            push_line(&mut out, prefix, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, prefix: &str, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = *w)
        })
        .collect();
    out.push_str(prefix);
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}
