use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a single column may grow before its cells are truncated.
pub(crate) const MAX_COLUMN_WIDTH: usize = 48;

/// Display width of a string; accented titles and CJK stay aligned.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` display columns, marking the cut with "..".
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(|ch| ch.to_string())
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }
    format!("{}..", &s[..end_byte])
}

/// Pad or truncate to exactly `width` display columns, text on the left.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Pad to `width` display columns, text on the right. Numbers never truncate.
pub(crate) fn pad_left(s: &str, width: usize) -> String {
    let sw = display_width(s);
    format!("{}{}", " ".repeat(width.saturating_sub(sw)), s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
}

fn format_line<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    aligns: &[Align],
) -> String {
    cells
        .zip(widths.iter().zip(aligns))
        .map(|(cell, (w, align))| match align {
            Align::Left => pad_right(cell, *w),
            Align::Right => pad_left(cell, *w),
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render a plain-text table: header, dashed rule, rows. Column widths fit
/// the widest cell, capped at [`MAX_COLUMN_WIDTH`].
pub(crate) fn render_table(headers: &[&str], aligns: &[Align], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell)).min(MAX_COLUMN_WIDTH);
        }
    }

    let mut out = String::new();
    out.push_str(&format_line(headers.iter().copied(), &widths, aligns));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths, aligns));
        out.push('\n');
    }
    out
}
