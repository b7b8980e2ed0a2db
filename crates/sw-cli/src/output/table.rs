#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Foreground color class of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Muted,
}

impl Tone {
    const fn code(self) -> &'static str {
        match self {
            Self::Good => "32",
            Self::Warn => "33",
            Self::Bad => "31",
            Self::Muted => "2",
        }
    }
}

/// Render a simple aligned table for string rows.
///
/// Numeric cells are right aligned and status words are colored when
/// `options.color` is set.
#[must_use]
pub fn render_entity_table(
    headers: &[&str],
    rows: &[Vec<String>],
    options: TableOptions,
) -> String {
    render_rows(headers, rows, options, |_, _, value| {
        (status_tone(value), looks_numeric(value))
    })
}

/// Render a left aligned table whose cell colors come from `tone`.
///
/// `tone` receives the row index, the column index and the cell text.
#[must_use]
pub fn render_toned_table<F>(
    headers: &[&str],
    rows: &[Vec<String>],
    options: TableOptions,
    tone: F,
) -> String
where
    F: Fn(usize, usize, &str) -> Option<Tone>,
{
    render_rows(headers, rows, options, |row, column, value| {
        (tone(row, column, value), false)
    })
}

fn render_rows<F>(headers: &[&str], rows: &[Vec<String>], options: TableOptions, style: F) -> String
where
    F: Fn(usize, usize, &str) -> (Option<Tone>, bool),
{
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|value| value.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
                .max(6)
        })
        .collect();

    fit_widths(&mut widths, headers, options.max_width);

    let header_line = headers
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| {
            let text = truncate_text(header, *width);
            format_cell(&text, *width, false)
        })
        .collect::<Vec<_>>()
        .join("  ");

    let divider = "-".repeat(strip_ansi(&header_line).chars().count());

    let row_lines = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            widths
                .iter()
                .enumerate()
                .map(|(index, width)| {
                    let value = row.get(index).map_or("-", String::as_str);
                    let truncated = truncate_text(value, *width);
                    let (tone, numeric) = style(row_index, index, value);
                    let padded = format_cell(&truncated, *width, numeric);
                    match tone {
                        Some(tone) if options.color => paint(&padded, tone),
                        _ => padded,
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>();

    let mut lines = Vec::with_capacity(2 + row_lines.len());
    lines.push(header_line.trim_end().to_string());
    lines.push(divider);
    lines.extend(row_lines);
    lines.join("\n")
}

fn fit_widths(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };

    if widths.is_empty() {
        return;
    }

    let separators = widths.len().saturating_sub(1) * 2;
    let mut total = widths.iter().sum::<usize>() + separators;

    while total > max_width {
        let mut candidate_idx = None;
        let mut candidate_width = 0usize;
        for (idx, width) in widths.iter().enumerate() {
            let min_width = headers[idx].chars().count().max(6);
            if *width > min_width && *width > candidate_width {
                candidate_idx = Some(idx);
                candidate_width = *width;
            }
        }

        let Some(idx) = candidate_idx else {
            break;
        };

        widths[idx] = widths[idx].saturating_sub(1);
        total = widths.iter().sum::<usize>() + separators;
    }
}

fn truncate_text(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    for ch in value.chars().take(width - 1) {
        out.push(ch);
    }
    out.push('…');
    out
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|ch| ch.is_ascii_digit())
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | ','))
}

fn format_cell(value: &str, width: usize, numeric: bool) -> String {
    let pad = width.saturating_sub(value.chars().count());
    if numeric {
        format!("{}{}", " ".repeat(pad), value)
    } else {
        format!("{}{}", value, " ".repeat(pad))
    }
}

fn status_tone(value: &str) -> Option<Tone> {
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "ok" | "true" | "found" | "fresh" | "updated") {
        Some(Tone::Good)
    } else if matches!(
        lower.as_str(),
        "aging" | "stale" | "skipped" | "unmatched" | "empty_table" | "truncated"
    ) {
        Some(Tone::Warn)
    } else if matches!(
        lower.as_str(),
        "error" | "errors" | "failed" | "false" | "table_not_found" | "access_or_other_error"
    ) {
        Some(Tone::Bad)
    } else {
        None
    }
}

fn paint(value: &str, tone: Tone) -> String {
    format!("\u{1b}[{}m{value}\u{1b}[0m", tone.code())
}

pub fn strip_ansi(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}
