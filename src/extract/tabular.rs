use tracing::debug;

use crate::data::DocumentKind;

/// Flattens delimited rows into space-separated cells, skipping blank and
/// all-digit cells. Rows after index `row_limit` are ignored. A parse
/// failure returns the decoded text untouched.
pub fn extract_from_tabular(text: &str, kind: DocumentKind, row_limit: usize) -> String {
    match collect_cells(text, kind.delimiter(), row_limit) {
        Ok(cells) => cells.join(" "),
        Err(err) => {
            debug!("tabular parse failed ({}); using raw text", err);
            text.to_string()
        }
    }
}

fn collect_cells(text: &str, delimiter: u8, row_limit: usize) -> Result<Vec<String>, csv::Error> {
    let mut cells = Vec::new();
    for (index, row) in split_rows(text, delimiter).into_iter().enumerate() {
        if index > row_limit {
            break;
        }
        if row.is_empty() {
            continue;
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(row.as_bytes());
        for record in reader.records() {
            let record = record?;
            for cell in record.iter() {
                let cell = cell.trim();
                if cell.is_empty() || is_all_digits(cell) {
                    continue;
                }
                cells.push(cell.to_string());
            }
        }
    }
    Ok(cells)
}

/// Splits on line breaks outside quoted fields. A blank line is an empty row
/// and still counts toward the row limit.
fn split_rows(text: &str, delimiter: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut rows = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        if in_quotes {
            if byte == b'"' {
                if bytes.get(index + 1) == Some(&b'"') {
                    index += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if byte == b'"' && field_start {
            in_quotes = true;
            field_start = false;
        } else if byte == b'\n' {
            rows.push(text[start..index].trim_end_matches('\r'));
            start = index + 1;
            field_start = true;
        } else {
            field_start = byte == delimiter;
        }
        index += 1;
    }
    if start < bytes.len() {
        rows.push(text[start..].trim_end_matches('\r'));
    }
    rows
}

fn is_all_digits(cell: &str) -> bool {
    cell.chars().all(|ch| ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_are_skipped() {
        let text = "42,apple,7.5,banana\n, 1000 ,cherry,\n";
        assert_eq!(
            extract_from_tabular(text, DocumentKind::Csv, 1000),
            "apple 7.5 banana cherry"
        );
    }

    #[test]
    fn tab_delimiter_for_tsv() {
        let text = "name\tcount\nrust, cargo\t3\n";
        insta::assert_snapshot!(
            extract_from_tabular(text, DocumentKind::Tsv, 1000),
            @"name count rust, cargo"
        );
    }

    #[test]
    fn quoted_cells_keep_embedded_delimiters() {
        let text = "\"hello, world\",  spaced  \n";
        assert_eq!(
            extract_from_tabular(text, DocumentKind::Csv, 1000),
            "hello, world spaced"
        );
    }

    #[test]
    fn rows_past_limit_are_ignored() {
        let text = (0..1500)
            .map(|index| format!("row{},{}", index, index))
            .collect::<Vec<_>>()
            .join("\n");
        let output = extract_from_tabular(&text, DocumentKind::Csv, 1000);
        let words = output.split(' ').collect::<Vec<_>>();
        assert_eq!(words.len(), 1001);
        assert_eq!(words.first(), Some(&"row0"));
        assert_eq!(words.last(), Some(&"row1000"));
    }

    #[test]
    fn blank_lines_count_as_rows() {
        let text = "a\n\nb\n\nc\n";
        assert_eq!(extract_from_tabular(text, DocumentKind::Csv, 1), "a");
        assert_eq!(extract_from_tabular(text, DocumentKind::Csv, 2), "a b");
    }

    #[test]
    fn quoted_line_breaks_stay_in_one_row() {
        let text = "\"two\nlines\",x\r\ny\r\n";
        assert_eq!(split_rows(text, b','), vec!["\"two\nlines\",x", "y"]);
        assert_eq!(
            extract_from_tabular(text, DocumentKind::Csv, 0),
            "two\nlines x"
        );
    }

    #[test]
    fn only_ascii_digit_cells_are_numeric() {
        assert_eq!(
            extract_from_tabular("½,Ⅻ,x,42", DocumentKind::Csv, 1000),
            "½ Ⅻ x"
        );
    }

    #[test]
    fn unterminated_quote_is_not_fatal() {
        let text = "alpha,\"beta\ngamma";
        let output = extract_from_tabular(text, DocumentKind::Csv, 1000);
        assert!(output.contains("alpha"));
    }
}
