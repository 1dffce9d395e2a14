/// HND Bayern water-level history scraper
///
/// Fetches the gauge history page (an HTML table, class `tblsort`) and
/// parses its body rows into timestamped water-level readings. The page
/// uses German formatting: `DD.MM.YYYY HH:MM` dates and decimal commas.
///
/// Rows that fail date or numeric parsing are skipped; a missing table or
/// a non-200 response is a hard error.

use chrono::NaiveDateTime;

use crate::logging::{self, DataSource};
use crate::model::{FetchError, WaterLevelReading};

/// CSS class of the history table on the HND gauge page.
const TABLE_CLASS: &str = "tblsort";

/// Timestamp format used in the first table column.
const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

// ============================================================================
// Fetching
// ============================================================================

/// Fetch and parse the water-level history table.
///
/// Fails fast on a non-200 status or when the expected table structure is
/// absent. The returned vector may be empty if every row was unparsable;
/// emptiness is the caller's concern.
pub fn fetch_water_level_history(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<Vec<WaterLevelReading>, FetchError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::HttpError(response.status().as_u16()));
    }

    let body = response
        .text()
        .map_err(|e| FetchError::ParseError(e.to_string()))?;

    parse_history_table(&body)
}

// ============================================================================
// HTML parsing
// ============================================================================

/// Parse the history page HTML into readings.
pub fn parse_history_table(html: &str) -> Result<Vec<WaterLevelReading>, FetchError> {
    let table = find_element(html, "table", Some(TABLE_CLASS)).ok_or(FetchError::MissingTable)?;
    // Some page variants omit <tbody>; fall back to scanning the table itself.
    let body = find_element(table, "tbody", None).unwrap_or(table);

    let rows = collect_elements(body, "tr");
    let total = rows.len();
    let mut readings = Vec::new();

    for row in &rows {
        let cells = collect_elements(row, "td");
        if cells.len() < 2 {
            continue; // header or spacer row
        }

        let date_text = text_content(cells[0]);
        let value_text = text_content(cells[1]).replace(',', ".");

        let timestamp = match NaiveDateTime::parse_from_str(&date_text, DATE_FORMAT) {
            Ok(ts) => ts,
            Err(_) => continue,
        };
        let level_cm: f64 = match value_text.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        readings.push(WaterLevelReading { timestamp, level_cm });
    }

    logging::log_read_summary(
        DataSource::Hnd,
        "water level table",
        total,
        readings.len(),
        total - readings.len(),
    );

    Ok(readings)
}

// ----------------------------------------------------------------------------
// Minimal tag scanning. The HND table is flat (no nested tables or cells),
// so non-nesting case-insensitive scanning is sufficient.
// ----------------------------------------------------------------------------

/// Case-insensitive substring search over ASCII.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || from + n.len() > h.len() {
        return None;
    }
    (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Find the first `<tag ...>...</tag>` element, optionally requiring the
/// opening tag's attributes to mention `class_name`, and return its inner
/// HTML.
fn find_element<'a>(html: &'a str, tag: &str, class_name: Option<&str>) -> Option<&'a str> {
    let open_marker = format!("<{}", tag);
    let close_marker = format!("</{}", tag);
    let mut pos = 0;

    while let Some(start) = find_ci(html, &open_marker, pos) {
        let after_tag = start + open_marker.len();
        // Reject prefix matches like <tablefoot for tag "table"
        match html.as_bytes().get(after_tag) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' => {}
            _ => {
                pos = after_tag;
                continue;
            }
        }
        let gt = match html[after_tag..].find('>') {
            Some(i) => after_tag + i,
            None => return None,
        };

        if let Some(class_name) = class_name {
            let attrs = &html[after_tag..gt];
            if find_ci(attrs, class_name, 0).is_none() {
                pos = gt + 1;
                continue;
            }
        }

        let end = find_ci(html, &close_marker, gt + 1)?;
        return Some(&html[gt + 1..end]);
    }
    None
}

/// Collect the inner HTML of every `<tag>` element, in document order.
fn collect_elements<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let open_marker = format!("<{}", tag);
    let close_marker = format!("</{}", tag);
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_ci(html, &open_marker, pos) {
        let after_tag = start + open_marker.len();
        match html.as_bytes().get(after_tag) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' => {}
            _ => {
                pos = after_tag;
                continue;
            }
        }
        let gt = match html[after_tag..].find('>') {
            Some(i) => after_tag + i,
            None => break,
        };
        let end = match find_ci(html, &close_marker, gt + 1) {
            Some(i) => i,
            None => break,
        };
        out.push(&html[gt + 1..end]);
        pos = end + close_marker.len();
    }
    out
}

/// Strip markup from a fragment and trim surrounding whitespace.
fn text_content(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ").trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <table class="tblsort" id="pegel">
          <thead><tr><th>Datum</th><th>Wasserstand [cm]</th></tr></thead>
          <tbody>
            <tr><td>01.05.2024 12:00</td><td>142,5</td></tr>
            <tr><td>01.05.2024 13:00</td><td>141,0</td></tr>
            <tr><td>01.05.2024 14:00</td><td>--</td></tr>
            <tr><td>kein Datum</td><td>140,0</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parses_rows_and_skips_bad_ones() {
        let readings = parse_history_table(FIXTURE).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].level_cm, 142.5);
        assert_eq!(readings[0].hour(), 12);
        assert_eq!(readings[1].level_cm, 141.0);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let html = "<html><body><p>Wartungsarbeiten</p></body></html>";
        match parse_history_table(html) {
            Err(FetchError::MissingTable) => {}
            other => panic!("expected MissingTable, got {:?}", other),
        }
    }

    #[test]
    fn test_other_tables_are_ignored() {
        let html = r#"
            <table class="nav"><tr><td>01.01.2024 00:00</td><td>999</td></tr></table>
            <table class="tblsort"><tbody>
              <tr><td>02.01.2024 05:00</td><td>133,0</td></tr>
            </tbody></table>
        "#;
        let readings = parse_history_table(html).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].level_cm, 133.0);
    }

    #[test]
    fn test_case_insensitive_markup() {
        let html = r#"
            <TABLE CLASS="TBLSORT"><TBODY>
              <TR><TD>03.02.2024 08:15</TD><TD>150,25</TD></TR>
            </TBODY></TABLE>
        "#;
        let readings = parse_history_table(html).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].level_cm, 150.25);
        assert_eq!(readings[0].hour(), 8);
    }

    #[test]
    fn test_cell_markup_is_stripped() {
        let html = r#"
            <table class="tblsort"><tbody>
              <tr><td><span>04.02.2024 09:00</span></td><td> <b>128,0</b>&nbsp;</td></tr>
            </tbody></table>
        "#;
        let readings = parse_history_table(html).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].level_cm, 128.0);
    }

    #[test]
    fn test_empty_table_yields_empty_vec() {
        let html = r#"<table class="tblsort"><tbody></tbody></table>"#;
        let readings = parse_history_table(html).unwrap();
        assert!(readings.is_empty());
    }
}
