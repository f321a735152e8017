//! Minimal OOXML spreadsheet reader.
//!
//! Understands exactly what a flat transaction export needs: the shared
//! string table and the cells of the first worksheet. Styles, formulas,
//! merged cells and further sheets are ignored.
//!
//! Sheet layout: row 1 is a title and is discarded, row 2 holds the column
//! headers, every later row is a transaction.

use crate::column::{column_of_reference, MAX_COLUMNS};
use crate::error::{ReconError, Result};
use crate::transaction::Transaction;
use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive path of the shared string table.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Archive path of the worksheet that holds the transactions.
pub const WORKSHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Reads transactions from a spreadsheet file.
pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    info!("Reading spreadsheet: {}", path.display());
    let transactions = SpreadsheetReader::open(path)?.read_transactions()?;
    info!("Loaded {} transactions from spreadsheet", transactions.len());
    Ok(transactions)
}

/// A spreadsheet archive opened for reading.
pub struct SpreadsheetReader<R> {
    archive: ZipArchive<R>,
}

impl SpreadsheetReader<BufReader<File>> {
    /// Opens the archive at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> SpreadsheetReader<R> {
    /// Wraps any seekable source holding a ZIP archive.
    pub fn new(reader: R) -> Result<Self> {
        Ok(SpreadsheetReader {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Parses the worksheet into transactions, in sheet order.
    ///
    /// Rows without a `Gateway UUID` or `Transaction ID` are dropped.
    pub fn read_transactions(&mut self) -> Result<Vec<Transaction>> {
        let shared_strings = match self.read_part(SHARED_STRINGS_PART)? {
            Some(xml) => {
                let strings = parse_shared_strings(&xml)?;
                info!("Loaded {} shared strings", strings.len());
                strings
            }
            None => {
                warn!("No shared strings in spreadsheet; string cells will be empty");
                Vec::new()
            }
        };

        let worksheet = self
            .read_part(WORKSHEET_PART)?
            .ok_or_else(|| ReconError::MissingWorksheet(WORKSHEET_PART.to_string()))?;
        let rows = parse_rows(&worksheet, &shared_strings)?;

        Ok(rows_to_transactions(rows))
    }

    /// Returns the bytes of an archive member, or `None` if it is absent.
    fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut part = match self.archive.by_name(name) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::with_capacity(part.size() as usize);
        part.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }
}

/// Turns dense rows into transactions.
///
/// Needs a title row, a header row and at least one data row; anything
/// shorter yields no transactions.
pub fn rows_to_transactions(rows: Vec<Vec<String>>) -> Vec<Transaction> {
    if rows.len() < 3 {
        warn!("Worksheet has {} rows; expected title, headers and data", rows.len());
        return Vec::new();
    }

    let mut rows = rows.into_iter().skip(1);
    let headers = rows.next().unwrap_or_default();
    debug!("Headers: {:?}", headers);

    rows.enumerate()
        .filter_map(|(idx, cells)| {
            let tx = Transaction::from_row(&headers, &cells);
            if tx.has_identity() {
                Some(tx)
            } else {
                debug!("Row {}: no Gateway UUID or Transaction ID, dropped", idx + 3);
                None
            }
        })
        .collect()
}

/// Extracts the shared string table in document order.
///
/// Each `<si>` contributes the text of its first `<t>`, or an empty string
/// when it has none. Rich-text items with several runs therefore yield
/// their first run only.
pub fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut doc = DocumentCheck::new(SHARED_STRINGS_PART);
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut in_item = false;
    let mut first_text: Option<String> = None;
    let mut text: Option<String> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        doc.observe(&event);
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    first_text = None;
                }
                b"t" if in_item && first_text.is_none() => text = Some(String::new()),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"si" => strings.push(String::new()),
                b"t" if in_item && first_text.is_none() => first_text = Some(String::new()),
                _ => {}
            },
            Event::Text(e) => {
                if let Some(text) = text.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(text) = text.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => {
                    if let Some(done) = text.take() {
                        first_text = Some(done);
                    }
                }
                b"si" => {
                    strings.push(first_text.take().unwrap_or_default());
                    in_item = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    doc.finish()?;
    Ok(strings)
}

/// A cell being assembled while its children stream past.
struct PendingCell {
    reference: String,
    column: usize,
    shared: bool,
    value: Option<String>,
    in_value: bool,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>, next_column: usize) -> Result<Self> {
        let mut reference = None;
        let mut shared = false;
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"r" => reference = Some(attr.unescape_value()?.into_owned()),
                b"t" => shared = attr.unescape_value()? == "s",
                _ => {}
            }
        }

        // Cells may omit their reference; they then follow the previous one.
        let column = match reference.as_deref() {
            Some(r) => column_of_reference(r),
            None => Some(next_column).filter(|c| *c < MAX_COLUMNS),
        };
        let column = column.ok_or_else(|| ReconError::MalformedPart {
            part: WORKSHEET_PART.to_string(),
            reason: format!(
                "cell {} is outside columns A..XFD",
                reference.as_deref().unwrap_or("without reference")
            ),
        })?;

        Ok(PendingCell {
            reference: reference.unwrap_or_default(),
            column,
            shared,
            value: None,
            in_value: false,
        })
    }

    fn resolve(self, shared_strings: &[String]) -> Result<(usize, String)> {
        let raw = match self.value {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok((self.column, String::new())),
        };
        if !self.shared {
            return Ok((self.column, raw));
        }

        let index: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ReconError::InvalidSharedStringIndex {
                cell: self.reference.clone(),
                value: raw.clone(),
            })?;
        let value = usize::try_from(index)
            .ok()
            .and_then(|i| shared_strings.get(i))
            .cloned()
            .unwrap_or_default();
        Ok((self.column, value))
    }
}

/// Parses every `<row>` of the worksheet into a dense list of cell values.
///
/// Cells are sparse in the file; columns with no cell in a row are filled
/// with empty strings up to the row's rightmost cell.
pub fn parse_rows(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_reader(xml);
    let mut doc = DocumentCheck::new(WORKSHEET_PART);
    let mut buf = Vec::new();

    let mut rows = Vec::new();
    let mut row: Option<BTreeMap<usize, String>> = None;
    let mut cell: Option<PendingCell> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        doc.observe(&event);
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Some(BTreeMap::new()),
                b"c" => {
                    if let Some(cells) = row.as_ref() {
                        cell = Some(PendingCell::from_start(&e, next_column(cells))?);
                    }
                }
                b"v" => {
                    if let Some(pending) = cell.as_mut().filter(|c| c.value.is_none()) {
                        pending.in_value = true;
                        pending.value = Some(String::new());
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    if let Some(cells) = row.as_mut() {
                        let pending = PendingCell::from_start(&e, next_column(cells))?;
                        cells.insert(pending.column, String::new());
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some(pending) = cell.as_mut().filter(|c| c.in_value) {
                    if let Some(value) = pending.value.as_mut() {
                        value.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => {
                    if let Some(pending) = cell.as_mut() {
                        pending.in_value = false;
                    }
                }
                b"c" => {
                    if let (Some(pending), Some(cells)) = (cell.take(), row.as_mut()) {
                        let (column, value) = pending.resolve(shared_strings)?;
                        cells.insert(column, value);
                    }
                }
                b"row" => {
                    if let Some(cells) = row.take() {
                        rows.push(densify(cells));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    doc.finish()?;
    Ok(rows)
}

fn next_column(cells: &BTreeMap<usize, String>) -> usize {
    cells.keys().next_back().map_or(0, |last| last + 1)
}

fn densify(cells: BTreeMap<usize, String>) -> Vec<String> {
    let width = cells.keys().next_back().map_or(0, |last| last + 1);
    let mut dense = vec![String::new(); width];
    for (column, value) in cells {
        dense[column] = value;
    }
    dense
}

/// Tracks element nesting so truncated or empty parts are rejected.
///
/// The XML reader checks that end tags match but stops quietly at end of
/// input; a part must contain a root element and close everything it opens.
struct DocumentCheck {
    part: &'static str,
    depth: usize,
    saw_root: bool,
}

impl DocumentCheck {
    fn new(part: &'static str) -> Self {
        DocumentCheck {
            part,
            depth: 0,
            saw_root: false,
        }
    }

    fn observe(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(_) => {
                self.depth += 1;
                self.saw_root = true;
            }
            Event::Empty(_) => self.saw_root = true,
            Event::End(_) => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
    }

    fn finish(&self) -> Result<()> {
        let reason = if !self.saw_root {
            "no root element"
        } else if self.depth > 0 {
            "unexpected end of document"
        } else {
            return Ok(());
        };
        Err(ReconError::MalformedPart {
            part: self.part.to_string(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>Report</t></si>
<si><t>Gateway UUID</t></si>
<si><r><rPr><b/></rPr><t>Bold</t></r><r><t> tail</t></r></si>
<si/>
</sst>"#;

    fn archive(parts: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    fn sheet(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
        )
    }

    #[test]
    fn test_shared_strings_first_run_only() {
        let strings = parse_shared_strings(SHARED.as_bytes()).unwrap();
        assert_eq!(strings, vec!["Report", "Gateway UUID", "Bold", ""]);
    }

    #[test]
    fn test_shared_strings_unescape_entities() {
        let xml = r#"<sst><si><t>Fish &amp; Chips</t></si></sst>"#;
        assert_eq!(parse_shared_strings(xml.as_bytes()).unwrap(), vec!["Fish & Chips"]);
    }

    #[test]
    fn test_rows_are_dense() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1"><v>42</v></c></row>
<row r="2"><c r="B2" t="s"><v>1</v></c></row>"#,
        );
        let shared = vec!["Report".to_string(), "Gateway UUID".to_string()];

        let rows = parse_rows(xml.as_bytes(), &shared).unwrap();
        assert_eq!(rows, vec![vec!["Report", "", "42"], vec!["", "Gateway UUID"]]);
    }

    #[test]
    fn test_cell_value_edge_cases() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>9</v></c><c r="B1"/><c r="C1" t="s"/><c r="D1" t="n"><v>1.5E-2</v></c><c r="E1" t="inlineStr"><is><t>x</t></is></c></row>"#,
        );

        let rows = parse_rows(xml.as_bytes(), &[]).unwrap();
        assert_eq!(rows, vec![vec!["", "", "", "1.5E-2", ""]]);
    }

    #[test]
    fn test_cells_without_reference_follow_previous() {
        let xml = sheet(r#"<row><c r="B1"><v>b</v></c><c><v>c</v></c></row>"#);

        let rows = parse_rows(xml.as_bytes(), &[]).unwrap();
        assert_eq!(rows, vec![vec!["", "b", "c"]]);
    }

    #[test]
    fn test_non_integer_shared_index_is_fatal() {
        let xml = sheet(r#"<row><c r="A1" t="s"><v>abc</v></c></row>"#);

        let err = parse_rows(xml.as_bytes(), &[]).unwrap_err();
        assert!(matches!(err, ReconError::InvalidSharedStringIndex { .. }));
    }

    #[test]
    fn test_out_of_range_cell_reference_is_fatal() {
        for reference in ["AAAAAAAAAAAAAAA3", "ZZZZZZZ1", "XFE1", "12"] {
            let xml = sheet(&format!(r#"<row><c r="{reference}"><v>x</v></c></row>"#));
            let err = parse_rows(xml.as_bytes(), &[]).unwrap_err();
            assert!(
                matches!(err, ReconError::MalformedPart { .. }),
                "{reference}: {err:?}"
            );
        }

        let empty = sheet(r#"<row><c r="AAAAAAAAAAAAAAA3"/></row>"#);
        assert!(matches!(
            parse_rows(empty.as_bytes(), &[]),
            Err(ReconError::MalformedPart { .. })
        ));

        let worksheet = sheet(r#"<row><c r="AAAAAAAAAAAAAAA3"><v>1</v></c></row>"#);
        let archive = archive(&[(WORKSHEET_PART, worksheet.as_str())]);
        let err = SpreadsheetReader::new(archive)
            .unwrap()
            .read_transactions()
            .unwrap_err();
        assert!(matches!(err, ReconError::MalformedPart { .. }));
    }

    #[test]
    fn test_last_column_is_accepted() {
        let xml = sheet(r#"<row><c r="XFD1"><v>x</v></c></row>"#);
        let rows = parse_rows(xml.as_bytes(), &[]).unwrap();
        assert_eq!(rows[0].len(), MAX_COLUMNS);
        assert_eq!(rows[0][MAX_COLUMNS - 1], "x");
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        assert!(parse_rows(b"<worksheet><sheetData><row></sheetData></worksheet>", &[]).is_err());
        assert!(parse_rows(b"<worksheet><sheetData>", &[]).is_err());
        assert!(parse_shared_strings(b"not xml at all").is_err());
    }

    #[test]
    fn test_read_transactions_from_archive() {
        let body = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>Amount</v></c></row>
<row r="3"><c r="A3"><v>T1</v></c><c r="B3"><v>100</v></c></row>
<row r="4"><c r="B4"><v>999</v></c></row>
<row r="5"><c r="A5"><v>T2</v></c></row>"#,
        );
        let cursor = archive(&[(SHARED_STRINGS_PART, SHARED), (WORKSHEET_PART, &body)]);

        let txs = SpreadsheetReader::new(cursor).unwrap().read_transactions().unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].gateway_uuid.as_deref(), Some("T1"));
        assert_eq!(txs[0].amount.as_deref(), Some("100"));
        assert_eq!(txs[1].gateway_uuid.as_deref(), Some("T2"));
        assert_eq!(txs[1].amount.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_shared_strings_is_tolerated() {
        let body = sheet(
            r#"<row><c r="A1"><v>Title</v></c></row>
<row><c r="A2"><v>Gateway UUID</v></c><c r="B2"><v>Merchant</v></c></row>
<row><c r="A3"><v>T1</v></c><c r="B3" t="s"><v>0</v></c></row>"#,
        );
        let cursor = archive(&[(WORKSHEET_PART, &body)]);

        let txs = SpreadsheetReader::new(cursor).unwrap().read_transactions().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].merchant.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_worksheet_is_fatal() {
        let cursor = archive(&[(SHARED_STRINGS_PART, SHARED)]);

        let err = SpreadsheetReader::new(cursor)
            .unwrap()
            .read_transactions()
            .unwrap_err();
        assert!(matches!(err, ReconError::MissingWorksheet(_)));
    }

    #[test]
    fn test_not_an_archive() {
        let err = SpreadsheetReader::new(Cursor::new(b"plain text".to_vec()))
            .err()
            .unwrap();
        assert!(matches!(err, ReconError::Zip(_)));
    }

    #[test]
    fn test_two_rows_yield_nothing() {
        let rows = vec![vec!["Title".to_string()], vec!["Gateway UUID".to_string()]];
        assert!(rows_to_transactions(rows).is_empty());
    }
}
