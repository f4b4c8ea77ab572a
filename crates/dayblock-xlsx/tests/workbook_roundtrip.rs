//! Integration tests for the XLSX container round-trip
//!
//! Covers the writer's package layout and determinism, reading back our own
//! output, reading containers laid out the way other tools write them, and
//! the file-backed store used by the update pipeline.

use dayblock_core::{default_headers, run_update, AssembledBlock, CellValue, Row, SheetStore};
use dayblock_xlsx::{
    read_workbook_bytes, read_workbook_file, write_workbook, ReadPolicy, XlsxStore,
    DEFAULT_SHEET_NAME,
};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

fn t(s: &str) -> CellValue {
    CellValue::text(s)
}

fn n(v: f64) -> CellValue {
    CellValue::Number(v)
}

fn sample_rows() -> Vec<Row> {
    vec![
        vec![
            t("2024-01-01"),
            t("Torres Vedras"),
            n(8.4),
            n(17.0),
            n(31.3),
            t("NW,WNW"),
            n(29.9),
            t("N"),
        ],
        vec![t("2024-01-01"), t("Peniche"), CellValue::Empty, n(15.5)],
        vec![CellValue::Empty; 8],
        vec![t("2024-01-02"), t("Caldas & <Rainha>")],
        vec![],
    ]
}

/// Build a container by hand, the way third-party writers lay it out
fn foreign_container(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default();
    for (name, body) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

// =============================================================================
// Writer layout
// =============================================================================

#[test]
fn writer_emits_exactly_the_minimal_parts() {
    let bytes = write_workbook(&default_headers(), &sample_rows(), DEFAULT_SHEET_NAME).unwrap();
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();

    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(
        sorted,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]
    );
    assert!(!names.contains(&"xl/sharedStrings.xml"));
}

#[test]
fn writer_is_byte_identical_across_runs() {
    let first = write_workbook(&default_headers(), &sample_rows(), DEFAULT_SHEET_NAME).unwrap();
    let second = write_workbook(&default_headers(), &sample_rows(), DEFAULT_SHEET_NAME).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sheet_name_lands_in_workbook_part() {
    use std::io::Read;

    let bytes = write_workbook(&default_headers(), &[], "Oeste").unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut workbook = String::new();
    archive
        .by_name("xl/workbook.xml")
        .unwrap()
        .read_to_string(&mut workbook)
        .unwrap();
    assert!(workbook.contains(r#"<sheet name="Oeste" sheetId="1" r:id="rId1"/>"#));
}

// =============================================================================
// Round-trip
// =============================================================================

#[test]
fn rows_survive_a_round_trip() {
    let header = default_headers();
    let rows = sample_rows();
    let bytes = write_workbook(&header, &rows, DEFAULT_SHEET_NAME).unwrap();
    let back = read_workbook_bytes(&bytes).unwrap();

    assert_eq!(back.len(), rows.len() + 1);
    assert_eq!(back[0], header.iter().map(|h| t(h)).collect::<Row>());

    // Trailing empties are not written, so compare after trimming them
    let trim = |row: &Row| {
        let mut row = row.clone();
        while row.last().is_some_and(CellValue::is_empty) {
            row.pop();
        }
        row
    };
    for (written, read) in rows.iter().zip(&back[1..]) {
        assert_eq!(trim(read), trim(written));
    }
}

#[test]
fn booleans_come_back_as_text() {
    let rows = vec![vec![t("2024-01-01"), CellValue::Bool(true), CellValue::Bool(false)]];
    let bytes = write_workbook(&["date".to_string()], &rows, DEFAULT_SHEET_NAME).unwrap();
    let back = read_workbook_bytes(&bytes).unwrap();
    assert_eq!(back[1], vec![t("2024-01-01"), t("TRUE"), t("FALSE")]);
}

#[test]
fn rewriting_read_rows_is_stable() {
    let header = default_headers();
    let first = write_workbook(&header, &sample_rows(), DEFAULT_SHEET_NAME).unwrap();
    let back = read_workbook_bytes(&first).unwrap();
    let second = write_workbook(&header, &back[1..], DEFAULT_SHEET_NAME).unwrap();
    assert_eq!(first, second);
}

#[test]
fn values_rounding_to_whole_numbers_rewrite_identically() {
    let header = default_headers();
    let rows = vec![vec![
        t("2024-01-03"),
        t("Bombarral"),
        n(9.96),
        n(19.97),
        n(0.04),
        t("SW"),
        n(-0.04),
        n(3.14159),
    ]];

    let first = write_workbook(&header, &rows, DEFAULT_SHEET_NAME).unwrap();
    let back = read_workbook_bytes(&first).unwrap();
    assert_eq!(back[1][2..5], [n(10.0), n(20.0), n(0.0)]);
    assert_eq!(back[1][6..], [n(0.0), n(3.1)]);

    let second = write_workbook(&header, &back[1..], DEFAULT_SHEET_NAME).unwrap();
    assert_eq!(first, second);
}

#[test]
fn edge_whitespace_survives_a_round_trip() {
    let rows = vec![vec![t("2024-01-01"), t("  Caldas da Rainha "), t("\tN")]];
    let bytes = write_workbook(&default_headers(), &rows, DEFAULT_SHEET_NAME).unwrap();
    let back = read_workbook_bytes(&bytes).unwrap();
    assert_eq!(back[1], rows[0]);
}

// =============================================================================
// Containers from other tools
// =============================================================================

#[test]
fn reads_shared_strings_through_relationships() {
    let bytes = foreign_container(&[
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Data" sheetId="1" r:id="rId7"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/data.xml"/></Relationships>"#,
        ),
        (
            "xl/sharedStrings.xml",
            r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>date</t></si><si><t>concelho</t></si><si><t>2024-02-10</t></si><si><r><t>Bom</t></r><r><t>barral</t></r></si></sst>"#,
        ),
        (
            "xl/worksheets/data.xml",
            r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" t="s"><v>3</v></c><c r="C2"><v>11.5</v></c><c r="D2" t="s"><v>42</v></c></row></sheetData></worksheet>"#,
        ),
    ]);

    let rows = read_workbook_bytes(&bytes).unwrap();
    assert_eq!(
        rows,
        vec![
            vec![t("date"), t("concelho")],
            vec![t("2024-02-10"), t("Bombarral"), n(11.5), CellValue::Empty],
        ]
    );
}

#[test]
fn falls_back_to_default_sheet_path() {
    let bytes = foreign_container(&[(
        "xl/worksheets/sheet1.xml",
        r#"<worksheet><sheetData><row><c r="B1"><v>3</v></c></row></sheetData></worksheet>"#,
    )]);
    let rows = read_workbook_bytes(&bytes).unwrap();
    assert_eq!(rows, vec![vec![CellValue::Empty, n(3.0)]]);
}

#[test]
fn container_without_worksheet_reads_empty() {
    let bytes = foreign_container(&[("xl/workbook.xml", "<workbook/>")]);
    assert!(read_workbook_bytes(&bytes).unwrap().is_empty());
}

#[test]
fn missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let rows = read_workbook_file(&dir.path().join("nope.xlsx")).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn garbage_is_an_error() {
    assert!(read_workbook_bytes(b"not a zip file").is_err());
}

// =============================================================================
// File-backed store
// =============================================================================

#[test]
fn store_writes_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.xlsx");
    let mut store = XlsxStore::new(&path);

    store
        .write(&default_headers(), &[vec![t("2024-01-01"), t("Obidos")]])
        .unwrap();

    let rows = store.read().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec![t("2024-01-01"), t("Obidos")]);
    // Only the destination remains; the staging file was renamed over it
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn unreadable_workbook_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.xlsx");
    std::fs::write(&path, b"corrupted").unwrap();

    let reset = XlsxStore::new(&path);
    assert!(reset.read().unwrap().is_empty());

    let abort = XlsxStore::new(&path).on_unreadable(ReadPolicy::Abort);
    assert!(abort.read().is_err());
    assert_eq!(std::fs::read(&path).unwrap(), b"corrupted");
}

#[test]
fn pipeline_over_file_store_replaces_same_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.xlsx");
    let mut store = XlsxStore::new(&path);
    let headers = default_headers();

    let day = |date: &str, name: &str, t_max: f64| AssembledBlock {
        rows: vec![{
            let mut row = vec![t(date), t(name), CellValue::Empty, n(t_max)];
            row.resize(8, CellValue::Empty);
            row
        }],
        errors: Vec::new(),
        run_date: Some(date.to_string()),
    };

    run_update(&mut store, &headers, &day("2024-01-01", "A", 10.0)).unwrap();
    run_update(&mut store, &headers, &day("2024-01-02", "B", 9.0)).unwrap();
    let before = std::fs::read(&path).unwrap();
    let report = run_update(&mut store, &headers, &day("2024-01-02", "B", 11.0)).unwrap();
    assert!(report.replaced);

    let rows = read_workbook_file(&path).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[1][..4], [t("2024-01-01"), t("A"), CellValue::Empty, n(10.0)]);
    assert!(rows[2].is_empty());
    assert_eq!(rows[3][..4], [t("2024-01-02"), t("B"), CellValue::Empty, n(11.0)]);
    assert!(rows[4].is_empty());

    // Same input again: the file does not change at all
    run_update(&mut store, &headers, &day("2024-01-02", "B", 11.0)).unwrap();
    let after_first = std::fs::read(&path).unwrap();
    run_update(&mut store, &headers, &day("2024-01-02", "B", 11.0)).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), after_first);
    assert_ne!(before, after_first);
}
