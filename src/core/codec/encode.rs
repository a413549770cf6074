use anyhow::Result;
use quick_xml::escape::escape;
use rust_xlsxwriter::{Format, Workbook};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{SheetFormat, sheet_name};

const ODS_MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

/// Serialize `table` (header row first) into `format`.
pub fn encode(format: SheetFormat, table: &[Vec<String>], title: &str) -> Result<Vec<u8>> {
    match format {
        SheetFormat::Csv => encode_csv(table),
        SheetFormat::Xlsx => encode_xlsx(table, title),
        SheetFormat::Ods => encode_ods(table, title),
        SheetFormat::SpreadsheetMl => Ok(encode_spreadsheet_ml(table, title).into_bytes()),
    }
}

fn encode_csv(table: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in table {
        writer.write_record(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV buffer error: {}", e.error()))
}

fn encode_xlsx(table: &[Vec<String>], title: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(title))?;

    for (r, row) in table.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            // Text cells keep leading zeros and long digit runs intact.
            if r == 0 {
                worksheet.write_string_with_format(r as u32, c as u16, value, &header)?;
            } else {
                worksheet.write_string(r as u32, c as u16, value)?;
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn ods_content(table: &[Vec<String>], title: &str) -> String {
    let mut rows = String::new();
    for row in table {
        rows.push_str("<table:table-row>");
        for value in row {
            rows.push_str(&format!(
                "<table:table-cell office:value-type=\"string\"><text:p>{}</text:p></table:table-cell>",
                escape(value.as_str())
            ));
        }
        rows.push_str("</table:table-row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2"><office:body><office:spreadsheet><table:table table:name="{}">{}</table:table></office:spreadsheet></office:body></office:document-content>"#,
        escape(sheet_name(title).as_str()),
        rows
    )
}

fn ods_manifest() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="{}"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#,
        ODS_MIMETYPE
    )
}

fn encode_ods(table: &[Vec<String>], title: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // The mimetype entry must come first and be stored uncompressed.
    zip.start_file(
        "mimetype",
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )?;
    zip.write_all(ODS_MIMETYPE.as_bytes())?;

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file("META-INF/manifest.xml", deflated)?;
    zip.write_all(ods_manifest().as_bytes())?;
    zip.start_file("content.xml", deflated)?;
    zip.write_all(ods_content(table, title).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn encode_spreadsheet_ml(table: &[Vec<String>], title: &str) -> String {
    let mut rows = String::new();
    for (r, row) in table.iter().enumerate() {
        rows.push_str("   <Row>\n");
        for value in row {
            let style = if r == 0 { " ss:StyleID=\"header\"" } else { "" };
            rows.push_str(&format!(
                "    <Cell{}><Data ss:Type=\"String\">{}</Data></Cell>\n",
                style,
                escape(value.as_str())
            ));
        }
        rows.push_str("   </Row>\n");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<?mso-application progid="Excel.Sheet"?>
<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet" xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
 <Styles>
  <Style ss:ID="header"><Font ss:Bold="1"/></Style>
 </Styles>
 <Worksheet ss:Name="{}">
  <Table>
{}  </Table>
 </Worksheet>
</Workbook>
"#,
        escape(sheet_name(title).as_str()),
        rows
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Reader, Xlsx};
    use std::io::Read;

    fn table() -> Vec<Vec<String>> {
        vec![
            vec!["Name".into(), "Phone".into()],
            vec!["Ana & Bia".into(), "011999990000".into()],
            vec!["Carla, \"C\"".into(), "11977771234".into()],
        ]
    }

    #[test]
    fn csv_quotes_fields_with_delimiters() {
        let bytes = encode(SheetFormat::Csv, &table(), "Launch").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "Name,Phone\nAna & Bia,011999990000\n\"Carla, \"\"C\"\"\",11977771234\n"
        );
    }

    #[test]
    fn xlsx_is_readable_and_keeps_phone_text() {
        let bytes = encode(SheetFormat::Xlsx, &table(), "Launch").unwrap();
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Launch".to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_size(), (3, 2));
        assert_eq!(
            range.get_value((1, 1)).map(|d| d.to_string()),
            Some("011999990000".to_string())
        );
    }

    #[test]
    fn ods_has_stored_mimetype_first_and_escaped_content() {
        let bytes = encode(SheetFormat::Ods, &table(), "Launch").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }
        let mut content = String::new();
        archive
            .by_name("content.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("table:name=\"Launch\""));
        assert!(content.contains("<text:p>Ana &amp; Bia</text:p>"));
        assert!(archive.by_name("META-INF/manifest.xml").is_ok());
    }

    #[test]
    fn spreadsheet_ml_marks_header_and_escapes() {
        let xml = String::from_utf8(encode(SheetFormat::SpreadsheetMl, &table(), "A<B").unwrap())
            .unwrap();
        assert!(xml.contains("<?mso-application progid=\"Excel.Sheet\"?>"));
        assert!(xml.contains("ss:Name=\"A&lt;B\""));
        assert!(xml.contains("<Cell ss:StyleID=\"header\"><Data ss:Type=\"String\">Name</Data></Cell>"));
        assert!(xml.contains("Carla, &quot;C&quot;"));
        assert_eq!(xml.matches("<Row>").count(), 3);
    }

    #[test]
    fn exported_files_reimport_names_and_phones() {
        use crate::core::codec::decode_path;
        use crate::core::leads::export::{ExportRow, to_table};
        use crate::core::leads::normalizer::{Candidate, HeaderPolicy, parse_sheet};

        let rows = vec![ExportRow {
            name: "Ana".into(),
            phone: "011999990000".into(),
            status: "SENT".into(),
            agent: "Bia".into(),
            imported_at: "2024-01-01 10:00:00".into(),
            sent_at: "2024-01-02 09:30:00".into(),
        }];
        let table = to_table(&rows);
        let dir = tempfile::tempdir().unwrap();

        for format in [SheetFormat::Csv, SheetFormat::Xlsx, SheetFormat::Ods] {
            let path = dir.path().join(format!("launch.{}", format.extension()));
            std::fs::write(&path, encode(format, &table, "Launch").unwrap()).unwrap();
            let decoded = decode_path(&path).unwrap();
            let batch = parse_sheet(&decoded, HeaderPolicy::Strict).unwrap();
            assert_eq!(
                batch.candidates,
                vec![Candidate {
                    name: "Ana".into(),
                    phone: "011999990000".into(),
                }],
                "{:?} did not reimport",
                format
            );
            assert!(batch.rejected.is_empty());
        }
    }
}
