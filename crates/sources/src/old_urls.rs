use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::decode::decode_url;
use crate::error::{Result, SourceError};

/// Header naming the old-URL column; otherwise the first column is used.
pub const URL_COLUMN: &str = "url";

/// Extensions read as spreadsheets; anything else is read as CSV.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Old URLs from a CSV file or the first sheet of a spreadsheet, picked by
/// extension.
pub fn read_old_urls(path: &Path) -> Result<Vec<String>> {
    let urls = if is_spreadsheet(path) {
        read_old_urls_xlsx(path)?
    } else {
        read_old_urls_from(File::open(path)?)?
    };
    log::info!("Read {} old URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Old URLs from a CSV table with a header row, in row order.
///
/// Cells are trimmed and percent-decoded. Blank cells and unreadable rows are
/// skipped; duplicates are kept.
pub fn read_old_urls_from<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let mut rows = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_owned).collect()),
            Err(err) => log::warn!("Skipping unreadable input row {}: {err}", row + 2),
        }
    }
    pick_urls(&headers, rows)
}

/// Same rules as [`read_old_urls_from`], applied to the first worksheet.
pub fn read_old_urls_xlsx(path: &Path) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::Other(format!("{} has no worksheets", path.display())))??;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    pick_urls(&headers, rows)
}

fn pick_urls<I>(headers: &[String], rows: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if headers.is_empty() {
        return Err(SourceError::Other("input table has no columns".to_string()));
    }
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == URL_COLUMN)
        .unwrap_or(0);

    let mut urls = Vec::new();
    for row in rows {
        if let Some(cell) = row.get(column) {
            let cell = cell.trim();
            if !cell.is_empty() {
                urls.push(decode_url(cell));
            }
        }
    }
    Ok(urls)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn prefers_url_column() {
        let csv = "title,url\nHome, https://example.com/ \nPost,/blog/%D8%A7\n";
        assert_eq!(
            read_old_urls_from(csv.as_bytes()).unwrap(),
            vec!["https://example.com/", "/blog/ا"]
        );
    }

    #[test]
    fn falls_back_to_first_column() {
        let csv = "address,notes\n/a,x\n,blank\n/b\n/a,dup\n";
        assert_eq!(
            read_old_urls_from(csv.as_bytes()).unwrap(),
            vec!["/a", "/b", "/a"]
        );
    }

    #[test]
    fn header_with_bom_still_matches() {
        let csv = "\u{feff}url,other\n/x,1\n";
        assert_eq!(read_old_urls_from(csv.as_bytes()).unwrap(), vec!["/x"]);
    }

    #[test]
    fn empty_input_fails() {
        assert!(read_old_urls_from("".as_bytes()).is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "url\n/one\n/two\n").unwrap();
        assert_eq!(read_old_urls(&path).unwrap(), vec!["/one", "/two"]);
        assert!(read_old_urls(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn reads_first_sheet_of_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old_urls.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "title").unwrap();
        sheet.write_string(0, 1, "url").unwrap();
        sheet.write_string(1, 0, "Phone").unwrap();
        sheet.write_string(1, 1, "https://old.example.com/shop/%DA%AF%D9%88%D8%B4%DB%8C").unwrap();
        sheet.write_string(2, 0, "Empty").unwrap();
        sheet.write_string(3, 0, "Post").unwrap();
        sheet.write_string(3, 1, " /blog/post ").unwrap();
        workbook.save(&path).unwrap();

        assert_eq!(
            read_old_urls(&path).unwrap(),
            vec!["https://old.example.com/shop/گوشی", "/blog/post"]
        );
    }

    #[test]
    fn xlsx_without_url_header_uses_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.XLSX");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Address").unwrap();
        sheet.write_string(1, 0, "/a").unwrap();
        sheet.write_string(2, 0, "/b").unwrap();
        workbook.save(&path).unwrap();

        assert_eq!(read_old_urls(&path).unwrap(), vec!["/a", "/b"]);
    }

    #[test]
    fn extension_picks_reader() {
        assert!(is_spreadsheet(Path::new("old_urls.xlsx")));
        assert!(is_spreadsheet(Path::new("OLD.XLS")));
        assert!(!is_spreadsheet(Path::new("old_urls.csv")));
        assert!(!is_spreadsheet(Path::new("old_urls")));
    }
}
