//! Extract the latest release from the catalog page HTML.
//!
//! The page holds a table of releases, newest first, with a header row.
//! Columns by position: 0 = download link, 1 = version, 4 = MD5.

use scraper::{ElementRef, Html, Selector};

use crate::checksum;
use crate::error::UpdateError;
use crate::release::{file_name_from_url, Release};

const LINK_COLUMN: usize = 0;
const VERSION_COLUMN: usize = 1;
const CHECKSUM_COLUMN: usize = 4;

fn selector(css: &str) -> Result<Selector, UpdateError> {
    Selector::parse(css).map_err(|e| UpdateError::parse(format!("invalid selector {css:?}: {e:?}")))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse the catalog HTML into the newest `Release` (second row of the first table).
pub(crate) fn parse_latest(html: &str) -> Result<Release, UpdateError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| UpdateError::parse("no table element"))?;
    let latest = table
        .select(&row_sel)
        .nth(1)
        .ok_or_else(|| UpdateError::parse("table has no release rows"))?;
    let cells: Vec<ElementRef<'_>> = latest.select(&cell_sel).collect();
    if cells.len() <= CHECKSUM_COLUMN {
        return Err(UpdateError::parse(format!(
            "latest row has {} cells, expected at least {}",
            cells.len(),
            CHECKSUM_COLUMN + 1
        )));
    }

    let download_url = cells[LINK_COLUMN]
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| UpdateError::parse("first cell has no download link"))?
        .to_string();
    if file_name_from_url(&download_url).is_none() {
        return Err(UpdateError::parse(format!(
            "download link {download_url:?} has no filename"
        )));
    }

    let version = cell_text(&cells[VERSION_COLUMN]);
    if version.is_empty() {
        return Err(UpdateError::parse("version cell is empty"));
    }

    let expected_checksum = cell_text(&cells[CHECKSUM_COLUMN]).to_ascii_uppercase();
    if !checksum::is_valid_checksum(&expected_checksum) {
        return Err(UpdateError::parse(format!(
            "checksum cell {expected_checksum:?} is not a hex digest"
        )));
    }

    Ok(Release {
        download_url,
        version,
        expected_checksum,
    })
}
