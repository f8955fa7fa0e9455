//! Order hand-off file.
//!
//! A storefront run that reaches the confirmation page appends the order to a
//! CSV file that the fulfillment run (or any downstream tool) can pick up.
//! Fields are quoted per RFC 4180 when they contain a comma, quote or line
//! break. The header is written only when the file is created.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifacts::{ArtifactError, ArtifactResult};

/// Column names, in file order
pub const ORDER_HEADERS: [&str; 4] = ["order_id", "product_title", "product_url", "generated_at_utc"];

/// UTC timestamp format of `generated_at_utc`
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One exported order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub product_title: String,
    pub product_url: String,
    pub generated_at_utc: String,
}

impl OrderRecord {
    /// Record stamped with the current UTC time
    pub fn new(order_id: impl Into<String>, product_title: impl Into<String>, product_url: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            product_title: product_title.into(),
            product_url: product_url.into(),
            generated_at_utc: chrono::Utc::now().format(EXPORT_TIME_FORMAT).to_string(),
        }
    }
}

fn malformed(path: &Path) -> impl Fn(csv::Error) -> ArtifactError + '_ {
    move |err| ArtifactError::Export {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Append one record, creating the file (and parent directories) with a header
pub fn append_order(path: &Path, record: &OrderRecord) -> ArtifactResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ArtifactError::io(parent))?;
    }
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(ArtifactError::io(path))?;
    let mut writer = WriterBuilder::new()
        .has_headers(is_new)
        .terminator(Terminator::CRLF)
        .from_writer(file);
    writer.serialize(record).map_err(malformed(path))?;
    writer.flush().map_err(ArtifactError::io(path))?;

    debug!(path = %path.display(), order_id = %record.order_id, "order exported");
    Ok(())
}

/// Read every record from a hand-off file. Blank lines are ignored.
pub fn read_orders(path: &Path) -> ArtifactResult<Vec<OrderRecord>> {
    let file = File::open(path).map_err(ArtifactError::io(path))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let header = reader.headers().map_err(malformed(path))?;
    if header.is_empty() {
        return Ok(Vec::new());
    }
    if header.iter().ne(ORDER_HEADERS) {
        return Err(ArtifactError::Export {
            path: path.to_path_buf(),
            message: format!("unexpected header {:?}", header.iter().collect::<Vec<_>>()),
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<OrderRecord>, _>>()
        .map_err(malformed(path))
}
