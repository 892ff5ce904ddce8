//! Text-based I/O for verse datasets.
//!
//! Both functions assume UTF-8 input and drop a leading byte order mark,
//! which spreadsheet exports of the datasets tend to carry.

use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::fs;

use crate::error::BackendError;

/// Reads a UTF-8 text file, removing a leading BOM if present.
///
/// # Examples
///
/// ```no_run
/// use scriptura::fileio::do_read;
///
/// # async fn run() -> std::io::Result<()> {
/// let content = do_read("data/verses.json").await?;
/// println!("{}", content.len());
/// # Ok(())
/// # }
/// ```
pub async fn do_read<P: AsRef<Path>>(filename: P) -> std::io::Result<String> {
    let content = fs::read_to_string(filename).await?;
    match content.strip_prefix('\u{FEFF}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}

/// Reads and decodes a JSON file.
pub async fn read_json<T, P>(filename: P) -> Result<T, BackendError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = filename.as_ref();
    let content = do_read(path)
        .await
        .map_err(|e| BackendError::new(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| BackendError::new(format!("cannot decode {}: {}", path.display(), e)))
}
