use crate::error::{Result, ShopError};
use crate::interfaces::api::Request;
use std::io::BufRead;

/// Reads boundary requests, one JSON object per line.
///
/// Blank lines and lines starting with `#` are skipped. A malformed line
/// yields an error for that line only.
pub struct RequestReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<Request>> {
        self.source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        None
                    } else {
                        Some(serde_json::from_str(trimmed).map_err(|e| {
                            ShopError::InvalidInput(format!("line {}: {e}", index + 1))
                        }))
                    }
                }
                Err(e) => Some(Err(ShopError::from(e))),
            })
    }
}
