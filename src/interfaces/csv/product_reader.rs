use crate::domain::catalog::Product;
use crate::error::{Result, ShopError};
use std::io::Read;

/// Reads catalog products from a CSV source.
///
/// Expected header: `id, name, category, price, stock` with an optional
/// trailing `deleted` column. Whitespace around fields is trimmed.
pub struct ProductReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ProductReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one product per row; a bad row yields an error
    /// and does not stop the rest.
    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ShopError::from))
    }
}
