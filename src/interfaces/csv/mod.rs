pub mod product_reader;
pub mod report_writer;
