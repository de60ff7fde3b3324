pub mod errors;
mod table;

pub use errors::ParserError;
pub use table::parse_track_table;

#[cfg(test)]
mod tests;
