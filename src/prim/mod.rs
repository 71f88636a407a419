pub mod polygon;
mod triangle;

pub use triangle::Triangle;
