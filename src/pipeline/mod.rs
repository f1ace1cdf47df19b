pub mod aggregate;
pub mod table;
