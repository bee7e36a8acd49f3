pub mod contacts;
pub mod meta;
