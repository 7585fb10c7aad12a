pub mod board;
pub mod bulk;
pub mod ids;
pub mod layout;
pub mod lead;
pub mod pagination;
pub mod query;
pub mod selection;
pub mod session;

#[cfg(test)]
pub mod fixtures;
