pub mod connection;
pub mod layouts;
pub mod leads;
