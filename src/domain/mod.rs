pub mod decode;
pub mod models;
pub mod report;
pub mod session_filter;
pub mod timestamp;
pub mod token;
