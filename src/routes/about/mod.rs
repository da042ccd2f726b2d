mod handler;
mod model;

pub use handler::{about, home, submit_report};
pub use model::ReportRequest;
