pub mod classify;
pub mod dispatch;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod pipeline;

pub use error::{ReportError, Result};
