//! Core library for the yard-erp command line application.
//!
//! The library turns yard inventory exports into per-customer transshipment
//! reports. IO adapters live under [`yard::erp::io`], the record types inside
//! [`yard::erp::model`], aging classification in [`yard::erp::classify`],
//! workbook layout in [`yard::erp::flatten`], email delivery in
//! [`yard::erp::dispatch`], and the end-to-end entry points under
//! [`yard::erp::pipeline`].

pub mod yard;

pub use yard::erp::{
    ReportError, Result, classify, dispatch, error, flatten, io, model, pipeline,
};
