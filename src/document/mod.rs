//! 文档层

pub mod assembler;

pub use assembler::{output_file_name, plan_pages, DocumentAssembler, PagePlan};
