pub mod report;
pub mod sequence;
