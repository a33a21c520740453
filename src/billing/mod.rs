pub mod invoice;
pub mod report;
