pub mod assignment;
pub mod flow;
pub mod lifecycle;
pub mod placement;
pub mod reconciliation;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;
