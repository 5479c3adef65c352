mod borrow_model;
mod borrow_projector;

pub use borrow_model::OutflowProjection;
pub use borrow_projector::project_borrow_outflows;
