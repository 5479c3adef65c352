mod reporting_model;
mod reporting_service;


pub use reporting_model::PeriodSummary;
pub use reporting_service::{ReportingService, ReportingServiceTrait};
