mod cash_flow_calculator;
mod cash_flow_model;

pub use cash_flow_calculator::calculate_cash_flow;
pub use cash_flow_model::{CashFlowReport, TypeFlow};
