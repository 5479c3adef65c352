pub mod decimal_utils;
pub mod period;
pub mod time_utils;
