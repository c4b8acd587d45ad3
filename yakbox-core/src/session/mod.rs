pub mod arbiter;
pub mod capture;
