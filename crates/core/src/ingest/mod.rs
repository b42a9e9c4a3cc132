pub mod alpha_vantage;
pub mod provider;
pub mod types;
