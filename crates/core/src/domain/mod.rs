pub mod balance_sheet;
pub mod ratios;
