pub mod calc;
pub mod loans;
pub mod networth;
pub mod portfolio;
pub mod setup;
pub mod ui;
