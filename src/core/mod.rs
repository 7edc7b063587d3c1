//! Calculation engine and the abstractions around it

pub mod amortization;
pub mod cache;
pub mod config;
pub mod cost_basis;
pub mod decimal;
pub mod error;
pub mod ledger;
pub mod loan;
pub mod log;
pub mod net_worth;
pub mod position;
pub mod quote;
pub mod valuation;

// Re-export main types for cleaner imports
pub use error::{EngineError, EngineResult};
pub use loan::{AmortizationEntry, LoanCalculation, LoanState, LoanTerms, PaymentEvent, PaymentResult, Schedule};
pub use net_worth::{AssetKind, ManualAsset, NetWorth};
pub use position::{InvestmentPosition, TradeEvent, TradeResult, TradeSide, TransactionRecord};
pub use quote::{Quote, QuoteLookup, QuoteSource};
pub use valuation::{PortfolioSummary, PositionValuation, StaleQuote};
