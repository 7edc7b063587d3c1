//! Net worth: manual assets plus the portfolio, minus outstanding loans.
use crate::core::decimal::{Money, Scale};
use crate::core::error::{EngineError, EngineResult};
use crate::core::loan::LoanState;
use crate::core::valuation::PortfolioSummary;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Name of the asset line carrying the portfolio's current value.
pub const PORTFOLIO_ASSET_NAME: &str = "Stock Portfolio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Cash,
    RealEstate,
    Vehicle,
    #[default]
    Other,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetKind::Cash => "Cash",
            AssetKind::RealEstate => "Real Estate",
            AssetKind::Vehicle => "Vehicle",
            AssetKind::Other => "Other",
        };
        write!(f, "{label}")
    }
}

/// An asset valued by hand in the book, such as savings or a house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualAsset {
    pub name: String,
    #[serde(default)]
    pub kind: AssetKind,
    pub value: Money,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetLine {
    pub kind: AssetKind,
    pub name: String,
    pub value: Money,
    /// Derived from positions rather than entered by hand.
    pub auto_calculated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityLine {
    pub name: String,
    pub kind: Option<String>,
    pub remaining_balance: Money,
    pub monthly_payment: Money,
    pub progress_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorth {
    pub net_worth: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub assets: Vec<AssetLine>,
    pub liabilities: Vec<LiabilityLine>,
}

/// Totals assets and liabilities.
///
/// Assets are the manual assets followed by the portfolio's current value,
/// which is listed only when positive. Liabilities are the remaining balances
/// of `loans`; a paid-off loan stays listed at zero.
pub fn compute_net_worth(
    loans: &[LoanState],
    portfolio: Option<&PortfolioSummary>,
    manual_assets: &[ManualAsset],
) -> EngineResult<NetWorth> {
    let mut assets = Vec::with_capacity(manual_assets.len() + 1);
    let mut total_assets = Decimal::ZERO;

    for asset in manual_assets {
        if asset.value < Decimal::ZERO {
            return Err(EngineError::validation(
                "value",
                format!("asset '{}' must not be negative", asset.name),
            ));
        }
        let value = Scale::Currency.round(asset.value);
        total_assets += value;
        assets.push(AssetLine {
            kind: asset.kind,
            name: asset.name.clone(),
            value,
            auto_calculated: false,
        });
    }

    let investments = portfolio.map_or(Decimal::ZERO, |summary| summary.current_value);
    if investments > Decimal::ZERO {
        total_assets += investments;
        assets.push(AssetLine {
            kind: AssetKind::Other,
            name: PORTFOLIO_ASSET_NAME.to_string(),
            value: investments,
            auto_calculated: true,
        });
    }

    let mut liabilities = Vec::with_capacity(loans.len());
    let mut total_liabilities = Decimal::ZERO;
    for loan in loans {
        total_liabilities += loan.remaining_balance;
        liabilities.push(LiabilityLine {
            name: loan.name.clone(),
            kind: loan.kind.clone(),
            remaining_balance: loan.remaining_balance,
            monthly_payment: loan.monthly_payment,
            progress_percent: loan.progress()?.progress_percent,
        });
    }

    let net_worth = total_assets - total_liabilities;
    debug!(%total_assets, %total_liabilities, %net_worth, "Computed net worth");

    Ok(NetWorth {
        net_worth,
        total_assets,
        total_liabilities,
        assets,
        liabilities,
    })
}
