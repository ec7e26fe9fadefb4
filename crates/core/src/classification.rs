use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of money movement relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashflowType {
    Inflow,
    Outflow,
    Transfer,
    Withdrawal,
}

impl fmt::Display for CashflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashflowType::Inflow => write!(f, "INFLOW"),
            CashflowType::Outflow => write!(f, "OUTFLOW"),
            CashflowType::Transfer => write!(f, "TRANSFER"),
            CashflowType::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

impl std::str::FromStr for CashflowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFLOW" => Ok(CashflowType::Inflow),
            "OUTFLOW" => Ok(CashflowType::Outflow),
            "TRANSFER" => Ok(CashflowType::Transfer),
            "WITHDRAWAL" => Ok(CashflowType::Withdrawal),
            other => Err(format!("Unknown cashflow type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    TransferInternal,
    TransferExternal,
    WithdrawalAtm,
    WithdrawalOwnerDraw,
    InflowCardSales,
    InflowProcessorOther,
    OutflowLaborPayroll,
    OutflowLaborTaxes,
    OutflowLaborBenefits,
    OutflowCogsFood,
    OutflowInsurance,
    OutflowMaintenance,
    OutflowLoanPayment,
    OutflowMiscOpex,
    OutflowSoftware,
    OutflowVendorNoncogs,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::TransferInternal => "TRANSFER_INTERNAL",
            Category::TransferExternal => "TRANSFER_EXTERNAL",
            Category::WithdrawalAtm => "WITHDRAWAL_ATM",
            Category::WithdrawalOwnerDraw => "WITHDRAWAL_OWNER_DRAW",
            Category::InflowCardSales => "INFLOW_CARD_SALES",
            Category::InflowProcessorOther => "INFLOW_PROCESSOR_OTHER",
            Category::OutflowLaborPayroll => "OUTFLOW_LABOR_PAYROLL",
            Category::OutflowLaborTaxes => "OUTFLOW_LABOR_TAXES",
            Category::OutflowLaborBenefits => "OUTFLOW_LABOR_BENEFITS",
            Category::OutflowCogsFood => "OUTFLOW_COGS_FOOD",
            Category::OutflowInsurance => "OUTFLOW_INSURANCE",
            Category::OutflowMaintenance => "OUTFLOW_MAINTENANCE",
            Category::OutflowLoanPayment => "OUTFLOW_LOAN_PAYMENT",
            Category::OutflowMiscOpex => "OUTFLOW_MISC_OPEX",
            Category::OutflowSoftware => "OUTFLOW_SOFTWARE",
            Category::OutflowVendorNoncogs => "OUTFLOW_VENDOR_NONCOGS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSFER_INTERNAL" => Ok(Category::TransferInternal),
            "TRANSFER_EXTERNAL" => Ok(Category::TransferExternal),
            "WITHDRAWAL_ATM" => Ok(Category::WithdrawalAtm),
            "WITHDRAWAL_OWNER_DRAW" => Ok(Category::WithdrawalOwnerDraw),
            "INFLOW_CARD_SALES" => Ok(Category::InflowCardSales),
            "INFLOW_PROCESSOR_OTHER" => Ok(Category::InflowProcessorOther),
            "OUTFLOW_LABOR_PAYROLL" => Ok(Category::OutflowLaborPayroll),
            "OUTFLOW_LABOR_TAXES" => Ok(Category::OutflowLaborTaxes),
            "OUTFLOW_LABOR_BENEFITS" => Ok(Category::OutflowLaborBenefits),
            "OUTFLOW_COGS_FOOD" => Ok(Category::OutflowCogsFood),
            "OUTFLOW_INSURANCE" => Ok(Category::OutflowInsurance),
            "OUTFLOW_MAINTENANCE" => Ok(Category::OutflowMaintenance),
            "OUTFLOW_LOAN_PAYMENT" => Ok(Category::OutflowLoanPayment),
            "OUTFLOW_MISC_OPEX" => Ok(Category::OutflowMiscOpex),
            "OUTFLOW_SOFTWARE" => Ok(Category::OutflowSoftware),
            "OUTFLOW_VENDOR_NONCOGS" => Ok(Category::OutflowVendorNoncogs),
            other => Err(format!("Unknown category: '{other}'")),
        }
    }
}

/// Cashflow type and category are assigned together by a single rule hit,
/// so they travel as one value; a record is either fully classified or not
/// classified at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub cashflow_type: CashflowType,
    pub category: Category,
}
