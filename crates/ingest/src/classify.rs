use ledgerflow_core::{CashflowType, Category, Classification};
use regex::Regex;
use rust_decimal::Decimal;

/// Amount-sign precondition for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignGate {
    Any,
    Negative,
    Positive,
}

/// Ordered decision list: (name, sign gate, pattern, cashflow type, category).
/// Evaluation order is part of the contract. The first matching rule
/// classifies the transaction and later rules never see it; rows without a
/// pattern are sign-gated catch-alls. Patterns match the uppercased
/// description, so they are written uppercase.
const RULES: &[(&str, SignGate, Option<&str>, CashflowType, Category)] = &[
    (
        "internal_transfer",
        SignGate::Any,
        Some(r"CREDIT CARD PAYMENT|AUTOPAY|ONLINE TRANSFER"),
        CashflowType::Transfer,
        Category::TransferInternal,
    ),
    (
        "external_transfer",
        SignGate::Any,
        Some(r"ZELLE|VENMO|WIRE TRANSFER"),
        CashflowType::Transfer,
        Category::TransferExternal,
    ),
    (
        "atm_withdrawal",
        SignGate::Negative,
        Some(r"\bATM\b|CASH WITHDRAWAL|ATM WITHDRAWAL"),
        CashflowType::Withdrawal,
        Category::WithdrawalAtm,
    ),
    (
        "owner_draw",
        SignGate::Negative,
        Some(r"OWNER DRAW|OWNERS DRAW|OWNER WITHDRAWAL"),
        CashflowType::Withdrawal,
        Category::WithdrawalOwnerDraw,
    ),
    (
        "card_sales",
        SignGate::Positive,
        Some(r"\bSHIFT4\b|CARD\s*SALES|BATCH"),
        CashflowType::Inflow,
        Category::InflowCardSales,
    ),
    (
        "other_inflow",
        SignGate::Positive,
        None,
        CashflowType::Inflow,
        Category::InflowProcessorOther,
    ),
    (
        "payroll_wages",
        SignGate::Negative,
        Some(r"ADP WAGE|ADP PAYROLL|PAYROLL\b"),
        CashflowType::Outflow,
        Category::OutflowLaborPayroll,
    ),
    (
        "payroll_taxes",
        SignGate::Negative,
        Some(r"ADP TAX|PAYROLL TAX"),
        CashflowType::Outflow,
        Category::OutflowLaborTaxes,
    ),
    (
        "payroll_benefits",
        SignGate::Negative,
        Some(r"PAYROLL FEES|ADP BENEFITS|ADP PAY-BY-PAY"),
        CashflowType::Outflow,
        Category::OutflowLaborBenefits,
    ),
    (
        "cogs_food_beverage",
        SignGate::Negative,
        Some(r"SYSCO|BALDOR|UNION BEER|MANHATTAN BEER|EMPIRE|SGWS|ANHEUSER|WOOLCO|MS WALKER"),
        CashflowType::Outflow,
        Category::OutflowCogsFood,
    ),
    (
        "insurance",
        SignGate::Negative,
        Some(r"INSUR|FAIRMONT|IPFS"),
        CashflowType::Outflow,
        Category::OutflowInsurance,
    ),
    (
        "maintenance_waste",
        SignGate::Negative,
        Some(r"CARTING|WASTE|TRASH"),
        CashflowType::Outflow,
        Category::OutflowMaintenance,
    ),
    (
        "loan_debt_service",
        SignGate::Negative,
        Some(r"\bSBA\b|\bLOAN\b|TERM LOAN|PROMISSORY"),
        CashflowType::Outflow,
        Category::OutflowLoanPayment,
    ),
    (
        "check_payment",
        SignGate::Negative,
        Some(r"\bCHECK\s*#"),
        CashflowType::Outflow,
        Category::OutflowMiscOpex,
    ),
    (
        "software",
        SignGate::Negative,
        Some(r"SEATED|SOFTWARE|SAAS"),
        CashflowType::Outflow,
        Category::OutflowSoftware,
    ),
    (
        "fallback_outflow",
        SignGate::Negative,
        None,
        CashflowType::Outflow,
        Category::OutflowVendorNoncogs,
    ),
];

/// A rule with its pattern compiled once at engine construction.
struct CompiledRule {
    name: &'static str,
    sign: SignGate,
    regex: Option<Regex>,
    classification: Classification,
}

impl CompiledRule {
    fn matches(&self, amount: Decimal, desc_upper: &str) -> bool {
        let sign_ok = match self.sign {
            SignGate::Any => true,
            SignGate::Negative => amount < Decimal::ZERO,
            SignGate::Positive => amount > Decimal::ZERO,
        };
        if !sign_ok {
            return false;
        }
        match &self.regex {
            Some(re) => re.is_match(desc_upper),
            None => true,
        }
    }
}

pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    pub fn new() -> Self {
        let rules = RULES
            .iter()
            .map(|&(name, sign, pattern, cashflow_type, category)| CompiledRule {
                name,
                sign,
                regex: pattern.map(|p| Regex::new(p).expect("invalid rule pattern")),
                classification: Classification {
                    cashflow_type,
                    category,
                },
            })
            .collect();
        Self { rules }
    }

    /// Assign a cashflow type and category, or nothing if no rule fires.
    /// Pure function of (amount, description) given the static table; a
    /// zero amount only classifies when a sign-agnostic rule matches.
    pub fn classify(&self, amount: Decimal, description: &str) -> Option<Classification> {
        let desc = description.to_uppercase();
        let hit = self.rules.iter().find(|r| r.matches(amount, &desc))?;
        tracing::trace!(rule = hit.name, "classification rule matched");
        Some(hit.classification)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
