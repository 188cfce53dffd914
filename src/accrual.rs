// accrual.rs
// Amount a client owes for a reference month, including months carried over.

use chrono::Month;
use rust_decimal::Decimal;

use crate::{
    calendar::{MONTHS, MonthNames, month_index},
    config::{AccrualMode, BillingConfig, CarryoverLabels},
    models::{ClientRecord, MonthStatus},
    money,
};

/// Decides which months before the reference month are still collectable.
pub trait AccrualStrategy: Send + Sync {
    fn prior_months(&self, reference: Month) -> &'static [Month];
}

/// Every month earlier in the same year. No carry across years.
pub struct Cumulative;

impl AccrualStrategy for Cumulative {
    fn prior_months(&self, reference: Month) -> &'static [Month] {
        &MONTHS[..month_index(reference)]
    }
}

/// Bills the reference month alone.
pub struct ReferenceOnly;

impl AccrualStrategy for ReferenceOnly {
    fn prior_months(&self, _reference: Month) -> &'static [Month] {
        &[]
    }
}

impl AccrualMode {
    pub fn strategy(self) -> Box<dyn AccrualStrategy> {
        match self {
            AccrualMode::Cumulative => Box::new(Cumulative),
            AccrualMode::ReferenceOnly => Box::new(ReferenceOnly),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryoverKind {
    /// Month never paid; the whole monthly amount is owed.
    Full,
    /// Month partially paid; what is left is owed.
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carryover {
    pub month: Month,
    pub kind: CarryoverKind,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    pub reference: Month,
    pub reference_status: MonthStatus,
    pub total: Decimal,
    pub carryover: Vec<Carryover>,
}

impl Accrual {
    /// Nothing is sent for clients settled in the reference month or owing nothing.
    pub fn is_billable(&self) -> bool {
        self.reference_status != MonthStatus::Paid && self.total > Decimal::ZERO
    }
}

// Partial remainders at or below one cent are treated as settled.
const REMAINDER_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub struct AccrualEngine {
    months: MonthNames,
    labels: CarryoverLabels,
    strategy: Box<dyn AccrualStrategy>,
}

impl AccrualEngine {
    pub fn new(config: &BillingConfig) -> Self {
        Self::with_strategy(config, config.accrual_mode.strategy())
    }

    pub fn with_strategy(config: &BillingConfig, strategy: Box<dyn AccrualStrategy>) -> Self {
        Self {
            months: config.months.clone(),
            labels: config.labels.clone(),
            strategy,
        }
    }

    pub fn months(&self) -> &MonthNames {
        &self.months
    }

    pub fn accrue(&self, client: &ClientRecord, reference: Month) -> Accrual {
        let monthly = money::parse(Some(&client.monthly_amount)).or_zero();
        let mut total = Decimal::ZERO;
        let mut carryover = Vec::new();

        for &month in self.strategy.prior_months(reference) {
            let name = self.months.name(month);
            match client.status_of(name) {
                MonthStatus::Open => {
                    total += monthly;
                    carryover.push(Carryover {
                        month,
                        kind: CarryoverKind::Full,
                        amount: monthly,
                    });
                }
                MonthStatus::Partial => {
                    let remaining = self.remaining(client, name, monthly);
                    if remaining > REMAINDER_THRESHOLD {
                        total += remaining;
                        carryover.push(Carryover {
                            month,
                            kind: CarryoverKind::Remainder,
                            amount: remaining,
                        });
                    }
                }
                MonthStatus::Paid => {}
            }
        }

        let reference_name = self.months.name(reference);
        let reference_status = client.status_of(reference_name);
        match reference_status {
            MonthStatus::Open => total += monthly,
            MonthStatus::Partial => total += self.remaining(client, reference_name, monthly),
            MonthStatus::Paid => {}
        }

        total += money::parse(Some(&client.pending_adjustment)).or_zero();

        Accrual {
            reference,
            reference_status,
            total,
            carryover,
        }
    }

    fn remaining(&self, client: &ClientRecord, month: &str, monthly: Decimal) -> Decimal {
        let paid = money::parse(client.partial_paid(month)).or_zero();
        (monthly - paid).max(Decimal::ZERO)
    }

    /// "MARCO (restante)" style labels, in calendar order.
    pub fn carryover_labels(&self, accrual: &Accrual) -> Vec<String> {
        accrual
            .carryover
            .iter()
            .map(|c| {
                let kind = match c.kind {
                    CarryoverKind::Full => &self.labels.full,
                    CarryoverKind::Remainder => &self.labels.remainder,
                };
                format!("{} ({})", self.months.name(c.month), kind)
            })
            .collect()
    }

    /// Parenthetical suffix for messages; empty when nothing was carried over.
    pub fn describe(&self, accrual: &Accrual) -> String {
        if accrual.carryover.is_empty() {
            return String::new();
        }
        format!(
            "({}: {})",
            self.labels.prefix,
            self.carryover_labels(accrual).join(", ")
        )
    }
}
