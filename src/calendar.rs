// calendar.rs
// Billing cycle: which month is being billed and how months are named.

use chrono::{Datelike, Month, NaiveDate};

/// Calendar months in billing order (index 0 = January).
pub static MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Zero-based position of `month` inside the yearly cycle.
pub fn month_index(month: Month) -> usize {
    month.number_from_month() as usize - 1
}

/// The month being billed when running on `today`: always the previous calendar month.
pub fn reference_month(today: NaiveDate) -> Month {
    MONTHS[today.month0() as usize].pred()
}

/// Reference month together with the year it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub month: Month,
    pub year: i32,
}

impl BillingPeriod {
    pub fn preceding(today: NaiveDate) -> Self {
        let month = reference_month(today);
        let year = if today.month() == 1 {
            today.year() - 1
        } else {
            today.year()
        };
        Self { month, year }
    }
}

/// Ordered names used for the twelve months in records, forms and messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthNames([String; 12]);

impl MonthNames {
    pub fn new(names: [String; 12]) -> Self {
        Self(names)
    }

    pub fn name(&self, month: Month) -> &str {
        &self.0[month_index(month)]
    }

    /// Case-insensitive lookup of a configured name.
    pub fn parse(&self, name: &str) -> Option<Month> {
        let wanted = name.trim();
        self.0
            .iter()
            .position(|n| n.eq_ignore_ascii_case(wanted))
            .map(|idx| MONTHS[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, &str)> {
        MONTHS.iter().copied().zip(self.0.iter().map(String::as_str))
    }

    pub fn names(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self([
            "JANEIRO".into(),
            "FEVEREIRO".into(),
            "MARCO".into(),
            "ABRIL".into(),
            "MAIO".into(),
            "JUNHO".into(),
            "JULHO".into(),
            "AGOSTO".into(),
            "SETEMBRO".into(),
            "OUTUBRO".into(),
            "NOVEMBRO".into(),
            "DEZEMBRO".into(),
        ])
    }
}
