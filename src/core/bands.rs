//! Tax-year tables for 2025/26 (England and Northern Ireland, rUK income tax).
//!
//! Everything here is immutable `static` data; calculators borrow the tables and
//! never copy them into mutable state.

use super::types::{BandSlice, StudentLoanPlan};

/// Lower edge of a progressive band and the rate charged above it. A band runs
/// up to the next band's `from`; the last band is open-ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub from: f64,
    pub rate_pct: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct IncomeTaxTable {
    pub personal_allowance: f64,
    pub taper_threshold: f64,
    /// Bands over income after the personal allowance.
    pub bands: &'static [Band],
}

#[derive(Debug, Clone, Copy)]
pub struct StudentLoanTerms {
    pub plan: StudentLoanPlan,
    pub threshold: f64,
    pub rate_pct: f64,
}

pub static INCOME_TAX: IncomeTaxTable = IncomeTaxTable {
    personal_allowance: 12_570.0,
    taper_threshold: 100_000.0,
    bands: &[
        Band {
            from: 0.0,
            rate_pct: 20.0,
        },
        Band {
            from: 37_700.0,
            rate_pct: 40.0,
        },
        Band {
            from: 125_140.0,
            rate_pct: 45.0,
        },
    ],
};

/// Class 1 employee contributions, annualised.
pub static NATIONAL_INSURANCE: [Band; 3] = [
    Band {
        from: 0.0,
        rate_pct: 0.0,
    },
    Band {
        from: 12_570.0,
        rate_pct: 8.0,
    },
    Band {
        from: 50_270.0,
        rate_pct: 2.0,
    },
];

pub static STUDENT_LOANS: [StudentLoanTerms; 5] = [
    StudentLoanTerms {
        plan: StudentLoanPlan::Plan1,
        threshold: 26_065.0,
        rate_pct: 9.0,
    },
    StudentLoanTerms {
        plan: StudentLoanPlan::Plan2,
        threshold: 28_470.0,
        rate_pct: 9.0,
    },
    StudentLoanTerms {
        plan: StudentLoanPlan::Plan4,
        threshold: 32_745.0,
        rate_pct: 9.0,
    },
    StudentLoanTerms {
        plan: StudentLoanPlan::Plan5,
        threshold: 25_000.0,
        rate_pct: 9.0,
    },
    StudentLoanTerms {
        plan: StudentLoanPlan::Postgraduate,
        threshold: 21_000.0,
        rate_pct: 6.0,
    },
];

/// Residential SDLT from 1 April 2025.
pub static SDLT_STANDARD: [Band; 5] = [
    Band {
        from: 0.0,
        rate_pct: 0.0,
    },
    Band {
        from: 125_000.0,
        rate_pct: 2.0,
    },
    Band {
        from: 250_000.0,
        rate_pct: 5.0,
    },
    Band {
        from: 925_000.0,
        rate_pct: 10.0,
    },
    Band {
        from: 1_500_000.0,
        rate_pct: 12.0,
    },
];

/// First-time buyer relief; only available up to `SDLT_FIRST_TIME_PRICE_CAP`.
pub static SDLT_FIRST_TIME: [Band; 2] = [
    Band {
        from: 0.0,
        rate_pct: 0.0,
    },
    Band {
        from: 300_000.0,
        rate_pct: 5.0,
    },
];

pub const SDLT_FIRST_TIME_PRICE_CAP: f64 = 500_000.0;
pub const SDLT_ADDITIONAL_PROPERTY_SURCHARGE_PCT: f64 = 5.0;
pub const SDLT_ADDITIONAL_PROPERTY_MIN_PRICE: f64 = 40_000.0;
pub const SDLT_NON_RESIDENT_SURCHARGE_PCT: f64 = 2.0;

pub fn student_loan_terms(plan: StudentLoanPlan) -> &'static StudentLoanTerms {
    let idx = match plan {
        StudentLoanPlan::Plan1 => 0,
        StudentLoanPlan::Plan2 => 1,
        StudentLoanPlan::Plan4 => 2,
        StudentLoanPlan::Plan5 => 3,
        StudentLoanPlan::Postgraduate => 4,
    };
    &STUDENT_LOANS[idx]
}

/// Splits `amount` across progressive `bands`, adding `surcharge_pct` to every
/// band's rate. Bands the amount never reaches are omitted.
pub fn apply_bands(amount: f64, bands: &[Band], surcharge_pct: f64) -> Vec<BandSlice> {
    let amount = amount.max(0.0);
    let mut slices = Vec::with_capacity(bands.len());

    for (idx, band) in bands.iter().enumerate() {
        if amount <= band.from && !(amount == 0.0 && idx == 0) {
            break;
        }
        let to = bands.get(idx + 1).map(|next| next.from);
        let upper = to.map_or(amount, |to| amount.min(to));
        let taxable = (upper - band.from).max(0.0);
        let rate_pct = band.rate_pct + surcharge_pct;
        slices.push(BandSlice {
            from: band.from,
            to,
            rate_pct,
            taxable,
            tax: taxable * rate_pct / 100.0,
        });
    }

    slices
}

pub fn banded_total(amount: f64, bands: &[Band]) -> f64 {
    apply_bands(amount, bands, 0.0)
        .iter()
        .map(|slice| slice.tax)
        .sum()
}
