use tracing::debug;

use super::bands::{
    SDLT_ADDITIONAL_PROPERTY_MIN_PRICE, SDLT_ADDITIONAL_PROPERTY_SURCHARGE_PCT,
    SDLT_FIRST_TIME, SDLT_FIRST_TIME_PRICE_CAP, SDLT_NON_RESIDENT_SURCHARGE_PCT, SDLT_STANDARD,
    apply_bands,
};
use super::types::{BuyerType, StampDutyOptions, StampDutyRelief, StampDutyResult};

/// Residential SDLT on `price`. A non-finite or negative price is rejected
/// with `ok: false` and a zero total rather than an error.
pub fn stamp_duty(price: f64, options: &StampDutyOptions) -> StampDutyResult {
    if !price.is_finite() || price < 0.0 {
        return StampDutyResult::rejected();
    }

    let first_time_relief = options.buyer_type == BuyerType::FirstTime
        && !options.additional_property
        && price <= SDLT_FIRST_TIME_PRICE_CAP;
    let (bands, relief) = if first_time_relief {
        (&SDLT_FIRST_TIME[..], StampDutyRelief::FirstTimeBuyer)
    } else {
        (&SDLT_STANDARD[..], StampDutyRelief::None)
    };

    let mut surcharge_pct = 0.0;
    if options.additional_property && price >= SDLT_ADDITIONAL_PROPERTY_MIN_PRICE {
        surcharge_pct += SDLT_ADDITIONAL_PROPERTY_SURCHARGE_PCT;
    }
    if options.non_uk_resident {
        surcharge_pct += SDLT_NON_RESIDENT_SURCHARGE_PCT;
    }

    let slices = apply_bands(price, bands, surcharge_pct);
    let total: f64 = slices.iter().map(|slice| slice.tax).sum();
    let effective_rate_pct = if price > 0.0 {
        total / price * 100.0
    } else {
        0.0
    };
    debug!(price, total, ?relief, surcharge_pct, "computed stamp duty");

    StampDutyResult {
        ok: true,
        total,
        effective_rate_pct,
        relief,
        bands: slices,
    }
}
