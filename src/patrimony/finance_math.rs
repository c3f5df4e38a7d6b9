//! Loan and discounting arithmetic
//!
//! Periods are counted in years from the first period of the schedule.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FinanceError {
    #[error("negative number of periods: {0}")]
    NegativePeriod(i32),
    #[error("period {period} outside [{first_period}, {last_period}]")]
    PeriodOutOfRange {
        period: i32,
        first_period: i32,
        last_period: i32,
    },
    #[error("negative value: {0}")]
    NegativeValue(f64),
}

fn check_amount(value: f64) -> Result<(), FinanceError> {
    if value < 0.0 {
        Err(FinanceError::NegativeValue(value))
    } else {
        Ok(())
    }
}

fn check_periods(nb_periods: i32) -> Result<(), FinanceError> {
    if nb_periods < 0 {
        Err(FinanceError::NegativePeriod(nb_periods))
    } else {
        Ok(())
    }
}

/// Constant payment repaying `principal` over `nb_periods` at `rate`
pub fn annuity_payment(principal: f64, rate: f64, nb_periods: i32) -> Result<f64, FinanceError> {
    check_amount(principal)?;
    check_periods(nb_periods)?;
    if nb_periods == 0 {
        return Ok(principal);
    }
    if rate.abs() < 1e-12 {
        return Ok(principal / nb_periods as f64);
    }
    let n = nb_periods as f64;
    Ok(principal * rate / (1.0 - (1.0 + rate).powf(-n)))
}

/// Principal still due after `elapsed` payments of a constant annuity
pub fn remaining_principal(
    principal: f64,
    rate: f64,
    nb_periods: i32,
    elapsed: i32,
) -> Result<f64, FinanceError> {
    check_periods(nb_periods)?;
    check_periods(elapsed)?;
    if elapsed > nb_periods {
        return Err(FinanceError::PeriodOutOfRange {
            period: elapsed,
            first_period: 0,
            last_period: nb_periods,
        });
    }
    let payment = annuity_payment(principal, rate, nb_periods)?;
    let k = elapsed as f64;
    let remaining = if rate.abs() < 1e-12 {
        principal - payment * k
    } else {
        let growth = (1.0 + rate).powf(k);
        principal * growth - payment * (growth - 1.0) / rate
    };
    Ok(remaining.max(0.0))
}

/// Linear depreciation from `initial` in `first_period` to 0 after `last_period`
pub fn residual_value(
    initial: f64,
    first_period: i32,
    last_period: i32,
    period: i32,
) -> Result<f64, FinanceError> {
    check_amount(initial)?;
    if period < first_period || period > last_period {
        return Err(FinanceError::PeriodOutOfRange {
            period,
            first_period,
            last_period,
        });
    }
    let duration = (last_period - first_period + 1) as f64;
    Ok(initial * (last_period - period) as f64 / duration)
}
