// src/services/mortgage.rs
use serde::{Deserialize, Serialize};

/// Loan terms the calculator offers, in years.
pub const OFFERED_TERMS: [u32; 3] = [15, 20, 30];

/// Monthly property tax estimate as a fraction of the purchase price.
const PROPERTY_TAX_MONTHLY_RATE: f64 = 0.001;
/// Flat monthly home insurance estimate.
const INSURANCE_MONTHLY_ESTIMATE: f64 = 120.0;

pub fn is_offered_term(years: u32) -> bool {
    OFFERED_TERMS.contains(&years)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortgageInputs {
    pub price: f64,
    pub down_payment: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
}

impl Default for MortgageInputs {
    fn default() -> Self {
        Self {
            price: 500_000.0,
            down_payment: 100_000.0,
            annual_rate_percent: 6.5,
            term_years: 30,
        }
    }
}

impl MortgageInputs {
    /// Amount actually borrowed. Negative when the down payment exceeds the price.
    pub fn principal(&self) -> f64 {
        self.price - self.down_payment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub principal_and_interest: f64,
    pub property_tax_estimate: f64,
    pub insurance_estimate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortgageResult {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub loan_amount: f64,
    pub breakdown: PaymentBreakdown,
}

/// Closed-form amortization of a fixed-rate loan.
///
/// `term_years` must be non-zero. A down payment larger than the price is not
/// rejected: the negative principal flows through as a negative monthly payment.
pub fn amortize(inputs: &MortgageInputs) -> MortgageResult {
    debug_assert!(inputs.term_years > 0, "term_years must be positive");

    let principal = inputs.principal();
    let monthly_rate = inputs.annual_rate_percent / 100.0 / 12.0;
    let payment_count = f64::from(inputs.term_years * 12);

    let (monthly_payment, total_interest) = if monthly_rate == 0.0 {
        (principal / payment_count, 0.0)
    } else {
        let growth = (1.0 + monthly_rate).powf(payment_count);
        let monthly = principal * monthly_rate * growth / (growth - 1.0);
        (monthly, monthly * payment_count - principal)
    };

    MortgageResult {
        monthly_payment,
        total_payment: monthly_payment * payment_count,
        total_interest,
        loan_amount: principal,
        breakdown: PaymentBreakdown {
            principal_and_interest: monthly_payment,
            property_tax_estimate: inputs.price * PROPERTY_TAX_MONTHLY_RATE,
            insurance_estimate: INSURANCE_MONTHLY_ESTIMATE,
        },
    }
}

/// A partial change to the calculator inputs. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MortgageUpdate {
    pub price: Option<f64>,
    pub down_payment: Option<f64>,
    pub annual_rate_percent: Option<f64>,
    pub term_years: Option<u32>,
}

impl MortgageUpdate {
    pub fn apply_to(&self, inputs: &mut MortgageInputs) {
        if let Some(price) = self.price {
            inputs.price = price;
        }
        if let Some(down_payment) = self.down_payment {
            inputs.down_payment = down_payment;
        }
        if let Some(rate) = self.annual_rate_percent {
            inputs.annual_rate_percent = rate;
        }
        if let Some(years) = self.term_years {
            inputs.term_years = years;
        }
    }
}

type Subscriber = Box<dyn Fn(&MortgageInputs, &MortgageResult) + Send + Sync>;

/// Holds the current calculator inputs and republishes the result on every change.
pub struct MortgageCalculator {
    inputs: MortgageInputs,
    result: MortgageResult,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for MortgageCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MortgageCalculator")
            .field("inputs", &self.inputs)
            .field("result", &self.result)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for MortgageCalculator {
    fn default() -> Self {
        Self::new(MortgageInputs::default())
    }
}

impl MortgageCalculator {
    pub fn new(inputs: MortgageInputs) -> Self {
        Self {
            inputs,
            result: amortize(&inputs),
            subscribers: Vec::new(),
        }
    }

    pub fn inputs(&self) -> MortgageInputs {
        self.inputs
    }

    pub fn result(&self) -> MortgageResult {
        self.result
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&MortgageInputs, &MortgageResult) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Apply a change, recompute and notify subscribers.
    pub fn update(&mut self, change: MortgageUpdate) -> MortgageResult {
        change.apply_to(&mut self.inputs);
        self.result = amortize(&self.inputs);
        for subscriber in &self.subscribers {
            subscriber(&self.inputs, &self.result);
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inputs(price: f64, down: f64, rate: f64, years: u32) -> MortgageInputs {
        MortgageInputs {
            price,
            down_payment: down,
            annual_rate_percent: rate,
            term_years: years,
        }
    }

    #[test]
    fn thirty_year_reference_loan() {
        let result = amortize(&inputs(500_000.0, 100_000.0, 6.5, 30));
        assert!((result.monthly_payment - 2528.27).abs() < 0.5);
        assert!((result.total_interest - 510_177.0).abs() < 5.0);
        assert_eq!(result.loan_amount, 400_000.0);
    }

    #[test]
    fn zero_rate_divides_evenly() {
        for years in OFFERED_TERMS {
            let result = amortize(&inputs(360_000.0, 60_000.0, 0.0, years));
            let expected = 300_000.0 / f64::from(years * 12);
            assert_eq!(result.monthly_payment, expected);
            assert_eq!(result.total_interest, 0.0);
        }
    }

    #[test]
    fn totals_are_consistent() {
        let cases = [
            inputs(250_000.0, 50_000.0, 3.25, 15),
            inputs(820_000.0, 20_000.0, 7.9, 20),
            inputs(1_000_000.0, 0.0, 12.0, 30),
        ];
        for case in cases {
            let result = amortize(&case);
            let n = f64::from(case.term_years * 12);
            let tolerance = result.total_payment.abs() * 1e-6;
            assert!((result.total_payment - result.monthly_payment * n).abs() <= tolerance);
            assert!(
                (result.total_interest - (result.total_payment - case.principal())).abs()
                    <= tolerance
            );
        }
    }

    #[test]
    fn fully_paid_down_loan_costs_nothing() {
        let result = amortize(&inputs(300_000.0, 300_000.0, 5.0, 15));
        assert_eq!(result.monthly_payment, 0.0);
        assert_eq!(result.total_interest, 0.0);
        assert_eq!(result.total_payment, 0.0);
    }

    #[test]
    fn oversized_down_payment_goes_negative() {
        let result = amortize(&inputs(200_000.0, 250_000.0, 4.0, 30));
        assert!(result.monthly_payment < 0.0);
        assert_eq!(result.loan_amount, -50_000.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let case = inputs(475_000.0, 95_000.0, 6.1, 20);
        assert_eq!(amortize(&case), amortize(&case));
    }

    #[test]
    fn breakdown_estimates() {
        let result = amortize(&MortgageInputs::default());
        assert_eq!(result.breakdown.property_tax_estimate, 500.0);
        assert_eq!(result.breakdown.insurance_estimate, 120.0);
        assert_eq!(result.breakdown.principal_and_interest, result.monthly_payment);
    }

    #[test]
    fn calculator_publishes_every_update() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut calc = MortgageCalculator::default();
        let seen = calls.clone();
        calc.subscribe(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = calc.update(MortgageUpdate {
            annual_rate_percent: Some(0.0),
            ..Default::default()
        });
        assert_eq!(result.total_interest, 0.0);
        assert_eq!(calc.inputs().price, 500_000.0);

        calc.update(MortgageUpdate::default());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
