/// A scalar equation `f(x) = 0` with a central finite-difference derivative.
pub trait Equation {
    fn value(&self, x: f64) -> f64;

    /// Finite-difference step used by [`Equation::derivative`].
    fn step(&self) -> f64;

    fn derivative(&self, x: f64) -> f64 {
        central_difference(|x| self.value(x), x, self.step())
    }
}

pub fn central_difference<F: Fn(f64) -> f64>(f: F, x: f64, h: f64) -> f64 {
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Ordinary-annuity future value in the periodic rate `i`:
/// `PMT * ((1 + i)^n - 1) / i - VF`, with `PMT * n - VF` at `i = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalizationEquation {
    pub payment: f64,
    pub periods: u32,
    pub future_value: f64,
    pub step: f64,
}

impl Equation for CapitalizationEquation {
    fn value(&self, rate: f64) -> f64 {
        let n = f64::from(self.periods);
        if rate == 0.0 {
            return self.payment * n - self.future_value;
        }
        self.payment * ((1.0 + rate).powf(n) - 1.0) / rate - self.future_value
    }

    fn step(&self) -> f64 {
        self.step
    }
}

/// Ordinary-annuity present value in the payment `x`:
/// `x * (1 - (1 + i)^-n) / i - PV`, with `x * n - PV` at `i = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalEquation {
    pub present_value: f64,
    pub rate: f64,
    pub periods: u32,
    pub step: f64,
}

impl WithdrawalEquation {
    /// Present value of one unit paid per period for `n` periods.
    pub fn annuity_factor(&self) -> f64 {
        let n = f64::from(self.periods);
        if self.rate == 0.0 {
            return n;
        }
        (1.0 - (1.0 + self.rate).powf(-n)) / self.rate
    }
}

impl Equation for WithdrawalEquation {
    fn value(&self, payment: f64) -> f64 {
        payment * self.annuity_factor() - self.present_value
    }

    fn step(&self) -> f64 {
        self.step
    }
}
