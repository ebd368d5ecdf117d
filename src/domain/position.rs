//! Single-instrument long position.

/// Share counts below this are treated as flat.
pub const SHARE_EPSILON: f64 = 1e-9;

/// `average_cost` is per share and includes buy-side transaction costs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub shares: f64,
    pub average_cost: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.shares <= SHARE_EPSILON
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.average_cost)
    }

    /// Add `shares` acquired for `total_cost`, fees included.
    pub fn add(&mut self, shares: f64, total_cost: f64) {
        let combined = self.shares + shares;
        if combined <= SHARE_EPSILON {
            return;
        }
        self.average_cost = (self.average_cost * self.shares + total_cost) / combined;
        self.shares = combined;
    }

    /// Remove up to `shares`, returning `(shares_removed, cost_basis_removed)`.
    pub fn reduce(&mut self, shares: f64) -> (f64, f64) {
        let removed = shares.clamp(0.0, self.shares);
        let basis = removed * self.average_cost;
        self.shares -= removed;
        if self.shares <= SHARE_EPSILON {
            *self = Position::default();
        }
        (removed, basis)
    }
}
