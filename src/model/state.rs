// src/model/state.rs

use serde::{Deserialize, Serialize};

/// On-hand position of the single stocking point.
///
/// `level` is signed: a negative value is backlog, carried into the next
/// period as unmet demand (backorders, not lost sales).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryState {
    pub level: f64,
}

/// Everything that happened in one review period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// 1-based period number.
    pub period: usize,
    pub forecast: f64,
    /// Order-up-to level S_t.
    pub target_level: f64,
    /// Order quantity Q_t, never negative.
    pub order: f64,
    pub demand: f64,
    /// Inventory level at the end of the period.
    pub inventory: f64,
    pub holding_cost: f64,
    pub shortage_cost: f64,
}

impl InventoryState {
    pub fn new(initial_inventory: f64) -> Self {
        Self {
            level: initial_inventory,
        }
    }

    /// Step 1: Order up to `target_level`.
    ///
    /// Orders arrive within the period, so the level is raised immediately.
    /// Returns the quantity ordered.
    pub fn order_up_to(&mut self, target_level: f64) -> f64 {
        let order = (target_level - self.level).max(0.0);
        self.level += order;
        order
    }

    /// Step 2: Serve this period's demand. Shortfalls go into backlog.
    pub fn serve_demand(&mut self, demand: f64) {
        self.level -= demand;
    }

    pub fn on_hand(&self) -> f64 {
        self.level.max(0.0)
    }

    pub fn backlog(&self) -> f64 {
        (-self.level).max(0.0)
    }

    /// Cost of carrying the current position for one period.
    pub fn holding_cost(&self, holding_cost: f64) -> f64 {
        holding_cost * self.on_hand()
    }

    /// Penalty for the current backlog for one period.
    pub fn shortage_cost(&self, shortage_cost: f64) -> f64 {
        shortage_cost * self.backlog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_orders_when_above_target() {
        let mut state = InventoryState::new(20.0);
        assert_eq!(state.order_up_to(10.0), 0.0);
        assert_eq!(state.level, 20.0);
    }

    #[test]
    fn backlog_is_carried_and_cleared() {
        let mut state = InventoryState::new(5.0);
        state.serve_demand(8.0);
        assert_eq!(state.level, -3.0);
        assert_eq!(state.backlog(), 3.0);
        assert_eq!(state.on_hand(), 0.0);
        assert_eq!(state.shortage_cost(5.0), 15.0);

        // Ordering up to 10 covers the backlog as well.
        assert_eq!(state.order_up_to(10.0), 13.0);
        assert_eq!(state.level, 10.0);
        assert_eq!(state.holding_cost(1.0), 10.0);
    }
}
