//! Per-location inventory and in-transit orders.
//!
//! LocationState is an owned aggregate: a vector of inventory rows and a
//! vector of in-transit orders, addressed by index, mutated only by the
//! simulator for that location. Nothing is shared across locations.
//!
//! RULE: a withdrawal may never leave a row below MIN_REMAINING units.
//! Hitting that floor means the target inventory sizing is wrong for the
//! demand being simulated, and the run aborts.

use crate::{
    config::{LocationConfig, SimConfig},
    error::{SimError, SimResult},
    rng::SeededRng,
    types::{ComponentId, LocationId, SimDate, SupplierId},
};
use serde::{Deserialize, Serialize};

/// Units every inventory row must keep after a withdrawal.
pub const MIN_REMAINING: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInventory {
    pub supplier_id:  SupplierId,
    pub component_id: ComponentId,
    pub quantity:     u64,
}

impl ComponentInventory {
    /// Units that can be drawn without breaching MIN_REMAINING.
    pub fn usable(&self) -> u64 {
        self.quantity.saturating_sub(MIN_REMAINING)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInTransit {
    pub supplier_id:  SupplierId,
    pub component_id: ComponentId,
    pub quantity:     u64,
    pub order_date:   SimDate,
    pub arrival_date: SimDate,
}

impl OrderInTransit {
    pub fn lead_time_days(&self) -> i64 {
        (self.arrival_date - self.order_date).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub location_id:       LocationId,
    pub inventory:         Vec<ComponentInventory>,
    pub orders_in_transit: Vec<OrderInTransit>,
}

/// Preference-weighted stock level for one component at one location.
pub fn target_inventory_level(config: &SimConfig, location: &LocationConfig, component: &str) -> u64 {
    let daily: f64 = config
        .models
        .iter()
        .map(|m| {
            let per_unit: u32 = m
                .components
                .iter()
                .filter(|line| line.component == component)
                .map(|line| line.quantity)
                .sum();
            m.base_daily_demand * location.preference(&m.id) * per_unit as f64
        })
        .sum();
    if daily <= 0.0 {
        return 0;
    }
    ((daily * config.inventory.target_days_of_cover).ceil() as u64).max(config.inventory.minimum_units)
}

/// Split `total` across `n` holders with random weights; shares sum to `total`.
pub fn split_target(total: u64, n: usize, rng: &mut SeededRng) -> Vec<u64> {
    if n == 0 {
        return Vec::new();
    }
    let weights: Vec<f64> = (0..n).map(|_| rng.range_f64(0.5, 1.5)).collect();
    let weight_sum: f64 = weights.iter().sum();
    let mut shares: Vec<u64> = weights
        .iter()
        .map(|w| (total as f64 * w / weight_sum).floor() as u64)
        .collect();
    let assigned: u64 = shares.iter().sum();
    if let Some(last) = shares.last_mut() {
        *last += total.saturating_sub(assigned);
    }
    shares
}

impl LocationState {
    pub fn new(location_id: impl Into<LocationId>, inventory: Vec<ComponentInventory>) -> Self {
        Self {
            location_id: location_id.into(),
            inventory,
            orders_in_transit: Vec::new(),
        }
    }

    /// Initial stock: each component's target level split across the
    /// location's eligible suppliers for it. Rows are laid out by component
    /// declaration order, then by the location's supplier order.
    pub fn initialize(
        config: &SimConfig,
        location: &LocationConfig,
        rng: &mut SeededRng,
    ) -> SimResult<Self> {
        let mut inventory = Vec::new();
        for component in &config.components {
            let target = target_inventory_level(config, location, &component.id);
            if target == 0 {
                continue;
            }
            let suppliers: Vec<_> = config.suppliers_for(location, &component.id).collect();
            if suppliers.is_empty() {
                return Err(SimError::Config(format!(
                    "location '{}' needs component '{}' but has no eligible supplier",
                    location.id, component.id
                )));
            }
            let shares = split_target(target, suppliers.len(), rng);
            for (supplier, quantity) in suppliers.into_iter().zip(shares) {
                inventory.push(ComponentInventory {
                    supplier_id: supplier.id.clone(),
                    component_id: component.id.clone(),
                    quantity,
                });
            }
        }

        let state = Self::new(location.id.clone(), inventory);
        log::info!(
            "inventory: location={} initialized {} rows, {} units",
            state.location_id,
            state.inventory.len(),
            state.total_units()
        );
        Ok(state)
    }

    pub fn row_index(&self, supplier: &str, component: &str) -> Option<usize> {
        self.inventory
            .iter()
            .position(|r| r.supplier_id == supplier && r.component_id == component)
    }

    /// Row indices holding `component`, in row order.
    pub fn rows_for<'a>(&'a self, component: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.inventory
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.component_id == component)
            .map(|(i, _)| i)
    }

    /// Remove `quantity` units from row `idx`.
    pub fn withdraw(&mut self, idx: usize, quantity: u64, date: SimDate) -> SimResult<()> {
        let row = &mut self.inventory[idx];
        if row.quantity < quantity + MIN_REMAINING {
            return Err(SimError::InventoryDepleted {
                location: self.location_id.clone(),
                date,
                component: row.component_id.clone(),
                supplier: row.supplier_id.clone(),
                requested: quantity,
                available: row.usable(),
            });
        }
        row.quantity -= quantity;
        Ok(())
    }

    pub fn restock(&mut self, supplier: &str, component: &str, quantity: u64) -> SimResult<()> {
        let idx = self.row_index(supplier, component).ok_or_else(|| SimError::MissingInventoryRow {
            location: self.location_id.clone(),
            supplier: supplier.to_string(),
            component: component.to_string(),
        })?;
        self.inventory[idx].quantity += quantity;
        Ok(())
    }

    /// Remove and return every order arriving on `date`, in placement order.
    pub fn take_arrivals(&mut self, date: SimDate) -> Vec<OrderInTransit> {
        let (arrived, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.orders_in_transit)
            .into_iter()
            .partition(|o| o.arrival_date == date);
        self.orders_in_transit = pending;
        arrived
    }

    pub fn total_units(&self) -> u64 {
        self.inventory.iter().map(|r| r.quantity).sum()
    }

    pub fn units_on_hand(&self, component: &str) -> u64 {
        self.inventory
            .iter()
            .filter(|r| r.component_id == component)
            .map(|r| r.quantity)
            .sum()
    }

    pub fn units_in_transit(&self, component: &str) -> u64 {
        self.orders_in_transit
            .iter()
            .filter(|o| o.component_id == component)
            .map(|o| o.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngAlgorithm;

    fn date(y: i32, m: u32, d: u32) -> SimDate {
        SimDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state() -> LocationState {
        LocationState::new(
            "LOC-1",
            vec![ComponentInventory {
                supplier_id: "S1".into(),
                component_id: "ENGINE-A".into(),
                quantity: 10,
            }],
        )
    }

    #[test]
    fn withdraw_keeps_minimum() {
        let mut s = state();
        s.withdraw(0, 9, date(2022, 1, 1)).unwrap();
        assert_eq!(s.inventory[0].quantity, 1);
        let err = s.withdraw(0, 1, date(2022, 1, 2)).unwrap_err();
        assert!(matches!(err, SimError::InventoryDepleted { requested: 1, available: 0, .. }));
        assert_eq!(s.inventory[0].quantity, 1);
    }

    #[test]
    fn take_arrivals_only_removes_due_orders() {
        let mut s = state();
        for (i, day) in [3, 5, 3].into_iter().enumerate() {
            s.orders_in_transit.push(OrderInTransit {
                supplier_id: "S1".into(),
                component_id: "ENGINE-A".into(),
                quantity: i as u64 + 1,
                order_date: date(2022, 1, 1),
                arrival_date: date(2022, 1, day),
            });
        }
        let arrived = s.take_arrivals(date(2022, 1, 3));
        assert_eq!(arrived.iter().map(|o| o.quantity).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(s.orders_in_transit.len(), 1);
        assert_eq!(s.orders_in_transit[0].quantity, 2);
    }

    #[test]
    fn split_preserves_total() {
        let mut rng = SeededRng::new("split", RngAlgorithm::Pcg64Mcg);
        for total in [0, 1, 7, 100, 12_345] {
            for n in 1..5 {
                assert_eq!(split_target(total, n, &mut rng).iter().sum::<u64>(), total);
            }
        }
    }

    #[test]
    fn restock_unknown_row_is_fatal() {
        let mut s = state();
        assert!(matches!(
            s.restock("S9", "ENGINE-A", 5),
            Err(SimError::MissingInventoryRow { .. })
        ));
    }
}
