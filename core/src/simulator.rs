//! Day-by-day location simulator — the stateful core.
//!
//! One LocationSimulator per location, each owning its LocationState and
//! its own RNG stream. It is stepped explicitly through `simulate_day()`;
//! there is no internal loop, so callers may interleave locations freely.
//!
//! PER-DAY ORDER (fixed, documented, never reordered):
//!   1. Deliveries: orders arriving today are restocked and reported.
//!   2. Demand: each model with demand today, each BOM line in order, is
//!      filled from the component's inventory rows; every draw becomes an
//!      in-transit order.
//!   3. Failures: one report per (supplier, component) pair drawn today.
//!   4. Advance the date; no series entry for it means the run is finished.
//!   5. Emit the report for the pre-advance date.
//!
//! RNG DRAW ORDER within step 2, per draw:
//!   supplier slot (only when >1 candidate), partial quantity (same),
//!   then the delivery-timing draws for the new order.

use crate::{
    config::SimConfig,
    delivery,
    error::{SimError, SimResult},
    failure::{adjusted_failure_rate, ComponentFailureReport},
    inventory::{ComponentInventory, LocationState, OrderInTransit},
    rng::SeededRng,
    series::{HistoricalSeries, LocationDayData, ModelDemand},
    types::{ComponentId, LocationId, SimDate, SupplierId},
};
use chrono::Days;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub supplier_id:        SupplierId,
    pub component_id:       ComponentId,
    pub quantity:           u64,
    pub order_date:         SimDate,
    pub arrival_date:       SimDate,
    pub lead_time_days:     i64,
    /// Actual lead time minus the supplier's base lead time.
    pub lead_time_variance: i64,
}

/// Immutable snapshot of one simulated day at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLocationReport {
    pub location_id:    LocationId,
    pub date:           SimDate,
    pub market_trend:   f64,
    pub inflation_rate: f64,
    pub model_demand:   Vec<ModelDemand>,
    /// Inventory after today's deliveries and draws.
    pub inventory:      Vec<ComponentInventory>,
    pub deliveries:     Vec<DeliveryRecord>,
    pub orders_placed:  Vec<OrderInTransit>,
    pub failures:       Vec<ComponentFailureReport>,
}

impl DailyLocationReport {
    pub fn units_ordered(&self) -> u64 {
        self.orders_placed.iter().map(|o| o.quantity).sum()
    }

    pub fn units_delivered(&self) -> u64 {
        self.deliveries.iter().map(|d| d.quantity).sum()
    }
}

pub struct LocationSimulator<'a> {
    config:       &'a SimConfig,
    series:       &'a HistoricalSeries,
    state:        LocationState,
    rng:          SeededRng,
    current_date: SimDate,
    finished:     bool,
}

impl<'a> LocationSimulator<'a> {
    /// Start at the first day of `series`.
    pub fn new(
        config: &'a SimConfig,
        series: &'a HistoricalSeries,
        state: LocationState,
        rng: SeededRng,
    ) -> SimResult<Self> {
        let current_date = series
            .first_date()
            .ok_or_else(|| SimError::Config("cannot simulate an empty series".into()))?;
        Ok(Self {
            config,
            series,
            state,
            rng,
            current_date,
            finished: false,
        })
    }

    pub fn state(&self) -> &LocationState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Simulate the current day. Returns None once the calendar is exhausted;
    /// further calls keep returning None and leave state untouched.
    pub fn simulate_day(&mut self) -> SimResult<Option<DailyLocationReport>> {
        if self.finished {
            return Ok(None);
        }

        let date = self.current_date;
        let series = self.series;
        let day = series.day(date).ok_or_else(|| self.missing_day(date))?;
        let today = day
            .location(&self.state.location_id)
            .ok_or_else(|| self.missing_day(date))?;

        let deliveries = self.process_deliveries(date)?;
        let (orders_placed, used) = self.process_demand(date, today)?;
        let failures = self.component_failures(date, today, &used)?;

        match date.succ_opt() {
            Some(next) if series.day(next).is_some() => self.current_date = next,
            next => {
                if let Some(next) = next {
                    self.current_date = next;
                }
                self.finished = true;
                log::info!(
                    "simulation: location={} finished after {date}",
                    self.state.location_id
                );
            }
        }

        log::debug!(
            "simulation: location={} date={date} delivered={} ordered={} failures={}",
            self.state.location_id,
            deliveries.iter().map(|d| d.quantity).sum::<u64>(),
            orders_placed.iter().map(|o| o.quantity).sum::<u64>(),
            failures.len()
        );

        Ok(Some(DailyLocationReport {
            location_id: self.state.location_id.clone(),
            date,
            market_trend: day.market_trend,
            inflation_rate: today.inflation_rate,
            model_demand: today.model_demand.clone(),
            inventory: self.state.inventory.clone(),
            deliveries,
            orders_placed,
            failures,
        }))
    }

    fn missing_day(&self, date: SimDate) -> SimError {
        SimError::MissingDayData {
            location: self.state.location_id.clone(),
            date,
        }
    }

    fn base_lead_time(&self, supplier: &str) -> SimResult<u32> {
        self.config
            .supplier(supplier)
            .map(|s| s.base_lead_time_days)
            .ok_or_else(|| SimError::Config(format!("unknown supplier '{supplier}'")))
    }

    fn quality_today(&self, date: SimDate, today: &LocationDayData, supplier: &str) -> SimResult<f64> {
        today
            .quality_of(supplier)
            .map(|q| q.quality_index)
            .ok_or_else(|| SimError::MissingSupplierQuality {
                location: self.state.location_id.clone(),
                supplier: supplier.to_string(),
                date,
            })
    }

    fn process_deliveries(&mut self, date: SimDate) -> SimResult<Vec<DeliveryRecord>> {
        let arrivals = self.state.take_arrivals(date);
        let mut records = Vec::with_capacity(arrivals.len());
        for order in arrivals {
            self.state
                .restock(&order.supplier_id, &order.component_id, order.quantity)?;
            let lead_time_days = order.lead_time_days();
            let base = self.base_lead_time(&order.supplier_id)? as i64;
            records.push(DeliveryRecord {
                lead_time_days,
                lead_time_variance: lead_time_days - base,
                supplier_id: order.supplier_id,
                component_id: order.component_id,
                quantity: order.quantity,
                order_date: order.order_date,
                arrival_date: order.arrival_date,
            });
        }
        Ok(records)
    }

    /// Fill every model's demand. Returns the orders placed and the
    /// (supplier, component) pairs drawn from, in first-use order.
    fn process_demand(
        &mut self,
        date: SimDate,
        today: &LocationDayData,
    ) -> SimResult<(Vec<OrderInTransit>, Vec<(SupplierId, ComponentId)>)> {
        let config = self.config;
        let mut placed = Vec::new();
        let mut used = Vec::new();
        for model in &config.models {
            let demand = today.demand_of(&model.id);
            if demand == 0 {
                continue;
            }
            for line in &model.components {
                let needed = demand as u64 * line.quantity as u64;
                self.fill_component(date, today, &line.component, needed, &mut placed, &mut used)?;
            }
        }
        Ok((placed, used))
    }

    fn fill_component(
        &mut self,
        date: SimDate,
        today: &LocationDayData,
        component: &str,
        needed: u64,
        placed: &mut Vec<OrderInTransit>,
        used: &mut Vec<(SupplierId, ComponentId)>,
    ) -> SimResult<()> {
        // (row index, units still drawable this iteration)
        let mut pool: Vec<(usize, u64)> = self
            .state
            .rows_for(component)
            .map(|i| (i, self.state.inventory[i].usable()))
            .filter(|&(_, usable)| usable > 0)
            .collect();

        let mut remaining = needed;
        while remaining > 0 {
            let (slot, take) = match pool.len() {
                0 => return Err(self.exhausted(date, component, remaining)),
                1 => (0, remaining),
                n => {
                    let slot = self.rng.next_u64_below(n as u64) as usize;
                    let take = self.rng.range_inclusive(1, remaining).min(pool[slot].1);
                    (slot, take)
                }
            };

            let (idx, usable) = pool[slot];
            let order = self.draw(date, today, idx, take)?;
            let pair = (order.supplier_id.clone(), order.component_id.clone());
            if !used.contains(&pair) {
                used.push(pair);
            }
            placed.push(order);

            remaining -= take;
            if usable <= take {
                pool.remove(slot);
            } else {
                pool[slot].1 = usable - take;
            }
        }
        Ok(())
    }

    /// Withdraw `quantity` from row `idx` and put the replacement in transit.
    fn draw(
        &mut self,
        date: SimDate,
        today: &LocationDayData,
        idx: usize,
        quantity: u64,
    ) -> SimResult<OrderInTransit> {
        let supplier_id = self.state.inventory[idx].supplier_id.clone();
        let component_id = self.state.inventory[idx].component_id.clone();
        let quality = self.quality_today(date, today, &supplier_id)?;
        let base = self.base_lead_time(&supplier_id)?;

        self.state.withdraw(idx, quantity, date)?;

        let lead = delivery::lead_time_days(base, quality, &mut self.rng);
        let arrival_date = date.checked_add_days(Days::new(lead as u64)).ok_or_else(|| {
            SimError::Config(format!("arrival {lead} days after {date} is out of range"))
        })?;
        let order = OrderInTransit {
            supplier_id,
            component_id,
            quantity,
            order_date: date,
            arrival_date,
        };
        self.state.orders_in_transit.push(order.clone());
        Ok(order)
    }

    fn exhausted(&self, date: SimDate, component: &str, remaining: u64) -> SimError {
        let suppliers: Vec<&str> = self
            .state
            .rows_for(component)
            .map(|i| self.state.inventory[i].supplier_id.as_str())
            .collect();
        SimError::InventoryDepleted {
            location: self.state.location_id.clone(),
            date,
            component: component.to_string(),
            supplier: suppliers.join(","),
            requested: remaining,
            available: 0,
        }
    }

    fn component_failures(
        &self,
        date: SimDate,
        today: &LocationDayData,
        used: &[(SupplierId, ComponentId)],
    ) -> SimResult<Vec<ComponentFailureReport>> {
        used.iter()
            .map(|(supplier, component)| -> SimResult<ComponentFailureReport> {
                let quality = self.quality_today(date, today, supplier)?;
                let baseline = self
                    .config
                    .component(component)
                    .map(|c| c.baseline_failure_rate)
                    .ok_or_else(|| SimError::Config(format!("unknown component '{component}'")))?;
                Ok(ComponentFailureReport {
                    supplier_id: supplier.clone(),
                    component_id: component.clone(),
                    quality_index: quality,
                    baseline_failure_rate: baseline,
                    failure_rate: adjusted_failure_rate(baseline, quality),
                })
            })
            .collect()
    }
}
