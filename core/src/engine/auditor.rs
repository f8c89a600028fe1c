//! Periodic and on-demand reconciliation between the window's intended
//! state and what the venue actually has resting. Never mutates the
//! window directly — every correction goes through `OrderManager`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{OrderType, PositionMap, SlidingWindow};
use crate::execution::{Order, Venue};

use super::order_manager::OrderManager;

#[derive(Debug, Clone)]
pub struct AuditorConfig {
    /// Steady-state cadence between full audits.
    pub interval: Duration,
    /// Delay before the on-demand audit fired after a unit change.
    pub post_unit_change_delay: Duration,
    /// Delay before the mandatory follow-up audit after any correction.
    pub follow_up_delay: Duration,
    /// Price tolerance, expressed in units of `unit_size`, within which a
    /// live order is still considered matching its expected slot.
    pub tolerance_fraction: Decimal,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            post_unit_change_delay: Duration::from_secs(2),
            follow_up_delay: Duration::from_secs(30),
            tolerance_fraction: Decimal::new(5, 1), // 0.5 — half a tick
        }
    }
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub orphans_cancelled: Vec<String>,
    pub duplicates_reduced: Vec<String>,
    pub missing_replaced: Vec<i32>,
    pub consecutive_replacement_failures: u32,
}

impl AuditReport {
    pub fn is_healthy(&self) -> bool {
        self.orphans_cancelled.is_empty()
            && self.duplicates_reduced.is_empty()
            && self.missing_replaced.is_empty()
    }

    pub fn needs_follow_up(&self) -> bool {
        !self.is_healthy()
    }
}

pub struct Auditor {
    config: AuditorConfig,
    audit_count: AtomicU64,
    corrections_made: AtomicU64,
    last_healthy: Mutex<Option<Instant>>,
    consecutive_replacement_failures: AtomicU64,
}

impl Auditor {
    pub fn new(config: AuditorConfig) -> Self {
        Self {
            config,
            audit_count: AtomicU64::new(0),
            corrections_made: AtomicU64::new(0),
            last_healthy: Mutex::new(None),
            consecutive_replacement_failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AuditorConfig {
        &self.config
    }

    pub fn audit_count(&self) -> u64 {
        self.audit_count.load(Ordering::Relaxed)
    }

    pub fn corrections_made(&self) -> u64 {
        self.corrections_made.load(Ordering::Relaxed)
    }

    pub fn last_healthy(&self) -> Option<Instant> {
        *self.last_healthy.lock()
    }

    /// Runs one audit pass: fetch live orders, classify against the
    /// window, and issue cancels-before-placements corrections.
    pub fn audit<V: Venue>(
        &self,
        window: &SlidingWindow,
        position_map: &mut PositionMap,
        order_manager: &mut OrderManager<V>,
        fragment_size: Decimal,
    ) -> AuditReport {
        self.audit_count.fetch_add(1, Ordering::Relaxed);

        let live_orders = order_manager.venue().open_orders();
        let tolerance = window_tolerance(position_map, self.config.tolerance_fraction);

        let expected_units: Vec<i32> = window
            .trailing_stop()
            .iter()
            .copied()
            .chain(window.trailing_buy().iter().copied())
            .collect();

        let mut report = AuditReport::default();
        let mut claimed_units: Vec<i32> = Vec::new();

        for order in &live_orders {
            let matching_unit = expected_units.iter().copied().find(|&unit| {
                position_map
                    .get(unit)
                    .map(|entry| {
                        entry.order_id.as_deref() == Some(order.id.as_str())
                            && entry.order_type == Some(order.order_type)
                            && price_within_tolerance(entry.price, order.price, tolerance)
                    })
                    .unwrap_or(false)
            });

            match matching_unit {
                Some(unit) if !claimed_units.contains(&unit) => claimed_units.push(unit),
                Some(_) => {
                    // A second live order claiming an already-claimed unit
                    // is a duplicate: keep the first, cancel this one.
                    self.cancel_orphan(order, order_manager, &mut report);
                }
                None => self.cancel_orphan(order, order_manager, &mut report),
            }
        }

        for unit in expected_units {
            if claimed_units.contains(&unit) {
                continue;
            }
            self.replace_missing(unit, window, position_map, order_manager, fragment_size, &mut report);
        }

        if report.is_healthy() {
            *self.last_healthy.lock() = Some(Instant::now());
            self.consecutive_replacement_failures.store(0, Ordering::Relaxed);
        } else {
            self.corrections_made.fetch_add(
                (report.orphans_cancelled.len()
                    + report.duplicates_reduced.len()
                    + report.missing_replaced.len()) as u64,
                Ordering::Relaxed,
            );
        }

        report
    }

    fn cancel_orphan<V: Venue>(
        &self,
        order: &Order,
        order_manager: &mut OrderManager<V>,
        report: &mut AuditReport,
    ) {
        match order_manager.venue_mut().cancel(&order.id) {
            Ok(()) => {
                info!(order_id = %order.id, "auditor cancelled orphan order");
                report.orphans_cancelled.push(order.id.to_string());
            }
            Err(e) => warn!(order_id = %order.id, error = %e, "auditor failed to cancel orphan"),
        }
    }

    fn replace_missing<V: Venue>(
        &self,
        unit: i32,
        window: &SlidingWindow,
        position_map: &mut PositionMap,
        order_manager: &mut OrderManager<V>,
        fragment_size: Decimal,
        report: &mut AuditReport,
    ) {
        let order_type = if window.trailing_stop().contains(&unit) {
            OrderType::StopLossSell
        } else {
            OrderType::LimitBuy
        };
        let price = match position_map.price_of(unit) {
            Ok(p) => p,
            Err(_) => return,
        };

        let placed = match order_type {
            OrderType::StopLossSell => order_manager.venue_mut().place_stop_sell(price, fragment_size),
            OrderType::LimitBuy => order_manager.venue_mut().place_limit_buy(price, fragment_size),
        };

        match placed {
            Ok(order_id) => {
                let _ = position_map.set_active(unit, order_id.as_str().to_string());
                report.missing_replaced.push(unit);
                self.consecutive_replacement_failures.store(0, Ordering::Relaxed);
            }
            Err(e) => {
                let failures = self.consecutive_replacement_failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(unit, error = %e, failures, "auditor re-placement failed");
                report.consecutive_replacement_failures = failures as u32;
                if failures >= 2 {
                    warn!(unit, "two consecutive re-placement failures, escalating");
                }
            }
        }
    }
}

fn window_tolerance(position_map: &PositionMap, fraction: Decimal) -> Decimal {
    let min = position_map.min_unit();
    let max = position_map.max_unit();
    if max <= min {
        return Decimal::ZERO;
    }
    match (position_map.price_of(min), position_map.price_of(min + 1)) {
        (Ok(p0), Ok(p1)) => (p1 - p0).abs() * fraction,
        _ => Decimal::ZERO,
    }
}

fn price_within_tolerance(expected: Decimal, actual: Decimal, tolerance: Decimal) -> bool {
    (expected - actual).abs() <= tolerance
}
