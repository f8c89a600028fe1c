//! Single-task-per-symbol event loop. Price ticks, fills, audit timers
//! and shutdown are serialised through one in-process queue; accounting
//! and state transitions are synchronous, only venue calls suspend.

pub mod auditor;
pub mod fill_router;
pub mod order_manager;

pub use auditor::{Auditor, AuditorConfig, AuditReport};
pub use fill_router::{FillOutcome, FillRouter};
pub use order_manager::OrderManager;

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{
    CycleState, GridConfig, Phase, PhaseClassifier, PhaseHistory, PositionMap, PriceQuantiser,
    SlidingWindow,
};
use crate::execution::{Fill, Venue};
use crate::persistence::{self, Snapshot};

/// Events dequeued by the engine loop, in arrival order. `PriceTick` is
/// the only variant ever dropped under backpressure; fills and shutdown
/// are never dropped.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    PriceTick(Decimal),
    Fill(Fill),
    AuditTimer,
    Shutdown,
}

/// Bound chosen so a burst of price ticks during a fast market can't
/// grow the queue unboundedly; old ticks are superseded by newer ones
/// anyway, so dropping them under pressure loses no information fills
/// and audits don't already carry.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub ticks_processed: u64,
    pub fills_processed: u64,
    pub unmatched_fills: u64,
    pub resets: u64,
    pub audits_run: u64,
}

#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub symbol: String,
    pub phase: Phase,
    pub current_unit: i32,
    pub cycle_index: u32,
    pub cumulative_growth: Decimal,
    pub trailing_stop: Vec<i32>,
    pub trailing_buy: Vec<i32>,
    pub stats: EngineStats,
    pub audit_count: u64,
    pub corrections_made: u64,
}

pub struct Engine<V: Venue> {
    config: GridConfig,
    quantiser: PriceQuantiser,
    position_map: PositionMap,
    window: SlidingWindow,
    cycle: CycleState,
    order_manager: OrderManager<V>,
    fill_router: FillRouter,
    auditor: Auditor,
    stats: EngineStats,
    snapshot_path: Option<PathBuf>,
    startup_time: SystemTime,
}

impl<V: Venue> Engine<V> {
    pub fn new(
        config: GridConfig,
        order_manager: OrderManager<V>,
        auditor_config: AuditorConfig,
        position_range: (i32, i32),
        snapshot_path: Option<PathBuf>,
    ) -> Self {
        let quantiser = PriceQuantiser::new(config.entry_price, config.unit_size);
        let mut position_map = PositionMap::new(&quantiser, position_range.0, position_range.1);
        let mut window = SlidingWindow::new();
        let startup_time = SystemTime::now();

        let init_actions = window.init(&mut position_map);
        let mut order_manager = order_manager;
        for action in &init_actions {
            order_manager.execute(action, &mut position_map, config.long_fragment_asset);
        }

        Self {
            config,
            quantiser,
            position_map,
            window,
            cycle: CycleState::new(),
            order_manager,
            fill_router: FillRouter::new(startup_time),
            auditor: Auditor::new(auditor_config),
            stats: EngineStats::default(),
            snapshot_path,
            startup_time,
        }
    }

    pub fn status(&self) -> EngineStatus {
        let history = PhaseHistory {
            ever_held_buy: self.cycle.ever_held_buy,
            ever_filled_stop: self.cycle.ever_filled_stop,
            ever_fully_declined: self.cycle.ever_fully_declined,
        };
        EngineStatus {
            symbol: self.config.symbol.clone(),
            phase: PhaseClassifier::classify(&self.window, history),
            current_unit: self.cycle.current_unit,
            cycle_index: self.cycle.cycle_index,
            cumulative_growth: self.cycle.cumulative_growth,
            trailing_stop: self.window.trailing_stop().to_vec(),
            trailing_buy: self.window.trailing_buy().to_vec(),
            stats: self.stats.clone(),
            audit_count: self.auditor.audit_count(),
            corrections_made: self.auditor.corrections_made(),
        }
    }

    /// Rehydrates state from a crash-recovery snapshot, then runs an
    /// immediate audit pass before the caller resumes the event loop.
    pub fn recover_from_snapshot(&mut self, snapshot: &Snapshot) {
        self.cycle.current_unit = snapshot.current_unit;
        self.cycle.peak_unit = snapshot.peak_unit;
        self.cycle.valley_unit = snapshot.valley_unit;
        self.cycle.cycle_index = snapshot.cycle_index;
        self.cycle.cumulative_growth = snapshot.cumulative_growth;
        self.quantiser.rebase(snapshot.entry_price);
        self.position_map.rebuild(&self.quantiser);
        for (unit, order_id) in &snapshot.position_map_order_ids {
            if let Some(id) = order_id {
                let _ = self.position_map.set_active(*unit, id.clone());
            }
        }
        self.run_audit();
    }

    fn snapshot(&self) -> Snapshot {
        let history = PhaseHistory {
            ever_held_buy: self.cycle.ever_held_buy,
            ever_filled_stop: self.cycle.ever_filled_stop,
            ever_fully_declined: self.cycle.ever_fully_declined,
        };
        let position_map_order_ids = self
            .window
            .trailing_stop()
            .iter()
            .chain(self.window.trailing_buy().iter())
            .map(|&unit| {
                let id = self.position_map.get(unit).ok().and_then(|e| e.order_id.clone());
                (unit, id)
            })
            .collect();

        Snapshot {
            symbol: self.config.symbol.clone(),
            entry_price: self.config.entry_price,
            unit_size: self.config.unit_size,
            current_unit: self.cycle.current_unit,
            peak_unit: self.cycle.peak_unit,
            valley_unit: self.cycle.valley_unit,
            phase: PhaseClassifier::classify(&self.window, history).to_string(),
            trailing_stop: self.window.trailing_stop().to_vec(),
            trailing_buy: self.window.trailing_buy().to_vec(),
            position_map_order_ids,
            cycle_index: self.cycle.cycle_index,
            cumulative_growth: self.cycle.cumulative_growth,
            initial_order_id: self.cycle.initial_order_id.clone(),
            startup_timestamp: persistence::now_unix_timestamp(),
        }
    }

    fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Err(e) = persistence::save(path, &self.snapshot()) {
            warn!(error = %e, "failed to persist snapshot");
        }
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PriceTick(price) => self.handle_price_tick(price),
            EngineEvent::Fill(fill) => self.handle_fill(fill),
            EngineEvent::AuditTimer => {
                self.run_audit();
            }
            EngineEvent::Shutdown => self.shutdown(),
        }
    }

    fn handle_price_tick(&mut self, price: Decimal) {
        self.order_manager.on_price_tick(price, &mut self.position_map);

        let Some(unit_event) = self.quantiser.on_price(price) else {
            return;
        };
        self.stats.ticks_processed += 1;

        let gap = unit_event.gap();
        if gap > 1 {
            warn!(from = unit_event.from, to = unit_event.to, gap, "price gap jump");
        }

        self.cycle.observe_unit(unit_event.to);
        let actions = self
            .window
            .slide(unit_event.from, unit_event.to, &mut self.position_map);
        for action in &actions {
            self.order_manager
                .execute(action, &mut self.position_map, self.config.long_fragment_asset);
        }

        // A slide vacates crossed orders by bookkeeping alone (see
        // `SlidingWindow::slide`) — that's this cycle's primary fill
        // signal; a discrete `Fill` event for the same crossing is the
        // exception (out-of-order venue confirmation), not the rule.
        let declined = unit_event.to < unit_event.from;
        for action in &actions {
            if matches!(action, crate::domain::SlideAction::Vacated { .. }) {
                if declined {
                    self.cycle.ever_filled_stop = true;
                } else {
                    self.cycle.ever_held_buy = true;
                }
            }
        }
        if self.window.is_all_buys() {
            self.cycle.ever_fully_declined = true;
        }

        self.check_reset();
        self.persist();
    }

    fn handle_fill(&mut self, fill: Fill) {
        let outcome = self.fill_router.route(
            &fill,
            self.cycle.initial_order_id.as_deref(),
            &mut self.window,
            &mut self.position_map,
            &mut self.order_manager,
            self.config.long_fragment_asset,
            self.cycle.current_unit,
        );

        match outcome {
            FillOutcome::Applied { order_type, .. } => {
                self.stats.fills_processed += 1;
                match order_type {
                    crate::domain::OrderType::StopLossSell => self.cycle.ever_filled_stop = true,
                    crate::domain::OrderType::LimitBuy => self.cycle.ever_held_buy = true,
                }
            }
            FillOutcome::Unmatched => self.stats.unmatched_fills += 1,
            FillOutcome::Ignored => {}
        }
        if self.window.is_all_buys() {
            self.cycle.ever_fully_declined = true;
        }

        self.check_reset();
        self.persist();
    }

    /// Consulted after every mutation: all-stops after the window has
    /// fully declined to all-buys at least once means the cycle closed
    /// its decline/recovery loop and should rebase. A shallow retracement
    /// that returns to all-stops without ever reaching all-buys stays put.
    fn check_reset(&mut self) {
        if self.window.is_all_stops() && self.cycle.ever_fully_declined {
            self.reset();
        }
    }

    fn reset(&mut self) {
        info!(symbol = %self.config.symbol, "RESET triggered");

        if let Err(e) = self.order_manager.venue_mut().cancel_all() {
            warn!(error = %e, "failed to cancel all orders during reset");
        }

        let realised_size = self.order_manager.venue().position();
        let mark_price = self.order_manager.venue().mark_price();
        let prior_notional = self.config.position_notional;

        self.config.reset(mark_price, realised_size);
        self.quantiser.rebase(mark_price);
        self.position_map.rebuild(&self.quantiser);

        let growth_factor = if prior_notional.is_zero() {
            Decimal::ONE
        } else {
            self.config.position_notional / prior_notional
        };

        let actions = self.window.reset_to_stops(&mut self.position_map);
        for action in &actions {
            self.order_manager
                .execute(action, &mut self.position_map, self.config.long_fragment_asset);
        }

        self.cycle.on_reset(growth_factor);
        self.stats.resets += 1;

        info!(
            symbol = %self.config.symbol,
            growth_factor = %growth_factor,
            cumulative_growth = %self.cycle.cumulative_growth,
            cycle_index = self.cycle.cycle_index,
            "RESET complete"
        );

        self.persist();
    }

    fn run_audit(&mut self) -> AuditReport {
        self.stats.audits_run += 1;
        let report = self.auditor.audit(
            &self.window,
            &mut self.position_map,
            &mut self.order_manager,
            self.config.long_fragment_asset,
        );
        if report.needs_follow_up() {
            info!(follow_up_in = ?self.auditor.config().follow_up_delay, "auditor scheduling follow-up pass");
        }
        report
    }

    /// Cancels all live orders with bounded retries and persists final
    /// state before the caller tears the task down.
    fn shutdown(&mut self) {
        info!(symbol = %self.config.symbol, "engine shutting down");
        if let Err(e) = self.order_manager.venue_mut().cancel_all() {
            warn!(error = %e, "best-effort shutdown cancellation failed");
        }
        self.persist();
    }

    /// Drives the event loop until a `Shutdown` event is processed. Audit
    /// timers are interleaved with queued events at the configured
    /// cadence; this is the only place that owns the receiver end.
    pub async fn run(&mut self, mut events: mpsc::Receiver<EngineEvent>) {
        let mut audit_interval = tokio::time::interval(self.auditor.config().interval);
        audit_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(EngineEvent::Shutdown) => {
                            self.handle_event(EngineEvent::Shutdown);
                            break;
                        }
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
                _ = audit_interval.tick() => {
                    self.handle_event(EngineEvent::AuditTimer);
                }
            }
        }
    }

    pub fn since_startup(&self) -> Duration {
        self.startup_time.elapsed().unwrap_or_default()
    }
}

pub fn last_healthy_age(instant: Option<Instant>) -> Option<Duration> {
    instant.map(|i| i.elapsed())
}
