//! Tick orchestration: weights → balances → engine → submit.
//!
//! A tick is one full rebalance pass. Anything that fails before orders are
//! generated (weights, balances, prices) aborts the tick with no orders and
//! notifies the operator; the runner stays usable for the next tick.

use std::thread;

use chrono::Utc;
use log::{info, warn};
use pvdot::{Plan, QuantityMap, RebalanceEngine};
use pvdot_exchange::Exchange;

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::notify::{LogNotifier, Notifier};
use crate::target::WeightSource;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub generated: usize,
    pub submitted: usize,
    pub failed: usize,
}

/// Drives the engine against an exchange, one tick at a time.
pub struct Runner<E: Exchange> {
    exchange: E,
    engine: RebalanceEngine,
    weights: Box<dyn WeightSource>,
    notifier: Box<dyn Notifier>,
    audit: Option<AuditLog>,
    dry_run: bool,
    ticks: u64,
}

impl<E: Exchange> Runner<E> {
    /// Build a runner from a validated config. `exchange` must already be
    /// connected.
    pub fn new(config: &Config, exchange: E, weights: Box<dyn WeightSource>) -> Result<Self> {
        let engine = RebalanceEngine::new(config.engine_config())
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            exchange,
            engine,
            weights,
            notifier: Box::new(LogNotifier),
            audit: None,
            dry_run: config.strategy.dry_run,
            ticks: 0,
        })
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Force dry-run on (or off) regardless of the config.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Number of ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one rebalance pass.
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.ticks += 1;
        let tick = self.ticks;
        info!("tick {tick} started");
        if let Some(audit) = self.audit.as_mut() {
            audit::log_tick_started(audit, tick, self.dry_run)?;
        }

        match self.plan() {
            Ok(plan) => self.execute(tick, &plan),
            Err(e) => {
                let reason = e.to_string();
                self.notifier
                    .notify(&format!("tick {tick} aborted, no orders placed: {reason}"));
                if let Some(audit) = self.audit.as_mut() {
                    audit::log_tick_aborted(audit, tick, &reason)?;
                }
                Err(e)
            }
        }
    }

    /// Tick at every `interval` close, forever or until `max_ticks` ticks
    /// have run. Aborted ticks are skipped; only non-tick errors stop the loop.
    pub fn watch(&mut self, interval: Interval, max_ticks: Option<u64>) -> Result<()> {
        let mut done = 0;
        while max_ticks.is_none_or(|max| done < max) {
            let wait = interval.until_next_close(Utc::now());
            info!("next {interval} close in {}s", wait.as_secs());
            thread::sleep(wait);

            match self.tick() {
                Ok(_) => {}
                Err(e) if e.is_tick_fatal() => warn!("skipping tick: {e}"),
                Err(e) => return Err(e),
            }
            done += 1;
        }
        Ok(())
    }

    /// Only the currencies the weight source names are priced and valued.
    fn plan(&mut self) -> Result<Plan> {
        let targets = self.weights.target_weights()?;
        let balances = self.exchange.balances()?;
        Ok(self.engine.rebalance(&targets, &self.exchange, &balances)?)
    }

    fn execute(&mut self, tick: u64, plan: &Plan) -> Result<TickSummary> {
        if let Some(audit) = self.audit.as_mut() {
            audit::log_weights(audit, plan)?;
            audit::log_orders_generated(audit, &plan.orders)?;
        }

        let mut summary = TickSummary {
            generated: plan.orders.len(),
            ..TickSummary::default()
        };

        if self.dry_run {
            for order in &plan.orders {
                info!("[DRY RUN] {order}");
            }
            if let Some(audit) = self.audit.as_mut() {
                audit.log("dry_run", serde_json::json!({ "orders": plan.orders.len() }))?;
            }
        } else {
            for order in &plan.orders {
                match self.exchange.submit_order(order) {
                    Ok(id) => {
                        info!("submitted {order} as {id}");
                        summary.submitted += 1;
                        if let Some(audit) = self.audit.as_mut() {
                            audit::log_order_submitted(audit, order, id)?;
                        }
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        self.notifier
                            .notify(&format!("can not place order {order}: {reason}"));
                        summary.failed += 1;
                        if let Some(audit) = self.audit.as_mut() {
                            audit::log_order_failed(audit, order, &reason)?;
                        }
                    }
                }
            }
        }

        info!(
            "tick {tick} done: {} generated, {} submitted, {} failed",
            summary.generated, summary.submitted, summary.failed
        );
        if let Some(audit) = self.audit.as_mut() {
            audit::log_tick_completed(
                audit,
                tick,
                summary.generated,
                summary.submitted,
                summary.failed,
            )?;
        }
        Ok(summary)
    }
}

/// Quantities the engine would use for every configured currency.
pub fn quantities<E: Exchange>(config: &Config, exchange: &E) -> Result<QuantityMap> {
    let balances = exchange.balances()?;
    let currencies = config.currencies();
    Ok(pvdot::resolve_quantities(
        &balances,
        currencies.iter().map(String::as_str),
        config.strategy.ignore_locked,
    ))
}

/// Print the quantity map the engine would use.
pub fn show_balances<E: Exchange>(config: &Config, exchange: &E) -> Result<()> {
    let quantities = quantities(config, exchange)?;
    let mode = if config.strategy.ignore_locked {
        "available + locked"
    } else {
        "available"
    };
    println!("BALANCES ({mode}):");
    for (currency, qty) in &quantities {
        println!("  {currency:8} {qty:>20}");
    }
    Ok(())
}

/// Print the last price of every configured symbol.
pub fn check_status<E: Exchange>(config: &Config, exchange: &E) -> Result<()> {
    let base = config.strategy.base_currency.as_str();
    let prices = pvdot::resolve_prices(
        exchange,
        config.strategy.quote_currencies.iter().map(String::as_str),
        base,
    )?;
    println!("Connected. Last prices in {base}:");
    for (currency, price) in &prices {
        println!("  {:12} {price:>20}", pvdot::pair_symbol(currency, base));
    }
    Ok(())
}
