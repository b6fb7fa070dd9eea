use super::{Dashboard, DashboardState};
use crate::error::Result;
use crate::history::PowerSample;
use crate::protocol::{DongleStatus, InverterSnapshot};
use crate::rules::RuleEngine;
use tokio::time::{Duration, interval};

impl Dashboard {
    /// Run poll cycles on the configured interval until shutdown is signalled
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting dashboard poll loop");
        self.state = DashboardState::Running;
        self.publish();

        let mut poll_interval = interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let poll_started = std::time::Instant::now();
                    if let Err(e) = self.poll_cycle().await {
                        self.logger.warn(&format!("Poll cycle failed: {}", e));
                    }
                    let dur_ms = poll_started.elapsed().as_millis() as u64;
                    self.last_poll_duration_ms = Some(dur_ms);
                    if dur_ms > self.config.poll_interval_ms {
                        self.overrun_count = self.overrun_count.saturating_add(1);
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.state = DashboardState::ShuttingDown;
        self.publish();
        self.logger.info("Dashboard shutdown complete");
        Ok(())
    }

    /// One fetch -> decode -> history -> rules -> chart -> publish pass.
    ///
    /// A failed fetch is counted and reported through the status code; history
    /// and chart are left untouched.
    pub async fn poll_cycle(&mut self) -> Result<()> {
        self.total_polls = self.total_polls.saturating_add(1);
        let timestamp_ms = self.uptime_ms();

        let outcome = self.client.fetch_snapshot().await;
        let result = match outcome {
            Ok(snapshot) => {
                self.apply_snapshot(timestamp_ms, snapshot);
                Ok(())
            }
            Err(e) => {
                self.failed_polls = self.failed_polls.saturating_add(1);
                self.last_status = DongleStatus::from_error(&e);
                Err(e)
            }
        };

        if let Some(rates) = self.rates.as_mut() {
            rates.refresh_if_due().await;
        }

        self.publish();
        result
    }

    /// Fold a decoded snapshot into history and chart and re-evaluate the rules
    pub fn apply_snapshot(&mut self, timestamp_ms: u64, snapshot: InverterSnapshot) {
        let sample = PowerSample::from_snapshot(timestamp_ms, &snapshot);
        self.history.push(sample);
        self.chart.add_sample(
            timestamp_ms,
            sample.pv_power,
            i32::from(sample.load_power),
            sample.soc,
        );

        let decision = RuleEngine::evaluate(&self.history);
        if decision.active != self.decision.active {
            self.logger.info(&format!(
                "Load {} ({:?})",
                if decision.active { "activated" } else { "deactivated" },
                decision.reason
            ));
        }
        self.decision = decision;
        self.smart_control = self.resolver.resolve(&self.history);

        self.logger.debug(&format!(
            "pv={}W soc={}% battery={}W feed_in={}W load={}W",
            sample.pv_power,
            sample.soc,
            sample.battery_power,
            sample.feed_in_power,
            sample.load_power
        ));

        self.last_status = DongleStatus::Ok;
        self.last_inverter = Some(snapshot);
    }
}
