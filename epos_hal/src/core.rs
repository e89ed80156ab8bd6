//! HAL Core struct and cyclic loop management.
//!
//! The `HalCore` struct is the host runtime: it selects the vendor library,
//! builds and initializes the fleet, then calls `Fleet::read()` and
//! `Fleet::write()` once per cycle until shutdown is requested.

use crate::driver_registry::DriverRegistry;
use crate::fleet::{Fleet, InitReport};
use epos_common::config::ConfigLoader;
use epos_common::hal::config::FleetConfig;
use epos_common::hal::consts::HAL_SERVICE_NAME;
use epos_common::hal::driver::HalError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// HAL Core manages the fleet and the cyclic loop.
pub struct HalCore {
    /// Fleet configuration
    config: FleetConfig,
    /// Fleet, present after `init()`
    fleet: Option<Fleet>,
    /// Running flag for loop control
    running: Arc<AtomicBool>,
    /// Cycle time from config
    cycle_time: Duration,
    /// Timing statistics
    stats: TimingStats,
}

/// Timing statistics for loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Number of timing violations (cycle exceeded target)
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
}

impl TimingStats {
    /// Average cycle time in microseconds.
    pub fn avg_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }

    fn record(&mut self, cycle_time_us: u64, target_us: u64) -> bool {
        self.cycle_count += 1;
        self.total_cycle_time_us += cycle_time_us;
        self.max_cycle_time_us = self.max_cycle_time_us.max(cycle_time_us);
        if cycle_time_us > target_us {
            self.timing_violations += 1;
            true
        } else {
            false
        }
    }
}

impl HalCore {
    /// Create a new HalCore instance with the given configuration.
    ///
    /// # Errors
    /// Returns error if configuration validation fails.
    pub fn new(config: FleetConfig) -> Result<Self, HalError> {
        config.validate()?;

        let cycle_time = Duration::from_micros(u64::from(config.cycle_time_us));

        info!(
            "{} created with {} motor entries, cycle_time={}us",
            HAL_SERVICE_NAME,
            config.motors.len(),
            config.cycle_time_us
        );

        Ok(Self {
            config,
            fleet: None,
            running: Arc::new(AtomicBool::new(true)),
            cycle_time,
            stats: TimingStats::default(),
        })
    }

    /// Load fleet configuration from a TOML file.
    pub fn load_config(config_path: &Path) -> Result<FleetConfig, HalError> {
        info!("Loading configuration from {:?}", config_path);
        let config = FleetConfig::load(config_path)?;
        info!(
            "Loaded config: library={}, {} motor entries",
            config.library,
            config.motors.len()
        );
        Ok(config)
    }

    /// Create and initialize the vendor library, then build and initialize
    /// the fleet.
    ///
    /// Per-axis failures do not fail this call; they are in the report.
    ///
    /// # Errors
    /// Returns error if the library is unknown or fails to initialize, or
    /// if the fleet cannot be built.
    pub fn init(
        &mut self,
        registry: &DriverRegistry,
        library_name: &str,
    ) -> Result<InitReport, HalError> {
        info!("Initializing HalCore with library '{}'...", library_name);

        let mut library = registry.create_library(library_name)?;
        info!("Created library: {} v{}", library.name(), library.version());
        library.init(&self.config)?;

        let mut fleet = Fleet::from_config(&self.config, library)?;
        let report = fleet.init();
        self.fleet = Some(fleet);

        info!(
            "HalCore initialized: {} axes enabled, {} failed",
            report.enabled.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Run the cyclic loop.
    ///
    /// Blocks until the running flag is cleared or `max_cycles` cycles have
    /// run. The flag is set when the core is created; a stop requested
    /// before `run()` makes it return without cycling.
    ///
    /// # Errors
    /// Returns error if called before `init()`.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<(), HalError> {
        let fleet = self
            .fleet
            .as_mut()
            .ok_or_else(|| HalError::InitFailed("Fleet not initialized".to_string()))?;

        info!(
            "Starting HalCore loop (cycle_time={}us)...",
            self.cycle_time.as_micros()
        );
        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }

        let target_us = u64::from(self.config.cycle_time_us);
        let mut cycles = 0u64;

        while self.running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            let cycle_start = Instant::now();

            fleet.read();
            fleet.write();
            cycles += 1;

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            if self.stats.record(cycle_time_us, target_us)
                && (self.stats.timing_violations <= 10
                    || self.stats.timing_violations % 1000 == 0)
            {
                warn!(
                    "Timing violation #{}: cycle took {}us (target {}us)",
                    self.stats.timing_violations, cycle_time_us, target_us
                );
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "Loop: {} cycles, avg={}us, max={}us, violations={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_time_us(),
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations
                );
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "HalCore loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
        Ok(())
    }

    /// Stop the loop and release every axis.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);

        match self.fleet.as_mut() {
            Some(fleet) => fleet.shutdown(),
            None => Ok(()),
        }
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Fleet configuration.
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// The fleet, once initialized.
    pub fn fleet(&self) -> Option<&Fleet> {
        self.fleet.as_ref()
    }

    /// Mutable access to the fleet, once initialized.
    pub fn fleet_mut(&mut self) -> Option<&mut Fleet> {
        self.fleet.as_mut()
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        self.stats
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread.
        let policy = unsafe { sched_getscheduler(0) };
        policy == SCHED_FIFO || policy == SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
