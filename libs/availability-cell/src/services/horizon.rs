// libs/availability-cell/src/services/horizon.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{DateRange, ScheduleError, SlotGranularity};
use crate::services::expansion::{expand_slots, group_by_doctor};
use crate::store::{HolidayCalendar, ScheduleStore, SlotStore};

/// Manual generation may always cover at least this many days, even when the
/// configured horizon is shorter.
pub const MANUAL_GENERATION_MIN_SPAN_DAYS: u32 = 366;

#[derive(Debug, Clone)]
pub struct HorizonConfig {
    pub horizon_days: u32,
    pub granularity: SlotGranularity,
    pub interval: Duration,
}

impl HorizonConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScheduleError> {
        let interval = config.horizon_interval();
        if interval.is_zero() {
            return Err(ScheduleError::ValidationError(
                "Horizon interval must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            horizon_days: config.slot_horizon_days,
            granularity: SlotGranularity::from_minutes(config.slot_granularity_minutes)?,
            interval,
        })
    }

    /// Longest range, in days, a caller may request through manual generation.
    pub fn max_manual_span_days(&self) -> u32 {
        self.horizon_days.max(MANUAL_GENERATION_MIN_SPAN_DAYS)
    }
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            granularity: SlotGranularity::default(),
            interval: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorFailure {
    pub doctor_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HorizonRunReport {
    pub window: DateRange,
    pub doctors_processed: usize,
    pub slots_generated: usize,
    pub slots_inserted: usize,
    pub failures: Vec<DoctorFailure>,
}

impl HorizonRunReport {
    fn new(window: DateRange) -> Self {
        Self {
            window,
            doctors_processed: 0,
            slots_generated: 0,
            slots_inserted: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Keeps `[today, today + horizon_days]` populated with slots.
///
/// Writes go through `SlotStore::insert_slots_if_absent` only, so a run can
/// overlap earlier runs (or a concurrent manual generation) without touching
/// booked rows.
pub struct HorizonScheduler {
    schedules: Arc<dyn ScheduleStore>,
    holidays: Arc<dyn HolidayCalendar>,
    slots: Arc<dyn SlotStore>,
    config: HorizonConfig,
}

impl HorizonScheduler {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        holidays: Arc<dyn HolidayCalendar>,
        slots: Arc<dyn SlotStore>,
        config: HorizonConfig,
    ) -> Self {
        Self {
            schedules,
            holidays,
            slots,
            config,
        }
    }

    pub fn config(&self) -> &HorizonConfig {
        &self.config
    }

    pub async fn run_once(&self, today: NaiveDate) -> Result<HorizonRunReport, ScheduleError> {
        let window = DateRange::horizon(today, self.config.horizon_days)?;
        self.generate_for_range(window, self.config.granularity).await
    }

    /// Expands every doctor's schedules over `range`. A failure while
    /// persisting one doctor's slots is recorded in the report and does not
    /// stop the others.
    #[instrument(skip(self), fields(start = %range.start(), end = %range.end()))]
    pub async fn generate_for_range(
        &self,
        range: DateRange,
        granularity: SlotGranularity,
    ) -> Result<HorizonRunReport, ScheduleError> {
        let schedules = self.schedules.list_schedules().await?;
        let holidays = self.holidays.holidays_between(&range).await?;

        let mut report = HorizonRunReport::new(range);

        for (doctor_id, entries) in group_by_doctor(schedules) {
            let candidates = expand_slots(&entries, &range, granularity, &holidays);
            report.doctors_processed += 1;
            report.slots_generated += candidates.len();

            match self.slots.insert_slots_if_absent(&candidates).await {
                Ok(inserted) => {
                    debug!(
                        "Doctor {}: {} slots generated, {} new",
                        doctor_id,
                        candidates.len(),
                        inserted
                    );
                    report.slots_inserted += inserted;
                }
                Err(e) => {
                    warn!("Slot generation failed for doctor {}: {}", doctor_id, e);
                    report.failures.push(DoctorFailure {
                        doctor_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Slot generation for {} to {}: {} doctors, {} generated, {} inserted, {} failed",
            range.start(),
            range.end(),
            report.doctors_processed,
            report.slots_generated,
            report.slots_inserted,
            report.failures.len()
        );

        Ok(report)
    }

    /// Runs immediately, then once per `config.interval`, until the returned
    /// handle is shut down. Failed runs are logged and left for the next tick.
    pub fn spawn(self: Arc<Self>) -> HorizonHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Horizon scheduler started (every {:?})", period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let today = Utc::now().date_naive();
                        match self.run_once(today).await {
                            Ok(report) if report.is_complete() => {}
                            Ok(report) => warn!(
                                "Horizon run finished with {} failed doctors; retrying next tick",
                                report.failures.len()
                            ),
                            Err(e) => error!("Horizon run failed: {}; retrying next tick", e),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Horizon scheduler stopped");
        });

        HorizonHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct HorizonHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HorizonHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Horizon scheduler task ended abnormally: {}", e);
        }
    }
}
