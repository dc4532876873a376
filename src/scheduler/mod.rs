//! Daily quote scheduler.
//!
//! Keeps a single recurring job that fires once a day at a configured local
//! time, plus an on-demand trigger that bypasses the schedule.

pub mod runner;
pub mod schedule;

pub use runner::{DAILY_JOB_ID, DailyJob, ScheduleSnapshot, Scheduler, SchedulerError};
pub use schedule::{DailyTime, ScheduleError, next_fire_after};
