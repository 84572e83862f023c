// src/processors/work_time.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::ProcessorError;
use crate::model::{CommitEvent, UserId};
use crate::registry::IdRemap;

use super::DataProcessor;

/// `userId -> minute of week -> commit count`. The week starts on Sunday;
/// minutes run 0..10079 in UTC.
#[derive(Debug, Default)]
pub struct WorkTimeProcessor {
    pub distribution: BTreeMap<UserId, BTreeMap<u32, u64>>,
}

impl DataProcessor for WorkTimeProcessor {
    fn on_commit(&mut self, commit: &CommitEvent) -> Result<(), ProcessorError> {
        if let Some(minute) = minute_of_week(commit.timestamp) {
            *self
                .distribution
                .entry(commit.author)
                .or_default()
                .entry(minute)
                .or_insert(0) += 1;
        }
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (user, histogram) in other.distribution {
            let target = self.distribution.entry(remap.user(user)).or_default();
            for (minute, count) in histogram {
                *target.entry(minute).or_insert(0) += count;
            }
        }
    }
}

fn minute_of_week(timestamp: i64) -> Option<u32> {
    let time: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)?;
    Some(time.weekday().num_days_from_sunday() * 1440 + time.hour() * 60 + time.minute())
}
