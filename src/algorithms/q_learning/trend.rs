//! Direction-trend tracking over destination requests.

use super::config::DispatchConfig;
use super::types::{Direction, DirectionRecord, DirectionTrend};
use crate::Timestamp;

/// Timestamp-ordered log of destination-request directions.
///
/// Only the trailing `window` records (by timestamp) are consulted. The share
/// of each direction is taken over the full window size, so a short history
/// needs at least `ceil(threshold · window)` agreeing requests to form a trend.
#[derive(Debug, Clone)]
pub struct DirectionTrendTracker {
    records: Vec<DirectionRecord>,
    window: usize,
    threshold: f64,
}

impl DirectionTrendTracker {
    pub fn new(window: usize, threshold: f64) -> Self {
        Self {
            records: Vec::new(),
            window,
            threshold,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.trend_window, config.trend_threshold)
    }

    /// Appends a request, keeping the log ordered by timestamp. Requests
    /// sharing a timestamp keep registration order.
    pub fn record(&mut self, timestamp: Timestamp, direction: Direction) {
        let record = DirectionRecord {
            timestamp,
            direction,
        };
        match self.records.last() {
            Some(last) if last.timestamp > timestamp => {
                let pos = self
                    .records
                    .partition_point(|r| r.timestamp <= timestamp);
                self.records.insert(pos, record);
            }
            _ => self.records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Requests in timestamp order.
    pub fn records(&self) -> &[DirectionRecord] {
        &self.records
    }

    /// Classifies the most recent `window` requests.
    pub fn classify(&self) -> DirectionTrend {
        let recent = &self.records[self.records.len().saturating_sub(self.window)..];
        let up = recent
            .iter()
            .filter(|r| r.direction == Direction::Up)
            .count();
        let down = recent.len() - up;

        let window = self.window as f64;
        if up as f64 / window >= self.threshold {
            DirectionTrend::MostlyUp
        } else if down as f64 / window >= self.threshold {
            DirectionTrend::MostlyDown
        } else {
            DirectionTrend::Undetermined
        }
    }
}
