// Copyright (C) 2025-present The Alpenglow Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A module that provides a trailing window driven by an item-carried
//! "external" timestamp rather than wall-clock arrival time.
//!
//! The main components are:
//! - `ExternalTime`: A trait that exposes the timestamp driving window
//!   advancement for an item
//! - `ExternalTimeWindow`: The evaluator that buffers items and keeps exactly
//!   those whose external time falls within the trailing width of the highest
//!   external time seen so far (the watermark)
//!
//! An item is resident while `watermark - width <= t <= watermark`: the
//! trailing boundary value itself is retained and only strictly older items
//! are evicted. The watermark never moves backwards, which makes eviction a
//! one-way transition: once an item has been dropped it can never reappear in
//! a later snapshot.
//!
//! Example usage:
//! ```text
//! let mut window = ExternalTimeWindow::new(Duration::from_secs(3));
//! for event in source {
//!     let snapshot: Vec<_> = window.ingest(event).collect();
//!     notify(snapshot);
//! }
//! ```

use chrono::{DateTime, Utc};
use std::{collections::VecDeque, time::Duration};

/// A trait exposing the timestamp that drives window advancement.
pub trait ExternalTime {
    fn external_time(&self) -> DateTime<Utc>;
}

/// A trailing window over items carrying an external timestamp.
///
/// The buffer is kept sorted by external time (stable for equal timestamps,
/// so arrival order is preserved within a same-second batch). Keeping the
/// buffer sorted on insert means eviction is always a truncation from the
/// front, for monotone and out-of-order input alike.
#[derive(Debug, Clone)]
pub struct ExternalTimeWindow<T> {
    buffer: VecDeque<T>,
    width: Duration,
    /// Highest external time observed so far; `None` until the first ingest.
    watermark: Option<DateTime<Utc>>,
}

impl<T: ExternalTime> ExternalTimeWindow<T> {
    pub const fn new(width: Duration) -> Self {
        Self {
            buffer: VecDeque::new(),
            width,
            watermark: None,
        }
    }

    /// Ingests one item and returns the window's contents after this
    /// ingestion, in ascending external-time order.
    ///
    /// The item is inserted at its sorted position, the watermark advances to
    /// `max(watermark, item time)`, and everything strictly older than
    /// `watermark - width` is evicted. Never fails: an item that is already
    /// outside the window is inserted and immediately evicted, so it simply
    /// does not appear in the returned snapshot.
    pub fn ingest(&mut self, item: T) -> impl Iterator<Item = &T> {
        let ts = item.external_time();
        let pos = self
            .buffer
            .iter()
            .rposition(|buffered| buffered.external_time() <= ts)
            .map_or(0, |i| i + 1);
        self.buffer.insert(pos, item);

        let watermark = match self.watermark {
            Some(current) => current.max(ts),
            None => ts,
        };
        self.watermark = Some(watermark);

        let cutoff = watermark - self.width;
        while self
            .buffer
            .front()
            .is_some_and(|oldest| oldest.external_time() < cutoff)
        {
            self.buffer.pop_front();
        }
        self.buffer.iter()
    }

    /// Current window contents in ascending external-time order.
    pub fn contents(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub const fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    pub const fn width(&self) -> Duration {
        self.width
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
