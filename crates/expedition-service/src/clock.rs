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

//! Wall-clock-aligned tick scheduling.
//!
//! The generation loop ticks once per wall-clock second: after a batch it
//! sleeps until the next whole-second boundary. A batch that overruns its
//! second still wakes at the following truncated-second mark, so ticks
//! compress together when the system falls behind instead of drifting.
//! Cancellation is handled by the caller dropping the sleep future, normally
//! inside a `tokio::select!`.

use chrono::{DateTime, SubsecRound, Utc};
use std::time::Duration;

/// Time remaining from `now` until the next whole-second boundary.
///
/// Exactly one second when `now` already sits on a boundary.
pub fn delay_until_next_second(now: DateTime<Utc>) -> Duration {
    let next = now.trunc_subsecs(0) + chrono::Duration::seconds(1);
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Suspends the task until the next whole-second wall-clock boundary.
pub async fn sleep_until_next_second() {
    tokio::time::sleep(delay_until_next_second(Utc::now())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_from_mid_second() {
        let now = DateTime::from_timestamp_millis(1_000_123).unwrap();
        assert_eq!(delay_until_next_second(now), Duration::from_millis(877));
    }

    #[test]
    fn test_delay_from_exact_boundary() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        assert_eq!(delay_until_next_second(now), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_never_exceeds_one_second() {
        for millis in [1, 250, 500, 999] {
            let now = DateTime::from_timestamp_millis(7_000 + millis).unwrap();
            let delay = delay_until_next_second(now);
            assert!(delay > Duration::ZERO);
            assert!(delay < Duration::from_secs(1));
        }
    }
}
