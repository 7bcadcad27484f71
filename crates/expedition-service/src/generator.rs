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

//! Synthetic expedition event generation.
//!
//! One generator owns one reusable random source; the peak and leader name
//! tables are static. Generated events stamp `its` with the generation time
//! truncated to whole seconds and `ets` up to [MAX_EVENT_TIME_LAG] behind it,
//! so events produced within one tick share their ingest time.

use alpenglow_expedition_pkt::{
    ExpeditionEvent, ExpeditionOutcome, InvalidExpeditionEvent, MAX_EVENT_TIME_LAG,
    MAX_PARTY_SIZE, MIN_PARTY_SIZE,
};
use chrono::{DateTime, SubsecRound, Utc};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use strum::VariantArray;

const PEAK_NAMES: &[&str] = &[
    "Mont Blanc",
    "Matterhorn",
    "Eiger",
    "Denali",
    "Aconcagua",
    "Kilimanjaro",
    "Elbrus",
    "K2",
    "Annapurna",
    "Nanga Parbat",
    "Broad Peak",
    "Cho Oyu",
];

const TRIP_LEADERS: &[&str] = &[
    "Wanda Rutkiewicz",
    "Reinhold Messner",
    "Jerzy Kukuczka",
    "Junko Tabei",
    "Edmund Hillary",
    "Tenzing Norgay",
    "Krzysztof Wielicki",
    "Lynn Hill",
    "Walter Bonatti",
    "Catherine Destivelle",
];

/// Produces one synthetic [ExpeditionEvent] per invocation.
///
/// Holds no shared mutable state, so independent generators can run on
/// separate tasks with their own random sources.
#[derive(Debug, Clone)]
pub struct ExpeditionGenerator<R> {
    rng: R,
}

impl ExpeditionGenerator<SmallRng> {
    /// Generator backed by an OS-seeded random source.
    pub fn from_os_rng() -> Self {
        Self::new(SmallRng::from_os_rng())
    }
}

impl<R: Rng> ExpeditionGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generates one event stamped with the current wall-clock time.
    pub fn generate_one(&mut self) -> Result<ExpeditionEvent, InvalidExpeditionEvent> {
        self.generate_at(Utc::now())
    }

    /// Generates one event as of `now`. `now` is truncated to whole seconds
    /// and becomes the event's ingest time; the event time lags uniformly
    /// within [MAX_EVENT_TIME_LAG] behind it.
    pub fn generate_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<ExpeditionEvent, InvalidExpeditionEvent> {
        let its = now.trunc_subsecs(0);
        let lag =
            chrono::Duration::seconds(self.rng.random_range(0..=MAX_EVENT_TIME_LAG.as_secs()) as i64);
        let outcome =
            ExpeditionOutcome::VARIANTS[self.rng.random_range(0..ExpeditionOutcome::VARIANTS.len())];
        ExpeditionEvent::new(
            PEAK_NAMES[self.rng.random_range(0..PEAK_NAMES.len())].to_string(),
            TRIP_LEADERS[self.rng.random_range(0..TRIP_LEADERS.len())].to_string(),
            outcome,
            self.rng.random_range(MIN_PARTY_SIZE..=MAX_PARTY_SIZE),
            its - lag,
            its,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seeded() -> ExpeditionGenerator<SmallRng> {
        ExpeditionGenerator::new(SmallRng::seed_from_u64(42))
    }

    #[test]
    fn test_generated_event_ranges() {
        let mut generator = seeded();
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap();
        for _ in 0..200 {
            let event = generator.generate_at(now).unwrap();
            assert!(!event.peak_name().is_empty());
            assert!(!event.trip_leader().is_empty());
            assert!((MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&event.amount_people()));
            assert!(event.ets() <= event.its());
            assert!(event.its() - event.ets() <= chrono::Duration::seconds(42));
        }
    }

    #[test]
    fn test_ingest_time_is_truncated_to_seconds() {
        let mut generator = seeded();
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(734);
        let event = generator.generate_at(now).unwrap();
        assert_eq!(
            event.its(),
            Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_same_tick_shares_ingest_time() {
        let mut generator = seeded();
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap();
        let first = generator.generate_at(now).unwrap();
        let second = generator.generate_at(now).unwrap();
        assert_eq!(first.its(), second.its());
    }

    #[test]
    fn test_all_outcomes_reachable() {
        let mut generator = seeded();
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(generator.generate_at(now).unwrap().result());
        }
        assert_eq!(seen.len(), ExpeditionOutcome::VARIANTS.len());
    }
}
