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

//! Data model for synthetic mountain expedition events.
//!
//! An [ExpeditionEvent] carries two timestamps with second precision:
//! - `ets` (event time): when the expedition outcome occurred in the real
//!   world, up to [MAX_EVENT_TIME_LAG] behind generation time.
//! - `its` (ingest time): when the generator emitted the record. This is the
//!   "external time" that drives trailing-window evaluation; `ets` is carried
//!   payload only.
//!
//! [WindowRecord] is the fixed six-field projection handed to window
//! listeners, with both timestamps already rendered in their textual form.

use alpenglow_analytics::windowing::ExternalTime;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Textual timestamp form used on the wire and in listener output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Smallest allowed expedition party.
pub const MIN_PARTY_SIZE: u8 = 1;

/// Largest allowed expedition party.
pub const MAX_PARTY_SIZE: u8 = 12;

/// Upper bound on how far event time may lag behind ingest time.
pub const MAX_EVENT_TIME_LAG: Duration = Duration::from_secs(42);

/// How an expedition ended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::VariantArray,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExpeditionOutcome {
    SummitReached,
    BaseReached,
    ResignationInjury,
    ResignationWeather,
    ResignationSomeoneMissing,
    ResignationOther,
}

/// Errors rejecting a malformed event at construction time, before it can
/// reach the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum InvalidExpeditionEvent {
    #[strum(to_string = "peak_name must not be empty")]
    EmptyPeakName,
    #[strum(to_string = "trip_leader must not be empty")]
    EmptyTripLeader,
    #[strum(to_string = "amount_people {0} is outside [1, 12]")]
    PartySizeOutOfRange(u8),
    #[strum(to_string = "timestamp carries sub-second precision")]
    SubSecondPrecision,
}

impl std::error::Error for InvalidExpeditionEvent {}

/// An immutable expedition event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpeditionEvent {
    peak_name: String,
    trip_leader: String,
    result: ExpeditionOutcome,
    amount_people: u8,
    #[serde(with = "timestamp")]
    ets: DateTime<Utc>,
    #[serde(with = "timestamp")]
    its: DateTime<Utc>,
}

impl ExpeditionEvent {
    /// Builds a validated event. Both timestamps must be whole seconds.
    pub fn new(
        peak_name: String,
        trip_leader: String,
        result: ExpeditionOutcome,
        amount_people: u8,
        ets: DateTime<Utc>,
        its: DateTime<Utc>,
    ) -> Result<Self, InvalidExpeditionEvent> {
        if peak_name.is_empty() {
            return Err(InvalidExpeditionEvent::EmptyPeakName);
        }
        if trip_leader.is_empty() {
            return Err(InvalidExpeditionEvent::EmptyTripLeader);
        }
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&amount_people) {
            return Err(InvalidExpeditionEvent::PartySizeOutOfRange(amount_people));
        }
        if ets.trunc_subsecs(0) != ets || its.trunc_subsecs(0) != its {
            return Err(InvalidExpeditionEvent::SubSecondPrecision);
        }
        Ok(Self {
            peak_name,
            trip_leader,
            result,
            amount_people,
            ets,
            its,
        })
    }

    pub fn peak_name(&self) -> &str {
        &self.peak_name
    }

    pub fn trip_leader(&self) -> &str {
        &self.trip_leader
    }

    pub const fn result(&self) -> ExpeditionOutcome {
        self.result
    }

    pub const fn amount_people(&self) -> u8 {
        self.amount_people
    }

    /// Event time: when the outcome occurred in the real world.
    pub const fn ets(&self) -> DateTime<Utc> {
        self.ets
    }

    /// Ingest time: when the generator emitted the record.
    pub const fn its(&self) -> DateTime<Utc> {
        self.its
    }
}

impl ExternalTime for ExpeditionEvent {
    fn external_time(&self) -> DateTime<Utc> {
        self.its
    }
}

/// Renders a timestamp in the [TIMESTAMP_FORMAT] textual form.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for the second-precision textual timestamp form.
pub mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let parsed = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)?;
        Ok(parsed.and_utc())
    }
}

/// The fixed projection emitted to window listeners:
/// `{peak_name, trip_leader, result, amount_people, ets, its}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub peak_name: String,
    pub trip_leader: String,
    pub result: ExpeditionOutcome,
    pub amount_people: u8,
    pub ets: String,
    pub its: String,
}

impl From<&ExpeditionEvent> for WindowRecord {
    fn from(event: &ExpeditionEvent) -> Self {
        Self {
            peak_name: event.peak_name.clone(),
            trip_leader: event.trip_leader.clone(),
            result: event.result,
            amount_people: event.amount_people,
            ets: format_timestamp(event.ets),
            its: format_timestamp(event.its),
        }
    }
}
