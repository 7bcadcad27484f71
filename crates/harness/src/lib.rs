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

//! Command-line harness wiring the query pipeline to stdout.

pub mod config;

use alpenglow_expedition_pkt::WindowRecord;
use alpenglow_expedition_service::WindowListener;
use std::sync::Arc;
use tracing::error;

/// Listener that prints each window snapshot to stdout as one `R:`-prefixed
/// JSON array per ingested event.
pub fn printing_listener() -> WindowListener {
    Arc::new(|records: &[WindowRecord]| match serde_json::to_string(records) {
        Ok(rendered) => println!("R: {rendered}"),
        Err(err) => error!("failed to render window snapshot: {err}"),
    })
}
