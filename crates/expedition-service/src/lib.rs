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

pub mod clock;
pub mod generator;
pub mod pipeline;

use alpenglow_expedition_pkt::WindowRecord;
use std::sync::Arc;

/// Listener invoked once per ingested event with the window's contents after
/// that ingestion. Listeners must not panic; any internal error is theirs to
/// surface and must not stop the pipeline.
pub type WindowListener = Arc<dyn Fn(&[WindowRecord]) + Send + Sync>;
