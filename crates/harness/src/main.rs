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

use alpenglow_expedition_service::pipeline::QueryPipelineHandle;
use alpenglow_harness::{config::HarnessConfig, printing_listener};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use std::{env, path::PathBuf, str::FromStr};
use tracing::{info, Level};

fn init_tracing(level: &'_ str) {
    // Very simple setup at the moment to validate the instrumentation in the code
    // is working in the future that should be configured automatically based on
    // configuration options
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::from_str(level).expect("invalid logging level"))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        return Err(format!("Usage: {} [config-file]", args[0]).into());
    }
    let mut figment = Figment::new().merge(Serialized::defaults(HarnessConfig::default()));
    if let Some(config_file) = args.get(1) {
        figment = figment.merge(Yaml::file(PathBuf::from(config_file)));
    }
    let config: HarnessConfig = match figment.merge(Env::prefixed("EXPD_").split("__")).extract() {
        Ok(config) => config,
        Err(err) => {
            return Err(format!("Parsing config file failed: {err}").into());
        }
    };
    init_tracing(&config.logging.level);

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    // If num threads is not configured then the default use all CPU cores is used
    if let Some(num_threads) = config.runtime.threads {
        runtime_builder.worker_threads(num_threads);
    }
    runtime_builder.enable_all();
    let runtime = runtime_builder.build()?;
    runtime.block_on(async move {
        let (join_handle, pipeline_handle) =
            QueryPipelineHandle::new(config.pipeline, printing_listener())?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Termination signal received, gracefully shutting down the pipeline");
                let report = pipeline_handle.shutdown().await?;
                info!(
                    "Pipeline stopped after {} events over {} ticks",
                    report.generated, report.ticks
                );
            }
            result = join_handle => {
                let report = result??;
                info!(
                    "Pipeline run finished: {} events over {} ticks",
                    report.generated, report.ticks
                );
            }
        }
        Ok::<(), Box<dyn std::error::Error + Send + Sync + 'static>>(())
    })
}
