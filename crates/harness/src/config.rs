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

use alpenglow_expedition_service::pipeline::PipelineConfig;

/// Top-level harness configuration. Every section has working defaults, so
/// an empty config file (or none at all) runs the reference demo: 2 records
/// per second for 5 seconds.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    #[serde(skip_serializing_if = "::std::option::Option::is_none")]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{
        providers::{Env, Format, Serialized, Yaml},
        Figment,
    };

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.runtime.threads, None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pipeline.records_per_second, 2);
        assert_eq!(config.pipeline.duration_seconds, 5);
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "harness.yaml",
                r"
logging:
  level: debug
pipeline:
  records_per_second: 7
",
            )?;
            let config: HarnessConfig = Figment::new()
                .merge(Serialized::defaults(HarnessConfig::default()))
                .merge(Yaml::file("harness.yaml"))
                .extract()?;
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.pipeline.records_per_second, 7);
            // Keys the file does not mention keep their defaults
            assert_eq!(config.pipeline.duration_seconds, 5);
            assert_eq!(config.runtime.threads, None);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "harness.yaml",
                r"
pipeline:
  duration_seconds: 30
",
            )?;
            jail.set_env("EXPD_PIPELINE__DURATION_SECONDS", "12");
            jail.set_env("EXPD_RUNTIME__THREADS", "2");
            let config: HarnessConfig = Figment::new()
                .merge(Serialized::defaults(HarnessConfig::default()))
                .merge(Yaml::file("harness.yaml"))
                .merge(Env::prefixed("EXPD_").split("__"))
                .extract()?;
            assert_eq!(config.pipeline.duration_seconds, 12);
            assert_eq!(config.runtime.threads, Some(2));
            Ok(())
        });
    }
}
