use envconfig::Envconfig;
use lazy_static::lazy_static;
use std::{collections::HashSet, str::FromStr, time::Duration};

lazy_static! {
    pub static ref ENV_VARS: EnvVars = EnvVars::from_env().unwrap();
}

/// How a subscription topic treats subscribers that attach after events
/// were already published
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Deliver the most recent event once, then live events
    Latest,
    /// Only deliver events published after attaching
    None,
}

impl FromStr for ReplayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(ReplayPolicy::Latest),
            "none" => Ok(ReplayPolicy::None),
            _ => Err(format!(
                "Invalid replay policy `{}`, expected `latest` or `none`",
                s
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnvVars {
    inner: Inner,
    log_query_timing: HashSet<String>,
}

impl EnvVars {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        let inner = Inner::init_from_env()?;
        let log_query_timing = inner
            .log_query_timing
            .split(',')
            .map(ToOwned::to_owned)
            .collect();

        Ok(Self {
            inner,
            log_query_timing,
        })
    }

    /// Number of events a subscriber can fall behind before it starts
    /// losing the oldest ones.
    pub fn subscription_buffer(&self) -> usize {
        self.inner.subscription_buffer.max(1)
    }

    pub fn subscription_replay(&self) -> ReplayPolicy {
        self.inner.subscription_replay
    }

    pub fn parallel_dispatch(&self) -> bool {
        self.inner.parallel_dispatch.0
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.inner.query_timeout_in_secs.map(Duration::from_secs)
    }

    pub fn log_gql_timing(&self) -> bool {
        self.log_query_timing.contains("gql")
    }

    pub fn log_loader_timing(&self) -> bool {
        self.log_query_timing.contains("loader")
    }
}

impl Default for EnvVars {
    fn default() -> Self {
        ENV_VARS.clone()
    }
}

#[derive(Clone, Debug, Envconfig)]
struct Inner {
    #[envconfig(from = "POSTGRAPH_SUBSCRIPTION_BUFFER", default = "256")]
    subscription_buffer: usize,
    #[envconfig(from = "POSTGRAPH_SUBSCRIPTION_REPLAY", default = "latest")]
    subscription_replay: ReplayPolicy,
    #[envconfig(from = "POSTGRAPH_PARALLEL_DISPATCH", default = "true")]
    parallel_dispatch: EnvVarBoolean,
    #[envconfig(from = "POSTGRAPH_QUERY_TIMEOUT")]
    query_timeout_in_secs: Option<u64>,
    #[envconfig(from = "POSTGRAPH_LOG_QUERY_TIMING", default = "")]
    log_query_timing: String,
}

#[derive(Copy, Clone, Debug)]
struct EnvVarBoolean(pub bool);

impl FromStr for EnvVarBoolean {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "1" => Ok(Self(true)),
            "false" | "0" => Ok(Self(false)),
            _ => Err("Invalid env. var. flag, expected true / false / 1 / 0".to_string()),
        }
    }
}
