//! Subsystem tags for log attribution
//!
//! Each tag maps to one engine subsystem so output can be filtered by
//! component when diagnosing a tick.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Scheduler,
    Confirm,
    Price,
    Swap,
    Lock,
    Store,
    Chain,
    Database,
    Events,
    Notify,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Scheduler => "SCHEDULER",
            LogTag::Confirm => "CONFIRM",
            LogTag::Price => "PRICE",
            LogTag::Swap => "SWAP",
            LogTag::Lock => "LOCK",
            LogTag::Store => "STORE",
            LogTag::Chain => "CHAIN",
            LogTag::Database => "DATABASE",
            LogTag::Events => "EVENTS",
            LogTag::Notify => "NOTIFY",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
