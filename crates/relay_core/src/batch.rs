use std::fmt;
use std::str::FromStr;

/// Per-run aggregate of the publish loop.
///
/// `seen` is fixed when the publishing snapshot is taken; `processed`
/// increments on every upload attempt regardless of outcome; `succeeded`
/// only when the item was uploaded and removed from staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub seen: usize,
    pub processed: usize,
    pub succeeded: usize,
}

impl BatchOutcome {
    pub fn new(seen: usize) -> Self {
        Self {
            seen,
            processed: 0,
            succeeded: 0,
        }
    }

    /// Record one upload attempt.
    pub fn record_attempt(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.succeeded += 1;
        }
    }

    pub fn failed(&self) -> usize {
        self.processed - self.succeeded
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.seen
    }
}

/// Policy deciding whether the link manifest is written for a finished batch.
///
/// The reference system gated on `processed == seen`, which writes the
/// manifest even when every upload failed — as long as each item was
/// attempted. That behavior is kept available (and default) under its own
/// name instead of being silently corrected; the stricter alternatives are
/// explicit choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestGate {
    /// Write when every seen item was attempted, successful or not.
    #[default]
    AllProcessed,
    /// Write only when every seen item succeeded.
    AllSucceeded,
    /// Write whatever succeeded, as long as anything did.
    AnySucceeded,
}

impl ManifestGate {
    pub fn should_write(&self, outcome: &BatchOutcome) -> bool {
        match self {
            ManifestGate::AllProcessed => outcome.processed == outcome.seen,
            ManifestGate::AllSucceeded => outcome.seen > 0 && outcome.all_succeeded(),
            ManifestGate::AnySucceeded => outcome.succeeded > 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestGate::AllProcessed => "all-processed",
            ManifestGate::AllSucceeded => "all-succeeded",
            ManifestGate::AnySucceeded => "any-succeeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateParseError {
    pub input: String,
}

impl fmt::Display for GateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown manifest gate {:?} (expected all-processed, all-succeeded or any-succeeded)",
            self.input
        )
    }
}

impl std::error::Error for GateParseError {}

impl FromStr for ManifestGate {
    type Err = GateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all-processed" => Ok(ManifestGate::AllProcessed),
            "all-succeeded" => Ok(ManifestGate::AllSucceeded),
            "any-succeeded" => Ok(ManifestGate::AnySucceeded),
            other => Err(GateParseError {
                input: other.to_string(),
            }),
        }
    }
}
