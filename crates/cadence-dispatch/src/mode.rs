use serde::{Deserialize, Serialize};

/// Whether operation handlers talk to real external systems or a
/// deterministic stand-in. Named `ProcessingMode` in the CLI surface
/// (spec.md §6); the original's third mode (`HOOKS`, talking to
/// Vivaria/pyhooks) is out of scope here — LIVE plays its role for a
/// freestanding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    Live,
    Simulated,
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "simulated" | "simulate" | "sim" => Ok(Self::Simulated),
            other => Err(format!("unknown processing mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!("LIVE".parse::<ProcessingMode>().unwrap(), ProcessingMode::Live);
        assert_eq!(
            "Simulated".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::Simulated
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!("turbo".parse::<ProcessingMode>().is_err());
    }
}
