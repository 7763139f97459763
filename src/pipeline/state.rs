//! Pipeline states and the transitions allowed between them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing chosen, nothing loaded
    #[default]
    Idle,
    /// A file is chosen but not uploaded
    FileChosen,
    /// Upload call outstanding
    Uploading,
    /// Rows uploaded; no preview for them yet
    Parsed,
    /// Transform call outstanding
    Previewing,
    /// Preview rows available for selection and export
    Previewed,
    /// Export call outstanding
    Exporting,
    /// Handoff outstanding
    HandingOff,
    /// Reset in progress
    Discarding,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FileChosen => "file_chosen",
            Self::Uploading => "uploading",
            Self::Parsed => "parsed",
            Self::Previewing => "previewing",
            Self::Previewed => "previewed",
            Self::Exporting => "exporting",
            Self::HandingOff => "handing_off",
            Self::Discarding => "discarding",
        }
    }

    /// Whether a collaborator call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Uploading | Self::Previewing | Self::Exporting | Self::HandingOff
        )
    }

    /// Check if this state can move to `target`.
    pub fn can_transition_to(&self, target: Self) -> bool {
        if target == Self::Discarding {
            return true;
        }
        match (self, target) {
            (Self::Idle | Self::FileChosen, Self::FileChosen)
            | (Self::FileChosen | Self::Parsed | Self::Previewed, Self::Uploading)
            // Failed upload returns to where the request came from
            | (Self::Uploading, Self::FileChosen | Self::Parsed | Self::Previewed)
            | (Self::Parsed, Self::Previewing | Self::Exporting | Self::HandingOff)
            | (Self::Previewing, Self::Previewed | Self::Parsed)
            | (Self::Previewed, Self::Exporting | Self::HandingOff)
            | (Self::Exporting, Self::Parsed | Self::Previewed)
            | (Self::HandingOff, Self::Idle | Self::Parsed | Self::Previewed)
            | (Self::Discarding, Self::Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use PipelineState as S;
        let path = [
            S::Idle,
            S::FileChosen,
            S::Uploading,
            S::Parsed,
            S::Previewing,
            S::Previewed,
            S::Exporting,
            S::Previewed,
            S::HandingOff,
            S::Idle,
        ];
        for pair in path.windows(2) {
            if let [from, to] = pair {
                assert!(from.can_transition_to(*to), "{from} -> {to} should be allowed");
            }
        }
    }

    #[test]
    fn test_discard_reachable_from_everywhere() {
        use PipelineState as S;
        for state in [
            S::Idle,
            S::FileChosen,
            S::Uploading,
            S::Parsed,
            S::Previewing,
            S::Previewed,
            S::Exporting,
            S::HandingOff,
        ] {
            assert!(state.can_transition_to(S::Discarding));
        }
        assert!(S::Discarding.can_transition_to(S::Idle));
        assert!(!S::Discarding.can_transition_to(S::Previewed));
    }

    #[test]
    fn test_rejected_transitions() {
        use PipelineState as S;
        assert!(!S::Idle.can_transition_to(S::Uploading));
        assert!(!S::Uploading.can_transition_to(S::Uploading));
        assert!(!S::Previewing.can_transition_to(S::Exporting));
        assert!(!S::Idle.can_transition_to(S::Previewed));
    }

    #[test]
    fn test_busy_states() {
        assert!(PipelineState::Uploading.is_busy());
        assert!(PipelineState::Previewing.is_busy());
        assert!(!PipelineState::Previewed.is_busy());
        assert!(!PipelineState::Idle.is_busy());
    }
}
