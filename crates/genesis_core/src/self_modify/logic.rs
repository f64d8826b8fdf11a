//! Per-lineage static behavior logic with versioned history.

use super::patch::apply_diff;
use genesis_data::{BehaviorDiff, BehaviorParams, Tunable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Check run immediately after a version is installed.
pub type SmokeTest = fn(&BehaviorParams) -> Result<(), String>;

/// Every tunable finite and inside its range.
pub fn range_smoke_test(params: &BehaviorParams) -> Result<(), String> {
    for tunable in Tunable::ALL {
        let v = params.get(tunable);
        let (lo, hi) = tunable.range();
        if !v.is_finite() || v < lo || v > hi {
            return Err(format!("{tunable} = {v} outside [{lo}, {hi}]"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromotionError {
    #[error("smoke test failed after installing version {version}: {reason}")]
    SmokeTestFailed { version: u32, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicVersion {
    pub version: u32,
    pub behavior: BehaviorParams,
    pub patch: Option<Uuid>,
    pub tick: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicRegistry {
    lineages: BTreeMap<Uuid, Vec<LogicVersion>>,
}

impl LogicRegistry {
    #[must_use]
    pub fn head(&self, lineage: &Uuid) -> Option<&LogicVersion> {
        self.lineages.get(lineage).and_then(|h| h.last())
    }

    #[must_use]
    pub fn history(&self, lineage: &Uuid) -> &[LogicVersion] {
        self.lineages.get(lineage).map_or(&[], Vec::as_slice)
    }

    /// Records version 0 for a lineage the first time it is seen.
    pub fn seed(&mut self, lineage: Uuid, behavior: BehaviorParams, tick: u64) {
        self.lineages.entry(lineage).or_insert_with(|| {
            vec![LogicVersion {
                version: 0,
                behavior,
                patch: None,
                tick,
            }]
        });
    }

    /// Installs `diff` on top of the lineage head, then runs `smoke_test`.
    /// A failing test pops the new version again so the head is exactly what
    /// it was before the call.
    pub fn promote(
        &mut self,
        lineage: Uuid,
        patch: Uuid,
        diff: &BehaviorDiff,
        fallback: BehaviorParams,
        tick: u64,
        smoke_test: SmokeTest,
    ) -> Result<u32, PromotionError> {
        self.seed(lineage, fallback, tick);
        let history = self.lineages.entry(lineage).or_default();
        let (base, version) = history
            .last()
            .map_or((fallback, 1), |h| (h.behavior, h.version + 1));
        history.push(LogicVersion {
            version,
            behavior: apply_diff(&base, diff),
            patch: Some(patch),
            tick,
        });

        let installed = history.last().map(|h| h.behavior).unwrap_or(base);
        if let Err(reason) = smoke_test(&installed) {
            history.pop();
            return Err(PromotionError::SmokeTestFailed { version, reason });
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff() -> BehaviorDiff {
        BehaviorDiff {
            deltas: vec![(Tunable::ConserveBias, 0.1)],
            strategy: None,
        }
    }

    #[test]
    fn test_promote_appends_version() {
        let mut reg = LogicRegistry::default();
        let lineage = Uuid::from_u128(7);
        let base = BehaviorParams::default();
        let v = reg
            .promote(lineage, Uuid::from_u128(1), &diff(), base, 10, range_smoke_test)
            .unwrap();
        assert_eq!(v, 1);
        assert_eq!(reg.history(&lineage).len(), 2);
        let head = reg.head(&lineage).unwrap();
        assert!((head.behavior.conserve_bias - (base.conserve_bias + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_failed_smoke_test_rolls_back() {
        fn always_fails(_: &BehaviorParams) -> Result<(), String> {
            Err("boom".into())
        }
        let mut reg = LogicRegistry::default();
        let lineage = Uuid::from_u128(7);
        let base = BehaviorParams::default();
        reg.seed(lineage, base, 0);
        let before = reg.history(&lineage).to_vec();
        let err = reg
            .promote(lineage, Uuid::from_u128(1), &diff(), base, 10, always_fails)
            .unwrap_err();
        assert!(matches!(err, PromotionError::SmokeTestFailed { version: 1, .. }));
        assert_eq!(reg.history(&lineage), before.as_slice());
    }

    #[test]
    fn test_range_smoke_test_rejects_nan() {
        let mut params = BehaviorParams::default();
        assert!(range_smoke_test(&params).is_ok());
        params.learning_rate = f32::NAN;
        assert!(range_smoke_test(&params).is_err());
    }
}
