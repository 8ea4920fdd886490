//! Built-in detector suite.
//!
//! Each detector is a small, deterministic pattern reader. The engine treats
//! them as opaque [`Detector`] implementations — nothing here is special
//! compared to a custom detector registered through a provider.
//!
//! Families follow the shared taxonomy: `sr` (support/resistance), `structure`
//! (break/retest, tops and bottoms), `pattern` (single-candle patterns),
//! `fibo` (retracement confluence).

pub mod break_retest;
pub mod double_top_bottom;
pub mod fibo_retrace_confluence;
pub mod pinbar_at_level;
pub mod sr_break_close;
pub mod util;

pub use break_retest::BreakRetest;
pub use double_top_bottom::DoubleTopBottom;
pub use fibo_retrace_confluence::FiboRetraceConfluence;
pub use pinbar_at_level::PinbarAtLevel;
pub use sr_break_close::SrBreakClose;

use std::sync::Arc;

use crate::registry::{DetectorRegistry, RegistryError};

/// Register every built-in detector with its default parameters.
pub fn register_builtins(registry: &mut DetectorRegistry) -> Result<(), RegistryError> {
    registry.register(Arc::new(SrBreakClose::default()))?;
    registry.register(Arc::new(BreakRetest::default()))?;
    registry.register(Arc::new(DoubleTopBottom::default()))?;
    registry.register(Arc::new(PinbarAtLevel::default()))?;
    registry.register(Arc::new(FiboRetraceConfluence::default()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_unique_ids_and_known_families() {
        let mut registry = DetectorRegistry::new();
        register_builtins(&mut registry).unwrap();
        assert_eq!(registry.len(), 5);
        let families: Vec<&str> = registry.list_with_families().map(|(_, f)| f).collect();
        for family in families {
            assert!(["sr", "structure", "pattern", "fibo"].contains(&family));
        }
    }
}
