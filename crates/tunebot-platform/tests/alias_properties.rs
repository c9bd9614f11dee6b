// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for alias resolution.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use tunebot_core::{CapabilitySet, Platform};
use tunebot_platform::{PlatformRegistry, Registration};

struct Named(String);

impl Platform for Named {
    fn name(&self) -> &str {
        &self.0
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new()
    }
}

fn token() -> impl Strategy<Value = String> {
    // Small alphabet so collisions between names and aliases are common.
    "[a-cA-C]{1,2}"
}

fn platform_specs() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec((token(), prop::collection::vec(token(), 0..4)), 1..8)
}

proptest! {
    #[test]
    fn resolution_is_unambiguous(specs in platform_specs()) {
        let registry = PlatformRegistry::new();
        // Normalized alias -> owner, for every accepted registration.
        let mut accepted: HashMap<String, String> = HashMap::new();
        let mut explicit_self: Vec<String> = Vec::new();

        for (name, aliases) in &specs {
            let provider: Arc<dyn Platform> = Arc::new(Named(name.clone()));
            let registration = Registration::script(provider, aliases.clone(), "props");
            if let Ok(handle) = registry.register(registration) {
                for alias in aliases {
                    let alias = alias.trim().to_lowercase();
                    if alias == handle.name() {
                        explicit_self.push(alias.clone());
                    }
                    accepted.insert(alias, handle.name().to_string());
                }
            }
        }

        for (alias, owner) in &accepted {
            let resolved_lower = registry.resolve_alias(alias);
            prop_assert_eq!(resolved_lower.as_deref(), Some(owner.as_str()));
            let resolved_upper = registry.resolve_alias(&alias.to_uppercase());
            prop_assert_eq!(
                resolved_upper.as_deref(),
                Some(owner.as_str())
            );
            // An alias never shadows another platform's canonical name.
            if alias != owner {
                prop_assert!(registry.get(alias).is_none());
            }
        }

        for handle in registry.list() {
            let resolved = registry.resolve_alias(handle.name());
            if explicit_self.iter().any(|n| n == handle.name()) {
                prop_assert_eq!(resolved.as_deref(), Some(handle.name()));
            } else {
                prop_assert_eq!(resolved, None);
            }
        }
    }

    #[test]
    fn sequences_are_strictly_increasing(specs in platform_specs()) {
        let registry = PlatformRegistry::new();
        for (name, aliases) in &specs {
            let provider: Arc<dyn Platform> = Arc::new(Named(name.clone()));
            let _ = registry.register(Registration::script(provider, aliases.clone(), "props"));
        }
        let sequences: Vec<u64> = registry.list().iter().map(|h| h.sequence()).collect();
        prop_assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }
}
