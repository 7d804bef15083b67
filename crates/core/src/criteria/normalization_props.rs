//! Property-based tests for weight normalization and registry mutation sequences.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use keystone_shared::types::CriterionId;

use super::normalization::{WeightEntry, WeightNormalizer};

/// Strategy for weights with two decimals in [0, 100].
fn arb_weight() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for an active set of 1..=20 criteria.
fn arb_entries() -> impl Strategy<Value = Vec<WeightEntry>> {
    prop::collection::vec((arb_weight(), -5i32..50), 1..=20).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (weight, display_order))| WeightEntry {
                id: CriterionId::from_uuid(Uuid::from_u128(idx as u128 + 1)),
                display_order,
                weight,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Normalized weights always sum to exactly 100.00.
    #[test]
    fn prop_normalized_sum_is_exactly_one_hundred(entries in arb_entries()) {
        let result = WeightNormalizer::normalize(&entries);
        let total = WeightNormalizer::total(result.iter().map(|(_, w)| *w));
        prop_assert_eq!(total, Decimal::ONE_HUNDRED);
        prop_assert!(WeightNormalizer::is_balanced(total, entries.len()));
    }

    /// No weight goes negative or above 100, and all keep two decimals.
    #[test]
    fn prop_normalized_weights_in_range(entries in arb_entries()) {
        for (_, weight) in WeightNormalizer::normalize(&entries) {
            prop_assert!(weight >= Decimal::ZERO);
            prop_assert!(weight <= Decimal::ONE_HUNDRED);
            prop_assert_eq!(weight.round_dp(2), weight);
        }
    }

    /// Normalizing an already normalized set changes nothing.
    #[test]
    fn prop_normalization_is_idempotent(entries in arb_entries()) {
        let once = WeightNormalizer::normalize(&entries);
        let renormalized: Vec<WeightEntry> = entries
            .iter()
            .zip(&once)
            .map(|(e, (_, w))| WeightEntry { weight: *w, ..*e })
            .collect();
        let twice = WeightNormalizer::normalize(&renormalized);
        prop_assert_eq!(once, twice);
    }

    /// Order of ids in the output matches the input.
    #[test]
    fn prop_output_preserves_input_order(entries in arb_entries()) {
        let result = WeightNormalizer::normalize(&entries);
        let ids: Vec<CriterionId> = result.iter().map(|(id, _)| *id).collect();
        let expected: Vec<CriterionId> = entries.iter().map(|e| e.id).collect();
        prop_assert_eq!(ids, expected);
    }
}

mod registry_sequences {
    use std::sync::Arc;

    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use keystone_shared::types::CriterionId;

    use super::arb_weight;
    use crate::criteria::{
        CreateCriterionInput, CriteriaRegistry, CriterionCategory, UpdateCriterionInput,
    };
    use crate::fixtures::{admin, prioritization_config};
    use crate::memory::InMemoryStore;

    /// One registry mutation; indices pick among criteria created so far.
    #[derive(Debug, Clone)]
    enum Mutation {
        Create(Decimal),
        Update(usize, Decimal),
        Delete(usize),
        Reactivate(usize),
        Purge(usize),
    }

    fn arb_mutation() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            3 => arb_weight().prop_map(Mutation::Create),
            2 => (any::<usize>(), arb_weight()).prop_map(|(i, w)| Mutation::Update(i, w)),
            2 => any::<usize>().prop_map(Mutation::Delete),
            1 => any::<usize>().prop_map(Mutation::Reactivate),
            1 => any::<usize>().prop_map(Mutation::Purge),
        ]
    }

    fn pick(created: &[CriterionId], i: usize) -> Option<CriterionId> {
        (!created.is_empty()).then(|| created[i % created.len()])
    }

    async fn apply(
        registry: &CriteriaRegistry<InMemoryStore>,
        created: &mut Vec<CriterionId>,
        step: usize,
        mutation: Mutation,
    ) {
        let actor = admin();
        // Rejected mutations are fine; only the invariant afterwards matters.
        match mutation {
            Mutation::Create(weight) => {
                let input = CreateCriterionInput {
                    name: format!("Criterion {step}"),
                    description: None,
                    category: CriterionCategory::Strategic,
                    weight,
                    scoring_guideline: None,
                    display_order: None,
                };
                if let Ok(criterion) = registry.create_criteria(&actor, input).await {
                    created.push(criterion.id);
                }
            }
            Mutation::Update(i, weight) => {
                if let Some(id) = pick(created, i) {
                    let input = UpdateCriterionInput {
                        weight: Some(weight),
                        ..Default::default()
                    };
                    let _ = registry.update_criteria(&actor, id, input).await;
                }
            }
            Mutation::Delete(i) => {
                if let Some(id) = pick(created, i) {
                    let _ = registry.delete_criteria(&actor, id).await;
                }
            }
            Mutation::Reactivate(i) => {
                if let Some(id) = pick(created, i) {
                    let _ = registry.reactivate_criteria(&actor, id).await;
                }
            }
            Mutation::Purge(i) => {
                if let Some(id) = pick(created, i) {
                    if let Ok(criterion) = registry.get_criterion(id).await {
                        let _ = registry
                            .permanently_delete_criteria(&actor, id, &criterion.name)
                            .await;
                    }
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any sequence of registry mutations leaves the active set summing to 100.
        #[test]
        fn prop_mutation_sequences_keep_weights_balanced(
            mutations in prop::collection::vec(arb_mutation(), 1..16),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let registry = CriteriaRegistry::new(Arc::new(InMemoryStore::new()), prioritization_config());
            let mut created = Vec::new();

            for (step, mutation) in mutations.into_iter().enumerate() {
                let validation = runtime.block_on(async {
                    apply(&registry, &mut created, step, mutation).await;
                    registry.validate_weights().await.unwrap()
                });
                prop_assert!(validation.is_valid, "step {}: weights sum to {}", step, validation.total);
                if validation.active_count > 0 {
                    prop_assert_eq!(validation.total, Decimal::ONE_HUNDRED);
                }
            }
        }
    }
}
