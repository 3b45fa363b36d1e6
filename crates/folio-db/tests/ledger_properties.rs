//! Property tests for the reaction ledger
//!
//! Any sequence of toggles, from any number of users, must leave the stored
//! counters equal to a recount of the ledger.

use proptest::prelude::*;

use folio_core::{ReactionAggregate, ReactionLedger, ReactionType, Snowflake, ToggleRequest};
use folio_db::MemoryStore;

const PROJECT: Snowflake = Snowflake::new(1);

fn arb_reaction_type() -> impl Strategy<Value = ReactionType> {
    proptest::sample::select(ReactionType::ALL.to_vec())
}

fn arb_toggles() -> impl Strategy<Value = Vec<(i64, ReactionType)>> {
    proptest::collection::vec((1i64..6, arb_reaction_type()), 0..64)
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn counters_match_ledger(toggles in arb_toggles()) {
        let (stored, recount) = run(async {
            let store = MemoryStore::new();
            store.insert_project(PROJECT);

            for (i, (user, reaction_type)) in toggles.iter().enumerate() {
                store
                    .toggle(ToggleRequest {
                        reaction_id: Snowflake::new(1000 + i as i64),
                        project_id: PROJECT,
                        user_id: Snowflake::new(*user),
                        reaction_type: *reaction_type,
                    })
                    .await
                    .unwrap();
            }

            let ledger = store.find_by_project(PROJECT, None, 100).await.unwrap();
            (
                store.aggregate(PROJECT).await.unwrap(),
                ReactionAggregate::from_reactions(PROJECT, &ledger),
            )
        });

        prop_assert!(stored.is_consistent());
        prop_assert_eq!(stored, recount);
    }

    #[test]
    fn at_most_one_reaction_per_user(toggles in arb_toggles()) {
        let ledger = run(async {
            let store = MemoryStore::new();
            store.insert_project(PROJECT);
            for (i, (user, reaction_type)) in toggles.iter().enumerate() {
                store
                    .toggle(ToggleRequest {
                        reaction_id: Snowflake::new(1000 + i as i64),
                        project_id: PROJECT,
                        user_id: Snowflake::new(*user),
                        reaction_type: *reaction_type,
                    })
                    .await
                    .unwrap();
            }
            store.find_by_project(PROJECT, None, 100).await.unwrap()
        });

        let mut users: Vec<_> = ledger.iter().map(|r| r.user_id).collect();
        users.sort();
        users.dedup();
        prop_assert_eq!(users.len(), ledger.len());
    }

    #[test]
    fn double_toggle_is_identity(reaction_type in arb_reaction_type()) {
        let (before, after) = run(async {
            let store = MemoryStore::new();
            store.insert_project(PROJECT);
            let before = store.aggregate(PROJECT).await.unwrap();
            for id in [1, 2] {
                store
                    .toggle(ToggleRequest {
                        reaction_id: Snowflake::new(id),
                        project_id: PROJECT,
                        user_id: Snowflake::new(7),
                        reaction_type,
                    })
                    .await
                    .unwrap();
            }
            (before, store.aggregate(PROJECT).await.unwrap())
        });
        prop_assert_eq!(before, after);
    }
}
