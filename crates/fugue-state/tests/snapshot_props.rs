//! Snapshot round-trip properties over random mutation sequences

use bytes::Bytes;
use fugue_primitives::{Address, U256};
use fugue_state::{AccountInfo, AccountState, MemoryBackend};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    SetBalance(u8, u64),
    Transfer(u8, u8, u64),
    SetStorage(u8, u8, u64),
    BumpNonce(u8),
    SetCode(u8, Vec<u8>),
    Create(u8),
    Commit,
}

fn addr(n: u8) -> Address {
    Address::from_bytes([n % 4 + 1; 20])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u64>()).prop_map(|(a, v)| Op::SetBalance(a, v)),
        (any::<u8>(), any::<u8>(), 0u64..500).prop_map(|(a, b, v)| Op::Transfer(a, b, v)),
        (any::<u8>(), 0u8..4, 0u64..3).prop_map(|(a, k, v)| Op::SetStorage(a, k, v)),
        any::<u8>().prop_map(Op::BumpNonce),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..4)).prop_map(|(a, c)| Op::SetCode(a, c)),
        any::<u8>().prop_map(Op::Create),
        Just(Op::Commit),
    ]
}

fn apply(state: &mut AccountState<MemoryBackend>, op: &Op) {
    match op {
        Op::SetBalance(a, v) => state.set_balance(&addr(*a), U256::from(*v)),
        Op::Transfer(a, b, v) => {
            let _ = state.transfer(&addr(*a), &addr(*b), U256::from(*v));
        }
        Op::SetStorage(a, k, v) => {
            state.set_storage(&addr(*a), U256::from(*k), U256::from(*v));
        }
        Op::BumpNonce(a) => {
            let _ = state.increment_nonce(&addr(*a));
        }
        Op::SetCode(a, c) => state.set_code(&addr(*a), Bytes::from(c.clone())),
        Op::Create(a) => state.create_account(&addr(*a), 1),
        Op::Commit => state.commit(),
    }
}

type View = Vec<(AccountInfo, BTreeMap<U256, U256>, bool)>;

fn view(state: &mut AccountState<MemoryBackend>) -> View {
    (0..4)
        .map(|n| {
            let a = addr(n);
            (state.account(&a), state.storage_entries(&a), state.exists(&a))
        })
        .collect()
}

fn seeded() -> AccountState<MemoryBackend> {
    let mut backend = MemoryBackend::new();
    backend.insert_account(addr(0), AccountInfo::with_balance(U256::from(1_000u64)));
    backend.insert_account(addr(1), AccountInfo::with_balance(U256::from(50u64)).with_nonce(3));
    backend.insert_storage(addr(1), U256::one(), U256::from(9u64));
    AccountState::new(backend)
}

proptest! {
    #[test]
    fn revert_restores_prior_view(
        setup in prop::collection::vec(op_strategy(), 0..6),
        ops in prop::collection::vec(op_strategy(), 0..24),
    ) {
        let mut state = seeded();
        for op in &setup {
            apply(&mut state, op);
        }
        let before = view(&mut state);

        let snap = state.snapshot();
        for op in &ops {
            apply(&mut state, op);
        }
        state.revert(snap);

        prop_assert_eq!(view(&mut state), before);
    }

    #[test]
    fn discard_keeps_applied_view(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let mut state = seeded();
        let snap = state.snapshot();
        for op in &ops {
            apply(&mut state, op);
        }
        let after = view(&mut state);
        state.discard(snap);

        prop_assert_eq!(view(&mut state), after);
    }

    #[test]
    fn commit_after_revert_matches_uncommitted_replay(
        ops in prop::collection::vec(op_strategy(), 0..24),
    ) {
        let mut state = seeded();
        let snap = state.snapshot();
        for op in &ops {
            apply(&mut state, op);
        }
        state.revert(snap);
        state.commit();

        let mut reloaded = AccountState::new(state.into_backend());
        let mut fresh = seeded();
        prop_assert_eq!(view(&mut reloaded), view(&mut fresh));
    }
}
