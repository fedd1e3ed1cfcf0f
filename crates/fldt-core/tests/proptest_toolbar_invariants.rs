//! Property-based invariant tests for the toolbar dispatcher.
//!
//! These tests drive a [`Dispatcher`] with arbitrary gesture sequences and
//! check after every step:
//!
//! 1. At most one panel content region is visible
//! 2. The sub-window is never visible while the toolbar is collapsed
//! 3. The Escape listener is bound exactly while the toolbar is shown
//! 4. Listener changes reported to the host replay to the same bound state
//! 5. The collapse flag in the store matches the toolbar visibility
//! 6. The active cookie always decodes to the in-memory active set
//! 7. Only the most recent sub-window fetch can inject content

use fldt_core::active::ActiveSet;
use fldt_core::dispatch::{ContentUpdate, DispatchOutcome, IgnoredReason};
use fldt_core::persist::PersistenceStore;
use fldt_core::{
    Dispatcher, Gesture, ListenerChange, MemoryStore, PanelEntry, PanelRegistry, RequestToken,
    ToolbarConfig,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

const PANELS: [&str; 4] = ["flDebugSQLPanel", "flDebugTimerPanel", "flDebugLogPanel", "ghost"];

fn registry() -> PanelRegistry {
    PanelRegistry::new([
        PanelEntry::new("flDebugSQLPanel"),
        PanelEntry::new("flDebugTimerPanel").with_content(false),
        PanelEntry::new("flDebugLogPanel").with_switch(false),
    ])
}

fn panel_strategy() -> impl Strategy<Value = String> {
    (0usize..PANELS.len()).prop_map(|i| PANELS[i].to_string())
}

fn gesture_strategy() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        proptest::option::of(panel_strategy())
            .prop_map(|panel| Gesture::PanelLinkClick { panel: panel.map(Into::into) }),
        panel_strategy().prop_map(|panel| Gesture::SwitchClick { panel: panel.into() }),
        Just(Gesture::CloseClick),
        Just(Gesture::HideClick),
        Just(Gesture::ShowClick),
        "/[a-z]{0,6}".prop_map(|href| Gesture::RemoteCallClick { href }),
        Just(Gesture::BackClick),
        prop_oneof![
            Just(("Escape".to_string(), 27u32)),
            Just((String::new(), 27u32)),
            Just(("Enter".to_string(), 13u32)),
        ]
        .prop_map(|(key, key_code)| Gesture::KeyDown { key, key_code }),
        Just(Gesture::TableSortEnd),
        (0u8..4).prop_map(|key| Gesture::DisclosureClick { key: key.to_string() }),
    ]
}

fn initial_store() -> impl Strategy<Value = MemoryStore> {
    (any::<bool>(), proptest::collection::vec(panel_strategy(), 0..4)).prop_map(
        |(collapsed, active)| {
            let mut store = MemoryStore::new();
            if collapsed {
                store = store.with_value("fldt", "hide");
            }
            if !active.is_empty() {
                store = store.with_value("fldt_active", &active.join(";"));
            }
            store
        },
    )
}

fn replay(bound: &mut bool, change: Option<ListenerChange>) {
    match change {
        Some(ListenerChange::BindEscape) => {
            assert!(!*bound, "bind reported while already bound");
            *bound = true;
        }
        Some(ListenerChange::UnbindEscape) => {
            assert!(*bound, "unbind reported while not bound");
            *bound = false;
        }
        None => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1-6. Structural invariants hold after every gesture
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_for_any_gesture_sequence(
        store in initial_store(),
        gestures in proptest::collection::vec(gesture_strategy(), 0..64),
    ) {
        let (mut dispatcher, loaded) = Dispatcher::load(ToolbarConfig::default(), registry(), store);
        let mut host_bound = false;
        replay(&mut host_bound, loaded.listener);

        for gesture in gestures {
            let dispatch = dispatcher.dispatch(gesture);
            replay(&mut host_bound, dispatch.listener);

            let view = dispatcher.view();
            let machine = dispatcher.machine();

            let open = PANELS.iter().filter(|id| view.content_visible(id)).count();
            prop_assert!(open <= 1);
            prop_assert!(!(view.sub_window_visible && !view.toolbar_visible));
            prop_assert_eq!(machine.escape_bound(), view.toolbar_visible);
            prop_assert_eq!(host_bound, machine.escape_bound());
            prop_assert_eq!(view.handle_visible, !view.toolbar_visible);

            let flag = dispatcher.store().read("fldt");
            prop_assert_eq!(flag.is_some_and(|v| !v.is_empty()), !view.toolbar_visible);

            let persisted = ActiveSet::decode(dispatcher.store().read("fldt_active").as_deref());
            prop_assert_eq!(&persisted, dispatcher.active().set());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Only the newest sub-window request injects
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn only_latest_sub_window_fetch_injects(
        count in 1usize..6,
        order in proptest::collection::vec(any::<prop::sample::Index>(), 1..12),
    ) {
        let (mut dispatcher, _) = Dispatcher::load(ToolbarConfig::default(), registry(), MemoryStore::new());
        let tokens: Vec<RequestToken> = (0..count)
            .filter_map(|i| {
                dispatcher
                    .dispatch(Gesture::RemoteCallClick { href: format!("/frag/{i}") })
                    .fetch
                    .map(|request| request.token)
            })
            .collect();
        prop_assert_eq!(tokens.len(), count);
        let latest = tokens[count - 1];

        let mut injected = 0;
        for index in order {
            let token = tokens[index.index(count)];
            let done = dispatcher.complete_fetch(token, Ok(format!("body {}", token.get())));
            match done.content {
                Some(ContentUpdate::Inject(_)) => {
                    prop_assert_eq!(token, latest);
                    injected += 1;
                }
                None => prop_assert_eq!(
                    done.outcome,
                    DispatchOutcome::Ignored(IgnoredReason::StaleResponse)
                ),
                Some(other) => prop_assert!(false, "unexpected content {:?}", other),
            }
        }
        prop_assert!(injected <= 1);
    }
}
