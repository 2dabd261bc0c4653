#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use futures::FutureExt;
    use usex_core::{PromiseError, Scope, flush, signal};

    use crate::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[derive(Default)]
    struct PersonPatch {
        name: Option<String>,
        age: Option<u32>,
    }

    impl ModalData for Person {
        type Patch = PersonPatch;

        fn merge(&mut self, patch: PersonPatch) {
            if let Some(name) = patch.name {
                self.name = name;
            }
            if let Some(age) = patch.age {
                self.age = age;
            }
        }
    }

    fn john() -> Person {
        Person {
            name: "John Doe".into(),
            age: 30,
        }
    }

    fn name(n: &str) -> PersonPatch {
        PersonPatch {
            name: Some(n.into()),
            ..Default::default()
        }
    }

    type Calls = Rc<Cell<usize>>;

    fn counted<T>(options: ModalOptions<T, String>) -> (ModalOptions<T, String>, Calls, Calls) {
        let opens = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let options = options
            .on_open({
                let opens = opens.clone();
                move |_| opens.set(opens.get() + 1)
            })
            .on_close({
                let closes = closes.clone();
                move |_| closes.set(closes.get() + 1)
            });
        (options, opens, closes)
    }

    #[test]
    fn test_open_and_close() {
        let modal: Modal<Person, String> = Modal::default();
        assert!(!modal.visible());

        modal.open(None);
        assert!(modal.visible());
        assert!(modal.is_open());

        modal.close(None);
        assert!(!modal.visible());
        assert!(!modal.is_open());
    }

    #[test]
    fn test_close_resolves_open_promise() {
        let modal: Modal<Person, String> = Modal::default();

        let promise = modal.open(None);
        assert!(promise.clone().now_or_never().is_none());
        modal.close_with("x".into());

        assert_eq!(pollster::block_on(promise), Ok(Some("x".to_string())));
        assert!(!modal.visible());
        assert_eq!(modal.return_value().as_deref(), Some("x"));
    }

    #[test]
    fn test_close_without_value_resolves_none() {
        let modal: Modal<(), u8> = Modal::default();
        let promise = modal.open(None);
        modal.close(None);
        assert_eq!(pollster::block_on(promise), Ok(None));
        assert_eq!(modal.return_value(), None);
    }

    #[test]
    fn test_second_open_returns_same_promise() {
        let (options, opens, _) = counted(ModalOptions::<Person, String>::default());
        let modal = Modal::new(options);

        let first = modal.open(None);
        let second = modal.open_with(name("ignored"));

        assert!(first.ptr_eq(&second));
        assert_eq!(opens.get(), 1);
        assert_eq!(modal.data().name, "");

        modal.close_with("done".into());
        assert_eq!(pollster::block_on(second), Ok(Some("done".to_string())));
    }

    #[test]
    fn test_each_cycle_gets_a_fresh_promise() {
        let modal: Modal<(), u8> = Modal::default();
        let first = modal.open(None);
        modal.close_with(1);
        let second = modal.open(None);

        assert!(!first.ptr_eq(&second));
        assert_eq!(pollster::block_on(first), Ok(Some(1)));
        assert!(second.now_or_never().is_none());
    }

    #[test]
    fn test_callbacks_fire() {
        let seen_data = Rc::new(RefCell::new(None));
        let seen_rv = Rc::new(RefCell::new(None));
        let modal: Modal<Person, String> = Modal::new(
            ModalOptions::new(john())
                .on_open({
                    let seen_data = seen_data.clone();
                    move |d: &Person| *seen_data.borrow_mut() = Some(d.clone())
                })
                .on_close({
                    let seen_rv = seen_rv.clone();
                    move |rv: Option<&String>| *seen_rv.borrow_mut() = rv.cloned()
                }),
        );

        modal.open_with(name("Jane Doe"));
        assert_eq!(seen_data.borrow().as_ref().map(|p| p.name.as_str()), Some("Jane Doe"));

        modal.close_with("bye".into());
        assert_eq!(seen_rv.borrow().as_deref(), Some("bye"));
    }

    #[test]
    fn test_redundant_close_is_noop() {
        let (options, _, closes) = counted(ModalOptions::<Person, String>::default());
        let modal = Modal::new(options);

        modal.open(None);
        let done = modal.close_with("a".into());
        assert!(!done.is_noop());
        assert_eq!(closes.get(), 1);

        let again = modal.close_with("b".into());
        assert!(again.is_noop());
        assert_eq!(closes.get(), 1);
        assert_eq!(modal.return_value().as_deref(), Some("a"));

        let rv = again.then(|rv| rv);
        assert_eq!(rv, None);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_close_then_runs_synchronously() {
        let modal: Modal<(), String> = Modal::default();
        let ran = Rc::new(Cell::new(false));

        modal.open(None);
        modal.close_with("v".into()).then({
            let ran = ran.clone();
            move |rv| {
                assert_eq!(rv.as_deref(), Some("v"));
                ran.set(true);
            }
        });
        assert!(ran.get());
    }

    #[test]
    fn test_reset_data_after_close() {
        let modal: Modal<Person, String> =
            Modal::new(ModalOptions::new(john()).reset_data_after_close(true));

        modal.open(None);
        assert_eq!(modal.data(), john());

        modal.patch_data(name("Jane Doe"));
        assert_eq!(modal.data().name, "Jane Doe");

        modal.close(None);
        assert_eq!(modal.data(), john());
    }

    #[test]
    fn test_keeps_data_after_close_by_default() {
        let modal: Modal<Person, String> = Modal::new(ModalOptions::new(john()));

        modal.open(None);
        modal.patch_data(name("Jane Doe"));
        modal.close(None);
        assert_eq!(modal.data().name, "Jane Doe");
    }

    #[test]
    fn test_open_with_data() {
        let modal: Modal<HashMap<String, String>, ()> = Modal::default();
        let data = HashMap::from([("name".to_string(), "Jane Doe".to_string())]);

        modal.open_with(data.clone());
        assert!(modal.visible());
        assert_eq!(modal.data(), data);
    }

    #[test]
    fn test_patch_data_keeps_other_keys() {
        let modal: Modal<Person, String> = Modal::new(ModalOptions::new(john()));

        modal.open(None);
        modal.patch_data(PersonPatch {
            age: Some(31),
            ..Default::default()
        });
        assert_eq!(modal.data().age, 31);
        assert_eq!(modal.data().name, "John Doe");
    }

    #[test]
    fn test_patch_data_with_function() {
        let modal: Modal<Person, String> = Modal::new(ModalOptions::new(john()));

        modal.open(None);
        modal.patch_data_with(|d| PersonPatch {
            age: Some(d.age + 1),
            ..Default::default()
        });
        assert_eq!(modal.data().age, 31);
        assert_eq!(modal.data().name, "John Doe");
    }

    #[test]
    fn test_map_patch_is_shallow() {
        let modal: Modal<HashMap<&str, i32>, ()> =
            Modal::new(ModalOptions::new(HashMap::from([("a", 1), ("b", 2)])));

        modal.patch_data(HashMap::from([("b", 20), ("c", 30)]));
        assert_eq!(
            modal.data(),
            HashMap::from([("a", 1), ("b", 20), ("c", 30)])
        );
    }

    #[test]
    fn test_reset_data_in_any_state() {
        let modal: Modal<Person, String> = Modal::new(ModalOptions::new(john()));

        modal.patch_data(name("Closed Patch"));
        modal.reset_data();
        assert_eq!(modal.data(), john());

        modal.open(None);
        modal.patch_data(name("Jane Doe"));
        modal.reset_data();
        assert_eq!(modal.data(), john());
        assert_eq!(modal.init_data(), &john());
    }

    #[test]
    fn test_set_visible_true_opens_after_flush() {
        let (options, opens, _) = counted(ModalOptions::<Person, String>::default());
        let modal = Modal::new(options);

        modal.set_visible(true);
        assert_eq!(opens.get(), 0);
        assert!(!modal.is_open());

        flush();
        assert_eq!(opens.get(), 1);
        assert!(modal.is_open());

        // The cycle opened by the flush is the one `open()` now joins.
        let promise = modal.open(None);
        assert_eq!(opens.get(), 1);
        modal.close_with("ok".into());
        assert_eq!(pollster::block_on(promise), Ok(Some("ok".to_string())));
    }

    #[test]
    fn test_set_visible_false_closes_after_flush() {
        let (options, _, closes) = counted(ModalOptions::<Person, String>::default());
        let modal = Modal::new(options);

        let promise = modal.open(None);
        modal.set_visible(false);
        assert_eq!(closes.get(), 0);

        flush();
        assert_eq!(closes.get(), 1);
        assert!(!modal.is_open());
        assert_eq!(pollster::block_on(promise), Ok(None));
    }

    #[test]
    fn test_external_signal_write_is_observed() {
        let (options, opens, _) = counted(ModalOptions::<(), String>::new(()));
        let modal = Modal::new(options);

        let bound = modal.visible_signal();
        bound.set(true);
        flush();
        assert_eq!(opens.get(), 1);
        assert!(modal.visible());
    }

    #[test]
    fn test_visibility_toggled_back_before_flush_is_noop() {
        let (options, opens, closes) = counted(ModalOptions::<(), String>::new(()));
        let modal = Modal::new(options);

        modal.set_visible(true);
        modal.set_visible(false);
        flush();
        assert_eq!((opens.get(), closes.get()), (0, 0));
    }

    #[test]
    fn test_imperative_transitions_do_not_retrigger_via_flush() {
        let (options, opens, closes) = counted(ModalOptions::<(), String>::new(()));
        let modal = Modal::new(options);

        modal.open(None);
        flush();
        modal.close(None);
        flush();
        assert_eq!((opens.get(), closes.get()), (1, 1));
    }

    #[test]
    fn test_visible_tracks_state_over_sequences() {
        let modal: Modal<(), ()> = Modal::default();
        let ops = [true, true, false, true, false, false, true];
        for op in ops {
            if op {
                modal.open(None);
            } else {
                modal.close(None);
            }
            assert_eq!(modal.visible(), op);
            assert_eq!(modal.is_open(), op);
        }
    }

    #[test]
    fn test_dispose_stops_visibility_watcher() {
        let (options, opens, _) = counted(ModalOptions::<(), String>::new(()));
        let modal = Modal::new(options);

        modal.dispose();
        modal.set_visible(true);
        flush();
        assert_eq!(opens.get(), 0);

        // Imperative calls still work.
        modal.open(None);
        assert_eq!(opens.get(), 1);
    }

    #[test]
    fn test_owning_scope_disposal_stops_watcher() {
        let scope = Scope::new();
        let (options, opens, _) = counted(ModalOptions::<(), String>::new(()));
        let modal = scope.run(|| Modal::new(options));

        scope.dispose();
        modal.set_visible(true);
        flush();
        assert_eq!(opens.get(), 0);
    }

    #[test]
    fn test_owning_scope_releases_disposed_and_dropped_modals() {
        let scope = Scope::new();

        for i in 0..1000 {
            let modal: Modal<(), ()> = scope.run(Modal::default);
            if i % 2 == 0 {
                modal.dispose();
            }
            drop(modal);
        }
        assert_eq!(scope.child_count(), 0);

        let live: Modal<(), ()> = scope.run(Modal::default);
        assert_eq!(scope.child_count(), 1);
        drop(live);
        assert_eq!(scope.child_count(), 0);
    }

    #[test]
    fn test_panicking_callback_keeps_transition() {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let opener: Modal<(), u8> =
            Modal::new(ModalOptions::new(()).on_open(|_| panic!("on_open")));
        let opened = catch_unwind(AssertUnwindSafe(|| opener.open(None)));
        assert!(opened.is_err());
        assert!(opener.visible() && opener.is_open());

        let promise = opener.open(None);
        opener.close_with(3);
        assert_eq!(pollster::block_on(promise), Ok(Some(3)));

        let closer: Modal<(), u8> =
            Modal::new(ModalOptions::new(()).on_close(|_| panic!("on_close")));
        let promise = closer.open(None);
        let closed = catch_unwind(AssertUnwindSafe(|| closer.close_with(1)));
        assert!(closed.is_err());
        assert!(!closer.visible() && !closer.is_open());
        assert_eq!(closer.return_value(), None);
        assert_eq!(pollster::block_on(promise), Err(PromiseError::Abandoned));
    }

    #[test]
    fn test_patch_data_with_closure_may_touch_modal() {
        let modal: Modal<Person, ()> = Modal::new(ModalOptions::new(john()));
        modal.patch_data(name("Jane Doe"));

        modal.patch_data_with(|current| {
            modal.reset_data();
            PersonPatch {
                age: Some(current.age + 1),
                ..Default::default()
            }
        });
        assert_eq!(
            modal.data(),
            Person {
                name: "John Doe".into(),
                age: 31
            }
        );
    }

    #[test]
    fn test_dropped_modal_abandons_pending_promise() {
        let _ = env_logger::builder().is_test(true).try_init();

        let modal: Modal<(), u8> = Modal::default();
        let promise = modal.open(None);
        drop(modal);
        assert_eq!(pollster::block_on(promise), Err(PromiseError::Abandoned));
    }

    #[test]
    fn test_reentrant_open_from_callback_shares_promise() {
        let slot: Rc<RefCell<Option<Modal<(), u8>>>> = Rc::new(RefCell::new(None));
        let inner_promise = Rc::new(RefCell::new(None));

        let modal = Modal::new(ModalOptions::new(()).on_open({
            let slot = slot.clone();
            let inner_promise = inner_promise.clone();
            move |_| {
                if let Some(m) = slot.borrow().as_ref() {
                    *inner_promise.borrow_mut() = Some(m.open(None));
                }
            }
        }));
        *slot.borrow_mut() = Some(modal.clone());

        let outer = modal.open(None);
        let inner = inner_promise.borrow_mut().take().unwrap();
        assert!(outer.ptr_eq(&inner));

        slot.borrow_mut().take();
    }

    #[test]
    fn test_callback_may_patch_data() {
        let slot: Rc<RefCell<Option<Modal<Person, ()>>>> = Rc::new(RefCell::new(None));
        let modal = Modal::new(ModalOptions::new(john()).on_open({
            let slot = slot.clone();
            move |_| {
                if let Some(m) = slot.borrow().as_ref() {
                    m.patch_data(name("from callback"));
                }
            }
        }));
        *slot.borrow_mut() = Some(modal.clone());

        modal.open(None);
        assert_eq!(modal.data().name, "from callback");
        slot.borrow_mut().take();
    }

    #[test]
    fn test_data_signal_is_a_live_view() {
        let modal: Modal<Person, ()> = Modal::new(ModalOptions::new(john()));
        let view = modal.data_signal();
        let ages = Rc::new(RefCell::new(Vec::new()));
        view.subscribe({
            let ages = ages.clone();
            move |p: &Person| ages.borrow_mut().push(p.age)
        });

        modal.patch_data(PersonPatch {
            age: Some(40),
            ..Default::default()
        });
        modal.reset_data();
        assert_eq!(*ages.borrow(), vec![40, 30]);
        assert_eq!(view.get(), john());
    }

    #[test]
    fn test_return_value_changes_only_on_close() {
        let modal: Modal<(), u8> = Modal::default();
        let rv = modal.return_value_signal();

        modal.open(None);
        assert_eq!(rv.get(), None);
        modal.close_with(7);
        assert_eq!(rv.get(), Some(7));
        modal.open(None);
        assert_eq!(rv.get(), Some(7));
        modal.close(None);
        assert_eq!(rv.get(), None);
    }

    #[derive(Default)]
    struct FakeDialog {
        log: RefCell<Vec<String>>,
    }

    fn dialog_factory() -> RefModalFactory<Option<Rc<FakeDialog>>, &'static str, &'static str, Person, String>
    {
        create_ref_modal(
            |dialog: &Option<Rc<FakeDialog>>, data: &Person, opts: &&'static str| {
                if let Some(d) = dialog {
                    d.log.borrow_mut().push(format!("show {} {}", data.name, opts));
                }
            },
            |dialog: &Option<Rc<FakeDialog>>, rv: Option<&String>, opts: &&'static str| {
                if let Some(d) = dialog {
                    d.log.borrow_mut().push(format!("close {:?} {}", rv, opts));
                }
            },
        )
    }

    #[test]
    fn test_ref_modal_runs_effects_before_callbacks() {
        let dialog = Rc::new(FakeDialog::default());
        let order = Rc::new(RefCell::new(Vec::new()));

        let modal = dialog_factory().create(
            Some(dialog.clone()),
            ModalOptions::new(john())
                .on_open({
                    let order = order.clone();
                    let dialog = dialog.clone();
                    move |_| order.borrow_mut().push(dialog.log.borrow().len())
                })
                .on_close({
                    let order = order.clone();
                    let dialog = dialog.clone();
                    move |_| order.borrow_mut().push(dialog.log.borrow().len())
                }),
            "modal",
            "esc",
        );

        let promise = modal.open(None);
        modal.close_with("saved".into());

        assert_eq!(
            *dialog.log.borrow(),
            vec![
                "show John Doe modal".to_string(),
                "close Some(\"saved\") esc".to_string()
            ]
        );
        assert_eq!(*order.borrow(), vec![1, 2]);
        assert_eq!(pollster::block_on(promise), Ok(Some("saved".to_string())));
    }

    #[test]
    fn test_ref_modal_resolves_handle_lazily() {
        let mounted = signal(None::<Rc<FakeDialog>>);
        let modal = dialog_factory().create(mounted.clone(), ModalOptions::new(john()), "a", "b");

        // Not mounted yet: the effect sees no handle.
        modal.open(None);
        modal.close(None);

        let dialog = Rc::new(FakeDialog::default());
        mounted.set(Some(dialog.clone()));
        modal.open(None);
        assert_eq!(*dialog.log.borrow(), vec!["show John Doe a".to_string()]);
    }

    #[test]
    fn test_ref_modal_visible_binding_runs_effects() {
        let dialog = Rc::new(FakeDialog::default());
        let modal = dialog_factory().create(Some(dialog.clone()), ModalOptions::new(john()), "x", "y");

        modal.set_visible(true);
        flush();
        modal.set_visible(false);
        flush();
        assert_eq!(
            *dialog.log.borrow(),
            vec!["show John Doe x".to_string(), "close None y".to_string()]
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_map_data() {
        use serde_json::{Map, Value, json};

        let init: Map<String, Value> = json!({"title": "Edit", "count": 1})
            .as_object()
            .cloned()
            .unwrap_or_default();
        let modal: Modal<Map<String, Value>, Value> =
            Modal::new(ModalOptions::new(init).reset_data_after_close(true));

        let patch = json!({"count": 2}).as_object().cloned().unwrap_or_default();
        let promise = modal.open_with(patch);
        assert_eq!(modal.data()["count"], json!(2));
        assert_eq!(modal.data()["title"], json!("Edit"));

        modal.close_with(json!({"ok": true}));
        assert_eq!(modal.data()["count"], json!(1));
        assert_eq!(pollster::block_on(promise), Ok(Some(json!({"ok": true}))));
    }
}
