use ferrous_lifecycle::{
    HookResult, InitState, Key, Managed, RegistryConfig, RegistryObserver, Singleton, SingletonRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn quiet() -> SingletonRegistry {
    SingletonRegistry::builder()
        .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
        .build()
}

static CLOCK_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct Clock {
    ticks: AtomicUsize,
}

impl Managed for Clock {}

impl Singleton for Clock {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        CLOCK_BUILDS.fetch_add(1, Ordering::SeqCst);
        Ok(Clock { ticks: AtomicUsize::new(0) })
    }
}

struct Palette;
impl Managed for Palette {}
impl Singleton for Palette {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(Palette)
    }
}

// Reaches its own instance from the post-construction hook
struct SelfRegistering {
    seen_self: AtomicUsize,
}

impl Managed for SelfRegistering {
    fn on_constructed(&self, registry: &SingletonRegistry) -> HookResult {
        let me = registry.get::<SelfRegistering>()?;
        assert!(std::ptr::eq(&*me, self));
        self.seen_self.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Singleton for SelfRegistering {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(SelfRegistering { seen_self: AtomicUsize::new(0) })
    }
}

#[derive(Default)]
struct Transitions {
    seen: Mutex<Vec<(InitState, InitState)>>,
}

impl RegistryObserver for Transitions {
    fn state_changed(&self, _key: &Key, from: InitState, to: InitState) {
        self.seen.lock().unwrap().push((from, to));
    }
}

#[test]
fn nothing_is_constructed_before_first_use() {
    let registry = quiet();
    assert_eq!(registry.state::<Clock>(), InitState::Uninitialized);
    assert!(!registry.exists::<Clock>());
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn get_returns_the_same_instance() {
    let registry = quiet();
    let before = CLOCK_BUILDS.load(Ordering::SeqCst);

    let first = registry.get::<Clock>().unwrap();
    first.ticks.fetch_add(1, Ordering::SeqCst);
    let second = registry.get_required::<Clock>();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.ticks.load(Ordering::SeqCst), 1);
    assert!(CLOCK_BUILDS.load(Ordering::SeqCst) - before >= 1);
    assert!(registry.exists::<Clock>());
    assert_eq!(registry.live_count(), 1);
}

#[test]
fn registries_are_independent() {
    let a = quiet();
    let b = quiet();
    let from_a = a.get_required::<Palette>();
    assert!(!b.exists::<Palette>());
    let from_b = b.get_required::<Palette>();
    assert!(!Arc::ptr_eq(&from_a, &from_b));
}

#[test]
fn delete_marks_deleted() {
    let registry = quiet();
    registry.get_required::<Palette>();
    registry.delete::<Palette>();

    assert!(registry.was_deleted::<Palette>());
    assert!(!registry.exists::<Palette>());
    assert_eq!(registry.live_count(), 0);

    // second delete is a no-op
    registry.delete::<Palette>();
    assert!(registry.was_deleted::<Palette>());
}

#[test]
fn delete_of_unknown_type_is_noop() {
    let registry = quiet();
    registry.delete::<Clock>();
    assert_eq!(registry.state::<Clock>(), InitState::Uninitialized);
}

#[test]
fn callers_keep_their_reference_after_delete() {
    let registry = quiet();
    let clock = registry.get_required::<Clock>();
    registry.delete::<Clock>();
    clock.ticks.fetch_add(5, Ordering::SeqCst);
    assert_eq!(clock.ticks.load(Ordering::SeqCst), 5);
    assert_eq!(Arc::strong_count(&clock), 1);
}

#[test]
fn post_construction_hook_sees_own_instance() {
    let registry = quiet();
    let instance = registry.get_required::<SelfRegistering>();
    assert_eq!(instance.seen_self.load(Ordering::SeqCst), 1);
    // self access is not a dependency
    assert!(registry.dependencies_of::<SelfRegistering>().is_empty());
}

#[test]
fn state_walks_the_lifecycle() {
    let transitions = Arc::new(Transitions::default());
    let registry = SingletonRegistry::builder()
        .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
        .observer(transitions.clone())
        .build();

    registry.get_required::<Palette>();
    registry.get_required::<Palette>();
    registry.delete::<Palette>();

    assert_eq!(
        *transitions.seen.lock().unwrap(),
        vec![
            (InitState::Uninitialized, InitState::Constructing),
            (InitState::Constructing, InitState::Initializing),
            (InitState::Initializing, InitState::Initialized),
            (InitState::Initialized, InitState::Deleted),
        ]
    );
}

#[test]
fn default_registry_logs_through_log_crate() {
    let registry = SingletonRegistry::new();
    assert!(registry.config().log_events);
    registry.get_required::<Palette>();
    registry.delete_all();
}
