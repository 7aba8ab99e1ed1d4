//! Dependency capture and teardown ordering.

use ferrous_lifecycle::{HookResult, Managed, RegistryConfig, RegistryObserver, Singleton, SingletonRegistry};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

thread_local! {
    static TORN_DOWN: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

fn record(name: &'static str) {
    TORN_DOWN.with(|log| log.borrow_mut().push(name));
}

fn take_log() -> Vec<&'static str> {
    TORN_DOWN.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

fn quiet() -> SingletonRegistry {
    take_log();
    SingletonRegistry::builder()
        .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
        .build()
}

fn short(names: Vec<&'static str>) -> Vec<&'static str> {
    names.into_iter().map(|n| n.rsplit("::").next().unwrap_or(n)).collect()
}

/// Declares a singleton that records its teardown and builds `$deps` first.
macro_rules! node {
    ($name:ident $(, $dep:ident)*) => {
        struct $name;
        impl Managed for $name {
            fn on_teardown(&self, _: &SingletonRegistry) -> HookResult {
                record(stringify!($name));
                Ok(())
            }
        }
        impl Singleton for $name {
            fn construct(_registry: &SingletonRegistry) -> HookResult<Self> {
                $( _registry.get::<$dep>()?; )*
                Ok($name)
            }
        }
    };
}

// chain: Renderer -> Shaders -> Device
node!(Device);
node!(Shaders, Device);
node!(Renderer, Shaders);

// diamond: App -> {Audio, Input} -> Platform
node!(Platform);
node!(Audio, Platform);
node!(Input, Platform);
node!(App, Audio, Input);

// accessed twice while building
node!(Config);
node!(Greedy, Config, Config);

node!(Logger);
node!(Service, Logger);

// Dependency captured from the post-construction hook
struct Window;
impl Managed for Window {
    fn on_constructed(&self, registry: &SingletonRegistry) -> HookResult {
        registry.get::<Device>()?;
        Ok(())
    }
    fn on_teardown(&self, _: &SingletonRegistry) -> HookResult {
        record("Window");
        Ok(())
    }
}
impl Singleton for Window {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(Window)
    }
}

// Cycle through two-phase init: Editor's hook needs Toolbar, Toolbar needs Editor
struct Editor;
impl Managed for Editor {
    fn on_constructed(&self, registry: &SingletonRegistry) -> HookResult {
        registry.get::<Toolbar>()?;
        Ok(())
    }
    fn on_teardown(&self, _: &SingletonRegistry) -> HookResult {
        record("Editor");
        Ok(())
    }
}
impl Singleton for Editor {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(Editor)
    }
}

struct Toolbar {
    editor: Arc<Editor>,
}
impl Managed for Toolbar {
    fn on_teardown(&self, _: &SingletonRegistry) -> HookResult {
        record("Toolbar");
        Ok(())
    }
}
impl Singleton for Toolbar {
    fn construct(registry: &SingletonRegistry) -> HookResult<Self> {
        Ok(Toolbar { editor: registry.get::<Editor>()? })
    }
}

#[derive(Default)]
struct CycleWatcher {
    cycles: Mutex<Vec<Vec<&'static str>>>,
}

impl RegistryObserver for CycleWatcher {
    fn dependency_cycle(&self, cycle: &[&'static str]) {
        self.cycles.lock().unwrap().push(short(cycle.to_vec()));
    }
}

#[test]
fn chain_tears_down_dependents_first() {
    let registry = quiet();
    registry.get_required::<Renderer>();
    assert_eq!(short(registry.dependencies_of::<Renderer>()), vec!["Shaders"]);
    assert_eq!(short(registry.dependencies_of::<Shaders>()), vec!["Device"]);
    assert!(registry.dependencies_of::<Device>().is_empty());

    registry.delete_all();
    assert_eq!(take_log(), vec!["Renderer", "Shaders", "Device"]);
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn nested_dependencies_are_not_inherited() {
    let registry = quiet();
    registry.get_required::<Renderer>();
    // Device was built while Shaders was on top of the stack
    assert!(!short(registry.dependencies_of::<Renderer>()).contains(&"Device"));
    registry.delete_all();
}

#[test]
fn diamond_tears_down_shared_dependency_last() {
    let registry = quiet();
    registry.get_required::<App>();
    assert_eq!(short(registry.dependencies_of::<App>()), vec!["Audio", "Input"]);

    registry.delete_all();
    assert_eq!(take_log(), vec!["App", "Audio", "Input", "Platform"]);
}

#[test]
fn dependency_sets_have_no_duplicates() {
    let registry = quiet();
    registry.get_required::<Greedy>();
    assert_eq!(short(registry.dependencies_of::<Greedy>()), vec!["Config"]);
    registry.delete_all();
}

#[test]
fn dependency_constructed_first_is_still_torn_down_last() {
    let registry = quiet();
    registry.get_required::<Logger>();
    registry.get_required::<Service>();
    assert_eq!(short(registry.dependencies_of::<Service>()), vec!["Logger"]);

    registry.delete_all();
    assert_eq!(take_log(), vec!["Service", "Logger"]);
}

#[test]
fn unrelated_singletons_go_in_construction_order() {
    let registry = quiet();
    registry.get_required::<Logger>();
    registry.get_required::<Device>();
    registry.get_required::<Config>();
    registry.delete_all();
    assert_eq!(take_log(), vec!["Logger", "Device", "Config"]);
}

#[test]
fn access_from_post_construction_hook_is_a_dependency() {
    let registry = quiet();
    registry.get_required::<Window>();
    assert_eq!(short(registry.dependencies_of::<Window>()), vec!["Device"]);

    registry.delete_all();
    assert_eq!(take_log(), vec!["Window", "Device"]);
}

#[test]
fn access_outside_construction_records_nothing() {
    let registry = quiet();
    registry.get_required::<Logger>();
    registry.get_required::<Device>();
    assert!(registry.dependencies_of::<Logger>().is_empty());
    assert!(registry.dependencies_of::<Device>().is_empty());
    registry.delete_all();
}

#[test]
fn two_phase_cycle_is_broken_by_construction_order() {
    take_log();
    let watcher = Arc::new(CycleWatcher::default());
    let registry = SingletonRegistry::builder()
        .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
        .observer(watcher.clone())
        .build();

    let editor = registry.get_required::<Editor>();
    let toolbar = registry.get_required::<Toolbar>();
    assert!(Arc::ptr_eq(&toolbar.editor, &editor));
    assert_eq!(short(registry.dependencies_of::<Editor>()), vec!["Toolbar"]);
    assert_eq!(short(registry.dependencies_of::<Toolbar>()), vec!["Editor"]);
    drop((editor, toolbar));

    let graph = registry.dependency_graph();
    assert!(graph.metadata.has_cycles);

    registry.delete_all();
    // Editor started construction first
    assert_eq!(take_log(), vec!["Editor", "Toolbar"]);
    assert_eq!(*watcher.cycles.lock().unwrap(), vec![vec!["Editor", "Toolbar", "Editor"]]);
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn teardown_order_matches_delete_all() {
    let registry = quiet();
    registry.get_required::<Logger>();
    registry.get_required::<App>();
    let planned = short(registry.teardown_order());
    registry.delete_all();
    assert_eq!(planned, take_log());
}

#[test]
fn graph_export_lists_edges() {
    let registry = quiet();
    registry.get_required::<Renderer>();
    let graph = registry.dependency_graph();

    assert_eq!(graph.metadata.live_count, 3);
    assert_eq!(graph.metadata.edge_count, 2);
    assert!(!graph.metadata.has_cycles);
    let renderer = graph.nodes.iter().find(|n| n.type_name.ends_with("Renderer")).unwrap();
    assert_eq!(renderer.state, "initialized");
    assert_eq!(renderer.kind, "implicit");
    assert_eq!(graph.teardown_order.first(), Some(&renderer.id));

    let mermaid = registry.export_graph(ferrous_lifecycle::ExportFormat::Mermaid).unwrap();
    assert!(mermaid.contains(&format!("{} -->", renderer.id)));
    registry.delete_all();
}
