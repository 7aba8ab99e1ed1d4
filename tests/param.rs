use ferrous_lifecycle::{
    HookResult, InitState, LockedSingleton, Managed, ParamSingleton, RegistryConfig, Singleton, SingletonError,
    SingletonRegistry,
};
use std::sync::Arc;

fn quiet() -> SingletonRegistry {
    SingletonRegistry::builder()
        .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
        .build()
}

struct Viewport {
    width: u32,
    height: u32,
}

impl Managed for Viewport {}

impl ParamSingleton for Viewport {
    type Args = (u32, u32);
    fn construct((width, height): (u32, u32), _: &SingletonRegistry) -> HookResult<Self> {
        Ok(Viewport { width, height })
    }
}

struct License;
impl Managed for License {}
impl LockedSingleton for License {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(License)
    }
}

// Reads a param singleton while being built
struct Layout {
    viewport: Arc<Viewport>,
}
impl Managed for Layout {}
impl Singleton for Layout {
    fn construct(registry: &SingletonRegistry) -> HookResult<Self> {
        Ok(Layout { viewport: registry.instance::<Viewport>()? })
    }
}

// Usable both ways; the first use decides
struct Ambiguous;
impl Managed for Ambiguous {}
impl Singleton for Ambiguous {
    fn construct(_: &SingletonRegistry) -> HookResult<Self> {
        Ok(Ambiguous)
    }
}
impl ParamSingleton for Ambiguous {
    type Args = ();
    fn construct(_: (), _: &SingletonRegistry) -> HookResult<Self> {
        Ok(Ambiguous)
    }
}

struct SelfInit;
impl Managed for SelfInit {}
impl ParamSingleton for SelfInit {
    type Args = ();
    fn construct(_: (), registry: &SingletonRegistry) -> HookResult<Self> {
        registry.instance::<SelfInit>()?;
        Ok(SelfInit)
    }
}

#[test]
fn access_before_init_is_an_error() {
    let registry = quiet();
    assert!(matches!(
        registry.instance::<Viewport>(),
        Err(SingletonError::UninitializedParamAccess(_))
    ));
    assert_eq!(registry.state::<Viewport>(), InitState::Uninitialized);
}

#[test]
fn init_with_then_instance() {
    let registry = quiet();
    let built = registry.init_with::<Viewport>((1920, 1080)).unwrap();
    let fetched = registry.instance_required::<Viewport>();
    assert!(Arc::ptr_eq(&built, &fetched));
    assert_eq!((fetched.width, fetched.height), (1920, 1080));
}

#[test]
fn second_init_is_an_error() {
    let registry = quiet();
    registry.init_with::<Viewport>((800, 600)).unwrap();
    assert!(matches!(
        registry.init_with::<Viewport>((1024, 768)),
        Err(SingletonError::DoubleInitialization(_))
    ));
    assert_eq!(registry.instance_required::<Viewport>().width, 800);
}

#[test]
fn deleted_param_singleton_is_not_revived() {
    let registry = quiet();
    registry.init_with::<Viewport>((800, 600)).unwrap();
    registry.delete::<Viewport>();

    assert!(matches!(registry.instance::<Viewport>(), Err(SingletonError::AccessAfterDelete(_))));
    assert!(matches!(
        registry.init_with::<Viewport>((800, 600)),
        Err(SingletonError::AccessAfterDelete(_))
    ));
    assert!(registry.was_deleted::<Viewport>());
}

#[test]
fn locked_singleton_needs_explicit_init() {
    let registry = quiet();
    assert!(registry.instance::<License>().is_err());
    let license = registry.init::<License>().unwrap();
    assert!(Arc::ptr_eq(&license, &registry.instance_required::<License>()));
    assert!(matches!(registry.init::<License>(), Err(SingletonError::DoubleInitialization(_))));
}

#[test]
fn param_singleton_can_be_a_dependency() {
    let registry = quiet();
    registry.init_with::<Viewport>((640, 480)).unwrap();
    let layout = registry.get_required::<Layout>();
    assert_eq!(layout.viewport.height, 480);

    let deps = registry.dependencies_of::<Layout>();
    assert_eq!(deps.len(), 1);
    assert!(deps[0].ends_with("Viewport"));
}

#[test]
fn implicit_dependent_fails_when_param_missing() {
    let registry = quiet();
    assert!(matches!(registry.get::<Layout>(), Err(SingletonError::ConstructorFailed { .. })));
}

#[test]
fn kind_is_fixed_by_first_use() {
    let registry = quiet();
    registry.get_required::<Ambiguous>();
    assert!(matches!(registry.instance::<Ambiguous>(), Err(SingletonError::KindMismatch(_))));
    assert!(matches!(registry.init_with::<Ambiguous>(()), Err(SingletonError::KindMismatch(_))));
}

#[test]
fn instance_from_own_constructor_is_reentrant() {
    let registry = quiet();
    let err = registry.init_with::<SelfInit>(()).err().unwrap();
    match err {
        SingletonError::ConstructorFailed { source, .. } => {
            assert!(matches!(
                source.downcast_ref::<SingletonError>(),
                Some(SingletonError::ReentrantConstruction(_))
            ));
        }
        other => panic!("unexpected error {:?}", other),
    }
}
