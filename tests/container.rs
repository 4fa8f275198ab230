use objectcore::{
    BootstrapContainer, BootstrapErrorKind, Container, Inject, InjectedValue, Lazy, Literal, Package, ResolveErrorKind,
    Scope, Settings, TypeDescriptor,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

#[derive(Default)]
struct Clock;

struct Greeter {
    greeting: String,
    clock: Arc<Clock>,
}

struct Ping;
struct Pong;

#[derive(Default)]
struct Node {
    peer: Mutex<Option<Lazy<Node>>>,
}

fn package(builds: Arc<AtomicU8>) -> Package {
    let node = |name: &str| {
        TypeDescriptor::builder::<Node>(name)
            .scope(Scope::Singleton)
            .default_constructor()
            .setter("peer", |node: &Node, peer: Lazy<Node>| {
                *node.peer.lock() = Some(peer);
                Ok(())
            })
            .build()
    };

    Package::new("Acme.App")
        .with_type(
            TypeDescriptor::builder::<Clock>("Acme.App.Clock")
                .scope(Scope::Singleton)
                .default_constructor()
                .build(),
        )
        .with_type(
            TypeDescriptor::builder::<Greeter>("Acme.App.Greeter")
                .parameter("greeting", None)
                .parameter("clock", Some("Acme.App.Clock"))
                .constructor(|mut arguments| {
                    let Literal(greeting) = arguments.next::<Literal<String>>()?;
                    let Inject(clock) = arguments.next::<Inject<Clock>>()?;
                    Ok(Greeter { greeting, clock })
                })
                .build(),
        )
        .with_type(
            TypeDescriptor::builder::<Ping>("Acme.App.Ping")
                .parameter("pong", Some("Acme.App.Pong"))
                .constructor(|mut arguments| {
                    let Inject(_) = arguments.next::<Inject<Pong>>()?;
                    Ok(Ping)
                })
                .build(),
        )
        .with_type(
            TypeDescriptor::builder::<Pong>("Acme.App.Pong")
                .parameter("ping", Some("Acme.App.Ping"))
                .constructor(|mut arguments| {
                    let Inject(_) = arguments.next::<Inject<Ping>>()?;
                    Ok(Pong)
                })
                .build(),
        )
        .with_type(node("Acme.App.Left"))
        .with_type(node("Acme.App.Right"))
        .with_type(
            TypeDescriptor::builder::<Node>("Acme.App.Hub")
                .scope(Scope::Singleton)
                .constructor(move |_| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(Node::default())
                })
                .build(),
        )
        .with_declarations_yaml(
            "
Acme.App.Greeter:
  arguments:
    greeting:
      value: hello
Acme.App.Ping:
  arguments:
    1:
      object: Acme.App.Pong
Acme.App.Pong:
  arguments:
    1:
      object: Acme.App.Ping
Acme.App.Left:
  properties:
    peer:
      object: Acme.App.Hub
      lazy: true
Acme.App.Right:
  properties:
    peer:
      object: Acme.App.Hub
      lazy: true
",
        )
        .unwrap()
}

fn bootstrap(builds: Arc<AtomicU8>) -> BootstrapContainer {
    let mut bootstrap = BootstrapContainer::new(Settings::default()).unwrap();
    bootstrap.initialize(&[package(builds)]).unwrap();
    bootstrap
}

fn container() -> Container {
    bootstrap(Arc::default()).into_container().unwrap()
}

#[test]
fn test_scope_caching() {
    let container = container();

    let first = container.resolve("Acme.App.Clock").unwrap();
    let second = container.resolve("Acme.App.Clock").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let first = container.get::<Greeter>("Acme.App.Greeter").unwrap();
    let second = container.get::<Greeter>("Acme.App.Greeter").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.clock, &second.clock));

    let custom = container
        .get_with::<Greeter>("Acme.App.Greeter", vec![InjectedValue::Literal(json!("hi"))])
        .unwrap();
    assert_eq!(custom.greeting, "hi");
    assert_eq!(first.greeting, "hello");

    assert!(matches!(
        container.resolve_with("Acme.App.Clock", vec![InjectedValue::Literal(json!(1))]),
        Err(ResolveErrorKind::InvalidUse { .. })
    ));
}

#[test]
fn test_circular_detection() {
    let container = container();

    match container.resolve("Acme.App.Ping") {
        Err(ResolveErrorKind::CircularDependency { chain, .. }) => {
            assert_eq!(chain, ["Acme.App.Ping", "Acme.App.Pong", "Acme.App.Ping"]);
        }
        Err(err) => panic!("unexpected error: {err}"),
        Ok(_) => panic!("circular dependency resolved"),
    }
    assert!(container.resolve("Acme.App.Clock").is_ok());
}

#[test]
fn test_lazy_fix_up() {
    let builds = Arc::new(AtomicU8::new(0));
    let container = bootstrap(builds.clone()).into_container().unwrap();

    let left = container.get::<Node>("Acme.App.Left").unwrap();
    let right = container.get::<Node>("Acme.App.Right").unwrap();
    let left_peer = left.peer.lock().clone().unwrap();
    let right_peer = right.peer.lock().clone().unwrap();
    assert!(left_peer.proxy().ptr_eq(right_peer.proxy()));
    assert_eq!(left_peer.proxy().slots().len(), 2);
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let hub = left_peer.get().unwrap();
    assert!(right_peer.is_activated());
    assert!(Arc::ptr_eq(&hub, &right_peer.get().unwrap()));
    assert!(Arc::ptr_eq(&hub, &container.get::<Node>("Acme.App.Hub").unwrap()));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bootstrap_restriction() {
    let mut bootstrap = bootstrap(Arc::default());

    assert!(matches!(
        bootstrap.resolve("Acme.App.Greeter"),
        Err(BootstrapErrorKind::UnsupportedOperation { .. })
    ));
    let clock = bootstrap.resolve("Acme.App.Clock").unwrap();

    let container = bootstrap.into_container().unwrap();
    let greeter = container.get::<Greeter>("Acme.App.Greeter").unwrap();
    assert_eq!(greeter.greeting, "hello");
    assert!(Arc::ptr_eq(&(greeter.clock.clone() as objectcore::Instance), &clock));
}
