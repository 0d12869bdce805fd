#![no_main]

use ferrous_ioc::{Constant, Container, LifetimeScope, RegisterOptions, Resolver};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

struct Leaf(i32);
struct Branch(Arc<Leaf>);

fn scope(byte: u8) -> LifetimeScope {
    if byte % 2 == 0 {
        LifetimeScope::ContainerManaged
    } else {
        LifetimeScope::InvokeManaged
    }
}

// Each pair of bytes is one operation against a root and a child container.
fuzz_target!(|data: &[u8]| {
    let root = Container::new();
    let child = root.create_child_container();
    let mut expected_leaf: Option<i32> = None;
    let mut child_leaf: Option<i32> = None;

    for op in data.chunks_exact(2) {
        let value = op[1] as i32;
        match op[0] % 6 {
            0 => {
                root.register(Constant::new(Leaf(value))).unwrap();
                expected_leaf = Some(value);
            }
            1 => {
                root.register_with(
                    move || Leaf(value),
                    [RegisterOptions::new().lifetime_scope(scope(op[1]))],
                )
                .unwrap();
                expected_leaf = Some(value);
            }
            2 => {
                root.register_with(
                    |leaf: Arc<Leaf>| Branch(leaf),
                    [RegisterOptions::new().lifetime_scope(scope(op[1]))],
                )
                .unwrap();
            }
            3 => {
                child.register(Constant::new(Leaf(value))).unwrap();
                child_leaf = Some(value);
            }
            4 => {
                let result = root.get::<Leaf>();
                assert_eq!(result.ok().map(|leaf| leaf.0), expected_leaf);
            }
            _ => {
                let seen = child_leaf.or(expected_leaf);
                let result = child.invoke(|leaf: Arc<Leaf>| assert_eq!(Some(leaf.0), seen));
                assert_eq!(result.is_ok(), seen.is_some());
                // a branch resolved through the child never sees the child's leaf
                if let (Ok(branch), None) = (child.get::<Branch>(), expected_leaf) {
                    panic!("branch built without a root leaf: {}", branch.0 .0);
                }
            }
        }
    }
});
