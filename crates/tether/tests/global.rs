use std::sync::{Arc, Mutex, MutexGuard};

use tether::{Params, Registry, plugin_value};

// The process-wide registry is shared by every test in this binary.
static SERIAL: Mutex<()> = Mutex::new(());

fn isolated() -> (MutexGuard<'static, ()>, Arc<Registry>) {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fresh = Arc::new(Registry::new());
    let old = tether::set_registry(Arc::clone(&fresh));
    drop(old);
    (guard, fresh)
}

#[test]
fn free_functions_use_the_installed_registry() {
    let (_guard, fresh) = isolated();

    tether::register("ns", "k", plugin_value("p1"), []);
    tether::register("ns", "k", plugin_value("p2"), [tether::name("two")]);

    let all = tether::get_all_plugins("ns", "k").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].name, "two");
    assert!(Arc::ptr_eq(&tether::get_plugin("ns", "k").unwrap(), &all[0]));
    assert!(Arc::ptr_eq(&tether::registry(), &fresh));
    assert_eq!(fresh.get_all_plugins("ns", "k").unwrap().len(), 2);
}

#[test]
fn swapping_isolates_state() {
    let (_guard, first) = isolated();
    tether::register("swap", "k", plugin_value(1u8), []);

    let second = Arc::new(Registry::new());
    let previous = tether::set_registry(Arc::clone(&second));
    assert!(Arc::ptr_eq(&previous, &first));

    assert!(tether::get_plugin("swap", "k").is_none());
    assert!(tether::get("swap", false).is_none());
    assert!(tether::get("swap", true).is_some());
    assert!(first.get_plugin("swap", "k").is_some());

    tether::set_registry(previous);
    assert!(tether::get_plugin("swap", "k").is_some());
}

#[test]
fn global_load_surfaces_open_errors() {
    let (_guard, fresh) = isolated();
    let dir = tempfile::tempdir().unwrap();

    let err = tether::load(dir.path().join("libnothere.so"), &Params::new()).unwrap_err();
    assert!(matches!(err, tether::LoadError::Open(_)));
    assert!(fresh.namespaces().is_empty());
    assert!(fresh.loaded_modules().is_empty());
}
