//! Lifecycle state machine tests.

use wharf::domain::{ContainerHandle, ImageRef, LifecycleState};

use LifecycleState::{Absent, Created, Pulling, Removed, Running, Stopped};

#[test]
fn forward_path_is_legal() {
    assert!(Absent.can_advance_to(Pulling));
    assert!(Pulling.can_advance_to(Created));
    assert!(Created.can_advance_to(Running));
    assert!(Running.can_advance_to(Stopped));
    assert!(Stopped.can_advance_to(Removed));
}

#[test]
fn pull_step_is_skippable() {
    assert!(Absent.can_advance_to(Created));
}

#[test]
fn forced_cleanup_reaches_removed_from_any_state() {
    for state in [Absent, Pulling, Created, Running, Stopped] {
        assert!(state.can_advance_to(Removed), "{state} -> removed");
    }
}

#[test]
fn removed_is_terminal() {
    assert!(!Removed.can_advance_to(Removed));
    assert!(!Removed.can_advance_to(Running));
    assert!(!Removed.can_advance_to(Created));
}

#[test]
fn backwards_and_skipping_moves_are_rejected() {
    assert!(!Running.can_advance_to(Created));
    assert!(!Stopped.can_advance_to(Running));
    assert!(!Absent.can_advance_to(Running));
    assert!(!Created.can_advance_to(Stopped));
}

#[test]
fn handle_advance_tracks_legal_transitions_only() {
    let mut handle = ContainerHandle {
        id: "c1".to_owned(),
        name: "wharf-test".to_owned(),
        image: ImageRef::new("alpine"),
        state: Created,
    };

    assert!(handle.advance(Running));
    assert_eq!(handle.state, Running);

    assert!(!handle.advance(Created), "no going back");
    assert_eq!(handle.state, Running);

    assert!(handle.advance(Removed), "forced cleanup from running");
    assert_eq!(handle.state, Removed);
}

#[test]
fn image_ref_defaults_the_tag() {
    assert_eq!(ImageRef::new("alpine").as_str(), "alpine:latest");
    assert_eq!(ImageRef::new("nginx:1.27").as_str(), "nginx:1.27");
    assert_eq!(
        ImageRef::new("registry.example.com:5000/app").as_str(),
        "registry.example.com:5000/app:latest"
    );
}
