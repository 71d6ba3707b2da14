//! End-to-end coverage of `DependencyForest` driven only through its
//! public API, matching the concrete scenarios a correctness review would check for the scheduler.

mod support;

use h2_priority::{DependencyForest, StreamState};
use support::{Item, Queue};

fn forest() -> DependencyForest<Item> {
    DependencyForest::new()
}

fn open(forest: &mut DependencyForest<Item>, id: u32, group: h2_priority::GroupKey) -> h2_priority::Key {
    let key = forest.open(id.into(), 0, StreamState::Idle, 0xffff, 0xffff, None);
    forest.group_add_stream(group, key);
    key
}

// Exclusive insert promotes adopted children to grandchildren.
#[test]
fn exclusive_insert_adopts_children() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);
    let s3 = open(&mut f, 3, g);
    let s5 = open(&mut f, 5, g);
    let s7 = open(&mut f, 7, g);
    let s9 = open(&mut f, 9, g);

    f.dep_add(s1, s3);
    f.dep_add(s1, s5);
    f.dep_add(s1, s7);
    f.dep_insert(s1, s9);

    assert_eq!(f.children(s1).into_iter().collect::<Vec<_>>(), vec![s9]);
    assert_eq!(f.children(s9).into_iter().collect::<Vec<_>>(), vec![s3, s5, s7]);
    assert_eq!(f.get(s9).num_substreams(), 4);
    assert_eq!(f.get(s1).num_substreams(), 5);
}

// Re-parenting a subtree containing a TOP stream demotes it during the
// group reassignment, and the follow-up top-search re-promotes it without
// a duplicate enqueue.
#[test]
fn subtree_reparent_demotes_then_repromotes_without_duplicate_push() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);
    let s9 = open(&mut f, 9, g);
    let s3 = open(&mut f, 3, g);
    f.dep_add(s9, s3);

    let mut pq = Queue::default();
    f.attach_data(s3, Item::new(3), &mut pq).unwrap();
    assert_eq!(pq.ids(), vec![3]);

    f.dep_insert_subtree(s1, s9, &mut pq).unwrap();

    assert_eq!(pq.ids(), vec![3], "s3's data must be queued exactly once");
    assert_eq!(f.get(s3).dpri(), h2_priority::Dpri::Top);
    assert_eq!(f.dep_root(s3), s1);
}

// Detaching a TOP stream's data promotes a shadowed descendant.
#[test]
fn detach_of_top_promotes_descendant() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);
    let s2 = open(&mut f, 3, g);
    let s3 = open(&mut f, 5, g);
    f.dep_add(s1, s2);
    f.dep_add(s2, s3);

    let mut pq = Queue::default();
    f.attach_data(s1, Item::new(1), &mut pq).unwrap();
    f.attach_data(s3, Item::new(3), &mut pq).unwrap();

    assert_eq!(f.get(s1).dpri(), h2_priority::Dpri::Top);
    assert_eq!(f.get(s3).dpri(), h2_priority::Dpri::Rest);

    f.detach_data(s1, &mut pq).unwrap();

    assert_eq!(f.get(s1).dpri(), h2_priority::Dpri::NoData);
    assert_eq!(f.get(s3).dpri(), h2_priority::Dpri::Top);
    assert_eq!(pq.ids(), vec![1, 3]);
}

// Removing a root leaves its children as independent roots, each
// retaining its own descendants and substream count.
#[test]
fn remove_root_leaves_children_as_roots() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);
    let s3 = open(&mut f, 3, g);
    let s5 = open(&mut f, 5, g);
    let s7 = open(&mut f, 7, g);
    let s9 = open(&mut f, 9, g);
    f.dep_add(s1, s3);
    f.dep_add(s1, s5);
    f.dep_add(s3, s7);
    f.dep_add(s3, s9);

    f.dep_remove(s1);

    assert_eq!(f.dep_root(s3), s3);
    assert_eq!(f.dep_root(s5), s5);
    assert_eq!(f.children(s3).into_iter().collect::<Vec<_>>(), vec![s7, s9]);
    assert_eq!(f.get(s3).num_substreams(), 3);
    assert_eq!(f.get(s5).num_substreams(), 1);
}

// A window update that would push the flow window past MAX_WINDOW_SIZE
// fails and leaves the window unchanged.
#[test]
fn window_overflow_rejected_and_window_unchanged() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let start = h2_priority::MAX_WINDOW_SIZE - 10;
    let s1 = f.open(1.into(), 0, StreamState::Idle, 0xffff, start, None);
    f.group_add_stream(g, s1);

    f.update_local_initial_window_size(s1, 1000, 5).unwrap_err();

    assert_eq!(f.get(s1).local_window_size(), start);
}

// Defer then resume doesn't duplicate the queue entry.
#[test]
fn defer_and_resume_preserves_queue_idempotence() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);

    let mut pq = Queue::default();
    f.attach_data(s1, Item::new(1), &mut pq).unwrap();
    assert_eq!(pq.ids(), vec![1]);

    f.defer_data(s1, 0xF);
    assert!(f.get(s1).data().is_none());
    assert!(f.get(s1).deferred_data().is_some());

    f.detach_deferred_data(s1, &mut pq).unwrap();

    assert_eq!(pq.ids(), vec![1]);
    assert_eq!(f.get(s1).dpri(), h2_priority::Dpri::Top);
}

#[test]
fn group_membership_tracks_add_and_remove() {
    let mut f = forest();
    let g1 = f.group_init(0, 16);
    let g2 = f.group_init(1, 32);
    let s1 = f.open(1.into(), 0, StreamState::Idle, 0xffff, 0xffff, None);

    f.group_add_stream(g1, s1);
    assert_eq!(f.group(g1).num_streams(), 1);

    f.group_remove_stream(s1);
    assert_eq!(f.group(g1).num_streams(), 0);

    f.group_add_stream(g2, s1);
    assert_eq!(f.group(g2).num_streams(), 1);
}

#[test]
fn subtree_find_prevents_cycles_before_reparenting() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let parent = open(&mut f, 1, g);
    let child = open(&mut f, 3, g);
    let grandchild = open(&mut f, 5, g);
    f.dep_add(parent, child);
    f.dep_add(child, grandchild);

    // A caller about to re-parent `parent` under `grandchild` should refuse:
    // that would create a cycle.
    assert!(f.subtree_find(parent, grandchild));
    assert!(!f.subtree_find(grandchild, parent));
}

#[test]
fn close_decrements_group_membership() {
    let mut f = forest();
    let g = f.group_init(0, 16);
    let s1 = open(&mut f, 1, g);
    assert_eq!(f.group(g).num_streams(), 1);

    f.close(s1);
    assert_eq!(f.group(g).num_streams(), 0);
}
