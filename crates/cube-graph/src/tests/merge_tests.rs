use super::{module_set, paths, qp, script};
use crate::{find_roots, mark_roots, merge};

#[test]
fn single_chain_is_emitted_dependency_first() {
    let set = module_set(vec![
        script("/a.js", &["/b.js"]),
        script("/b.js", &["/c.js"]),
        script("/c.js", &[]),
    ]);

    let result = merge(&set, &[]);

    let bundle = result.bundle(&qp("/a.js")).unwrap();
    assert_eq!(paths(&bundle.modules), vec!["/c.js", "/b.js", "/a.js"]);
    assert!(!bundle.uses_common);
    assert!(result.common.is_none());
}

#[test]
fn diamond_follows_first_discovery_order() {
    let set = module_set(vec![
        script("/a.js", &["/b.js", "/c.js"]),
        script("/b.js", &["/d.js"]),
        script("/c.js", &["/d.js"]),
        script("/d.js", &[]),
    ]);

    let result = merge(&set, &[]);

    let bundle = result.bundle(&qp("/a.js")).unwrap();
    assert_eq!(paths(&bundle.modules), vec!["/d.js", "/b.js", "/c.js", "/a.js"]);
}

#[test]
fn cycle_below_an_entry_terminates() {
    let set = module_set(vec![
        script("/main.js", &["/a.js"]),
        script("/a.js", &["/b.js"]),
        script("/b.js", &["/a.js"]),
    ]);

    let roots = find_roots(&set, &[]);
    assert_eq!(roots, vec![set.idx_of(&qp("/main.js")).unwrap()]);

    let result = merge(&set, &[]);
    let bundle = result.bundle(&qp("/main.js")).unwrap();
    assert_eq!(paths(&bundle.modules), vec!["/b.js", "/a.js", "/main.js"]);
}

#[test]
fn orphan_cycle_promotes_first_module_to_root() {
    let set = module_set(vec![
        script("/app.js", &[]),
        script("/x.js", &["/y.js"]),
        script("/y.js", &["/x.js"]),
    ]);

    assert_eq!(find_roots(&set, &[]).len(), 1);

    let result = merge(&set, &[]);
    let roots: Vec<_> = result.roots().map(|r| r.as_str()).collect();
    assert_eq!(roots, vec!["/app.js", "/x.js"]);
    assert_eq!(
        paths(&result.bundle(&qp("/x.js")).unwrap().modules),
        vec!["/y.js", "/x.js"]
    );
    assert_eq!(result.module_count(), set.len());
}

#[test]
fn module_reached_by_two_roots_carries_both_marks() {
    let set = module_set(vec![
        script("/r1.js", &["/shared.js", "/only1.js"]),
        script("/r2.js", &["/shared.js"]),
        script("/shared.js", &["/leaf.js"]),
        script("/only1.js", &[]),
        script("/leaf.js", &[]),
    ]);

    let roots = find_roots(&set, &[]);
    let marks = mark_roots(&set, &roots);

    let r1 = set.idx_of(&qp("/r1.js")).unwrap();
    let r2 = set.idx_of(&qp("/r2.js")).unwrap();
    let shared = set.idx_of(&qp("/shared.js")).unwrap();
    let leaf = set.idx_of(&qp("/leaf.js")).unwrap();
    let only1 = set.idx_of(&qp("/only1.js")).unwrap();

    assert_eq!(marks.roots_of(shared).collect::<Vec<_>>(), vec![r1, r2]);
    assert_eq!(marks.roots_of(leaf).collect::<Vec<_>>(), vec![r1, r2]);
    assert_eq!(marks.roots_of(only1).collect::<Vec<_>>(), vec![r1]);
    assert_eq!(marks.reach_count(r2), 1);
}

#[test]
fn marking_is_idempotent_on_cycles() {
    let set = module_set(vec![
        script("/r.js", &["/a.js", "/a.js"]),
        script("/a.js", &["/b.js"]),
        script("/b.js", &["/a.js", "/r.js"]),
    ]);

    let r = set.idx_of(&qp("/r.js")).unwrap();
    let marks = mark_roots(&set, &[r]);

    for (idx, _) in set.iter() {
        assert_eq!(marks.reach_count(idx), 1);
    }
}

#[test]
fn shared_modules_are_lifted_into_common_bundle() {
    let set = module_set(vec![
        script("/r1.js", &["/shared.js", "/only1.js"]),
        script("/r2.js", &["/shared.js"]),
        script("/shared.js", &["/leaf.js"]),
        script("/only1.js", &[]),
        script("/leaf.js", &[]),
    ]);

    let result = merge(&set, &[]);

    let r1 = result.bundle(&qp("/r1.js")).unwrap();
    assert_eq!(paths(&r1.modules), vec!["/only1.js", "/r1.js"]);
    assert!(r1.uses_common);

    let r2 = result.bundle(&qp("/r2.js")).unwrap();
    assert_eq!(paths(&r2.modules), vec!["/r2.js"]);
    assert!(r2.uses_common);

    let common = result.common.as_ref().unwrap();
    assert_eq!(paths(&common.modules), vec!["/leaf.js", "/shared.js"]);
    assert_eq!(result.module_count(), set.len());
}

#[test]
fn extra_root_reachable_elsewhere_moves_to_common() {
    let set = module_set(vec![
        script("/page.js", &["/widget.js"]),
        script("/widget.js", &[]),
    ]);

    let result = merge(&set, &[qp("/widget.js")]);

    let roots: Vec<_> = result.roots().map(|r| r.as_str()).collect();
    assert_eq!(roots, vec!["/page.js", "/widget.js"]);

    let widget = result.bundle(&qp("/widget.js")).unwrap();
    assert!(widget.is_empty());
    assert!(widget.uses_common);
    assert_eq!(paths(&result.common.unwrap().modules), vec!["/widget.js"]);
}

#[test]
fn extra_roots_are_deduplicated_and_unknown_ones_dropped() {
    let set = module_set(vec![script("/a.js", &["/b.js"]), script("/b.js", &[])]);

    let roots = find_roots(&set, &[qp("/a.js"), qp("/nope.js"), qp("/b.js"), qp("/b.js")]);

    assert_eq!(
        roots,
        vec![
            set.idx_of(&qp("/a.js")).unwrap(),
            set.idx_of(&qp("/b.js")).unwrap()
        ]
    );
}

#[test]
fn references_outside_the_set_are_external() {
    let set = module_set(vec![script(
        "/a.js",
        &["pkg:/lodash.js", "/node_modules/missing/index.js"],
    )]);

    let result = merge(&set, &[]);

    let bundle = result.bundle(&qp("/a.js")).unwrap();
    assert_eq!(paths(&bundle.modules), vec!["/a.js"]);
    assert!(!bundle.uses_common);
}

#[test]
fn repeated_merges_start_from_clean_marks() {
    let set = module_set(vec![
        script("/r1.js", &["/s.js"]),
        script("/r2.js", &["/s.js"]),
        script("/s.js", &[]),
    ]);

    let first = merge(&set, &[]);
    let second = merge(&set, &[]);

    assert_eq!(first.bundles, second.bundles);
    assert_eq!(first.common, second.common);
}

#[test]
fn empty_set_produces_no_bundles() {
    let set = module_set(Vec::new());
    let result = merge(&set, &[]);
    assert!(result.bundles.is_empty());
    assert!(result.common.is_none());
}

#[test]
fn many_roots_sharing_a_chain_lift_it_once() {
    let mut modules: Vec<_> = (0..200)
        .map(|i| script(&format!("/page{i}.js"), &["/shared/a.js"]))
        .collect();
    modules.push(script("/shared/a.js", &["/shared/b.js"]));
    modules.push(script("/shared/b.js", &[]));
    modules.push(script("/solo.js", &["/solo-dep.js"]));
    modules.push(script("/solo-dep.js", &[]));
    let set = module_set(modules);

    let roots = find_roots(&set, &[]);
    let marks = mark_roots(&set, &roots);
    let shared = set.idx_of(&qp("/shared/b.js")).unwrap();
    assert_eq!(marks.reach_count(shared), 200);
    assert!(marks.roots_of(shared).eq(roots.iter().copied().take(200)));

    let result = merge(&set, &[]);
    let common = result.common.as_ref().unwrap();
    assert_eq!(paths(&common.modules), vec!["/shared/b.js", "/shared/a.js"]);

    let page = result.bundle(&qp("/page199.js")).unwrap();
    assert_eq!(paths(&page.modules), vec!["/page199.js"]);
    assert!(page.uses_common);

    let solo = result.bundle(&qp("/solo.js")).unwrap();
    assert_eq!(paths(&solo.modules), vec!["/solo-dep.js", "/solo.js"]);
    assert!(!solo.uses_common);
    assert_eq!(result.module_count(), set.len());
}
