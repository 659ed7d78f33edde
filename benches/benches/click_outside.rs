// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use understory_click_outside::adapters::tree::{NodeId, ShadowMode, TreeDom};
use understory_click_outside::{ClickOutside, ClickOutsideBinding, EventType};

fn build(included: usize, shadow: bool) -> (Rc<TreeDom>, ClickOutside<TreeDom>, NodeId) {
    let dom = Rc::new(TreeDom::new());
    let parent = if shadow {
        let host = dom.create_element();
        dom.append_child(dom.body_id(), host);
        dom.attach_shadow(host, ShadowMode::Open)
    } else {
        dom.body_id()
    };
    let el = dom.create_element();
    dom.append_child(parent, el);
    let extra: Vec<NodeId> = (0..included)
        .map(|_| {
            let node = dom.create_element();
            dom.append_child(parent, node);
            node
        })
        .collect();
    let outside = dom.create_element();
    dom.append_child(dom.body_id(), outside);

    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(
        el,
        ClickOutsideBinding::new(|_| {})
            .with_close_conditional(|_| true)
            .with_include(move || extra.clone()),
    );
    (dom, detector, outside)
}

fn bench_outside_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("click_outside/outside_click");

    // Hypothesis: cost is linear in the number of included elements, since
    // both pointer-down and click walk every candidate.
    for included in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(included as u64));
        for shadow in [false, true] {
            let (dom, _detector, outside) = build(included, shadow);
            let label = if shadow { "shadow" } else { "light" };
            group.bench_with_input(BenchmarkId::new(label, included), &outside, |b, &outside| {
                b.iter(|| {
                    black_box(dom.dispatch(EventType::MouseDown, outside));
                    black_box(dom.dispatch(EventType::Click, outside));
                    dom.run_macrotasks()
                });
            });
        }
    }

    group.finish();
}

fn bench_attach_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("click_outside/attach_detach");

    for elements in [1usize, 32, 256] {
        group.throughput(Throughput::Elements(elements as u64));
        group.bench_with_input(BenchmarkId::from_parameter(elements), &elements, |b, &n| {
            let dom = Rc::new(TreeDom::new());
            let nodes: Vec<NodeId> = (0..n)
                .map(|_| {
                    let node = dom.create_element();
                    dom.append_child(dom.body_id(), node);
                    node
                })
                .collect();
            let mut detector = ClickOutside::new(Rc::clone(&dom));
            b.iter(|| {
                for &node in &nodes {
                    detector.attach(node, ClickOutsideBinding::inert());
                }
                detector.detach_all();
                black_box(detector.attached_count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_outside_click, bench_attach_detach);
criterion_main!(benches);
