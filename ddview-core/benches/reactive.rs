use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ddview_core::layout::tree::{add_panel, remove_panel, state_panels};
use ddview_core::layout::{PanelSide, PanelState};
use ddview_core::reactive::{Derived, Observer, PlainField, Watchable};

fn derived_chain(c: &mut Criterion) {
    let source = PlainField::new(0u64);
    let mut last = source.readonly();
    for _ in 0..64 {
        let previous = last.clone();
        last = Derived::new(move |watch, _| watch.watch(&previous) + 1);
    }
    let _observer = Observer::new(last.clone());

    let mut value = 0;
    c.bench_function("derived chain of 64, observed", |b| {
        b.iter(|| {
            value += 1;
            source.set(value).commit();
            black_box(last.get())
        })
    });
}

fn derived_fan_in(c: &mut Criterion) {
    let fields: Vec<_> = (0..256).map(PlainField::new).collect();
    let sum = {
        let fields = fields.clone();
        Derived::new(move |watch, _| fields.iter().map(|field| watch.watch(field)).sum::<i32>())
    };

    let mut value = 0;
    c.bench_function("derived sum of 256, lazy read", |b| {
        b.iter(|| {
            value += 1;
            fields[0].set(value).commit();
            black_box(sum.get())
        })
    });
}

fn grid(size: usize) -> PanelState {
    let mut state = PanelState::empty("root");
    for i in 0..size {
        let target = state_panels(&state)
            .into_iter()
            .filter(|panel| matches!(panel, PanelState::Tabs(_)))
            .nth(i % 3)
            .map(|panel| panel.id().to_string())
            .unwrap_or_else(|| "root".to_string());
        let side = if i % 2 == 0 {
            PanelSide::East
        } else {
            PanelSide::South
        };
        state = add_panel(&state, &target, side, 1.0, None).0;
    }
    state
}

fn layout_rewrites(c: &mut Criterion) {
    let state = grid(32);
    c.bench_function("add then remove a panel in a 32 panel layout", |b| {
        b.iter_batched(
            || state.clone(),
            |state| {
                let (next, id) = add_panel(&state, "root", PanelSide::West, 1.0, Some("bench"));
                black_box(id);
                remove_panel(&next, "bench")
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, derived_chain, derived_fan_in, layout_rewrites);
criterion_main!(benches);
