use std::any::Any;
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use chart_core::scales::ChartScale;
use chart_core::{
    AccessorScaleBinding, Component, ComponentId, ComponentTree, Dataset, DrawExecutor,
    DrawRecorder, LinePlot, Surface,
};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

struct Leaf {
    detaches: Rc<Cell<usize>>,
}

impl Component for Leaf {
    fn render(&mut self, surface: &Surface, executor: &mut dyn DrawExecutor) {
        executor.execute(surface, 0, &[]);
    }

    fn detached(&mut self) {
        self.detaches.set(self.detaches.get() + 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn check_tree(tree: &ComponentTree, nodes: &[ComponentId]) {
    let mut owned = HashSet::new();
    for &id in nodes.iter().filter(|id| tree.contains(**id)) {
        for child in tree.components(id) {
            assert_eq!(tree.parent(child), Some(id), "stale parent link");
            assert!(owned.insert(child), "{child:?} owned twice");
        }
        if let Some(parent) = tree.parent(id) {
            assert!(tree.contains(parent));
            assert_eq!(tree.is_anchored(id), tree.is_anchored(parent));
        }
    }
    for &root in tree.pending_layouts() {
        assert!(tree.contains(root));
        assert_eq!(tree.parent(root), None, "queued layout root has a parent");
        assert!(tree.is_anchored(root));
    }
}

#[test]
fn test_detach_all_with_shuffled_children() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..50 {
        let detaches = Rc::new(Cell::new(0));
        let mut tree = ComponentTree::new();
        let root = tree.create_container();
        let n = rng.random_range(1..40);
        let mut ids: Vec<_> = (0..n)
            .map(|_| {
                tree.insert(Leaf {
                    detaches: detaches.clone(),
                })
            })
            .collect();
        ids.shuffle(&mut rng);
        for id in &ids {
            tree.add_component(root, *id, rng.random_bool(0.5));
        }
        tree.anchor(root, Surface::new(1));

        // Detach a random subset directly, then sweep the rest.
        let direct = rng.random_range(0..n);
        for id in ids.iter().take(direct) {
            tree.detach(*id);
        }
        tree.detach_all(root);

        assert!(tree.empty(root));
        assert_eq!(detaches.get(), n);
        for id in &ids {
            assert!(!tree.is_anchored(*id));
            assert_eq!(tree.parent(*id), None);
        }
    }
}

#[test]
fn test_random_operations_keep_tree_consistent() {
    let mut rng = StdRng::seed_from_u64(42);
    let detaches = Rc::new(Cell::new(0));
    let mut tree = ComponentTree::new();
    let mut nodes: Vec<ComponentId> = Vec::new();

    for step in 0..2000 {
        let live: Vec<_> = nodes.iter().copied().filter(|id| tree.contains(*id)).collect();
        match rng.random_range(0..10) {
            0 | 1 => nodes.push(tree.create_container()),
            2 | 3 => nodes.push(tree.insert(Leaf {
                detaches: detaches.clone(),
            })),
            4..=6 if !live.is_empty() => {
                let container = live[rng.random_range(0..live.len())];
                let child = live[rng.random_range(0..live.len())];
                tree.add_component(container, child, rng.random_bool(0.3));
            }
            7 if !live.is_empty() => tree.detach(live[rng.random_range(0..live.len())]),
            8 if !live.is_empty() => {
                tree.remove(live[rng.random_range(0..live.len())]);
            }
            9 => {
                let roots: Vec<_> = live.iter().filter(|id| tree.parent(**id).is_none()).collect();
                if let Some(root) = roots.choose(&mut rng) {
                    tree.anchor(**root, Surface::new(step as u64));
                }
            }
            _ => {}
        }
        check_tree(&tree, &nodes);
    }

    let mut rec = DrawRecorder::new();
    let roots: Vec<_> = nodes
        .iter()
        .copied()
        .filter(|id| tree.contains(*id) && tree.parent(*id).is_none())
        .collect();
    for id in roots {
        tree.render(id, &mut rec);
    }
    for batch in &rec.batches {
        assert!(batch.surface.scope().iter().all(|c| tree.contains(*c)));
    }
}

#[test]
fn test_random_data_renders_identically_twice() {
    let mut rng = StdRng::seed_from_u64(5);
    let x = ChartScale::new_linear((0.0, 100.0), (0.0, 640.0)).shared();
    let y = ChartScale::new_linear((-50.0, 50.0), (480.0, 0.0)).shared();

    let mut plot: LinePlot<(f64, f64)> = LinePlot::new();
    plot.set_x(AccessorScaleBinding::new(|r: &(f64, f64), _, _| r.0.into(), x));
    plot.set_y(AccessorScaleBinding::new(|r: &(f64, f64), _, _| r.1.into(), y));
    for _ in 0..5 {
        let rows: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let v = if rng.random_bool(0.05) {
                    f64::NAN
                } else {
                    rng.random_range(-80.0..80.0)
                };
                (i as f64 * 0.5, v)
            })
            .collect();
        plot.add_dataset(Dataset::shared(rows));
    }

    for name in ["linear", "monotone", "cardinal", "basis", "step"] {
        plot.set_interpolator_name(name).unwrap();
        let first = plot.draw_commands();
        let second = plot.draw_commands();
        assert_eq!(first, second, "{name}");
        for commands in &first {
            let path = commands[0].path().unwrap().to_string();
            assert!(!path.contains("NaN"), "{name}: {path}");
        }
    }
}
