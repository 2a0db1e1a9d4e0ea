//! Circle packing for the root -> group -> item tree.
//!
//! Siblings are placed with a front-chain packer and wrapped in their minimal
//! enclosing circle, the same construction d3-hierarchy uses, so layouts match
//! the reference chart. Shuffling inside the enclosing-circle search uses a
//! fixed-seed LCG, keeping every layout deterministic.

use super::hierarchy::Hierarchy;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }

    fn with_radius(r: f64) -> Self {
        Self::new(0.0, 0.0, r)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Group { group: usize },
    Item { group: usize, item: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedNode {
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub r: f32,
    /// Sum of descendant item radii (the item's own radius for leaves).
    pub weight: f64,
}

impl PositionedNode {
    pub fn depth(&self) -> u8 {
        match self.kind {
            NodeKind::Root => 0,
            NodeKind::Group { .. } => 1,
            NodeKind::Item { .. } => 2,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Item { .. })
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= self.r * self.r
    }
}

/// Nodes in pre-order: root, then each group followed by its items. Siblings
/// appear in packing order (descending weight). The root sits at the origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackLayout {
    pub nodes: Vec<PositionedNode>,
}

impl PackLayout {
    pub fn root(&self) -> Option<&PositionedNode> {
        self.nodes.first()
    }

    pub fn groups(&self) -> impl Iterator<Item = &PositionedNode> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Group { .. }))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &PositionedNode> {
        self.nodes.iter().filter(|node| node.is_leaf())
    }
}

/// d3's linear congruential generator, seeded the same way.
pub(crate) struct Lcg {
    state: u64,
}

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub(crate) fn new() -> Self {
        Self { state: 1 }
    }

    fn next(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }
}

struct GroupFrame {
    group: usize,
    weight: f64,
    circle: Circle,
    items: Vec<(usize, f64)>,
    leaves: Vec<Circle>,
}

pub fn pack(hierarchy: &Hierarchy, diameter: f32, padding: f32) -> PackLayout {
    let size = f64::from(diameter.max(0.0));
    let padding = f64::from(padding.max(0.0));
    let mut random = Lcg::new();

    let mut frames = hierarchy
        .groups
        .iter()
        .enumerate()
        .map(|(group_index, group)| {
            let mut items = group
                .items
                .iter()
                .enumerate()
                .map(|(item_index, item)| (item_index, f64::from(item.radius.max(0.0))))
                .collect::<Vec<_>>();
            items.sort_by(|a, b| b.1.total_cmp(&a.1));
            let weight = items.iter().map(|(_, weight)| weight).sum();
            let leaves = items
                .iter()
                .map(|(_, weight)| Circle::with_radius(weight.sqrt()))
                .collect();
            GroupFrame {
                group: group_index,
                weight,
                circle: Circle::with_radius(0.0),
                items,
                leaves,
            }
        })
        .collect::<Vec<_>>();
    frames.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    let root_weight = frames.iter().map(|frame| frame.weight).sum::<f64>();

    if frames.is_empty() {
        return PackLayout::default();
    }

    let unpadded = pack_levels(&mut frames, 0.0, &mut random);
    let inset = if size > 0.0 {
        padding * unpadded / size
    } else {
        0.0
    };
    let root_radius = pack_levels(&mut frames, inset, &mut random);

    let k = if root_radius > 0.0 {
        size / (2.0 * root_radius)
    } else {
        0.0
    };

    let mut nodes = Vec::with_capacity(1 + frames.len() + hierarchy.item_count());
    nodes.push(PositionedNode {
        kind: NodeKind::Root,
        x: 0.0,
        y: 0.0,
        r: (root_radius * k) as f32,
        weight: root_weight,
    });

    for frame in &frames {
        let group_x = frame.circle.x * k;
        let group_y = frame.circle.y * k;
        nodes.push(PositionedNode {
            kind: NodeKind::Group { group: frame.group },
            x: group_x as f32,
            y: group_y as f32,
            r: (frame.circle.r * k) as f32,
            weight: frame.weight,
        });

        for ((item, weight), leaf) in frame.items.iter().zip(&frame.leaves) {
            nodes.push(PositionedNode {
                kind: NodeKind::Item {
                    group: frame.group,
                    item: *item,
                },
                x: (group_x + leaf.x * k) as f32,
                y: (group_y + leaf.y * k) as f32,
                r: (leaf.r * k) as f32,
                weight: *weight,
            });
        }
    }

    PackLayout { nodes }
}

/// Packs items inside each group, then groups inside the root. Circles are
/// inflated by `inset` while packing so siblings keep that gap. Returns the
/// root radius.
fn pack_levels(frames: &mut [GroupFrame], inset: f64, random: &mut Lcg) -> f64 {
    for frame in frames.iter_mut() {
        frame.circle.r = pack_padded(&mut frame.leaves, inset, random);
    }

    let mut group_circles = frames.iter().map(|frame| frame.circle).collect::<Vec<_>>();
    let root_radius = pack_padded(&mut group_circles, inset, random);
    for (frame, circle) in frames.iter_mut().zip(group_circles) {
        frame.circle = circle;
    }
    root_radius
}

fn pack_padded(circles: &mut [Circle], inset: f64, random: &mut Lcg) -> f64 {
    if inset > 0.0 {
        circles.iter_mut().for_each(|circle| circle.r += inset);
    }
    let enclosing = pack_siblings(circles, random);
    if inset > 0.0 {
        circles.iter_mut().for_each(|circle| circle.r -= inset);
    }
    enclosing + inset
}

/// Places circles tangent to each other around the origin and returns the
/// radius of the circle enclosing them all.
pub(crate) fn pack_siblings(circles: &mut [Circle], random: &mut Lcg) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    circles[2] = place(circles[1], circles[0], circles[2]);

    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    let (mut a, mut b) = (0usize, 1usize);
    next[0] = 1;
    prev[2] = 1;
    next[1] = 2;
    prev[0] = 2;
    next[2] = 0;
    prev[1] = 0;

    let mut i = 3;
    'pack: while i < n {
        circles[i] = place(circles[a], circles[b], circles[i]);
        let c = i;

        // Walk the front chain both ways and restart from the first circle the
        // candidate overlaps.
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        let mut best = score(circles, &next, a);
        let mut cursor = c;
        loop {
            cursor = next[cursor];
            if cursor == b {
                break;
            }
            let candidate = score(circles, &next, cursor);
            if candidate < best {
                a = cursor;
                best = candidate;
            }
        }
        b = next[a];
        i += 1;
    }

    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }

    let Some(enclosing) = enclose(&chain, random) else {
        return 0.0;
    };
    for circle in circles.iter_mut() {
        circle.x -= enclosing.x;
        circle.y -= enclosing.y;
    }
    enclosing.r
}

fn place(b: Circle, a: Circle, c: Circle) -> Circle {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    let mut placed = c;

    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            placed.x = b.x - x * dx - y * dy;
            placed.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            placed.x = a.x + x * dx - y * dy;
            placed.y = a.y + x * dy + y * dx;
        }
    } else {
        placed.x = a.x + c.r;
        placed.y = a.y;
    }
    placed
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn score(circles: &[Circle], next: &[usize], node: usize) -> f64 {
    let a = circles[node];
    let b = circles[next[node]];
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Smallest circle enclosing every input circle.
pub(crate) fn enclose(circles: &[Circle], random: &mut Lcg) -> Option<Circle> {
    let mut shuffled = circles.to_vec();
    shuffle(&mut shuffled, random);

    let mut basis: Vec<Circle> = Vec::new();
    let mut enclosing: Option<Circle> = None;
    let mut i = 0;
    while i < shuffled.len() {
        let p = shuffled[i];
        if let Some(current) = enclosing
            && encloses_weak(current, p)
        {
            i += 1;
            continue;
        }

        let Some(extended) = extend_basis(&basis, p) else {
            break;
        };
        basis = extended;
        enclosing = enclose_basis(&basis);
        i = 0;
    }
    enclosing
}

fn shuffle(circles: &mut [Circle], random: &mut Lcg) {
    let mut m = circles.len();
    while m > 0 {
        let i = (random.next() * m as f64) as usize;
        m -= 1;
        circles.swap(m, i);
    }
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    for &b in basis {
        if encloses_not(p, b) && encloses_weak_all(enclose_basis2(b, p), basis) {
            return Some(vec![b, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (basis[i], basis[j]);
            if encloses_not(enclose_basis2(bi, bj), p)
                && encloses_not(enclose_basis2(bi, p), bj)
                && encloses_not(enclose_basis2(bj, p), bi)
                && encloses_weak_all(enclose_basis3(bi, bj, p), basis)
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }

    None
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Option<Circle> {
    match *basis {
        [a] => Some(a),
        [a, b] => Some(enclose_basis2(a, b)),
        [a, b, c] => Some(enclose_basis3(a, b, c)),
        _ => None,
    }
}

fn enclose_basis2(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    Circle::new(
        (a.x + b.x + x21 / l * r21) / 2.0,
        (a.y + b.y + y21 / l * r21) / 2.0,
        (l + a.r + b.r) / 2.0,
    )
}

fn enclose_basis3(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle::new(x1 + xa + xb * r, y1 + ya + yb * r, r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::hierarchy::{Group, Item};
    use crate::chart::scale::SqrtScale;
    use crate::chart::selection::SelectionState;

    const EPSILON: f64 = 1e-6;

    fn assert_no_overlap(circles: &[Circle]) {
        for (i, a) in circles.iter().enumerate() {
            for b in &circles[i + 1..] {
                let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(
                    distance + 1e-4 >= a.r + b.r,
                    "{a:?} overlaps {b:?} (distance {distance})"
                );
            }
        }
    }

    fn assert_enclosed(outer: Circle, circles: &[Circle]) {
        for circle in circles {
            let distance = ((outer.x - circle.x).powi(2) + (outer.y - circle.y).powi(2)).sqrt();
            assert!(distance + circle.r <= outer.r + 1e-4, "{circle:?} escapes {outer:?}");
        }
    }

    fn group(name: &str, radii: &[f32]) -> Group {
        Group {
            name: name.to_owned(),
            total: radii.iter().map(|r| f64::from(*r)).sum(),
            formatted_values: Vec::new(),
            formatted_total: String::new(),
            color: None,
            items: radii
                .iter()
                .enumerate()
                .map(|(index, radius)| Item {
                    name: format!("{name}-{index}"),
                    group: name.to_owned(),
                    value: f64::from(*radius),
                    formatted_value: radius.to_string(),
                    elem: Some(index as i64),
                    radius: *radius,
                    state: SelectionState::Optional,
                })
                .collect(),
        }
    }

    fn hierarchy(groups: Vec<Group>) -> Hierarchy {
        Hierarchy {
            groups,
            scale: SqrtScale::new((0.0, 1.0), (0.0, 1.0)),
        }
    }

    #[test]
    fn lcg_matches_reference_sequence() {
        let mut random = Lcg::new();
        let first = random.next();
        let second = random.next();

        assert!((first - 1_015_568_748.0 / 4_294_967_296.0).abs() < 1e-12);
        assert!((second - 1_586_005_467.0 / 4_294_967_296.0).abs() < 1e-12);
    }

    #[test]
    fn one_and_two_siblings() {
        let mut random = Lcg::new();
        let mut single = vec![Circle::with_radius(3.0)];
        assert_eq!(pack_siblings(&mut single, &mut random), 3.0);
        assert_eq!((single[0].x, single[0].y), (0.0, 0.0));

        let mut pair = vec![Circle::with_radius(2.0), Circle::with_radius(1.0)];
        assert_eq!(pack_siblings(&mut pair, &mut random), 3.0);
        assert_eq!(pair[0].x, -1.0);
        assert_eq!(pair[1].x, 2.0);
    }

    #[test]
    fn many_siblings_do_not_overlap_and_stay_enclosed() {
        let mut random = Lcg::new();
        let mut circles = [9.0, 7.5, 6.0, 5.0, 4.0, 3.5, 3.0, 2.0, 2.0, 1.0, 1.0, 0.5]
            .into_iter()
            .map(Circle::with_radius)
            .collect::<Vec<_>>();

        let radius = pack_siblings(&mut circles, &mut random);

        assert_no_overlap(&circles);
        assert_enclosed(Circle::new(0.0, 0.0, radius), &circles);
        assert!(radius >= 9.0 + 7.5 - EPSILON);
    }

    #[test]
    fn enclose_covers_every_circle() {
        let circles = [
            Circle::new(0.0, 0.0, 1.0),
            Circle::new(5.0, 0.0, 2.0),
            Circle::new(2.0, 4.0, 1.5),
            Circle::new(1.0, 1.0, 0.5),
        ];
        let enclosing = enclose(&circles, &mut Lcg::new()).unwrap();

        assert_enclosed(enclosing, &circles);
        assert!(enclosing.r < 6.0);
    }

    #[test]
    fn siblings_pack_in_descending_weight() {
        let layout = pack(
            &hierarchy(vec![group("ten", &[10.0]), group("fifty", &[50.0]), group("twenty", &[20.0])]),
            400.0,
            3.0,
        );

        let weights = layout.groups().map(|node| node.weight).collect::<Vec<_>>();
        assert_eq!(weights, vec![50.0, 20.0, 10.0]);
        let order = layout
            .groups()
            .map(|node| match node.kind {
                NodeKind::Group { group } => group,
                _ => usize::MAX,
            })
            .collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn items_are_ordered_within_their_group() {
        let layout = pack(&hierarchy(vec![group("g", &[5.0, 30.0, 12.0])]), 300.0, 2.0);

        let items = layout
            .leaves()
            .map(|node| match node.kind {
                NodeKind::Item { item, .. } => item,
                _ => usize::MAX,
            })
            .collect::<Vec<_>>();
        assert_eq!(items, vec![1, 2, 0]);
    }

    #[test]
    fn root_is_centered_and_fills_the_diameter() {
        let layout = pack(
            &hierarchy(vec![group("a", &[40.0, 20.0, 35.0]), group("b", &[25.0, 60.0])]),
            500.0,
            3.0,
        );
        let root = layout.root().unwrap();

        assert_eq!((root.x, root.y), (0.0, 0.0));
        assert!((root.r - 250.0).abs() < 1e-3);
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn children_stay_inside_parents_and_apart() {
        let layout = pack(
            &hierarchy(vec![
                group("a", &[40.0, 20.0, 35.0, 10.0]),
                group("b", &[25.0, 60.0]),
                group("c", &[15.0]),
            ]),
            600.0,
            3.0,
        );
        let as_circle =
            |node: &PositionedNode| Circle::new(f64::from(node.x), f64::from(node.y), f64::from(node.r));

        let root = as_circle(layout.root().unwrap());
        let groups = layout.groups().map(as_circle).collect::<Vec<_>>();
        assert_enclosed(root, &groups);
        assert_no_overlap(&groups);

        let mut current_group = None;
        let mut members = Vec::new();
        for node in &layout.nodes[1..] {
            match node.kind {
                NodeKind::Group { .. } => {
                    if let Some(parent) = current_group.take() {
                        assert_enclosed(parent, &members);
                        assert_no_overlap(&members);
                        members.clear();
                    }
                    current_group = Some(as_circle(node));
                }
                _ => members.push(as_circle(node)),
            }
        }
        if let Some(parent) = current_group {
            assert_enclosed(parent, &members);
            assert_no_overlap(&members);
        }
    }

    #[test]
    fn heavier_group_gets_the_larger_circle() {
        let layout = pack(&hierarchy(vec![group("G1", &[80.0, 120.0]), group("G2", &[20.0])]), 400.0, 3.0);
        let radii = layout.groups().map(|node| node.r).collect::<Vec<_>>();

        assert!(radii[0] > radii[1]);
    }

    #[test]
    fn empty_hierarchy_has_no_nodes() {
        assert!(pack(&hierarchy(Vec::new()), 300.0, 3.0).nodes.is_empty());
    }

    #[test]
    fn hit_testing_uses_the_circle() {
        let node = PositionedNode {
            kind: NodeKind::Item { group: 0, item: 0 },
            x: 10.0,
            y: 10.0,
            r: 5.0,
            weight: 5.0,
        };

        assert!(node.contains(13.0, 13.0));
        assert!(!node.contains(15.0, 15.0));
    }
}
