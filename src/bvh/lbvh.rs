//! Linear bounding volume hierarchy over zone AABBs
//!
//! Topology comes from a Morton sort of leaf centroids and the
//! longest-common-prefix split: n leaves produce n-1 internal nodes in O(n),
//! with internal node 0 as the root. Internal nodes live at indices
//! `[0, n-1)` and leaves at `[n-1, 2n-1)` in the combined numbering used by
//! child and parent links.
//!
//! All build scratch (code pairs, sort buffers, visit counters) is retained
//! between rebuilds, so steady-state rebuilds allocate nothing once capacity
//! has grown.

use std::collections::HashMap;

use crate::core::types::Vec3;
use crate::math::{Aabb, MortonGrid, RadixSorter};
use crate::zone::ZoneId;

const NO_PARENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default)]
struct InternalNode {
    aabb: Aabb,
    left: u32,
    right: u32,
}

/// LBVH over one partition of the zone set (static or dynamic)
pub struct Lbvh {
    /// Leaf AABBs in Morton order
    leaf_aabbs: Vec<Aabb>,
    /// Zone ids parallel to `leaf_aabbs`
    leaf_zones: Vec<ZoneId>,
    nodes: Vec<InternalNode>,
    /// Parent link per combined index; `NO_PARENT` for the root
    parents: Vec<u32>,
    /// Zone id to leaf slot
    leaf_of: HashMap<ZoneId, u32>,
    // Build scratch, reused across rebuilds
    code_pairs: Vec<(u32, u32)>,
    sorted_codes: Vec<u32>,
    sorter: RadixSorter,
    visit: Vec<u8>,
}

impl Lbvh {
    pub fn new() -> Self {
        Self {
            leaf_aabbs: Vec::new(),
            leaf_zones: Vec::new(),
            nodes: Vec::new(),
            parents: Vec::new(),
            leaf_of: HashMap::new(),
            code_pairs: Vec::new(),
            sorted_codes: Vec::new(),
            sorter: RadixSorter::new(),
            visit: Vec::new(),
        }
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.leaf_zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_zones.is_empty()
    }

    /// Whether the given zone currently has a leaf in this tree
    pub fn contains(&self, id: ZoneId) -> bool {
        self.leaf_of.contains_key(&id)
    }

    /// Leaf AABB for a zone, if present
    pub fn leaf_aabb(&self, id: ZoneId) -> Option<Aabb> {
        self.leaf_of.get(&id).map(|&slot| self.leaf_aabbs[slot as usize])
    }

    /// Full rebuild from an unsorted (id, aabb) set
    ///
    /// The input order is the tie-break for equal Morton codes; callers pass
    /// zones in ascending id order so rebuilds are deterministic.
    pub fn rebuild(&mut self, zones: &[(ZoneId, Aabb)]) {
        let n = zones.len();
        self.leaf_aabbs.clear();
        self.leaf_zones.clear();
        self.leaf_of.clear();
        self.nodes.clear();
        self.parents.clear();
        if n == 0 {
            return;
        }

        // Morton codes from centroids normalized to the global centroid bounds
        let mut bounds = Aabb::from_point(zones[0].1.center());
        for (_, aabb) in zones.iter() {
            bounds.expand(aabb.center());
        }
        let grid = MortonGrid::from_bounds(bounds.min, bounds.max);

        self.code_pairs.clear();
        self.code_pairs.extend(
            zones
                .iter()
                .enumerate()
                .map(|(i, (_, aabb))| (grid.code(aabb.center()), i as u32)),
        );
        self.sorter.sort(&mut self.code_pairs);

        self.sorted_codes.clear();
        for &(code, src) in self.code_pairs.iter() {
            let (id, aabb) = zones[src as usize];
            self.leaf_of.insert(id, self.leaf_zones.len() as u32);
            self.leaf_zones.push(id);
            self.leaf_aabbs.push(aabb);
            self.sorted_codes.push(code);
        }

        self.parents.resize(2 * n - 1, NO_PARENT);
        if n == 1 {
            return;
        }

        self.build_topology();
        self.compute_internal_aabbs();
    }

    /// Update leaf AABBs in place and recompute unions along parent chains
    ///
    /// Only valid while the zone set is unchanged; the store decides when a
    /// mutation batch is small enough to refit instead of rebuild.
    pub fn refit(&mut self, updates: &[(ZoneId, Aabb)]) {
        let leaf_base = self.nodes.len() as u32;
        for &(id, aabb) in updates {
            if let Some(&slot) = self.leaf_of.get(&id) {
                self.leaf_aabbs[slot as usize] = aabb;
            }
        }
        for &(id, _) in updates {
            let Some(&slot) = self.leaf_of.get(&id) else { continue };
            let mut node = self.parents[(leaf_base + slot) as usize];
            while node != NO_PARENT {
                let merged = self
                    .child_aabb(self.nodes[node as usize].left)
                    .merged(&self.child_aabb(self.nodes[node as usize].right));
                if merged == self.nodes[node as usize].aabb {
                    break;
                }
                self.nodes[node as usize].aabb = merged;
                node = self.parents[node as usize];
            }
        }
    }

    /// Append every zone whose leaf AABB contains `p` to `out`
    ///
    /// Iterative descent with a caller-owned stack; result order is fixed
    /// for a given tree state.
    pub fn stab(&self, p: Vec3, stack: &mut Vec<u32>, out: &mut Vec<ZoneId>) {
        let n = self.leaf_zones.len();
        if n == 0 {
            return;
        }
        if n == 1 {
            if self.leaf_aabbs[0].contains_point(p) {
                out.push(self.leaf_zones[0]);
            }
            return;
        }

        let leaf_base = self.nodes.len() as u32;
        stack.clear();
        stack.push(0);
        while let Some(idx) = stack.pop() {
            if idx >= leaf_base {
                let slot = (idx - leaf_base) as usize;
                if self.leaf_aabbs[slot].contains_point(p) {
                    out.push(self.leaf_zones[slot]);
                }
            } else {
                let node = &self.nodes[idx as usize];
                if node.aabb.contains_point(p) {
                    stack.push(node.right);
                    stack.push(node.left);
                }
            }
        }
    }

    fn child_aabb(&self, child: u32) -> Aabb {
        let leaf_base = self.nodes.len() as u32;
        if child >= leaf_base {
            self.leaf_aabbs[(child - leaf_base) as usize]
        } else {
            self.nodes[child as usize].aabb
        }
    }

    /// Longest-common-prefix distance between sorted code positions
    ///
    /// Out-of-range `j` yields -1 so range searches stop at the ends. Equal
    /// codes fall back to the index bits, which keeps every split well
    /// defined when many zones share a centroid cell.
    fn delta(&self, i: i64, j: i64) -> i64 {
        if j < 0 || j >= self.sorted_codes.len() as i64 {
            return -1;
        }
        let ci = self.sorted_codes[i as usize];
        let cj = self.sorted_codes[j as usize];
        if ci == cj {
            32 + ((i as u32) ^ (j as u32)).leading_zeros() as i64
        } else {
            (ci ^ cj).leading_zeros() as i64
        }
    }

    fn build_topology(&mut self) {
        let n = self.leaf_zones.len();
        let leaf_base = (n - 1) as u32;
        self.nodes.resize(n - 1, InternalNode::default());

        for i in 0..(n - 1) as i64 {
            // Direction of the range covered by internal node i
            let d: i64 = if self.delta(i, i + 1) >= self.delta(i, i - 1) { 1 } else { -1 };
            let delta_min = self.delta(i, i - d);

            // Exponential then binary search for the far end
            let mut lmax: i64 = 2;
            while self.delta(i, i + lmax * d) > delta_min {
                lmax *= 2;
            }
            let mut l: i64 = 0;
            let mut t = lmax / 2;
            while t >= 1 {
                if self.delta(i, i + (l + t) * d) > delta_min {
                    l += t;
                }
                t /= 2;
            }
            let j = i + l * d;

            // Split position: highest-differing-bit boundary inside [i, j]
            let delta_node = self.delta(i, j);
            let mut s: i64 = 0;
            let mut t = (l + 1) / 2;
            loop {
                if self.delta(i, i + (s + t) * d) > delta_node {
                    s += t;
                }
                if t <= 1 {
                    break;
                }
                t = (t + 1) / 2;
            }
            let gamma = i + s * d + d.min(0);

            let (lo, hi) = (i.min(j), i.max(j));
            let left = if lo == gamma {
                leaf_base + gamma as u32
            } else {
                gamma as u32
            };
            let right = if hi == gamma + 1 {
                leaf_base + (gamma + 1) as u32
            } else {
                (gamma + 1) as u32
            };

            self.nodes[i as usize].left = left;
            self.nodes[i as usize].right = right;
            self.parents[left as usize] = i as u32;
            self.parents[right as usize] = i as u32;
        }
    }

    /// Bottom-up union pass: each internal node is computed on the second
    /// arrival so both children are final when it runs.
    fn compute_internal_aabbs(&mut self) {
        let n = self.leaf_zones.len();
        let leaf_base = (n - 1) as u32;
        self.visit.clear();
        self.visit.resize(n - 1, 0);

        for slot in 0..n as u32 {
            let mut node = self.parents[(leaf_base + slot) as usize];
            while node != NO_PARENT {
                if self.visit[node as usize] == 0 {
                    self.visit[node as usize] = 1;
                    break;
                }
                let merged = self
                    .child_aabb(self.nodes[node as usize].left)
                    .merged(&self.child_aabb(self.nodes[node as usize].right));
                self.nodes[node as usize].aabb = merged;
                node = self.parents[node as usize];
            }
        }
    }
}

impl Default for Lbvh {
    fn default() -> Self {
        Self::new()
    }
}
