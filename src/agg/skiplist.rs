//! Arena-backed skip list keyed by timestamp.
//!
//! The merge state's accumulator structure: nodes live in a `Vec` arena and
//! reference each other by `u32` index, never by address, so the structure
//! is freely clonable and released as one allocation when the state is
//! finalized. Expected O(log n) search and insert; level heights come from
//! an explicit xorshift state seeded by the caller rather than a hidden
//! global RNG.

use smallvec::SmallVec;
use tempora_types::{Timestamp, Value};

/// Hard cap on tower height. The configured maximum is clamped to this.
pub(crate) const MAX_LEVEL: usize = 32;

const NIL: u32 = u32::MAX;

/// One accumulator node.
///
/// `acc` is the aggregate value at `key`. `left` carries the limit the
/// aggregate approaches just before `key` when that differs from `acc`
/// (a jump on entry); `right` carries the value continuing past `key` when
/// that differs (a jump on exit). `exclusive` marks a right-open run end:
/// no contribution at `key` itself, `acc` holds the closing limit.
/// `linked` marks that the aggregate stays defined from this node to the
/// next.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub key: Timestamp,
    pub acc: Value,
    pub left: Option<Value>,
    pub right: Option<Value>,
    pub exclusive: bool,
    pub linked: bool,
    next: SmallVec<[u32; 8]>,
}

#[derive(Debug, Clone)]
pub(crate) struct SkipList {
    nodes: Vec<Node>,
    head: Vec<u32>,
    level: usize,
    max_level: usize,
    rng: u64,
}

impl SkipList {
    pub fn new(max_level: usize, seed: u64) -> Self {
        let max_level = max_level.clamp(2, MAX_LEVEL);
        Self {
            nodes: Vec::new(),
            head: vec![NIL; max_level],
            level: 1,
            max_level,
            // A zero state would lock the xorshift generator at zero.
            rng: seed | 1,
        }
    }

    /// Empty list sharing this list's configuration and generator state.
    pub fn spawn_empty(&self) -> SkipList {
        SkipList::new(self.max_level, self.rng.rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: u32) -> &Node {
        &self.nodes[idx as usize]
    }

    pub fn node_mut(&mut self, idx: u32) -> &mut Node {
        &mut self.nodes[idx as usize]
    }

    /// Level-0 successor.
    pub fn next(&self, idx: u32) -> Option<u32> {
        let nxt = self.nodes[idx as usize].next[0];
        (nxt != NIL).then_some(nxt)
    }

    /// Index of the exact key, if present.
    pub fn find(&self, key: Timestamp) -> Option<u32> {
        let (_, found) = self.search(key);
        found
    }

    /// Index of the last node with a key strictly below `key`.
    pub fn pred(&self, key: Timestamp) -> Option<u32> {
        let (update, _) = self.search(key);
        (update[0] != NIL).then_some(update[0])
    }

    /// Index of the first node with a key at or above `key`.
    pub fn lower_bound(&self, key: Timestamp) -> Option<u32> {
        let (update, _) = self.search(key);
        let candidate = self.forward(update[0], 0);
        (candidate != NIL).then_some(candidate)
    }

    /// Keys in `[lower, upper]`, in order.
    pub fn keys_in_range(&self, lower: Timestamp, upper: Timestamp) -> Vec<Timestamp> {
        let mut keys = Vec::new();
        let mut cur = self.lower_bound(lower);
        while let Some(idx) = cur {
            let node = self.node(idx);
            if node.key > upper {
                break;
            }
            keys.push(node.key);
            cur = self.next(idx);
        }
        keys
    }

    /// Insert a node under an absent key. Expected O(log n).
    pub fn insert(
        &mut self,
        key: Timestamp,
        acc: Value,
        left: Option<Value>,
        right: Option<Value>,
        exclusive: bool,
        linked: bool,
    ) -> u32 {
        let (mut update, found) = self.search(key);
        debug_assert!(found.is_none(), "insert requires an absent key");
        let height = self.random_level();
        if height > self.level {
            update.resize(height, NIL);
            self.level = height;
        }
        let idx = self.nodes.len() as u32;
        let mut next = SmallVec::with_capacity(height);
        for lvl in 0..height {
            next.push(self.forward(update[lvl], lvl));
        }
        self.nodes.push(Node {
            key,
            acc,
            left,
            right,
            exclusive,
            linked,
            next,
        });
        for lvl in 0..height {
            match update[lvl] {
                NIL => self.head[lvl] = idx,
                pred => self.nodes[pred as usize].next[lvl] = idx,
            }
        }
        idx
    }

    /// In-order iteration over the nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        let mut cur = self.head[0];
        std::iter::from_fn(move || {
            if cur == NIL {
                return None;
            }
            let node = &self.nodes[cur as usize];
            cur = node.next[0];
            Some(node)
        })
    }

    fn forward(&self, from: u32, lvl: usize) -> u32 {
        match from {
            NIL => self.head[lvl],
            idx => self.nodes[idx as usize].next[lvl],
        }
    }

    /// Per-level predecessors of `key` (NIL meaning the head sentinel) plus
    /// the exact-match index when the key is present.
    fn search(&self, key: Timestamp) -> (Vec<u32>, Option<u32>) {
        let mut update = vec![NIL; self.level];
        let mut cur = NIL;
        for lvl in (0..self.level).rev() {
            loop {
                let nxt = self.forward(cur, lvl);
                if nxt != NIL && self.nodes[nxt as usize].key < key {
                    cur = nxt;
                } else {
                    break;
                }
            }
            update[lvl] = cur;
        }
        let candidate = self.forward(cur, 0);
        let found =
            (candidate != NIL && self.nodes[candidate as usize].key == key).then_some(candidate);
        (update, found)
    }

    /// Geometric tower height with p = 1/2, from an xorshift64* step.
    fn random_level(&mut self) -> usize {
        let mut x = self.rng;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        let mut level = 1;
        while level < self.max_level && (bits >> level) & 1 == 1 {
            level += 1;
        }
        level
    }
}
