//! Proxy parent graph diagnostics
//!
//! Proxies reference their parents by UUID, possibly across modules. Nothing
//! stops a user from building a loop (A under B under A). The build does not
//! check for this; these helpers let tooling report it up front.
//!
//! Cycles are found with Tarjan's SCC algorithm in O(V+E). Any component with
//! more than one proxy, or a proxy parented to itself, is a cycle.
//!
//! # Determinism
//!
//! - Vertices are indexed in lexicographic UUID order
//! - Components are reported with their members sorted

use std::collections::{BTreeMap, BTreeSet};

/// Child → parent edges between proxies
#[derive(Debug, Clone, Default)]
pub struct ProxyGraph {
    /// Proxy UUID → vertex index (sorted)
    uuid_to_index: BTreeMap<String, usize>,
    index_to_uuid: Vec<String>,
    /// child index → parent index
    parent_of: Vec<Option<usize>>,
    /// (child, parent) where the parent is not a known proxy
    dangling: Vec<(String, String)>,
}

impl ProxyGraph {
    /// Build from `(proxy_uuid, parent_uuid)` pairs
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let edges: Vec<(&str, Option<&str>)> = edges.into_iter().collect();
        let uuids: BTreeSet<&str> = edges.iter().map(|(uuid, _)| *uuid).collect();
        let uuid_to_index: BTreeMap<String, usize> = uuids
            .iter()
            .enumerate()
            .map(|(idx, uuid)| (uuid.to_string(), idx))
            .collect();
        let index_to_uuid: Vec<String> = uuids.iter().map(|u| u.to_string()).collect();

        let mut parent_of = vec![None; index_to_uuid.len()];
        let mut dangling = Vec::new();
        for (child, parent) in edges {
            let Some(parent) = parent else { continue };
            let child_idx = uuid_to_index[child];
            match uuid_to_index.get(parent) {
                Some(parent_idx) => parent_of[child_idx] = Some(*parent_idx),
                None => dangling.push((child.to_string(), parent.to_string())),
            }
        }

        Self {
            uuid_to_index,
            index_to_uuid,
            parent_of,
            dangling,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.index_to_uuid.len()
    }

    pub fn parent_of(&self, uuid: &str) -> Option<&str> {
        let idx = *self.uuid_to_index.get(uuid)?;
        self.parent_of[idx].map(|p| self.index_to_uuid[p].as_str())
    }

    /// Edges whose parent UUID matches no proxy
    pub fn dangling(&self) -> &[(String, String)] {
        &self.dangling
    }

    /// Every parent loop, as sorted sets of proxy UUIDs
    pub fn find_cycles(&self) -> Vec<BTreeSet<String>> {
        let n = self.vertex_count();
        let mut state = TarjanState {
            index: 0,
            indices: vec![None; n],
            lowlinks: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            sccs: Vec::new(),
        };

        for v in 0..n {
            if state.indices[v].is_none() {
                self.strongconnect(v, &mut state);
            }
        }

        state
            .sccs
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|v| self.parent_of[*v] == Some(*v)))
            .map(|scc| scc.into_iter().map(|v| self.index_to_uuid[v].clone()).collect())
            .collect()
    }

    fn strongconnect(&self, v: usize, state: &mut TarjanState) {
        state.indices[v] = Some(state.index);
        state.lowlinks[v] = state.index;
        state.index += 1;
        state.stack.push(v);
        state.on_stack[v] = true;

        if let Some(w) = self.parent_of[v] {
            match state.indices[w] {
                None => {
                    self.strongconnect(w, state);
                    state.lowlinks[v] = state.lowlinks[v].min(state.lowlinks[w]);
                }
                Some(w_index) if state.on_stack[w] => {
                    state.lowlinks[v] = state.lowlinks[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(state.lowlinks[v]) == state.indices[v] {
            let mut scc = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                scc.push(w);
                if w == v {
                    break;
                }
            }
            scc.sort_unstable();
            state.sccs.push(scc);
        }
    }
}

struct TarjanState {
    index: usize,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}
