//! Forward cursor over a `get_all` snapshot.
//!
//! Used for extension chains, where each plugin may hand control to the
//! next one registered under the same key:
//!
//! ```ignore
//! type Filter = fn(&mut PluginIter, &str) -> String;
//! fn upper(rest: &mut PluginIter, s: &str) -> String {
//!     let s = s.to_uppercase();
//!     match rest.next() {
//!         Some(next) => (next.plugin_as::<Filter>().unwrap())(rest, &s),
//!         None => s,
//!     }
//! }
//! ```

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::meta::PluginMeta;

/// Single-pass iterator over a list of plugins. Once exhausted it keeps
/// returning `None`.
#[derive(Debug, Clone)]
pub struct PluginIter {
    plugins: Vec<Arc<PluginMeta>>,
    idx: usize,
}

/// Wrap a list of plugins, usually from [`Namespace::get_all`](crate::Namespace::get_all).
pub fn iter_plugins(plugins: Vec<Arc<PluginMeta>>) -> PluginIter {
    PluginIter { plugins, idx: 0 }
}

impl Iterator for PluginIter {
    type Item = Arc<PluginMeta>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.plugins.get(self.idx)?.clone();
        self.idx += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.plugins.len() - self.idx;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PluginIter {}
impl FusedIterator for PluginIter {}
