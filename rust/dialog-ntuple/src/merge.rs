//! Merging a clarification descriptor into a partial n-tuple.
//!
//! The merge is structural: every pending field anywhere in the nested
//! mappings of the original is bound to the whole descriptor, and every other
//! field is kept as is. A pending field whose placeholder was itself a
//! mapping is replaced, never deep-merged.

use crate::ntuple::{Entry, Ntuple};

impl Ntuple {
    /// Bind every pending field of `self` to `descriptor`.
    ///
    /// Leaves are returned unchanged; the result contains no pending field
    /// unless the descriptor itself carries one.
    pub fn clarify(&self, descriptor: &Ntuple) -> Ntuple {
        match self {
            Ntuple::Leaf(_) => self.clone(),
            Ntuple::Node(fields) => Ntuple::Node(
                fields
                    .iter()
                    .map(|(name, entry)| {
                        let entry = match entry {
                            Entry::Pending(_) => Entry::Bound(descriptor.clone()),
                            Entry::Bound(value) => Entry::Bound(value.clarify(descriptor)),
                        };
                        (name.clone(), entry)
                    })
                    .collect(),
            ),
        }
    }
}
