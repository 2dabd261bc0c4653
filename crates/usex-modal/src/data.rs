use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Record-shaped modal data.
///
/// `merge` is a shallow overwrite: fields present in the patch replace the
/// current ones, everything else is kept.
///
/// ```rust
/// use usex_modal::ModalData;
///
/// #[derive(Clone, Default)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// #[derive(Default)]
/// struct PersonPatch {
///     name: Option<String>,
///     age: Option<u32>,
/// }
///
/// impl ModalData for Person {
///     type Patch = PersonPatch;
///     fn merge(&mut self, patch: PersonPatch) {
///         if let Some(name) = patch.name {
///             self.name = name;
///         }
///         if let Some(age) = patch.age {
///             self.age = age;
///         }
///     }
/// }
/// ```
pub trait ModalData: Clone + 'static {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

impl ModalData for () {
    type Patch = ();

    fn merge(&mut self, _patch: ()) {}
}

impl<K, V> ModalData for HashMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    type Patch = HashMap<K, V>;

    fn merge(&mut self, patch: Self::Patch) {
        self.extend(patch);
    }
}

impl<K, V> ModalData for BTreeMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    type Patch = BTreeMap<K, V>;

    fn merge(&mut self, patch: Self::Patch) {
        self.extend(patch);
    }
}

#[cfg(feature = "json")]
impl ModalData for serde_json::Map<String, serde_json::Value> {
    type Patch = serde_json::Map<String, serde_json::Value>;

    fn merge(&mut self, patch: Self::Patch) {
        self.extend(patch);
    }
}
