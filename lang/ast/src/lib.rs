mod dump;
mod kind;
mod print;
mod token;
mod tree;
mod visit;

pub use dump::Dump;
pub use kind::NodeKind;
pub use token::*;
pub use tree::*;
pub use visit::Visitor;

pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;
pub type HashSet<V> = fxhash::FxHashSet<V>;
