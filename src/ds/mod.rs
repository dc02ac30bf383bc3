pub mod freq_heap;
pub mod ordered_index;

pub use freq_heap::FreqHeap;
pub use ordered_index::OrderedIndex;
