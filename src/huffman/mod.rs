pub mod decoder;
pub mod encoder;
pub mod format;
pub mod frequency;
pub mod tree;

pub use decoder::decode;
pub use encoder::{encode, max_encoded_len};
pub use format::{HuffmanHeader, HUFFMAN_FORMAT};
pub use frequency::FrequencyTable;
pub use tree::{Code, CodeTable, HuffmanTree, NodeId, NodeKind};
