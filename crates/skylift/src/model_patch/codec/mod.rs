//! Wire codecs for update batches.

pub mod json;
