/// Extension traits for futures and streams.
pub mod futures;
