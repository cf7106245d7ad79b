//! Components are the layers the blog service is assembled from, each with
//! a trait defining its interface. A higher-level component requires an
//! `Arc<C>` of the lower-level component in its constructor and calls the
//! functions defined on it.

/// Components dealing with storing blog entities.
pub mod store;
