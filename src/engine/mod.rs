pub mod carousel;
pub mod compliance;
pub mod fare;
pub mod recommendation;
