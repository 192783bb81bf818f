pub mod pages;

pub use pages::*;
