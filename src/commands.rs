//! Commands exposed by the binary, implemented on [`crate::App`].

mod propagate;

pub use propagate::propagate;
