//! Low-level numerical kernels of the eigensolver.

pub mod davidson;

pub use davidson::{
    RitzStep, append_random_vectors, generate_random_vectors, max_abs, new_directions,
    orthonormalize, rayleigh_ritz,
};
