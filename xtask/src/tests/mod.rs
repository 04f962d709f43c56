//! Host test runners.
