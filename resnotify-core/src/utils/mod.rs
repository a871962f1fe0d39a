pub mod backoff;
pub mod poison;
