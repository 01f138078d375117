//! Plain data describing one backup lineage: where it lives in the bucket,
//! how to reach the database and what each dump is called.

pub mod artifact;
pub mod credentials;
pub mod target;
