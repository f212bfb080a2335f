pub mod revocation;

pub use revocation::RevocationStore;

#[cfg(test)]
pub use revocation::MockRevocationStore;
