//! Contract-test crate: all checks live in `tests/contract_validation.rs`.
