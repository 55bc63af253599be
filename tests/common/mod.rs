#[path = "../../src/cert/fixtures.rs"]
mod fixtures;

pub use fixtures::self_signed;
