mod authenticate;
pub mod exec;

pub use authenticate::{AuthScheme, AuthenticationResolver};
pub use exec::{ExecCredential, ExecCredentialProvider};
