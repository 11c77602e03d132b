mod provider;
mod token;

pub use provider::{
    AuthenticatedUser, DemoIdentityProvider, IdentityProvider, StoreIdentityProvider,
};
pub use token::{Admin, AuthToken, Authenticated, Rights, Role, AUTH_TOKEN_COOKIE};
