//! Email-keyed scanners and the breach-check adapter.

mod breach;
mod gravatar;
mod pgp;

pub use breach::{BreachTransport, HibpScanner, PlainTransport};
pub use gravatar::{GravatarProfileScanner, GravatarScanner};
pub use pgp::{OpenPgpKeysScanner, UbuntuKeyserverScanner};
