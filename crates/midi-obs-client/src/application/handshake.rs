//! Reply to the server's `Hello`.

use midi_obs_core::auth::derive_auth_string;
use midi_obs_core::protocol::messages::{
    HelloMessage, IdentifyMessage, EVENT_SUBSCRIPTIONS_NONE, RPC_VERSION,
};

/// Builds the `Identify` answer to `hello`.
///
/// The auth string is included only when OBS sent a challenge *and* a
/// non-empty password is configured.  Without a password the `Identify` goes
/// out bare and OBS closes the socket, which the caller sees as a close.
pub fn identify_for(hello: &HelloMessage, password: Option<&str>) -> IdentifyMessage {
    let authentication = match (&hello.authentication, password) {
        (Some(challenge), Some(password)) if !password.is_empty() => Some(derive_auth_string(
            password,
            &challenge.salt,
            &challenge.challenge,
        )),
        _ => None,
    };

    IdentifyMessage {
        rpc_version: RPC_VERSION,
        authentication,
        event_subscriptions: EVENT_SUBSCRIPTIONS_NONE,
    }
}
