//! Replay key composition

use shared_types::{Interaction, ParsedToken, ReplayScope};

/// Build the replay key for a verified token under `scope`.
///
/// The base key identifies one issued component instance:
/// `route|tenant|message|nonce`. The message comes from the token when it
/// was bound at build time, otherwise from the event. `User` and `Channel`
/// scopes append the interacting actor or channel, so the same instance can
/// be used once by each of them. `None` disables tracking.
pub fn replay_key(
    scope: ReplayScope,
    token: &ParsedToken,
    interaction: &Interaction,
) -> Option<String> {
    let message = token
        .payload
        .message
        .as_ref()
        .or(interaction.message.as_ref())
        .map(|m| m.as_str())
        .unwrap_or("-");

    let base = format!(
        "{}|{}|{}|{}",
        token.route_key(),
        token.payload.tenant_label(),
        message,
        token.payload.nonce
    );

    match scope {
        ReplayScope::Id => Some(base),
        ReplayScope::User => Some(format!("{}|u:{}", base, interaction.actor)),
        ReplayScope::Channel => Some(format!("{}|c:{}", base, interaction.channel)),
        ReplayScope::None => None,
    }
}
