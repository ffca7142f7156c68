//! # Core Domain Entities
//!
//! Identifiers, the token payload, verification contexts and the inbound
//! interaction event.
//!
//! ## Token Payload Keys
//!
//! The payload rides inside a length-capped identifier, so its JSON keys are
//! single letters: `u` actor, `g` tenant (`-` when there is none), `c`
//! channel, `m` message, `e` expiry, `n` nonce, `d` custom data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tenant sentinel written into tokens issued outside any tenant (e.g. DMs).
pub const NO_TENANT: &str = "-";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from anything string-like.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// The user interacting with, or issuing, a component.
    ActorId
);
string_id!(
    /// An isolated scope (server/workspace) an event belongs to.
    TenantId
);
string_id!(
    /// The channel a component was posted in.
    ChannelId
);
string_id!(
    /// The message a component is attached to.
    MessageId
);
string_id!(
    /// A role held by the interacting member.
    RoleId
);

// =============================================================================
// INTERACTION KIND
// =============================================================================

/// Kind of UI element that produced an inbound event.
///
/// Each kind has its own handler namespace in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Button,
    SelectMenu,
    ModalSubmit,
}

impl InteractionKind {
    /// All kinds, in a stable order.
    pub const ALL: [InteractionKind; 3] = [
        InteractionKind::Button,
        InteractionKind::SelectMenu,
        InteractionKind::ModalSubmit,
    ];

    /// Stable lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Button => "button",
            InteractionKind::SelectMenu => "select_menu",
            InteractionKind::ModalSubmit => "modal_submit",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// REPLAY SCOPE
// =============================================================================

/// Granularity at which a token counts as "already used".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayScope {
    /// One use per issued component instance.
    #[default]
    Id,
    /// One use per component instance per interacting user.
    User,
    /// One use per component instance per channel.
    Channel,
    /// Never consumed; safe for idempotent actions such as "refresh".
    None,
}

// =============================================================================
// CONTEXTS
// =============================================================================

/// Context bound into a token when it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionContext {
    pub actor: ActorId,
    pub tenant: Option<TenantId>,
    pub channel: ChannelId,
    pub message: Option<MessageId>,
}

impl InteractionContext {
    pub fn new(
        actor: impl Into<ActorId>,
        tenant: Option<TenantId>,
        channel: impl Into<ChannelId>,
    ) -> Self {
        Self {
            actor: actor.into(),
            tenant,
            channel: channel.into(),
            message: None,
        }
    }

    /// Attach the message the component will live on.
    pub fn with_message(mut self, message: impl Into<MessageId>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Context a token is checked against when it comes back.
///
/// `actor` and `channel` are only compared when present. `tenant` is always
/// compared: a token issued inside a tenant never verifies outside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationContext {
    pub actor: Option<ActorId>,
    pub tenant: Option<TenantId>,
    pub channel: Option<ChannelId>,
    /// The current actor holds an elevation override (owner/admin).
    pub elevated: bool,
}

// =============================================================================
// TOKEN PAYLOAD
// =============================================================================

/// Payload embedded (base64url JSON) in every signed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "u")]
    pub actor: ActorId,

    #[serde(rename = "g", with = "tenant_sentinel")]
    pub tenant: Option<TenantId>,

    #[serde(rename = "c")]
    pub channel: ChannelId,

    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageId>,

    /// Expiry in epoch seconds; `0` never expires.
    #[serde(rename = "e")]
    pub expiry: u64,

    #[serde(rename = "n")]
    pub nonce: String,

    #[serde(rename = "d", default, skip_serializing_if = "serde_json::Value::is_null")]
    pub custom: serde_json::Value,
}

impl TokenPayload {
    /// Tenant as written on the wire.
    pub fn tenant_label(&self) -> &str {
        self.tenant.as_ref().map(TenantId::as_str).unwrap_or(NO_TENANT)
    }
}

mod tenant_sentinel {
    use super::{TenantId, NO_TENANT};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<TenantId>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(tenant) => s.serialize_str(tenant.as_str()),
            None => s.serialize_str(NO_TENANT),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TenantId>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw == NO_TENANT {
            Ok(None)
        } else {
            Ok(Some(TenantId(raw)))
        }
    }
}

/// A token that passed signature, decoding and expiry checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    pub namespace: String,
    pub action: String,
    pub version: u16,
    pub payload: TokenPayload,
}

impl ParsedToken {
    /// `namespace:action:version`, the exact key handlers are registered under.
    pub fn route_key(&self) -> String {
        format!("{}:{}:{}", self.namespace, self.action, self.version)
    }

    /// `namespace:action`, the version-agnostic key.
    pub fn unversioned_key(&self) -> String {
        format!("{}:{}", self.namespace, self.action)
    }

    /// Custom data the issuer embedded.
    pub fn custom(&self) -> &serde_json::Value {
        &self.payload.custom
    }
}

// =============================================================================
// INBOUND INTERACTION
// =============================================================================

/// An inbound UI event carrying a previously issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Platform-assigned event id (used for acknowledgement).
    pub id: String,
    pub kind: InteractionKind,
    /// The component identifier, i.e. the signed token.
    pub token: String,
    pub actor: ActorId,
    #[serde(default)]
    pub tenant: Option<TenantId>,
    pub channel: ChannelId,
    #[serde(default)]
    pub message: Option<MessageId>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// The actor holds an elevation override (owner/admin).
    #[serde(default)]
    pub elevated: bool,
    /// Selected values (select menus).
    #[serde(default)]
    pub values: Vec<String>,
    /// Submitted fields (modals).
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// When the platform delivered the event (epoch ms); `0` if unknown.
    #[serde(default)]
    pub received_at_ms: u64,
}

impl Interaction {
    /// The context the carried token is verified against.
    ///
    /// Actor binding is deliberately left out; it is enforced per handler by
    /// the caller-only policy.
    pub fn verification_context(&self) -> VerificationContext {
        VerificationContext {
            actor: None,
            tenant: self.tenant.clone(),
            channel: Some(self.channel.clone()),
            elevated: self.elevated,
        }
    }

    /// Context for tokens issued in reply to this interaction.
    pub fn reply_context(&self) -> InteractionContext {
        InteractionContext {
            actor: self.actor.clone(),
            tenant: self.tenant.clone(),
            channel: self.channel.clone(),
            message: self.message.clone(),
        }
    }
}
