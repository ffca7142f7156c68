//! Token Codec Service
//!
//! Builds signed tokens and verifies inbound ones.

use shared_types::{
    sign_truncated, system_clock, verify_truncated, InteractionContext, ParsedToken,
    SharedClock, SigningSecret, TokenPayload, VerificationContext,
};
use tracing::{debug, warn};

use crate::domain::wire::{self, Segments};
use crate::domain::TokenCodecConfig;
use crate::error::{TokenError, TokenRejection};

/// Signs and verifies component tokens with a process-wide secret.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: SigningSecret,
    config: TokenCodecConfig,
    clock: SharedClock,
}

impl TokenCodec {
    /// Create a codec on the system clock.
    pub fn new(secret: SigningSecret, config: TokenCodecConfig) -> Result<Self, TokenError> {
        Self::with_clock(secret, config, system_clock())
    }

    /// Create a codec reading time from `clock`.
    pub fn with_clock(
        secret: SigningSecret,
        config: TokenCodecConfig,
        clock: SharedClock,
    ) -> Result<Self, TokenError> {
        config.validate()?;
        Ok(Self {
            secret,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &TokenCodecConfig {
        &self.config
    }

    /// Build a signed token.
    ///
    /// `ttl_secs == 0` issues a token that never expires.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidSegment` - empty namespace/action or one containing `:`
    /// - `TokenError::LengthExceeded` - the encoded token does not fit the cap
    pub fn build(
        &self,
        namespace: &str,
        action: &str,
        version: u16,
        context: &InteractionContext,
        custom: serde_json::Value,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        wire::check_segment("namespace", namespace)?;
        wire::check_segment("action", action)?;

        let expiry = if ttl_secs == 0 {
            0
        } else {
            self.clock.now_secs().saturating_add(ttl_secs)
        };

        let payload = TokenPayload {
            actor: context.actor.clone(),
            tenant: context.tenant.clone(),
            channel: context.channel.clone(),
            message: context.message.clone(),
            expiry,
            nonce: wire::generate_nonce(),
            custom,
        };

        let encoded = wire::encode_payload(&payload)?;
        let version = version.to_string();
        let mut token = wire::signing_input(namespace, action, &version, &encoded);
        let signature = sign_truncated(&self.secret, token.as_bytes(), self.config.signature_len);
        token.push(wire::SEPARATOR);
        token.push_str(&signature);

        if token.len() > self.config.max_token_length {
            return Err(TokenError::LengthExceeded {
                length: token.len(),
                max: self.config.max_token_length,
            });
        }

        debug!(
            namespace = namespace,
            action = action,
            length = token.len(),
            expiry = expiry,
            "Built component token"
        );

        Ok(token)
    }

    /// Verify and decode a token.
    ///
    /// When `current` is supplied, the token must also be bound to it (see
    /// [`VerificationContext`] for which fields are compared).
    pub fn parse(
        &self,
        token: &str,
        current: Option<&VerificationContext>,
    ) -> Result<ParsedToken, TokenRejection> {
        // 1. Shape
        let segments = Segments::split(token)?;

        // 2. Signature
        if !verify_truncated(
            &self.secret,
            segments.signing_input().as_bytes(),
            segments.signature,
            self.config.signature_len,
        ) {
            return Err(TokenRejection::Tampered);
        }

        // 3. Payload
        let version: u16 = segments
            .version
            .parse()
            .map_err(|_| TokenRejection::Malformed("version is not numeric"))?;
        let payload = wire::decode_payload(segments.payload)?;

        // 4. Expiry
        if payload.expiry > 0 {
            let now = self.clock.now_secs();
            if now > payload.expiry.saturating_add(self.config.clock_skew_secs) {
                return Err(TokenRejection::Expired {
                    expiry: payload.expiry,
                    now,
                });
            }
        }

        // 5. Context binding
        if let Some(current) = current {
            self.check_context(&payload, current)?;
        }

        Ok(ParsedToken {
            namespace: segments.namespace.to_string(),
            action: segments.action.to_string(),
            version,
            payload,
        })
    }

    /// [`parse`](Self::parse), collapsing every rejection to `None`.
    pub fn parse_opt(
        &self,
        token: &str,
        current: Option<&VerificationContext>,
    ) -> Option<ParsedToken> {
        self.parse(token, current).ok()
    }

    fn check_context(
        &self,
        payload: &TokenPayload,
        current: &VerificationContext,
    ) -> Result<(), TokenRejection> {
        if let Some(actor) = &current.actor {
            if *actor != payload.actor && !current.elevated {
                return Err(TokenRejection::ActorMismatch);
            }
        }

        if current.tenant != payload.tenant {
            return Err(TokenRejection::TenantMismatch);
        }

        if let Some(channel) = &current.channel {
            if *channel != payload.channel {
                if self.config.strict_channel {
                    return Err(TokenRejection::ChannelMismatch);
                }
                warn!(
                    token_channel = %payload.channel,
                    current_channel = %channel,
                    "Token used outside the channel it was issued in"
                );
            }
        }

        Ok(())
    }
}
