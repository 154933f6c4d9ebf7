//! Embedded-app session tokens
//!
//! The storefront admin hands the app a short-lived HS256 JWT signed with the
//! app secret. The `dest` claim carries the shop origin, which is the tenant.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shopgate_billing::{BillingError, BillingResult, IdentityProvider, TenantContext, TenantId};

const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin origin that issued the token
    pub iss: String,
    /// Shop origin, e.g. `https://acme.myshopify.com`
    pub dest: String,
    /// App API key
    pub aud: String,
    /// User id
    pub sub: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(default)]
    pub sid: Option<String>,
}

/// [`IdentityProvider`] backed by session token verification
#[derive(Clone)]
pub struct SessionTokenProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionTokenProvider {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[api_key]);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "aud"]);

        Self {
            decoding_key: DecodingKey::from_secret(api_secret.as_bytes()),
            validation,
        }
    }

    /// Verify `token` and return its claims
    pub fn verify(&self, token: &str) -> BillingResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| BillingError::Unauthenticated(format!("invalid session token: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for SessionTokenProvider {
    async fn resolve(&self, ctx: &TenantContext) -> BillingResult<TenantId> {
        let token = ctx
            .session_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BillingError::Unauthenticated("missing session token".to_string()))?;

        let claims = self.verify(token)?;
        shop_from_dest(&claims.dest).map(TenantId::new)
    }
}

/// `https://acme.myshopify.com` -> `acme.myshopify.com`
fn shop_from_dest(dest: &str) -> BillingResult<String> {
    let invalid = || BillingError::Unauthenticated(format!("invalid shop destination: {dest}"));

    let url = url::Url::parse(dest).map_err(|_| invalid())?;
    if url.scheme() != "https" || url.port().is_some() || !matches!(url.path(), "" | "/") {
        return Err(invalid());
    }

    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let name = host.strip_suffix(SHOP_DOMAIN_SUFFIX).ok_or_else(invalid)?;
    let valid_name = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');

    if !valid_name {
        return Err(invalid());
    }
    Ok(host)
}
