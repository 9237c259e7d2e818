use std::collections::HashMap;

use {
    axum::async_trait,
    axum_login::{AuthnBackend, UserId},
    oauth2::{
        basic::BasicClient,
        reqwest::async_http_client,
        url::{ParseError, Url},
        AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
        TokenResponse, TokenUrl,
    },
    reqwest::header::USER_AGENT,
    serde_json::Value,
    tracing::{debug, warn},
};

use super::Credentials;
use crate::{
    db::UserStore,
    model::User,
    util::{ClientConfig, Config},
    Error,
};

const USER_AGENT_VALUE: &str = "bookshelf";

#[derive(Debug, Clone)]
struct Provider {
    client: BasicClient,
    userinfo_uri: String,
    login_field: String,
    scopes: Vec<Scope>,
}

impl Provider {
    fn from_config(name: &str, client: &ClientConfig, redirect_uri: String) -> Result<Self, Error> {
        let auth_url = AuthUrl::new(client.auth_uri.clone())
            .map_err(invalid_url("authorization", name, &client.auth_uri))?;
        let token_url = TokenUrl::new(client.token_uri.clone())
            .map_err(invalid_url("token", name, &client.token_uri))?;
        let redirect_url = RedirectUrl::new(redirect_uri.clone())
            .map_err(invalid_url("redirect", name, &redirect_uri))?;

        let oauth_client = BasicClient::new(
            ClientId::new(client.client_id.clone()),
            Some(ClientSecret::new(client.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client: oauth_client,
            userinfo_uri: client.userinfo_uri.clone(),
            login_field: client.login_field.clone(),
            scopes: client.scopes.iter().cloned().map(Scope::new).collect(),
        })
    }
}

fn invalid_url(kind: &'static str, name: &str, url: &str) -> impl FnOnce(ParseError) -> Error {
    let (client_name, url) = (name.to_string(), url.to_string());
    move |inner| Error::InvalidClientUrl {
        kind,
        client_name,
        url,
        inner,
    }
}

/// Authenticates users through the configured OAuth providers and keeps them
/// in the [`UserStore`].
#[derive(Debug, Clone)]
pub struct Backend {
    users: UserStore,
    providers: HashMap<String, Provider>,
    default_roles: Vec<String>,
}

impl Backend {
    /// # Errors
    ///
    /// Fails when a provider's authorization, token or redirect URL is invalid.
    pub fn from_config(
        config: &Config,
        callback_route: &str,
        users: UserStore,
    ) -> Result<Self, Error> {
        let providers = config
            .oauth_clients
            .iter()
            .map(|(name, client)| {
                let redirect_uri = config
                    .website
                    .format_public_server_url(&format!("{callback_route}/{name}"));
                Provider::from_config(name, client, redirect_uri).map(|p| (name.clone(), p))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            users,
            providers,
            default_roles: config.auth.default_roles.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::ProviderNotFound`] for an unconfigured provider.
    pub fn authorize_url(&self, provider: &str) -> Result<(Url, CsrfToken), Error> {
        let provider = self
            .providers
            .get(provider)
            .ok_or_else(|| Error::ProviderNotFound(provider.to_string()))?;

        Ok(provider
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(provider.scopes.iter().cloned())
            .url())
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = User;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        // Ensure the CSRF state has not been tampered with.
        if creds.old_state.secret() != creds.new_state.secret() {
            warn!("CSRF state mismatch for provider {}", creds.provider);
            return Ok(None);
        }

        let provider = self
            .providers
            .get(&creds.provider)
            .ok_or_else(|| Error::ProviderNotFound(creds.provider.clone()))?;

        let token_res = provider
            .client
            .exchange_code(AuthorizationCode::new(creds.code))
            .request_async(async_http_client)
            .await?;

        let user_info: Value = reqwest::Client::new()
            .get(&provider.userinfo_uri)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .bearer_auth(token_res.access_token().secret())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let account = login_from_userinfo(&user_info, &provider.login_field).ok_or_else(|| {
            Error::MissingLoginField {
                provider: creds.provider.clone(),
                field: provider.login_field.clone(),
            }
        })?;
        debug!("Userinfo from {} resolved to {}", creds.provider, account);

        // Persist user in our database so we can use `get_user`.
        let user = self
            .users
            .upsert(
                &creds.provider,
                &account,
                token_res.access_token().secret(),
                &self.default_roles,
            )
            .await?;

        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        self.users.find_by_id(user_id).await
    }
}

fn login_from_userinfo(user_info: &Value, field: &str) -> Option<String> {
    match user_info.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
