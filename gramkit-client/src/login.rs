//! Phone sign-in.

use std::io::{self, BufRead, Write};

use gramkit_tl_types::{enums, functions, types};
use log::{info, warn};

use crate::errors::{InvocationError, SignInError};
use crate::{Client, ClientState};

/// Returned by [`Client::request_login_code`]; pass it to [`Client::sign_in`].
#[derive(Clone, Debug)]
pub struct LoginToken {
    pub(crate) phone:           String,
    pub(crate) phone_code_hash: String,
}

type Prompt = Box<dyn Fn() -> String + Send + Sync>;
type SignUpConsent =
    Box<dyn Fn(Option<&enums::help::TermsOfService>) -> Option<(String, String)> + Send + Sync>;

/// Interactive steps of [`Client::start`].
pub struct LoginCallbacks {
    /// Phone number in international format.
    pub phone: Prompt,
    /// The code Telegram sent.
    pub code: Prompt,
    /// Called for unregistered numbers with the terms of service, if any.
    /// Return `(first_name, last_name)` to create the account, `None` to decline.
    pub sign_up: SignUpConsent,
}

fn prompt(label: &str) -> String {
    print!("{label}: ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        warn!("[gramkit] could not read {label}: {e}");
    }
    line.trim().to_string()
}

impl LoginCallbacks {
    /// Ask for everything on the terminal.
    pub fn stdin() -> Self {
        Self {
            phone: Box::new(|| prompt("Phone number")),
            code: Box::new(|| prompt("Login code")),
            sign_up: Box::new(|terms| {
                if let Some(enums::help::TermsOfService::TermsOfService(tos)) = terms {
                    println!("{}", tos.text);
                }
                let first = prompt("First name (empty to decline)");
                if first.is_empty() {
                    return None;
                }
                Some((first, prompt("Last name")))
            }),
        }
    }
}

fn authorized_user(authorization: enums::auth::Authorization) -> Result<types::User, SignInError> {
    match authorization {
        enums::auth::Authorization::Authorization(a) => match a.user {
            enums::User::User(user) => Ok(user),
            enums::User::Empty(_) => Err(SignInError::Other(InvocationError::Deserialize(
                "authorization carried an empty user".into(),
            ))),
        },
        enums::auth::Authorization::SignUpRequired(s) => {
            Err(SignInError::SignUpRequired { terms_of_service: s.terms_of_service })
        }
    }
}

impl Client {
    /// `true` when the session's key is bound to an account.
    pub async fn is_authorized(&self) -> Result<bool, InvocationError> {
        match self.get_me().await {
            Ok(_) => Ok(true),
            Err(e) if e.is("AUTH_KEY_UNREGISTERED") => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ask Telegram to send a login code to `phone`.
    pub async fn request_login_code(&self, phone: &str) -> Result<LoginToken, InvocationError> {
        let request = functions::auth::SendCode {
            phone_number: phone.to_string(),
            api_id:       self.inner.config.api_id,
            api_hash:     self.inner.config.api_hash.clone(),
            settings:     enums::CodeSettings::default(),
        };
        let enums::auth::SentCode::SentCode(sent) = self.invoke(&request).await?;
        info!("[gramkit] login code sent");
        Ok(LoginToken { phone: phone.to_string(), phone_code_hash: sent.phone_code_hash })
    }

    /// Complete sign-in with the received code.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<types::User, SignInError> {
        let request = functions::auth::SignIn {
            phone_number:    token.phone.clone(),
            phone_code_hash: token.phone_code_hash.clone(),
            phone_code:      Some(code.trim().to_string()),
        };
        let authorization = match self.invoke(&request).await {
            Ok(a) => a,
            Err(e) if e.is("SESSION_PASSWORD_NEEDED") => return Err(SignInError::PasswordRequired),
            Err(e) if e.is("PHONE_CODE_*") => return Err(SignInError::InvalidCode),
            Err(e) => return Err(SignInError::Other(e)),
        };
        let user = authorized_user(authorization)?;
        info!("[gramkit] signed in as user {}", user.id);
        Ok(user)
    }

    /// Create an account for an unregistered number after [`sign_in`](Self::sign_in)
    /// returned [`SignInError::SignUpRequired`].
    pub async fn sign_up(
        &self,
        token: &LoginToken,
        first_name: &str,
        last_name: &str,
    ) -> Result<types::User, SignInError> {
        let request = functions::auth::SignUp {
            no_joined_notifications: false,
            phone_number:    token.phone.clone(),
            phone_code_hash: token.phone_code_hash.clone(),
            first_name:      first_name.to_string(),
            last_name:       last_name.to_string(),
        };
        let user = authorized_user(self.invoke(&request).await?)?;
        info!("[gramkit] signed up as user {}", user.id);
        Ok(user)
    }

    /// Make sure the account is signed in, then bring the update state up to date.
    ///
    /// An already authorized session returns straight away; otherwise the
    /// callbacks drive phone, code and (if needed) sign-up.
    pub async fn start(&self, callbacks: &LoginCallbacks) -> Result<types::User, SignInError> {
        let me = match self.get_me().await {
            Ok(me) => me,
            Err(e) if e.is("AUTH_KEY_UNREGISTERED") => self.interactive_sign_in(callbacks).await?,
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.inner.updates.sync_state().await {
            warn!("[gramkit] could not sync update state: {e}");
        }
        self.inner.signed_in.store(true, std::sync::atomic::Ordering::Release);
        self.set_state(ClientState::Ready);
        self.save_session()?;
        Ok(me)
    }

    async fn interactive_sign_in(&self, callbacks: &LoginCallbacks) -> Result<types::User, SignInError> {
        let phone = (callbacks.phone)();
        let token = self.request_login_code(&phone).await?;
        let code = (callbacks.code)();
        match self.sign_in(&token, &code).await {
            Err(SignInError::SignUpRequired { terms_of_service }) => {
                let Some((first, last)) = (callbacks.sign_up)(terms_of_service.as_ref()) else {
                    return Err(SignInError::SignUpRequired { terms_of_service });
                };
                self.sign_up(&token, &first, &last).await
            }
            other => other,
        }
    }
}
