//! Authentication route handlers.
//!
//! Handles login, the multi-step registration wizard, the forgot-password
//! confirmation and logout. Credentials are checked by the auth backend;
//! the session only ever holds the token it issues.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use doux_core::{Email, RegistrationDraft, RegistrationError, RegistrationStep, StepFields};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_auth_token, set_auth_token};
use crate::models::session_keys;
use crate::routes::Layout;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Messages
// =============================================================================

/// Visitor-facing text for a `?error=` code on the login page.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "email" => "Please enter a valid email address.",
        "expired" => "Your session has expired. Please log in again.",
        "google" => "Google sign-in did not complete. Please try again.",
        "unavailable" => "Sign-in is temporarily unavailable. Please try again later.",
        "token" => "Sign-in failed. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Visitor-facing text for a `?success=` code on the login page.
fn login_success_message(code: &str) -> Option<&'static str> {
    match code {
        "registered" => Some("Your account has been created. Please log in."),
        _ => None,
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Which button submitted a wizard step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardAction {
    #[default]
    Next,
    Back,
    Submit,
}

/// Registration wizard form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub action: WizardAction,
    #[serde(flatten)]
    pub fields: StepFields,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// A step of the wizard's progress indicator.
#[derive(Debug, Clone)]
pub struct StepView {
    pub number: usize,
    pub title: &'static str,
    pub current: bool,
    pub done: bool,
}

/// Values echoed back into the wizard inputs. The password never is.
#[derive(Debug, Clone, Default)]
pub struct WizardValues {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subscribe: bool,
}

impl WizardValues {
    fn from_draft(draft: &RegistrationDraft) -> Self {
        Self {
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            subscribe: draft.subscribe,
        }
    }

    /// Overlay the fields a rejected step submitted.
    fn with_submitted(mut self, step: RegistrationStep, fields: &StepFields) -> Self {
        let text = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();
        match step {
            RegistrationStep::Personal => {
                self.first_name = text(&fields.first_name);
                self.last_name = text(&fields.last_name);
            }
            RegistrationStep::Contact => {
                self.email = text(&fields.email);
                self.phone = text(&fields.phone);
                self.subscribe = fields.subscribe.is_some();
            }
            RegistrationStep::Password | RegistrationStep::Review => {}
        }
        self
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    /// Errors not tied to an input, such as a backend rejection.
    pub form: Option<String>,
}

impl FieldErrors {
    fn from_errors(errors: &[RegistrationError]) -> Self {
        let mut out = Self::default();
        for error in errors {
            let slot = match error.field() {
                "first_name" => &mut out.first_name,
                "last_name" => &mut out.last_name,
                "email" => &mut out.email,
                "phone" => &mut out.phone,
                "password" => &mut out.password,
                "confirm_password" => &mut out.confirm_password,
                _ => &mut out.form,
            };
            slot.get_or_insert_with(|| error.to_string());
        }
        out
    }

    fn form(message: String) -> Self {
        Self {
            form: Some(message),
            ..Self::default()
        }
    }
}

/// Registration wizard template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub step: RegistrationStep,
    pub steps: Vec<StepView>,
    pub values: WizardValues,
    pub errors: FieldErrors,
    /// A password was already accepted (shown on the review step).
    pub has_password: bool,
}

impl RegisterTemplate {
    fn new(
        layout: Layout,
        draft: &RegistrationDraft,
        values: WizardValues,
        errors: FieldErrors,
    ) -> Self {
        let steps = RegistrationStep::ALL
            .into_iter()
            .map(|step| StepView {
                number: step.number(),
                title: step.title(),
                current: step == draft.step,
                done: step.number() < draft.step.number(),
            })
            .collect();

        Self {
            layout,
            step: draft.step,
            steps,
            values,
            errors,
            has_password: draft.has_password(),
        }
    }
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub email: String,
    /// Set once a well-formed address was submitted.
    pub sent: bool,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in visitors go straight to the catalog.
#[instrument(skip(state, auth))]
pub async fn login_page(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if auth.0.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout: Layout::new(&state, None),
        error: query.error.as_deref().map(login_error_message),
        success: query.success.as_deref().and_then(login_success_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the token is stored and the session id cycled; the cart is
/// kept because it is keyed by the visitor id, not the login.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let password = SecretString::from(form.password);

    match AuthService::new(state.backend())
        .login(&form.email, &password)
        .await
    {
        Ok(token) => {
            set_auth_token(&session, &token).await?;
            set_sentry_user(token.email());
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            report(&e, "Login failed");
            Ok(Redirect::to(&format!("/auth/login?error={}", e.code())).into_response())
        }
    }
}

/// Log an auth failure, capturing server-side ones to Sentry.
pub(crate) fn report(err: &AuthError, context: &'static str) {
    if err.is_server_error() {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "{context}");
    } else {
        tracing::warn!(error = %err, "{context}");
    }
}

/// Handle logout.
///
/// Only the token is dropped; the visitor keeps their cart.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_auth_token(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

// =============================================================================
// Registration Routes
// =============================================================================

async fn load_draft(session: &Session) -> Result<RegistrationDraft> {
    Ok(session
        .get::<RegistrationDraft>(session_keys::REGISTER_DRAFT)
        .await?
        .unwrap_or_default())
}

/// Display the current wizard step.
#[instrument(skip(state, session, auth))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Response> {
    if auth.0.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let draft = load_draft(&session).await?;
    let values = WizardValues::from_draft(&draft);
    Ok(RegisterTemplate::new(
        Layout::new(&state, None),
        &draft,
        values,
        FieldErrors::default(),
    )
    .into_response())
}

/// Handle a wizard step.
///
/// Successful steps redirect back to the wizard (post/redirect/get); failed
/// steps re-render with field errors and `422`.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let mut draft = load_draft(&session).await?;
    let layout = Layout::new(&state, None);
    tracing::debug!(step = ?draft.step, action = ?form.action, "Wizard step");

    match form.action {
        WizardAction::Back => {
            draft.back();
        }
        WizardAction::Next => {
            if let Err(errors) = draft.advance(&form.fields) {
                let values =
                    WizardValues::from_draft(&draft).with_submitted(draft.step, &form.fields);
                let page = RegisterTemplate::new(
                    layout,
                    &draft,
                    values,
                    FieldErrors::from_errors(&errors),
                );
                return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
            }
        }
        WizardAction::Submit => return submit_registration(&state, &session, draft, layout).await,
    }

    session
        .insert(session_keys::REGISTER_DRAFT, &draft)
        .await?;
    Ok(Redirect::to("/auth/register").into_response())
}

/// Send the finished draft to the backend.
async fn submit_registration(
    state: &AppState,
    session: &Session,
    mut draft: RegistrationDraft,
    layout: Layout,
) -> Result<Response> {
    let user = match draft.finish() {
        Ok(user) => user,
        Err(e) => {
            let values = WizardValues::from_draft(&draft);
            let page = RegisterTemplate::new(layout, &draft, values, FieldErrors::from_errors(&[e]));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match AuthService::new(state.backend()).register(&user).await {
        Ok(()) => {
            session
                .remove::<RegistrationDraft>(session_keys::REGISTER_DRAFT)
                .await?;
            Ok(Redirect::to("/auth/login?success=registered").into_response())
        }
        Err(e) => {
            report(&e, "Registration failed");
            let status = if e.is_server_error() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            // A rejected submit must not leave the plaintext password in the session
            draft.clear_password();
            session
                .insert(session_keys::REGISTER_DRAFT, &draft)
                .await?;
            let values = WizardValues::from_draft(&draft);
            let page = RegisterTemplate::new(
                layout,
                &draft,
                values,
                FieldErrors::form(e.user_message()),
            );
            Ok((status, page).into_response())
        }
    }
}

// =============================================================================
// Forgot Password Routes
// =============================================================================

/// Display the forgot password page.
#[instrument(skip(state))]
pub async fn forgot_password_page(State(state): State<AppState>) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate {
        layout: Layout::new(&state, None),
        error: None,
        email: String::new(),
        sent: false,
    }
}

/// Handle forgot password submission.
///
/// The backend has no reset endpoint, so a valid address only gets a
/// confirmation. The same page is shown whether or not an account exists.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let layout = Layout::new(&state, None);

    match Email::parse(&form.email) {
        Ok(email) => {
            tracing::info!(domain = email.domain(), "Password reset requested");
            ForgotPasswordTemplate {
                layout,
                error: None,
                email: email.to_string(),
                sent: true,
            }
            .into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ForgotPasswordTemplate {
                layout,
                error: Some(e.to_string()),
                email: form.email.trim().to_string(),
                sent: false,
            },
        )
            .into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_messages() {
        assert_eq!(login_error_message("credentials"), "Invalid email or password.");
        assert!(login_error_message("<script>").starts_with("Something went wrong"));
        assert!(login_success_message("registered").is_some());
        assert!(login_success_message("anything").is_none());
    }

    #[test]
    fn test_field_errors_keep_first_per_field() {
        let errors = FieldErrors::from_errors(&[
            RegistrationError::WeakPassword,
            RegistrationError::PasswordMismatch,
            RegistrationError::Phone,
            RegistrationError::Incomplete,
        ]);
        assert!(errors.password.is_some());
        assert!(errors.confirm_password.is_some());
        assert!(errors.phone.is_some());
        assert!(errors.form.is_some());
        assert!(errors.email.is_none());
    }

    #[test]
    fn test_values_echo_rejected_input() {
        let draft = RegistrationDraft::default();
        let fields = StepFields {
            first_name: Some("M".into()),
            last_name: Some("Mustermann".into()),
            ..StepFields::default()
        };
        let values = WizardValues::from_draft(&draft).with_submitted(draft.step, &fields);
        assert_eq!(values.first_name, "M");
        assert_eq!(values.last_name, "Mustermann");
    }

    #[test]
    fn test_wizard_action_parses_lowercase() {
        let form: RegisterForm = serde_json::from_value(serde_json::json!({
            "action": "back",
            "first_name": "Max"
        }))
        .unwrap();
        assert_eq!(form.action, WizardAction::Back);
        assert_eq!(form.fields.first_name.as_deref(), Some("Max"));
    }
}
