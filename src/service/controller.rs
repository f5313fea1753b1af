//! Screen state machine for the roster application.
//!
//! ```text
//! PreAuth --guest--------------------> Authenticated(Guest)
//! PreAuth --login(role)--------------> Authenticating(role)
//! PreAuth --signup-------------------> Signup
//! Authenticating(role) --success-----> Authenticated(role)
//! Authenticating(_) / Signup --back--> PreAuth
//! Authenticated(_) --logout----------> PreAuth
//! ```

use crate::error::DeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn permits(&self, action: Action) -> bool {
        match action {
            Action::CountStudents | Action::Logout => true,
            Action::ListStudents => matches!(self, Role::User | Role::Admin),
            Action::AddStudent | Action::CreateSchema | Action::DropSchema => {
                matches!(self, Role::Admin)
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Buttons on the authenticated screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CountStudents,
    ListStudents,
    AddStudent,
    CreateSchema,
    DropSchema,
    Logout,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::CountStudents,
        Action::ListStudents,
        Action::AddStudent,
        Action::CreateSchema,
        Action::DropSchema,
        Action::Logout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CountStudents => "count_students",
            Action::ListStudents => "list_students",
            Action::AddStudent => "add_student",
            Action::CreateSchema => "create_schema",
            Action::DropSchema => "drop_schema",
            Action::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "role", rename_all = "snake_case")]
pub enum Screen {
    PreAuth,
    Signup,
    Authenticating(Role),
    Authenticated(Role),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::PreAuth => "pre_auth",
            Screen::Signup => "signup",
            Screen::Authenticating(_) => "authenticating",
            Screen::Authenticated(_) => "authenticated",
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Screen::Authenticating(role) | Screen::Authenticated(role) => Some(*role),
            Screen::PreAuth | Screen::Signup => None,
        }
    }
}

/// Per-browser UI state, handed explicitly to every roster handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub screen: Screen,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            screen: Screen::PreAuth,
        }
    }
}

impl SessionContext {
    fn reject(&self, event: &str) -> DeskError {
        DeskError::InvalidTransition {
            screen: self.screen.name().to_string(),
            event: event.to_string(),
        }
    }

    pub fn continue_as_guest(&mut self) -> Result<(), DeskError> {
        match self.screen {
            Screen::PreAuth => {
                self.screen = Screen::Authenticated(Role::Guest);
                Ok(())
            }
            _ => Err(self.reject("continue_as_guest")),
        }
    }

    /// Open the login form for `user` or `admin`.
    pub fn begin_login(&mut self, role: Role) -> Result<(), DeskError> {
        match (self.screen, role) {
            (Screen::PreAuth, Role::User | Role::Admin) => {
                self.screen = Screen::Authenticating(role);
                Ok(())
            }
            _ => Err(self.reject("login")),
        }
    }

    pub fn open_signup(&mut self) -> Result<(), DeskError> {
        match self.screen {
            Screen::PreAuth => {
                self.screen = Screen::Signup;
                Ok(())
            }
            _ => Err(self.reject("signup")),
        }
    }

    pub fn back(&mut self) -> Result<(), DeskError> {
        match self.screen {
            Screen::Authenticating(_) | Screen::Signup => {
                self.screen = Screen::PreAuth;
                Ok(())
            }
            _ => Err(self.reject("back")),
        }
    }

    /// The role a login form was opened for.
    pub fn pending_login(&self) -> Result<Role, DeskError> {
        match self.screen {
            Screen::Authenticating(role) => Ok(role),
            _ => Err(self.reject("authenticate")),
        }
    }

    pub fn complete_login(&mut self) -> Result<Role, DeskError> {
        let role = self.pending_login()?;
        self.screen = Screen::Authenticated(role);
        Ok(role)
    }

    pub fn require_signup(&self) -> Result<(), DeskError> {
        match self.screen {
            Screen::Signup => Ok(()),
            _ => Err(self.reject("submit_signup")),
        }
    }

    /// Check that the current screen exposes `action` for its role.
    pub fn require(&self, action: Action) -> Result<Role, DeskError> {
        let Screen::Authenticated(role) = self.screen else {
            return Err(self.reject(action.as_str()));
        };
        if !role.permits(action) {
            return Err(DeskError::Forbidden {
                action: action.as_str().to_string(),
                role: role.to_string(),
            });
        }
        Ok(role)
    }

    pub fn logout(&mut self) -> Result<(), DeskError> {
        self.require(Action::Logout)?;
        *self = SessionContext::default();
        Ok(())
    }

    pub fn view(&self) -> View {
        let buttons = match self.screen {
            Screen::PreAuth => vec!["continue_as_guest", "login_user", "login_admin", "signup"],
            Screen::Signup => vec!["submit_signup", "back"],
            Screen::Authenticating(_) => vec!["authenticate", "back"],
            Screen::Authenticated(role) => Action::ALL
                .iter()
                .filter(|a| role.permits(**a))
                .map(Action::as_str)
                .collect(),
        };
        View {
            screen: self.screen.name(),
            role: self.screen.role(),
            authenticated: matches!(self.screen, Screen::Authenticated(_)),
            actions: buttons,
        }
    }
}

/// What the client renders: the screen and the buttons on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub screen: &'static str,
    pub role: Option<Role>,
    pub authenticated: bool,
    pub actions: Vec<&'static str>,
}
