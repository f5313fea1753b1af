use axum::{
    Form, Json,
    extract::{Path, State},
};
use axum_extra::extract::{WithRejection, cookie::PrivateCookieJar};
use tracing::{info, warn};

use crate::db::{NewStudent, Student};
use crate::middleware::session::Session;
use crate::service::controller::{Action, Role};
use crate::types::rendering::{DeskForm, LoginForm, Rendered, SignupForm, StudentForm};
use crate::{DeskError, router::DeskState};

type Reply<T = ()> = Result<(PrivateCookieJar, Json<Rendered<T>>), DeskError>;

/// GET /roster -> the current screen.
pub async fn show(session: Session) -> Json<Rendered> {
    Json(Rendered::view(session.ctx.view()))
}

/// POST /roster/guest
pub async fn continue_as_guest(mut session: Session) -> Reply {
    session.ctx.continue_as_guest()?;
    info!("guest session started");
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// POST /roster/login/{role} -> opens the login form for `user` or `admin`.
pub async fn begin_login(mut session: Session, Path(role): Path<String>) -> Reply {
    let role = role.parse::<Role>().map_err(|_| DeskError::InvalidTransition {
        screen: session.ctx.screen.name().to_string(),
        event: format!("login as `{role}`"),
    })?;
    session.ctx.begin_login(role)?;
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// POST /roster/signup
pub async fn open_signup(mut session: Session) -> Reply {
    session.ctx.open_signup()?;
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// POST /roster/signup/submit -> accounts cannot be created; the form only
/// acknowledges the attempt.
pub async fn submit_signup(session: Session, WithRejection(Form(form), _): DeskForm<SignupForm>) -> Reply {
    session.ctx.require_signup()?;
    info!(
        login = %form.login,
        has_password = !form.password.is_empty(),
        "sign-up submitted; no account store is configured"
    );
    Err(DeskError::SignupUnavailable)
}

/// POST /roster/back
pub async fn back(mut session: Session) -> Reply {
    session.ctx.back()?;
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// POST /roster/authenticate -> checks the login form against the role it
/// was opened for.
pub async fn authenticate(
    State(state): State<DeskState>,
    mut session: Session,
    WithRejection(Form(form), _): DeskForm<LoginForm>,
) -> Reply {
    let role = session.ctx.pending_login()?;
    let outcome = state
        .checker
        .authenticate(role, &form.login, &form.password)
        .await;
    if let Err(e) = outcome.into_result() {
        warn!(%role, login = %form.login, ?outcome, "sign-in rejected");
        return Err(e);
    }
    session.ctx.complete_login()?;
    info!(%role, login = %form.login, "signed in");
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// POST /roster/logout
pub async fn logout(mut session: Session) -> Reply {
    session.ctx.logout()?;
    let view = session.ctx.view();
    Ok((session.save(), Json(Rendered::view(view))))
}

/// GET /roster/students/count
pub async fn count_students(State(state): State<DeskState>, session: Session) -> Reply<i64> {
    session.ctx.require(Action::CountStudents)?;
    let count = state
        .students
        .count_students()
        .await
        .inspect_err(|e| warn!(error = %e, "counting students failed"))?;
    let view = session.ctx.view();
    Ok((
        session.save(),
        Json(Rendered::with(view, format!("Number of students: {count}"), count)),
    ))
}

/// GET /roster/students
pub async fn list_students(
    State(state): State<DeskState>,
    session: Session,
) -> Reply<Vec<Student>> {
    session.ctx.require(Action::ListStudents)?;
    let students = state
        .students
        .list_students()
        .await
        .inspect_err(|e| warn!(error = %e, "listing students failed"))?;
    let view = session.ctx.view();
    let message = format!("{} student(s)", students.len());
    Ok((session.save(), Json(Rendered::with(view, message, students))))
}

/// POST /roster/students -> admin adds a student.
pub async fn add_student(
    State(state): State<DeskState>,
    session: Session,
    WithRejection(Form(form), _): DeskForm<StudentForm>,
) -> Reply<i32> {
    session.ctx.require(Action::AddStudent)?;
    let student = NewStudent::parse(form.first_name, form.last_name, &form.group)?;
    let id = state
        .students
        .insert_student(student)
        .await
        .inspect_err(|e| warn!(error = %e, "adding a student failed"))?;
    info!(id, "student added");
    let view = session.ctx.view();
    Ok((
        session.save(),
        Json(Rendered::with(view, "Student added to the database", id)),
    ))
}

/// POST /roster/schema
pub async fn create_schema(State(state): State<DeskState>, session: Session) -> Reply<bool> {
    session.ctx.require(Action::CreateSchema)?;
    state.students.create_schema().await?;
    info!("student schema created by admin");
    let view = session.ctx.view();
    Ok((
        session.save(),
        Json(Rendered::with(view, "Database created", true)),
    ))
}

/// DELETE /roster/schema
pub async fn drop_schema(State(state): State<DeskState>, session: Session) -> Reply<bool> {
    session.ctx.require(Action::DropSchema)?;
    state.students.drop_schema().await?;
    info!("student schema dropped by admin");
    let view = session.ctx.view();
    Ok((
        session.save(),
        Json(Rendered::with(view, "Database deleted", true)),
    ))
}
